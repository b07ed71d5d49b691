//! Canned reply texts.

/// Sent to a sender whose message arrives outside business hours.
pub const CLOSED: &str = "🕐 *We're currently closed.*\n\n\
  Our team is not available right now but we'll get back to you as soon as we open.\n\n\
  Type *hours* to see our working hours.";

pub const MENU: &str = "📋 *Main Menu*\n\n\
  1️⃣ Type *price* - Pricing info\n\
  2️⃣ Type *location* - Find us\n\
  3️⃣ Type *hours* - Working hours\n\
  4️⃣ Type *human* - Talk to an agent\n\n\
  Type *menu* anytime to see this again.";

pub const HANDOFF: &str = "👤 *Connecting you to an agent...*\n\n\
  Please hold on, someone from our team will respond shortly.\n\
  Our working hours are Mon-Fri, 9am - 6pm.";

pub const FALLBACK: &str = "🤔 Sorry, I didn't quite understand that.\n\n\
  Type *menu* to see available options or *human* to speak with our team directly.";

/// First message a new sender ever receives from `business_name`.
pub fn greeting(business_name: &str) -> String {
  format!(
    "👋 Welcome to *{business_name}*!\n\n\
     We're glad you reached out. Here's what we can help you with:\n\n\
     1️⃣ Type *price* - to see our pricing\n\
     2️⃣ Type *location* - to find us\n\
     3️⃣ Type *hours* - for our working hours\n\
     4️⃣ Type *human* - to speak with an agent\n\n\
     Just type any of the keywords above to get started! 😊"
  )
}
