//! SQL schema for the wagate SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tenants (
    tenant_id          TEXT PRIMARY KEY,
    business_name      TEXT NOT NULL,
    email              TEXT NOT NULL,
    phone_number_id    TEXT NOT NULL,   -- inbound routing key
    whatsapp_number    TEXT NOT NULL,
    access_token       TEXT NOT NULL,
    is_active          INTEGER NOT NULL DEFAULT 1,
    utc_offset_minutes INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL,
    UNIQUE (email),
    UNIQUE (phone_number_id)
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id   TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(tenant_id),
    name         TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (tenant_id, phone_number)
);

CREATE TABLE IF NOT EXISTS auto_reply_rules (
    rule_id         TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL REFERENCES tenants(tenant_id),
    trigger_keyword TEXT NOT NULL,   -- stored normalized
    response_text   TEXT NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS business_hours (
    tenant_id   TEXT NOT NULL REFERENCES tenants(tenant_id),
    day_of_week INTEGER NOT NULL,   -- 0 = Monday
    open_time   TEXT NOT NULL,      -- HH:MM
    close_time  TEXT NOT NULL,      -- HH:MM
    is_open     INTEGER NOT NULL DEFAULT 1,
    UNIQUE (tenant_id, day_of_week),
    CHECK  (day_of_week BETWEEN 0 AND 6)
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS message_logs (
    message_id    TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL REFERENCES tenants(tenant_id),
    sender_number TEXT NOT NULL,
    message_text  TEXT NOT NULL,
    direction     TEXT NOT NULL,   -- 'inbound' | 'outbound'
    timestamp     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS broadcasts (
    broadcast_id  TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL REFERENCES tenants(tenant_id),
    title         TEXT NOT NULL,
    template_name TEXT NOT NULL,
    status        TEXT NOT NULL,   -- 'pending' | 'running' | 'completed'
    total         INTEGER NOT NULL DEFAULT 0,
    sent          INTEGER NOT NULL DEFAULT 0,
    failed        INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_tenant_idx   ON contacts(tenant_id);
CREATE INDEX IF NOT EXISTS rules_tenant_idx      ON auto_reply_rules(tenant_id);
CREATE INDEX IF NOT EXISTS messages_sender_idx   ON message_logs(tenant_id, sender_number);
CREATE INDEX IF NOT EXISTS broadcasts_tenant_idx ON broadcasts(tenant_id);
CREATE INDEX IF NOT EXISTS broadcasts_status_idx ON broadcasts(status);

PRAGMA user_version = 1;
";
