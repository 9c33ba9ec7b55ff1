//! v001 -- Initial schema creation.
//!
//! Creates the six core tables: `users`, `leads`, `campaigns`, `disputes`,
//! `earnings` and `activities`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    avatar      TEXT,
    role        TEXT NOT NULL DEFAULT 'referrer',   -- referrer | admin | business
    tier        TEXT NOT NULL DEFAULT 'standard',   -- standard | premium
    created_at  TEXT NOT NULL                       -- RFC-3339, microseconds
);

-- ----------------------------------------------------------------
-- Leads
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS leads (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    referrer_id     INTEGER,                        -- nullable: house leads
    customer_name   TEXT NOT NULL,
    customer_email  TEXT,
    customer_phone  TEXT,
    service         TEXT NOT NULL,
    value           TEXT NOT NULL,                  -- decimal, 2 places
    status          TEXT NOT NULL DEFAULT 'pending',
    business_name   TEXT,
    notes           TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,

    FOREIGN KEY (referrer_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Campaigns
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS campaigns (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    business_id            INTEGER,
    name                   TEXT NOT NULL,
    description            TEXT,
    service_area           TEXT NOT NULL,
    reward_per_conversion  TEXT NOT NULL,
    max_budget             TEXT NOT NULL,
    budget_used            TEXT NOT NULL DEFAULT '0.00',
    start_date             TEXT NOT NULL,
    end_date               TEXT NOT NULL,
    postcode               TEXT,                    -- JSON {"start","end"}
    status                 TEXT NOT NULL DEFAULT 'active',
    leads                  INTEGER NOT NULL DEFAULT 0,
    conversions            INTEGER NOT NULL DEFAULT 0,
    created_at             TEXT NOT NULL,

    FOREIGN KEY (business_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Disputes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS disputes (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id            TEXT NOT NULL UNIQUE,
    lead_id            INTEGER,
    business_id        INTEGER,
    referrer_id        INTEGER,
    business_claim     TEXT NOT NULL,
    referrer_response  TEXT,
    status             TEXT NOT NULL DEFAULT 'pending',
    decision           TEXT,
    admin_id           INTEGER,
    admin_notes        TEXT,
    evidence           TEXT,                        -- JSON
    created_at         TEXT NOT NULL,
    resolved_at        TEXT,

    FOREIGN KEY (lead_id)     REFERENCES leads(id),
    FOREIGN KEY (business_id) REFERENCES users(id),
    FOREIGN KEY (referrer_id) REFERENCES users(id),
    FOREIGN KEY (admin_id)    REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Earnings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS earnings (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    referrer_id  INTEGER,
    lead_id      INTEGER,
    campaign_id  INTEGER,
    amount       TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'pending',   -- pending | paid | disputed
    paid_at      TEXT,
    created_at   TEXT NOT NULL,

    FOREIGN KEY (referrer_id) REFERENCES users(id),
    FOREIGN KEY (lead_id)     REFERENCES leads(id),
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id)
);

-- ----------------------------------------------------------------
-- Activities (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS activities (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER,
    kind         TEXT NOT NULL,                     -- activity type tag
    title        TEXT NOT NULL,
    description  TEXT,
    metadata     TEXT,                              -- JSON
    created_at   TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
