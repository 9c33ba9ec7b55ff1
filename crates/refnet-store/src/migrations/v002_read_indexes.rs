use rusqlite::Connection;

// Newest-first listings and the filtered reads.
const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_leads_created      ON leads(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_leads_referrer     ON leads(referrer_id);
CREATE INDEX IF NOT EXISTS idx_leads_status       ON leads(status);
CREATE INDEX IF NOT EXISTS idx_campaigns_business ON campaigns(business_id);
CREATE INDEX IF NOT EXISTS idx_disputes_status    ON disputes(status);
CREATE INDEX IF NOT EXISTS idx_earnings_referrer  ON earnings(referrer_id);
CREATE INDEX IF NOT EXISTS idx_earnings_campaign  ON earnings(campaign_id, lead_id);
CREATE INDEX IF NOT EXISTS idx_activities_created ON activities(created_at DESC, id DESC);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
