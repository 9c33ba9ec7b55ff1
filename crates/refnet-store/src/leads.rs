//! SQLite persistence for [`Lead`] records.

use rusqlite::{params, Connection};

use refnet_shared::{LeadPatch, LeadStatus, NewLead};

use crate::database::{get_enum, get_money, get_ts, query_all, query_one, ts, write_err, Database};
use crate::error::Result;
use crate::merge;
use crate::models::Lead;
use crate::repository::LeadStore;

const SELECT_LEAD: &str = "SELECT id, referrer_id, customer_name, customer_email, customer_phone, service,
            value, status, business_name, notes, created_at, updated_at
     FROM leads";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

impl LeadStore for Database {
    fn list_leads(&self) -> Result<Vec<Lead>> {
        let conn = self.conn()?;
        query_all(&conn, &format!("{SELECT_LEAD} {NEWEST_FIRST}"), [], row_to_lead)
    }

    fn get_lead(&self, id: i64) -> Result<Option<Lead>> {
        select_lead(&*self.conn()?, id)
    }

    fn create_lead(&self, input: NewLead) -> Result<Lead> {
        let lead = merge::new_lead(0, input, crate::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO leads (referrer_id, customer_name, customer_email, customer_phone, service,
                                value, status, business_name, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                lead.referrer_id,
                lead.customer_name,
                lead.customer_email,
                lead.customer_phone,
                lead.service,
                lead.value.to_string(),
                lead.status.as_str(),
                lead.business_name,
                lead.notes,
                ts(&lead.created_at),
                ts(&lead.updated_at),
            ],
        )
        .map_err(write_err)?;

        Ok(Lead {
            id: conn.last_insert_rowid(),
            ..lead
        })
    }

    fn update_lead(&self, id: i64, patch: LeadPatch) -> Result<Option<Lead>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut lead) = select_lead(&tx, id)? else {
            return Ok(None);
        };
        merge::apply_lead_patch(&mut lead, patch, crate::now());

        tx.execute(
            "UPDATE leads
             SET referrer_id = ?2, customer_name = ?3, customer_email = ?4, customer_phone = ?5,
                 service = ?6, value = ?7, status = ?8, business_name = ?9, notes = ?10,
                 updated_at = ?11
             WHERE id = ?1",
            params![
                id,
                lead.referrer_id,
                lead.customer_name,
                lead.customer_email,
                lead.customer_phone,
                lead.service,
                lead.value.to_string(),
                lead.status.as_str(),
                lead.business_name,
                lead.notes,
                ts(&lead.updated_at),
            ],
        )
        .map_err(write_err)?;
        tx.commit()?;

        Ok(Some(lead))
    }

    fn leads_by_referrer(&self, referrer_id: i64) -> Result<Vec<Lead>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_LEAD} WHERE referrer_id = ?1 {NEWEST_FIRST}"),
            params![referrer_id],
            row_to_lead,
        )
    }

    fn leads_by_status(&self, status: LeadStatus) -> Result<Vec<Lead>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_LEAD} WHERE status = ?1 {NEWEST_FIRST}"),
            params![status.as_str()],
            row_to_lead,
        )
    }
}

pub(crate) fn select_lead(conn: &Connection, id: i64) -> Result<Option<Lead>> {
    query_one(
        conn,
        &format!("{SELECT_LEAD} WHERE id = ?1"),
        params![id],
        row_to_lead,
    )
}

fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        referrer_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        service: row.get(5)?,
        value: get_money(row, 6)?,
        status: get_enum(row, 7)?,
        business_name: row.get(8)?,
        notes: row.get(9)?,
        created_at: get_ts(row, 10)?,
        updated_at: get_ts(row, 11)?,
    })
}
