//! SQLite persistence for [`Earning`] records.

use rusqlite::{params, Connection};

use refnet_shared::{EarningPatch, NewEarning};

use crate::database::{
    get_enum, get_money, get_opt_ts, get_ts, opt_ts, query_all, query_one, ts, write_err, Database,
};
use crate::error::Result;
use crate::merge;
use crate::models::Earning;
use crate::repository::EarningStore;

const SELECT_EARNING: &str =
    "SELECT id, referrer_id, lead_id, campaign_id, amount, status, paid_at, created_at
     FROM earnings";

impl EarningStore for Database {
    fn list_earnings(&self) -> Result<Vec<Earning>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_EARNING} ORDER BY created_at DESC, id DESC"),
            [],
            row_to_earning,
        )
    }

    fn get_earning(&self, id: i64) -> Result<Option<Earning>> {
        select_earning(&*self.conn()?, id)
    }

    fn create_earning(&self, input: NewEarning) -> Result<Earning> {
        let earning = merge::new_earning(0, input, crate::now());
        let id = insert_earning(&*self.conn()?, &earning)?;
        Ok(Earning { id, ..earning })
    }

    fn update_earning(&self, id: i64, patch: EarningPatch) -> Result<Option<Earning>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut earning) = select_earning(&tx, id)? else {
            return Ok(None);
        };
        merge::apply_earning_patch(&mut earning, patch, crate::now())?;

        tx.execute(
            "UPDATE earnings
             SET referrer_id = ?2, lead_id = ?3, campaign_id = ?4, amount = ?5, status = ?6,
                 paid_at = ?7
             WHERE id = ?1",
            params![
                id,
                earning.referrer_id,
                earning.lead_id,
                earning.campaign_id,
                earning.amount.to_string(),
                earning.status.as_str(),
                opt_ts(&earning.paid_at),
            ],
        )
        .map_err(write_err)?;
        tx.commit()?;

        Ok(Some(earning))
    }

    fn earnings_by_referrer(&self, referrer_id: i64) -> Result<Vec<Earning>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_EARNING} WHERE referrer_id = ?1 ORDER BY created_at DESC, id DESC"),
            params![referrer_id],
            row_to_earning,
        )
    }
}

/// Insert a fully built earning and return its new id.
pub(crate) fn insert_earning(conn: &Connection, earning: &Earning) -> Result<i64> {
    conn.execute(
        "INSERT INTO earnings (referrer_id, lead_id, campaign_id, amount, status, paid_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            earning.referrer_id,
            earning.lead_id,
            earning.campaign_id,
            earning.amount.to_string(),
            earning.status.as_str(),
            opt_ts(&earning.paid_at),
            ts(&earning.created_at),
        ],
    )
    .map_err(write_err)?;
    Ok(conn.last_insert_rowid())
}

fn select_earning(conn: &Connection, id: i64) -> Result<Option<Earning>> {
    query_one(
        conn,
        &format!("{SELECT_EARNING} WHERE id = ?1"),
        params![id],
        row_to_earning,
    )
}

fn row_to_earning(row: &rusqlite::Row<'_>) -> rusqlite::Result<Earning> {
    Ok(Earning {
        id: row.get(0)?,
        referrer_id: row.get(1)?,
        lead_id: row.get(2)?,
        campaign_id: row.get(3)?,
        amount: get_money(row, 4)?,
        status: get_enum(row, 5)?,
        paid_at: get_opt_ts(row, 6)?,
        created_at: get_ts(row, 7)?,
    })
}
