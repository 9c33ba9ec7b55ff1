//! SQLite persistence for [`Dispute`] records.

use rusqlite::{params, Connection};

use refnet_shared::{DisputePatch, DisputeStatus, NewDispute};

use crate::database::{
    get_enum, get_json, get_opt_ts, get_ts, json, opt_ts, query_all, query_one, ts, write_err,
    Database,
};
use crate::error::Result;
use crate::merge;
use crate::models::Dispute;
use crate::repository::DisputeStore;

const SELECT_DISPUTE: &str = "SELECT id, case_id, lead_id, business_id, referrer_id, business_claim,
            referrer_response, status, decision, admin_id, admin_notes, evidence,
            created_at, resolved_at
     FROM disputes";

impl DisputeStore for Database {
    fn list_disputes(&self) -> Result<Vec<Dispute>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_DISPUTE} ORDER BY created_at DESC, id DESC"),
            [],
            row_to_dispute,
        )
    }

    fn get_dispute(&self, id: i64) -> Result<Option<Dispute>> {
        select_dispute(&*self.conn()?, id)
    }

    fn create_dispute(&self, input: NewDispute) -> Result<Dispute> {
        let dispute = merge::new_dispute(0, input, crate::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO disputes (case_id, lead_id, business_id, referrer_id, business_claim,
                                   referrer_response, status, decision, admin_id, admin_notes,
                                   evidence, created_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                dispute.case_id,
                dispute.lead_id,
                dispute.business_id,
                dispute.referrer_id,
                dispute.business_claim,
                dispute.referrer_response,
                dispute.status.as_str(),
                dispute.decision,
                dispute.admin_id,
                dispute.admin_notes,
                json(&dispute.evidence)?,
                ts(&dispute.created_at),
                opt_ts(&dispute.resolved_at),
            ],
        )
        .map_err(write_err)?;

        Ok(Dispute {
            id: conn.last_insert_rowid(),
            ..dispute
        })
    }

    fn update_dispute(&self, id: i64, patch: DisputePatch) -> Result<Option<Dispute>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut dispute) = select_dispute(&tx, id)? else {
            return Ok(None);
        };
        merge::apply_dispute_patch(&mut dispute, patch, crate::now())?;

        tx.execute(
            "UPDATE disputes
             SET case_id = ?2, lead_id = ?3, business_id = ?4, referrer_id = ?5,
                 business_claim = ?6, referrer_response = ?7, status = ?8, decision = ?9,
                 admin_id = ?10, admin_notes = ?11, evidence = ?12, resolved_at = ?13
             WHERE id = ?1",
            params![
                id,
                dispute.case_id,
                dispute.lead_id,
                dispute.business_id,
                dispute.referrer_id,
                dispute.business_claim,
                dispute.referrer_response,
                dispute.status.as_str(),
                dispute.decision,
                dispute.admin_id,
                dispute.admin_notes,
                json(&dispute.evidence)?,
                opt_ts(&dispute.resolved_at),
            ],
        )
        .map_err(write_err)?;
        tx.commit()?;

        Ok(Some(dispute))
    }

    fn disputes_by_status(&self, status: DisputeStatus) -> Result<Vec<Dispute>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_DISPUTE} WHERE status = ?1 ORDER BY created_at DESC, id DESC"),
            params![status.as_str()],
            row_to_dispute,
        )
    }
}

fn select_dispute(conn: &Connection, id: i64) -> Result<Option<Dispute>> {
    query_one(
        conn,
        &format!("{SELECT_DISPUTE} WHERE id = ?1"),
        params![id],
        row_to_dispute,
    )
}

fn row_to_dispute(row: &rusqlite::Row<'_>) -> rusqlite::Result<Dispute> {
    Ok(Dispute {
        id: row.get(0)?,
        case_id: row.get(1)?,
        lead_id: row.get(2)?,
        business_id: row.get(3)?,
        referrer_id: row.get(4)?,
        business_claim: row.get(5)?,
        referrer_response: row.get(6)?,
        status: get_enum(row, 7)?,
        decision: row.get(8)?,
        admin_id: row.get(9)?,
        admin_notes: row.get(10)?,
        evidence: get_json(row, 11)?,
        created_at: get_ts(row, 12)?,
        resolved_at: get_opt_ts(row, 13)?,
    })
}
