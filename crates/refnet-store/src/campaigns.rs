//! SQLite persistence for [`Campaign`] records.

use rusqlite::{params, Connection};

use refnet_shared::{CampaignPatch, NewCampaign, NewConversion};

use crate::database::{
    get_enum, get_json, get_money, get_ts, json, query_all, query_one, ts, write_err, Database,
};
use crate::earnings::insert_earning;
use crate::error::{Result, StoreError};
use crate::leads::select_lead;
use crate::merge;
use crate::models::{Campaign, Earning};
use crate::repository::CampaignStore;

const SELECT_CAMPAIGN: &str = "SELECT id, business_id, name, description, service_area, reward_per_conversion,
            max_budget, budget_used, start_date, end_date, postcode, status, leads,
            conversions, created_at
     FROM campaigns";

impl CampaignStore for Database {
    fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_CAMPAIGN} ORDER BY created_at DESC, id DESC"),
            [],
            row_to_campaign,
        )
    }

    fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        select_campaign(&*self.conn()?, id)
    }

    fn create_campaign(&self, input: NewCampaign) -> Result<Campaign> {
        let campaign = merge::new_campaign(0, input, crate::now())?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO campaigns (business_id, name, description, service_area,
                                    reward_per_conversion, max_budget, budget_used, start_date,
                                    end_date, postcode, status, leads, conversions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                campaign.business_id,
                campaign.name,
                campaign.description,
                campaign.service_area,
                campaign.reward_per_conversion.to_string(),
                campaign.max_budget.to_string(),
                campaign.budget_used.to_string(),
                ts(&campaign.start_date),
                ts(&campaign.end_date),
                json(&campaign.postcode)?,
                campaign.status.as_str(),
                campaign.leads,
                campaign.conversions,
                ts(&campaign.created_at),
            ],
        )
        .map_err(write_err)?;

        Ok(Campaign {
            id: conn.last_insert_rowid(),
            ..campaign
        })
    }

    fn update_campaign(&self, id: i64, patch: CampaignPatch) -> Result<Option<Campaign>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut campaign) = select_campaign(&tx, id)? else {
            return Ok(None);
        };
        merge::apply_campaign_patch(&mut campaign, patch)?;
        write_campaign(&tx, &campaign)?;
        tx.commit()?;

        Ok(Some(campaign))
    }

    fn campaigns_by_business(&self, business_id: i64) -> Result<Vec<Campaign>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_CAMPAIGN} WHERE business_id = ?1 ORDER BY created_at DESC, id DESC"),
            params![business_id],
            row_to_campaign,
        )
    }

    fn record_conversion(
        &self,
        campaign_id: i64,
        conversion: NewConversion,
    ) -> Result<Option<(Campaign, Earning)>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut campaign) = select_campaign(&tx, campaign_id)? else {
            return Ok(None);
        };
        let lead = select_lead(&tx, conversion.lead_id)?
            .ok_or_else(|| StoreError::missing_reference("lead", conversion.lead_id))?;
        let already_credited: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM earnings WHERE campaign_id = ?1 AND lead_id = ?2)",
            params![campaign.id, lead.id],
            |row| row.get(0),
        )?;

        let now = crate::now();
        let credit = merge::charge_conversion(&mut campaign, &lead, already_credited, now)?;
        write_campaign(&tx, &campaign)?;

        let earning = merge::new_earning(0, credit, now);
        let earning_id = insert_earning(&tx, &earning)?;
        tx.commit()?;

        Ok(Some((
            campaign,
            Earning {
                id: earning_id,
                ..earning
            },
        )))
    }
}

fn write_campaign(conn: &Connection, campaign: &Campaign) -> Result<()> {
    conn.execute(
        "UPDATE campaigns
         SET business_id = ?2, name = ?3, description = ?4, service_area = ?5,
             reward_per_conversion = ?6, max_budget = ?7, budget_used = ?8, start_date = ?9,
             end_date = ?10, postcode = ?11, status = ?12, leads = ?13, conversions = ?14
         WHERE id = ?1",
        params![
            campaign.id,
            campaign.business_id,
            campaign.name,
            campaign.description,
            campaign.service_area,
            campaign.reward_per_conversion.to_string(),
            campaign.max_budget.to_string(),
            campaign.budget_used.to_string(),
            ts(&campaign.start_date),
            ts(&campaign.end_date),
            json(&campaign.postcode)?,
            campaign.status.as_str(),
            campaign.leads,
            campaign.conversions,
        ],
    )
    .map_err(write_err)?;
    Ok(())
}

pub(crate) fn select_campaign(conn: &Connection, id: i64) -> Result<Option<Campaign>> {
    query_one(
        conn,
        &format!("{SELECT_CAMPAIGN} WHERE id = ?1"),
        params![id],
        row_to_campaign,
    )
}

fn row_to_campaign(row: &rusqlite::Row<'_>) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        service_area: row.get(4)?,
        reward_per_conversion: get_money(row, 5)?,
        max_budget: get_money(row, 6)?,
        budget_used: get_money(row, 7)?,
        start_date: get_ts(row, 8)?,
        end_date: get_ts(row, 9)?,
        postcode: get_json(row, 10)?,
        status: get_enum(row, 11)?,
        leads: row.get(12)?,
        conversions: row.get(13)?,
        created_at: get_ts(row, 14)?,
    })
}
