//! SQLite persistence for the append-only [`Activity`] feed.

use rusqlite::params;

use refnet_shared::NewActivity;

use crate::database::{get_enum, get_json, get_ts, json, query_all, ts, write_err, Database};
use crate::error::Result;
use crate::merge;
use crate::models::Activity;
use crate::repository::ActivityStore;

const SELECT_ACTIVITY: &str =
    "SELECT id, user_id, kind, title, description, metadata, created_at FROM activities";

impl ActivityStore for Database {
    fn list_activities(&self) -> Result<Vec<Activity>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_ACTIVITY} ORDER BY created_at DESC, id DESC"),
            [],
            row_to_activity,
        )
    }

    fn create_activity(&self, input: NewActivity) -> Result<Activity> {
        let activity = merge::new_activity(0, input, crate::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO activities (user_id, kind, title, description, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.user_id,
                activity.kind.as_str(),
                activity.title,
                activity.description,
                json(&activity.metadata)?,
                ts(&activity.created_at),
            ],
        )
        .map_err(write_err)?;

        Ok(Activity {
            id: conn.last_insert_rowid(),
            ..activity
        })
    }

    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>> {
        let conn = self.conn()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query_all(
            &conn,
            &format!("{SELECT_ACTIVITY} ORDER BY created_at DESC, id DESC LIMIT ?1"),
            params![limit],
            row_to_activity,
        )
    }
}

fn row_to_activity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: get_enum(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        metadata: get_json(row, 5)?,
        created_at: get_ts(row, 6)?,
    })
}
