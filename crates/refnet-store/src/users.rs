//! SQLite persistence for [`User`] records.

use rusqlite::{params, Connection};

use refnet_shared::{NewUser, UserPatch};

use crate::database::{get_enum, get_ts, query_all, query_one, ts, write_err, Database};
use crate::error::Result;
use crate::merge;
use crate::models::User;
use crate::repository::UserStore;

const SELECT_USER: &str = "SELECT id, username, email, first_name, last_name, avatar, role, tier, created_at
     FROM users";

impl UserStore for Database {
    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        query_all(
            &conn,
            &format!("{SELECT_USER} ORDER BY created_at DESC, id DESC"),
            [],
            row_to_user,
        )
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        select_user(&*self.conn()?, id)
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("{SELECT_USER} WHERE username = ?1"),
            params![username],
            row_to_user,
        )
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        query_one(
            &conn,
            &format!("{SELECT_USER} WHERE email = ?1"),
            params![email],
            row_to_user,
        )
    }

    fn create_user(&self, input: NewUser) -> Result<User> {
        let user = merge::new_user(0, input, crate::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, email, first_name, last_name, avatar, role, tier, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.username,
                user.email,
                user.first_name,
                user.last_name,
                user.avatar,
                user.role.as_str(),
                user.tier.as_str(),
                ts(&user.created_at),
            ],
        )
        .map_err(write_err)?;

        Ok(User {
            id: conn.last_insert_rowid(),
            ..user
        })
    }

    fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(mut user) = select_user(&tx, id)? else {
            return Ok(None);
        };
        merge::apply_user_patch(&mut user, patch);

        tx.execute(
            "UPDATE users
             SET username = ?2, email = ?3, first_name = ?4, last_name = ?5,
                 avatar = ?6, role = ?7, tier = ?8
             WHERE id = ?1",
            params![
                id,
                user.username,
                user.email,
                user.first_name,
                user.last_name,
                user.avatar,
                user.role.as_str(),
                user.tier.as_str(),
            ],
        )
        .map_err(write_err)?;
        tx.commit()?;

        Ok(Some(user))
    }
}

pub(crate) fn select_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("{SELECT_USER} WHERE id = ?1"),
        params![id],
        row_to_user,
    )
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        avatar: row.get(5)?,
        role: get_enum(row, 6)?,
        tier: get_enum(row, 7)?,
        created_at: get_ts(row, 8)?,
    })
}
