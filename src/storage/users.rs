//! Login accounts.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, StorageError};
use crate::auth::password::hash_password;

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Exact-match lookup by username.
pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>, StorageError> {
    let user = conn
        .query_row(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Insert a user, or replace the password of an existing one. Returns the id.
pub fn upsert_user(conn: &Connection, username: &str, password: &str) -> Result<i64, StorageError> {
    let hash = hash_password(password)?;
    conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)
         ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash",
        params![username, hash],
    )?;
    let id = conn.query_row(
        "SELECT id FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Async facade over the users table.
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let username = username.to_string();
        self.db.call(move |conn| find_by_username(conn, &username)).await
    }

    pub async fn upsert_user(&self, username: &str, password: &str) -> Result<i64, StorageError> {
        let username = username.to_string();
        let password = password.to_string();
        self.db
            .call(move |conn| upsert_user(conn, &username, &password))
            .await
    }
}
