//! Table definitions.

use rusqlite::Connection;

/// Creates all required tables.
pub fn create_all_tables(conn: &Connection) -> rusqlite::Result<()> {
    create_data_rows_table(conn)?;
    create_users_table(conn)?;
    Ok(())
}

/// Drop and recreate every table. Used by `ingest-cli reset-db`.
pub fn reset_all_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS data_rows;
         DROP TABLE IF EXISTS users;",
    )?;
    create_all_tables(conn)
}

/// Ingested records: one opaque JSON object per row.
pub fn create_data_rows_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS data_rows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payload TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Login accounts. `password_hash` is an Argon2 PHC string.
pub fn create_users_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}
