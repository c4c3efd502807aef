//! Replace-all storage for ingested records.

use rusqlite::{params, Connection};
use serde_json::{Map, Value};

use super::{Database, StorageError};

/// One ingested record: an arbitrary JSON object.
pub type DataRecord = Map<String, Value>;

/// Delete every stored record and insert `records` in a single transaction.
///
/// Any error drops the transaction, which rolls it back; the previous set
/// stays fully intact.
pub fn replace_all(conn: &mut Connection, records: &[DataRecord]) -> Result<(), StorageError> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM data_rows", [])?;
    {
        let mut insert = tx.prepare("INSERT INTO data_rows (payload) VALUES (?1)")?;
        for record in records {
            let payload = serde_json::to_string(record)?;
            insert.execute(params![payload])?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// All stored records, in insertion order.
pub fn read_all(conn: &Connection) -> Result<Vec<DataRecord>, StorageError> {
    let mut stmt = conn.prepare("SELECT payload FROM data_rows ORDER BY id")?;
    let payloads = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    payloads
        .iter()
        .map(|p| serde_json::from_str(p).map_err(StorageError::from))
        .collect()
}

pub fn has_any(conn: &Connection) -> Result<bool, StorageError> {
    let exists: bool = conn.query_row("SELECT EXISTS(SELECT 1 FROM data_rows)", [], |row| row.get(0))?;
    Ok(exists)
}

pub fn count(conn: &Connection) -> Result<usize, StorageError> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM data_rows", [], |row| row.get(0))?;
    Ok(n as usize)
}

/// Async facade over the record table.
#[derive(Clone)]
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn replace_all(&self, records: Vec<DataRecord>) -> Result<usize, StorageError> {
        let total = records.len();
        self.db.call(move |conn| replace_all(conn, &records)).await?;
        Ok(total)
    }

    pub async fn read_all(&self) -> Result<Vec<DataRecord>, StorageError> {
        self.db.call(|conn| read_all(conn)).await
    }

    pub async fn has_any(&self) -> Result<bool, StorageError> {
        self.db.call(|conn| has_any(conn)).await
    }

    pub async fn count(&self) -> Result<usize, StorageError> {
        self.db.call(|conn| count(conn)).await
    }
}
