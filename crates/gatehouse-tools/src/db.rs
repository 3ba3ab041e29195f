//! Embedded CRM database shared by the marketing tools.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed CRM store.
///
/// Read tables (`customers`, `transactions`, `items`, `rfm`) are populated
/// by an external batch pipeline; the campaign tables are written by the
/// tools in this crate.
pub struct CrmDb {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS customers (
    customer_id INTEGER PRIMARY KEY,
    country     TEXT,
    name        TEXT,
    email       TEXT
);

CREATE TABLE IF NOT EXISTS items (
    stock_code  TEXT PRIMARY KEY,
    description TEXT,
    price       REAL
);

CREATE TABLE IF NOT EXISTS transactions (
    invoice      INTEGER NOT NULL,
    invoice_date TEXT,
    stock_code   TEXT NOT NULL,
    quantity     INTEGER,
    price        REAL,
    total_price  REAL,
    customer_id  INTEGER,
    PRIMARY KEY (invoice, stock_code)
);

CREATE TABLE IF NOT EXISTS rfm (
    customer_id INTEGER PRIMARY KEY,
    recency     INTEGER,
    frequency   INTEGER,
    monetary    REAL,
    r           INTEGER,
    f           INTEGER,
    m           INTEGER,
    rfm_score   INTEGER,
    segment     TEXT
);

CREATE TABLE IF NOT EXISTS marketing_campaigns (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    type        TEXT CHECK (type IN ('loyalty', 'referral', 're-engagement')),
    description TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS campaign_emails (
    id          TEXT PRIMARY KEY,
    campaign_id TEXT REFERENCES marketing_campaigns (id) ON DELETE CASCADE,
    customer_id INTEGER,
    subject     TEXT,
    body        TEXT,
    sent_at     TEXT NOT NULL DEFAULT (datetime('now')),
    status      TEXT NOT NULL DEFAULT 'sent'
                CHECK (status IN ('sent', 'bounced', 'opened', 'clicked'))
);
";

impl CrmDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database, for tests and local experiments.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Exclusive access to the underlying connection.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let db = CrmDb::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn open_is_idempotent_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm.db");

        {
            let db = CrmDb::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO customers (customer_id, name) VALUES (1, 'Ada')",
                    [],
                )
                .unwrap();
        }

        let db = CrmDb::open(&path).unwrap();
        let name: String = db
            .conn()
            .query_row("SELECT name FROM customers WHERE customer_id = 1", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(name, "Ada");
    }

    #[test]
    fn campaign_type_check_constraint_holds() {
        let db = CrmDb::open_in_memory().unwrap();
        let err = db.conn().execute(
            "INSERT INTO marketing_campaigns (id, name, type) VALUES ('x', 'bad', 'spam')",
            [],
        );
        assert!(err.is_err());
    }
}
