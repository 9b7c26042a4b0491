use crate::domain::entities::bill::BillDocument;
use crate::domain::error::DomainError;
use crate::domain::ports::bill_repository::{BillRepository, DocumentSource};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;
use tracing::warn;

const SELECT_COLS: &str = "id, title, full_text, summary_text, summary_key, categories, updated_at";

pub struct SqliteBillRepo {
    conn: Mutex<Connection>,
}

impl SqliteBillRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_bill(row: &rusqlite::Row) -> Result<BillDocument, rusqlite::Error> {
        let id: String = row.get(0)?;
        let categories_str: String = row.get(5)?;
        let updated_str: String = row.get(6)?;
        let categories = serde_json::from_str(&categories_str).unwrap_or_else(|e| {
            warn!(bill = %id, "Invalid categories column ({e}), treating as empty");
            Vec::new()
        });

        Ok(BillDocument {
            title: row.get(1)?,
            full_text: row.get(2)?,
            summary_text: row.get(3)?,
            summary_key: row.get(4)?,
            categories,
            updated_at: DateTime::parse_from_rfc3339(&updated_str)
                .map(|dt| dt.with_timezone(&Utc))
                .ok(),
            id,
        })
    }
}

impl DocumentSource for SqliteBillRepo {
    fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<BillDocument>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Connection(e.to_string()))?;
        let sql = format!("SELECT {SELECT_COLS} FROM bills ORDER BY id LIMIT ?1 OFFSET ?2");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let bills = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_bill)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(bills)
    }
}

impl BillRepository for SqliteBillRepo {
    fn upsert_bill(&self, bill: &BillDocument) -> Result<(), DomainError> {
        if bill.id.trim().is_empty() {
            return Err(DomainError::InvalidInput("bill id must not be empty".into()));
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Connection(e.to_string()))?;
        let categories = serde_json::to_string(&bill.categories)
            .map_err(|e| DomainError::Parse(e.to_string()))?;
        conn.execute(
            "INSERT INTO bills (id, title, full_text, summary_text, summary_key, categories, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                full_text = excluded.full_text,
                summary_text = excluded.summary_text,
                summary_key = excluded.summary_key,
                categories = excluded.categories,
                updated_at = excluded.updated_at",
            params![
                bill.id,
                bill.title,
                bill.full_text,
                bill.summary_text,
                bill.summary_key,
                categories,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Write(format!("Failed to upsert bill {}: {e}", bill.id)))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<BillDocument>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Connection(e.to_string()))?;
        let sql = format!("SELECT {SELECT_COLS} FROM bills WHERE id = ?1");
        conn.query_row(&sql, params![id], Self::row_to_bill)
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn count(&self) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Connection(e.to_string()))?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM bills", [], |r| r.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    fn update_categories(&self, id: &str, categories: &[String]) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Connection(e.to_string()))?;
        let json = serde_json::to_string(categories).map_err(|e| DomainError::Parse(e.to_string()))?;
        let updated = conn
            .execute(
                "UPDATE bills SET categories = ?1, updated_at = ?2 WHERE id = ?3",
                params![json, Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| DomainError::Write(format!("Failed to update categories for {id}: {e}")))?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("bill {id}")));
        }
        Ok(())
    }
}
