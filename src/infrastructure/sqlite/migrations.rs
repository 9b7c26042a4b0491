use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS bills (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            full_text TEXT,
            summary_text TEXT,
            summary_key TEXT,
            categories TEXT NOT NULL DEFAULT '[]',
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vector_collections (
            name TEXT PRIMARY KEY,
            primary_key_field TEXT NOT NULL,
            vector_field TEXT NOT NULL,
            dimension INTEGER NOT NULL,
            metric TEXT NOT NULL,
            index_kind TEXT NOT NULL,
            index_params TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vector_entries (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            vector BLOB NOT NULL,
            PRIMARY KEY (collection, id)
        );
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
