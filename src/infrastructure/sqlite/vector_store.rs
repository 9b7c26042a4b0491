use crate::domain::entities::collection::{CollectionSchema, IndexKind};
use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::{NearestNeighbors, VectorStore};
use crate::domain::values::metric::Metric;
use rusqlite::{params, Connection, OptionalExtension};
use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Vector collections kept in SQLite and searched by exhaustive scan.
///
/// The index kind and params are recorded for compatibility with ANN
/// backends, but every search compares against every stored vector, so
/// results are exact regardless of the kind.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    pub fn open(path: &str) -> Result<Self, DomainError> {
        let conn = Connection::open(path)
            .map_err(|e| DomainError::Connection(format!("cannot open vector store at {path}: {e}")))?;
        crate::infrastructure::sqlite::migrations::run_migrations(&conn)?;
        Ok(Self::new(conn))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Connection(format!("vector store lock poisoned: {e}")))
    }

    fn serialize_vector(v: &[f32]) -> Vec<u8> {
        v.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_vector(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn read_schema(conn: &Connection, name: &str) -> Result<Option<CollectionSchema>, DomainError> {
        let row = conn
            .query_row(
                "SELECT name, primary_key_field, vector_field, dimension, metric, index_kind, index_params
                 FROM vector_collections WHERE name = ?1",
                params![name],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, i64>(3)?,
                        r.get::<_, String>(4)?,
                        r.get::<_, String>(5)?,
                        r.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| DomainError::Database(format!("Failed to read collection {name}: {e}")))?;

        let Some((name, pk, vf, dim, metric, kind, params_json)) = row else {
            return Ok(None);
        };
        let metric: Metric = metric.parse().map_err(DomainError::Schema)?;
        let index_kind: IndexKind = kind.parse().map_err(DomainError::Schema)?;
        let index_params = serde_json::from_str(&params_json)
            .map_err(|e| DomainError::Schema(format!("bad index params for {name}: {e}")))?;
        let dimension = usize::try_from(dim)
            .map_err(|_| DomainError::Schema(format!("bad dimension {dim} for {name}")))?;
        Ok(Some(CollectionSchema {
            name,
            primary_key_field: pk,
            vector_field: vf,
            dimension,
            metric,
            index_kind,
            index_params,
        }))
    }

    fn require_schema(conn: &Connection, name: &str) -> Result<CollectionSchema, DomainError> {
        Self::read_schema(conn, name)?
            .ok_or_else(|| DomainError::NotFound(format!("collection {name}")))
    }

    fn check_dimension(schema: &CollectionSchema, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != schema.dimension {
            return Err(DomainError::Schema(format!(
                "vector has {} components, collection {} expects {}",
                vector.len(),
                schema.name,
                schema.dimension
            )));
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Raw value for `metric`: squared L2 distance, or IP/cosine similarity.
pub fn raw_distance(metric: Metric, a: &[f32], b: &[f32]) -> f64 {
    match metric {
        Metric::L2 => squared_l2(a, b),
        Metric::InnerProduct => dot(a, b),
        Metric::Cosine => cosine_similarity(a, b),
    }
}

impl VectorStore for SqliteVectorStore {
    fn ensure_collection(&self, schema: &CollectionSchema) -> Result<CollectionSchema, DomainError> {
        schema.validate()?;
        let conn = self.lock()?;
        if let Some(existing) = Self::read_schema(&conn, &schema.name)? {
            if existing.metric != schema.metric || existing.dimension != schema.dimension {
                warn!(
                    collection = %existing.name,
                    metric = %existing.metric,
                    dimension = existing.dimension,
                    "Collection exists with a different schema; keeping the existing one"
                );
            } else {
                debug!(collection = %existing.name, "Collection already exists");
            }
            return Ok(existing);
        }

        conn.execute(
            "INSERT INTO vector_collections
                (name, primary_key_field, vector_field, dimension, metric, index_kind, index_params, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                schema.name,
                schema.primary_key_field,
                schema.vector_field,
                schema.dimension as i64,
                schema.metric.to_string(),
                schema.index_kind.to_string(),
                schema.index_params.to_string(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to create collection {}: {e}", schema.name)))?;

        info!(
            collection = %schema.name,
            dimension = schema.dimension,
            metric = %schema.metric,
            index = %schema.index_kind,
            "Created collection"
        );
        Ok(schema.clone())
    }

    fn describe(&self, collection: &str) -> Result<Option<CollectionSchema>, DomainError> {
        let conn = self.lock()?;
        Self::read_schema(&conn, collection)
    }

    fn upsert(&self, collection: &str, id: &str, vector: &[f32]) -> Result<(), DomainError> {
        let mut conn = self.lock()?;
        let schema = Self::require_schema(&conn, collection)?;
        Self::check_dimension(&schema, vector)?;
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(DomainError::Write(format!("vector for {id} has non-finite components")));
        }

        // Delete and insert commit together, so readers never see the id missing.
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Write(format!("Failed to begin upsert of {id}: {e}")))?;
        let removed = tx
            .execute(
                "DELETE FROM vector_entries WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .map_err(|e| DomainError::Write(format!("Failed to delete {id}: {e}")))?;
        tx.execute(
            "INSERT INTO vector_entries (collection, id, vector) VALUES (?1, ?2, ?3)",
            params![collection, id, Self::serialize_vector(vector)],
        )
        .map_err(|e| DomainError::Write(format!("Failed to insert {id}: {e}")))?;
        tx.commit()
            .map_err(|e| DomainError::Write(format!("Failed to commit {id}: {e}")))?;

        debug!(collection, id, replaced = removed > 0, "Upserted vector");
        Ok(())
    }

    fn query_nearest(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
        metric: Metric,
    ) -> Result<NearestNeighbors, DomainError> {
        let conn = self.lock()?;
        let schema = Self::require_schema(&conn, collection)?;
        Self::check_dimension(&schema, vector)?;

        let substituted = metric != schema.metric;
        if substituted {
            warn!(
                collection,
                requested = %metric,
                indexed = %schema.metric,
                "Index cannot search with the requested metric; using the indexed one"
            );
        }
        let used = schema.metric;
        if k == 0 {
            return Ok(NearestNeighbors { hits: vec![], metric: used, substituted });
        }

        let mut stmt = conn
            .prepare("SELECT id, vector FROM vector_entries WHERE collection = ?1")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![collection], |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob))
            })
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, blob) = row.map_err(|e| DomainError::Database(e.to_string()))?;
            let stored = Self::deserialize_vector(&blob);
            if stored.len() != schema.dimension {
                warn!(collection, id = %id, "Skipping stored vector with wrong dimension");
                continue;
            }
            hits.push((id, raw_distance(used, vector, &stored)));
        }

        hits.sort_by(|a, b| {
            let by_value = if used.higher_is_closer() {
                b.1.partial_cmp(&a.1)
            } else {
                a.1.partial_cmp(&b.1)
            };
            by_value.unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
        });
        hits.truncate(k);
        Ok(NearestNeighbors { hits, metric: used, substituted })
    }

    fn count(&self, collection: &str) -> Result<usize, DomainError> {
        let conn = self.lock()?;
        Self::require_schema(&conn, collection)?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM vector_entries WHERE collection = ?1",
                params![collection],
                |r| r.get(0),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(count as usize)
    }

    fn exists(&self, collection: &str) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        Ok(Self::read_schema(&conn, collection)?.is_some())
    }

    fn contains(&self, collection: &str, id: &str) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM vector_entries WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |r| r.get(0),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        Self::require_schema(&conn, collection)?;
        let removed = conn
            .execute(
                "DELETE FROM vector_entries WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .map_err(|e| DomainError::Write(format!("Failed to delete {id}: {e}")))?;
        Ok(removed > 0)
    }

    fn drop_collection(&self, collection: &str) -> Result<(), DomainError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let removed = tx
            .execute("DELETE FROM vector_entries WHERE collection = ?1", params![collection])
            .map_err(|e| DomainError::Database(format!("Failed to clear {collection}: {e}")))?;
        tx.execute("DELETE FROM vector_collections WHERE name = ?1", params![collection])
            .map_err(|e| DomainError::Database(format!("Failed to drop {collection}: {e}")))?;
        tx.commit().map_err(|e| DomainError::Database(e.to_string()))?;
        info!(collection, entries = removed, "Dropped collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteVectorStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::infrastructure::sqlite::migrations::run_migrations(&conn).unwrap();
        SqliteVectorStore::new(conn)
    }

    #[test]
    fn test_raw_distance_per_metric() {
        let a = [1.0_f32, 0.0];
        let b = [0.0_f32, 2.0];
        assert_eq!(raw_distance(Metric::L2, &a, &b), 5.0);
        assert_eq!(raw_distance(Metric::InnerProduct, &a, &b), 0.0);
        assert_eq!(raw_distance(Metric::Cosine, &a, &a), 1.0);
    }

    #[test]
    fn test_upsert_replaces_existing_entry() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 2, Metric::L2)).unwrap();
        s.upsert("c", "hr1", &[1.0, 0.0]).unwrap();
        s.upsert("c", "hr1", &[0.0, 1.0]).unwrap();
        assert_eq!(s.count("c").unwrap(), 1);

        let nn = s.query_nearest("c", &[0.0, 1.0], 5, Metric::L2).unwrap();
        assert_eq!(nn.hits, vec![("hr1".to_string(), 0.0)]);
    }

    #[test]
    fn test_dimension_mismatch_leaves_collection_unchanged() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 3, Metric::L2)).unwrap();
        s.upsert("c", "a", &[1.0, 2.0, 3.0]).unwrap();
        let err = s.upsert("c", "b", &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, DomainError::Schema(_)));
        assert_eq!(s.count("c").unwrap(), 1);
        assert!(!s.contains("c", "b").unwrap());
    }

    #[test]
    fn test_existing_schema_wins() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 2, Metric::InnerProduct)).unwrap();
        let got = s.ensure_collection(&CollectionSchema::new("c", 8, Metric::L2)).unwrap();
        assert_eq!(got.metric, Metric::InnerProduct);
        assert_eq!(got.dimension, 2);
    }

    #[test]
    fn test_query_substitutes_indexed_metric() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 2, Metric::L2)).unwrap();
        s.upsert("c", "near", &[1.0, 0.0]).unwrap();
        s.upsert("c", "far", &[5.0, 5.0]).unwrap();
        let nn = s.query_nearest("c", &[1.0, 0.0], 2, Metric::InnerProduct).unwrap();
        assert!(nn.substituted);
        assert_eq!(nn.metric, Metric::L2);
        assert_eq!(nn.hits[0].0, "near");
    }

    #[test]
    fn test_inner_product_orders_descending() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 2, Metric::InnerProduct)).unwrap();
        s.upsert("c", "low", &[0.1, 0.0]).unwrap();
        s.upsert("c", "high", &[0.9, 0.0]).unwrap();
        let nn = s.query_nearest("c", &[1.0, 0.0], 1, Metric::InnerProduct).unwrap();
        assert_eq!(nn.hits.len(), 1);
        assert_eq!(nn.hits[0].0, "high");
    }

    #[test]
    fn test_missing_collection_is_not_found() {
        let s = store();
        assert!(!s.exists("nope").unwrap());
        assert!(matches!(s.count("nope"), Err(DomainError::NotFound(_))));
        assert!(matches!(
            s.upsert("nope", "x", &[1.0]),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn test_drop_removes_entries() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 1, Metric::L2)).unwrap();
        s.upsert("c", "a", &[1.0]).unwrap();
        s.drop_collection("c").unwrap();
        assert!(!s.exists("c").unwrap());
        s.ensure_collection(&CollectionSchema::new("c", 1, Metric::L2)).unwrap();
        assert_eq!(s.count("c").unwrap(), 0);
    }

    #[test]
    fn test_delete_entry() {
        let s = store();
        s.ensure_collection(&CollectionSchema::new("c", 1, Metric::L2)).unwrap();
        s.upsert("c", "a", &[1.0]).unwrap();
        assert!(s.delete("c", "a").unwrap());
        assert!(!s.delete("c", "a").unwrap());
    }
}
