use crate::domain::entities::collection::CollectionSchema;
use crate::domain::error::DomainError;
use crate::domain::values::metric::Metric;

/// Raw nearest-neighbour hits plus the metric the index actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestNeighbors {
    pub hits: Vec<(String, f64)>,
    pub metric: Metric,
    /// The caller asked for a different metric and the indexed one was used instead.
    pub substituted: bool,
}

/// A set of named collections of `(id, vector)` entries, one metric and index each.
pub trait VectorStore: Send + Sync {
    /// Returns the schema actually in effect: an existing collection wins over `schema`.
    fn ensure_collection(&self, schema: &CollectionSchema) -> Result<CollectionSchema, DomainError>;
    fn describe(&self, collection: &str) -> Result<Option<CollectionSchema>, DomainError>;
    /// Replace any entry for `id` with `vector`, visible to reads on return.
    fn upsert(&self, collection: &str, id: &str, vector: &[f32]) -> Result<(), DomainError>;
    fn query_nearest(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
        metric: Metric,
    ) -> Result<NearestNeighbors, DomainError>;
    fn count(&self, collection: &str) -> Result<usize, DomainError>;
    fn exists(&self, collection: &str) -> Result<bool, DomainError>;
    fn contains(&self, collection: &str, id: &str) -> Result<bool, DomainError>;
    fn delete(&self, collection: &str, id: &str) -> Result<bool, DomainError>;
    fn drop_collection(&self, collection: &str) -> Result<(), DomainError>;
}
