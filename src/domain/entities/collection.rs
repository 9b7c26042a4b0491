use crate::domain::error::DomainError;
use crate::domain::values::metric::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest vector dimension a collection accepts.
pub const MAX_DIMENSION: usize = 32_768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexKind {
    Flat,
    IvfFlat,
    Hnsw,
}

impl IndexKind {
    /// Build parameters recorded alongside the index kind.
    pub fn default_params(self) -> serde_json::Value {
        match self {
            IndexKind::Flat => serde_json::json!({}),
            IndexKind::IvfFlat => serde_json::json!({ "nlist": 128 }),
            IndexKind::Hnsw => serde_json::json!({ "M": 16, "efConstruction": 200 }),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Flat => write!(f, "FLAT"),
            IndexKind::IvfFlat => write!(f, "IVF_FLAT"),
            IndexKind::Hnsw => write!(f, "HNSW"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FLAT" => Ok(IndexKind::Flat),
            "IVF_FLAT" => Ok(IndexKind::IvfFlat),
            "HNSW" => Ok(IndexKind::Hnsw),
            _ => Err(format!("Unknown index kind: {s}")),
        }
    }
}

/// Definition of a vector collection. Metric and dimension are fixed once
/// the collection exists; changing them means drop and recreate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub primary_key_field: String,
    pub vector_field: String,
    pub dimension: usize,
    pub metric: Metric,
    pub index_kind: IndexKind,
    pub index_params: serde_json::Value,
}

impl CollectionSchema {
    /// Bill-embedding layout: `bill_id` key, `embedding` vector, IVF_FLAT with nlist 128.
    pub fn new(name: impl Into<String>, dimension: usize, metric: Metric) -> Self {
        Self {
            name: name.into(),
            primary_key_field: "bill_id".into(),
            vector_field: "embedding".into(),
            dimension,
            metric,
            index_kind: IndexKind::IvfFlat,
            index_params: IndexKind::IvfFlat.default_params(),
        }
    }

    pub fn with_index(mut self, kind: IndexKind) -> Self {
        self.index_kind = kind;
        self.index_params = kind.default_params();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Schema("collection name must not be empty".into()));
        }
        if self.dimension == 0 || self.dimension > MAX_DIMENSION {
            return Err(DomainError::Schema(format!(
                "dimension {} outside 1..={MAX_DIMENSION}",
                self.dimension
            )));
        }
        if self.primary_key_field == self.vector_field {
            return Err(DomainError::Schema(
                "primary key and vector field must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Schema plus live entry count, as reported by `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub schema: CollectionSchema,
    pub entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let schema = CollectionSchema::new("bills", 0, Metric::L2);
        assert!(matches!(schema.validate(), Err(DomainError::Schema(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_dimension() {
        let schema = CollectionSchema::new("bills", MAX_DIMENSION + 1, Metric::L2);
        assert!(matches!(schema.validate(), Err(DomainError::Schema(_))));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let schema = CollectionSchema::new("  ", 768, Metric::L2);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_default_layout() {
        let schema = CollectionSchema::new("bill_embeddings", 768, Metric::L2);
        assert!(schema.validate().is_ok());
        assert_eq!(schema.index_kind, IndexKind::IvfFlat);
        assert_eq!(schema.index_params["nlist"], 128);
    }

    #[test]
    fn test_with_index_replaces_params() {
        let schema = CollectionSchema::new("bills", 768, Metric::Cosine).with_index(IndexKind::Hnsw);
        assert_eq!(schema.index_kind, IndexKind::Hnsw);
        assert_eq!(schema.index_params["M"], 16);
        assert!(schema.index_params.get("nlist").is_none());

        let flat = schema.with_index("flat".parse().unwrap());
        assert_eq!(flat.index_kind, IndexKind::Flat);
        assert_eq!(flat.index_params, serde_json::json!({}));
    }
}
