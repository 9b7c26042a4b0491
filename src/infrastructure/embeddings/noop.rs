use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};

/// Stand-in when no embedding backend is configured. Every call fails, so
/// ingestion counts the documents as failed instead of storing empty vectors.
pub struct NoopProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, _texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        Err(DomainError::Embedding("no embedding provider configured".into()))
    }

    fn dimension(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "noop"
    }
}
