use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy)]
pub enum InputType {
    Document,
    Query,
}

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Vector dimension this provider produces; 0 when unknown.
    fn dimension(&self) -> usize;

    fn name(&self) -> &str;

    async fn embed_one(&self, text: &str, input_type: InputType) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed(&[text.to_string()], input_type).await?;
        match vectors.pop() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(DomainError::Embedding(format!(
                "{} returned no embedding",
                self.name()
            ))),
        }
    }
}
