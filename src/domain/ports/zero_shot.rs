use crate::domain::error::DomainError;

/// External zero-shot model. Multi-label: each candidate is scored
/// independently and the scores need not sum to 1.
#[async_trait::async_trait]
pub trait ZeroShotScorer: Send + Sync {
    async fn score(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<Vec<(String, f64)>, DomainError>;

    fn name(&self) -> &str;
}
