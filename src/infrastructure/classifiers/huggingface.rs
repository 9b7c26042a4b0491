use crate::domain::error::DomainError;
use crate::domain::ports::zero_shot::ZeroShotScorer;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ZERO_SHOT_MODEL: &str = "facebook/bart-large-mnli";

/// Zero-shot scorer backed by a Hugging Face inference endpoint running an
/// NLI model in multi-label mode.
pub struct HuggingFaceScorer {
    client: Client,
    token: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

#[derive(Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

impl HuggingFaceScorer {
    pub fn new(token: Option<String>, model: Option<String>, base_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            token,
            model: model.unwrap_or_else(|| DEFAULT_ZERO_SHOT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api-inference.huggingface.co".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ZeroShotScorer for HuggingFaceScorer {
    async fn score(&self, text: &str, candidate_labels: &[String]) -> Result<Vec<(String, f64)>, DomainError> {
        let url = format!("{}/models/{}", self.base_url.trim_end_matches('/'), self.model);
        let mut req = self.client.post(&url).json(&ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels,
                multi_label: true,
            },
        });
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DomainError::Connection(format!("Zero-shot endpoint error: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Classification(format!("Zero-shot endpoint {status}: {body}")));
        }

        let result: ZeroShotResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(format!("Parse error: {e}")))?;
        if result.labels.len() != result.scores.len() {
            return Err(DomainError::Classification(format!(
                "endpoint returned {} labels but {} scores",
                result.labels.len(),
                result.scores.len()
            )));
        }
        Ok(result.labels.into_iter().zip(result.scores).collect())
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
