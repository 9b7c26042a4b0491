use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bill as held by the metadata store. `id` is the stable key shared
/// with the vector collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillDocument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub summary_key: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Which field an embedding text was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    FullText,
    Summary,
    TitleAndKey,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl BillDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_full_text(mut self, text: impl Into<String>) -> Self {
        self.full_text = Some(text.into());
        self
    }

    pub fn with_summary(mut self, text: impl Into<String>) -> Self {
        self.summary_text = Some(text.into());
        self
    }

    pub fn with_summary_key(mut self, key: impl Into<String>) -> Self {
        self.summary_key = Some(key.into());
        self
    }

    fn title_and(&self, rest: Option<&str>) -> String {
        match rest {
            Some(r) => format!("{} {}", self.title.trim(), r).trim().to_string(),
            None => self.title.trim().to_string(),
        }
    }

    /// Text to embed: full text, else title + summary, else title + summary key.
    /// `None` when every candidate is blank.
    pub fn embedding_text(&self) -> Option<(String, TextSource)> {
        if let Some(full) = non_empty(&self.full_text) {
            return Some((full.to_string(), TextSource::FullText));
        }
        if let Some(summary) = non_empty(&self.summary_text) {
            return Some((self.title_and(Some(summary)), TextSource::Summary));
        }
        let fallback = self.title_and(non_empty(&self.summary_key));
        if fallback.is_empty() {
            None
        } else {
            Some((fallback, TextSource::TitleAndKey))
        }
    }

    /// Text handed to the zero-shot classifier. Full text is deliberately
    /// skipped: the summary carries the topic with far fewer tokens.
    pub fn classification_text(&self) -> String {
        match non_empty(&self.summary_text) {
            Some(summary) => self.title_and(Some(summary)),
            None => self.title_and(non_empty(&self.summary_key)),
        }
    }
}
