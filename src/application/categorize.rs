use crate::application::classify::AdaptiveClassifier;
use crate::application::pagination::{fetch_all, DEFAULT_PAGE_SIZE};
use crate::domain::entities::bill::BillDocument;
use crate::domain::error::DomainError;
use crate::domain::ports::bill_repository::BillRepository;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct CategorizedBill {
    pub id: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorizeReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Bills classified successfully but with no label above the threshold.
    pub uncategorized: usize,
    pub bills: Vec<CategorizedBill>,
}

/// Which bills a categorize run covers.
#[derive(Debug, Clone, Copy)]
pub enum Selection {
    /// Every bill from `offset` on, paged.
    All { offset: usize },
    /// A single page.
    Page { limit: usize, offset: usize },
}

/// Classifies stored bills and writes the labels back to the repository.
pub struct CategorizeUseCase {
    repo: Arc<dyn BillRepository>,
    classifier: Arc<AdaptiveClassifier>,
    labels: Vec<String>,
    page_size: usize,
}

impl CategorizeUseCase {
    pub fn new(repo: Arc<dyn BillRepository>, classifier: Arc<AdaptiveClassifier>, labels: Vec<String>) -> Self {
        Self {
            repo,
            classifier,
            labels,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn execute(&self, threshold_std: f64, selection: Selection) -> Result<CategorizeReport, DomainError> {
        let bills = match selection {
            Selection::All { offset } => fetch_all(self.repo.as_ref(), self.page_size, offset)?,
            Selection::Page { limit, offset } => self.repo.fetch_page(limit, offset)?,
        };

        let mut report = CategorizeReport {
            total: bills.len(),
            ..CategorizeReport::default()
        };
        for bill in &bills {
            match self.categorize_one(bill, threshold_std).await {
                Ok(categories) => {
                    report.succeeded += 1;
                    if categories.is_empty() {
                        report.uncategorized += 1;
                    }
                    report.bills.push(CategorizedBill {
                        id: bill.id.clone(),
                        categories,
                    });
                }
                Err(e) => {
                    warn!(id = %bill.id, error = %e, "Failed to categorize bill");
                    report.failed += 1;
                }
            }
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            uncategorized = report.uncategorized,
            "Categorization complete"
        );
        Ok(report)
    }

    async fn categorize_one(&self, bill: &BillDocument, threshold_std: f64) -> Result<Vec<String>, DomainError> {
        let text = bill.classification_text();
        let classification = self.classifier.classify(&text, &self.labels, threshold_std).await?;
        for l in &classification.labels {
            debug!(id = %bill.id, label = %l.label, score = l.score, "Label kept");
        }
        let categories = classification.label_names();
        self.repo.update_categories(&bill.id, &categories)?;
        Ok(categories)
    }
}
