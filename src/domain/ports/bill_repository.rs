use crate::domain::entities::bill::BillDocument;
use crate::domain::error::DomainError;

/// Paged source of documents to ingest. A page shorter than `limit` means
/// the end of the data.
pub trait DocumentSource: Send + Sync {
    fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<BillDocument>, DomainError>;
}

/// Relational metadata store for bills.
pub trait BillRepository: DocumentSource {
    fn upsert_bill(&self, bill: &BillDocument) -> Result<(), DomainError>;
    fn get(&self, id: &str) -> Result<Option<BillDocument>, DomainError>;
    fn count(&self) -> Result<usize, DomainError>;
    fn update_categories(&self, id: &str, categories: &[String]) -> Result<(), DomainError>;
}
