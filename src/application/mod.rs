pub mod categorize;
pub mod classify;
pub mod ingest;
pub mod pagination;
pub mod search;
