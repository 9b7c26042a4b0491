pub mod classifiers;
pub mod embeddings;
pub mod sqlite;
