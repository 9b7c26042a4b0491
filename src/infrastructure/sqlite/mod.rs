pub mod bill_repo;
pub mod migrations;
pub mod vector_store;
