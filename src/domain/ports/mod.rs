pub mod bill_repository;
pub mod embedding_port;
pub mod vector_store;
pub mod zero_shot;
