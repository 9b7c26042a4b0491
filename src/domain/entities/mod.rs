pub mod bill;
pub mod classification;
pub mod collection;
pub mod search_result;
