pub mod category;
pub mod metric;
pub mod similarity;
