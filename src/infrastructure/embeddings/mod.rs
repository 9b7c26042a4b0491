pub mod hashing;
pub mod noop;
pub mod openai;
pub mod voyage;
