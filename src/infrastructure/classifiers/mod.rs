pub mod huggingface;
pub mod noop;
