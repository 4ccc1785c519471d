//! Chat backends.

pub mod openai;

pub use openai::OpenAIProvider;
