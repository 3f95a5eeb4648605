#![forbid(unsafe_code)]

pub mod backend;
pub mod http;
pub mod mapping;
pub mod wire;

pub use backend::{BackendError, InMemoryBackend, QuizBackend, VocabularyEntry};
pub use http::{HttpBackend, HttpConfig};
