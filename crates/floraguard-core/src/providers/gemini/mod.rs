//! Gemini provider (Generative Language API).

pub mod api;

pub use api::{DEFAULT_BASE_URL, GeminiClient, GeminiConfig};
