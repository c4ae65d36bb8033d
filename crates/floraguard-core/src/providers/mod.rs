//! Model backends that turn a plant photo into a diagnosis text.

pub mod gemini;
pub mod shared;

use std::future::Future;

use anyhow::Result;

pub use gemini::{GeminiClient, GeminiConfig};
pub use shared::{ProviderError, ProviderErrorKind, ProviderResult};

use crate::locale::Language;

/// Anything that can look at a plant photo and answer in markdown.
///
/// The pipeline only depends on this trait, so tests can substitute a
/// canned responder for the network client.
pub trait DiagnosisModel {
    /// Sends the image with the diagnosis prompt for `language` and returns
    /// the model's raw text answer.
    fn diagnose(
        &self,
        image: &[u8],
        mime_type: &str,
        language: Language,
    ) -> impl Future<Output = Result<String>> + Send;
}
