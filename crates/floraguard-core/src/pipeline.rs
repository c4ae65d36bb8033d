//! One diagnosis, end to end: model call, parse, thumbnail, history entry.

use anyhow::Result;
use chrono::Utc;

use crate::config::ThumbnailConfig;
use crate::diagnosis::{ParseOutcome, parse_diagnosis};
use crate::history::HistoryItem;
use crate::images::{SourceImage, create_thumbnail};
use crate::locale::Language;
use crate::providers::DiagnosisModel;

/// Everything produced by one diagnosis run.
#[derive(Debug, Clone)]
pub struct DiagnosisRun {
    pub outcome: ParseOutcome,
    /// The model's unmodified answer.
    pub raw_response: String,
    /// Entry ready to be pushed to history.
    pub history_item: HistoryItem,
}

/// Asks `model` about `image` and classifies the answer.
///
/// A thumbnail that fails to build does not fail the run; the history entry
/// simply has no image.
///
/// # Errors
/// Returns the model's error if the request fails.
pub async fn diagnose_image<M: DiagnosisModel>(
    model: &M,
    image: &SourceImage,
    language: Language,
    thumbnail: &ThumbnailConfig,
) -> Result<DiagnosisRun> {
    let raw_response = model
        .diagnose(&image.bytes, image.mime_type, language)
        .await?;
    let outcome = parse_diagnosis(&raw_response);

    let thumbnail = create_thumbnail(&image.bytes, thumbnail).unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{e:#}"), "Failed to create thumbnail");
        String::new()
    });

    let history_item = HistoryItem::new(&outcome, &raw_response, thumbnail, language, Utc::now());

    Ok(DiagnosisRun {
        outcome,
        raw_response,
        history_item,
    })
}
