//! Persistent diagnosis history.
//!
//! History lives in `$FLORAGUARD_HOME/history.json` as a JSON array, newest
//! entry first. The file has a size cap; when a save would exceed it, the
//! oldest entries are dropped until it fits.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnosis::{DiagnosisRecord, ParseOutcome};
use crate::locale::{Language, NoDiagnosisReason};

/// Parser classification as stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOutcome {
    Structured,
    Healthy,
    UnclearPhoto,
    Unparseable,
}

impl From<&ParseOutcome> for HistoryOutcome {
    fn from(outcome: &ParseOutcome) -> Self {
        match outcome {
            ParseOutcome::Structured(_) => HistoryOutcome::Structured,
            ParseOutcome::NoRecord {
                reason: NoDiagnosisReason::Healthy,
            } => HistoryOutcome::Healthy,
            ParseOutcome::NoRecord {
                reason: NoDiagnosisReason::UnclearPhoto,
            } => HistoryOutcome::UnclearPhoto,
            ParseOutcome::Unparseable => HistoryOutcome::Unparseable,
        }
    }
}

/// One past diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Creation time in Unix milliseconds.
    pub id: i64,
    /// Thumbnail as a data URL.
    pub image: String,
    #[serde(default)]
    pub language: Language,
    pub outcome: HistoryOutcome,
    pub diagnosis: Option<DiagnosisRecord>,
    /// Model text, kept whenever there is no structured record.
    pub raw_response: Option<String>,
    /// RFC 3339 creation time.
    pub timestamp: String,
}

impl HistoryItem {
    pub fn new(
        outcome: &ParseOutcome,
        raw_response: &str,
        image: String,
        language: Language,
        created_at: DateTime<Utc>,
    ) -> Self {
        let diagnosis = outcome.record().cloned();
        Self {
            id: created_at.timestamp_millis(),
            image,
            language,
            outcome: HistoryOutcome::from(outcome),
            raw_response: diagnosis.is_none().then(|| raw_response.to_string()),
            diagnosis,
            timestamp: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Rebuilds the parse outcome this entry was recorded with.
    pub fn parse_outcome(&self) -> ParseOutcome {
        match (self.outcome, &self.diagnosis) {
            (HistoryOutcome::Structured, Some(record)) => ParseOutcome::Structured(record.clone()),
            (HistoryOutcome::Healthy, _) => ParseOutcome::NoRecord {
                reason: NoDiagnosisReason::Healthy,
            },
            (HistoryOutcome::UnclearPhoto, _) => ParseOutcome::NoRecord {
                reason: NoDiagnosisReason::UnclearPhoto,
            },
            _ => ParseOutcome::Unparseable,
        }
    }

    /// Title shown in history listings: the disease name, else the raw
    /// response, else the localized "Diagnosis" label.
    pub fn display_name(&self, language: Language) -> &str {
        self.diagnosis
            .as_ref()
            .map(|d| d.disease_name.as_str())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.raw_response
                    .as_deref()
                    .map(str::trim)
                    .filter(|raw| !raw.is_empty())
            })
            .unwrap_or(language.table().ui.diagnosis)
    }
}

/// History entries backed by a JSON file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    max_bytes: u64,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    /// Loads history from `path`.
    ///
    /// A missing file is an empty history. A file that does not parse is
    /// logged and treated as empty; the next save overwrites it.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path, max_bytes: u64) -> Result<Self> {
        let items = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse history; starting empty");
                Vec::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read history from {}", path.display()));
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            items,
        })
    }

    /// Entries, newest first.
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Prepends `item` and saves.
    ///
    /// If another entry already has the same id (two diagnoses within one
    /// millisecond), the new id is bumped past the newest existing one.
    /// Returns the id the item was stored under, or `None` when the item
    /// alone exceeds the size limit and was pruned.
    ///
    /// # Errors
    /// Returns an error if the history cannot be written.
    pub fn push(&mut self, mut item: HistoryItem) -> Result<Option<i64>> {
        if self.get(item.id).is_some() {
            let newest = self.items.iter().map(|i| i.id).max().unwrap_or(item.id);
            item.id = newest + 1;
        }
        let id = item.id;
        self.items.insert(0, item);
        self.save()?;
        Ok(self.get(id).map(|_| id))
    }

    /// Removes every entry and the backing file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be removed.
    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.save().map(|_| ())
    }

    /// Writes the history, pruning the oldest entries until the serialized
    /// size fits `max_bytes`. An empty history removes the file.
    ///
    /// Returns how many entries were pruned.
    ///
    /// # Errors
    /// Returns an error if serialization or file I/O fails.
    pub fn save(&mut self) -> Result<usize> {
        let mut pruned = 0;
        loop {
            if self.items.is_empty() {
                self.remove_file()?;
                return Ok(pruned);
            }

            let json =
                serde_json::to_string(&self.items).context("Failed to serialize history")?;
            if json.len() as u64 <= self.max_bytes {
                self.write_file(&json)?;
                return Ok(pruned);
            }

            tracing::warn!(
                size = json.len(),
                max_bytes = self.max_bytes,
                "History exceeds size limit; pruning oldest entry"
            );
            self.items.pop();
            pruned += 1;
        }
    }

    fn remove_file(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e)
                .with_context(|| format!("Failed to remove history {}", self.path.display())),
            _ => Ok(()),
        }
    }

    fn write_file(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write history to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;
    use crate::diagnosis::parse_diagnosis;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    fn item(ms: i64, text: &str) -> HistoryItem {
        HistoryItem::new(
            &parse_diagnosis(text),
            text,
            "data:image/jpeg;base64,AAAA".to_string(),
            Language::En,
            at(ms),
        )
    }

    const STRUCTURED: &str = "## **Status: Likely Disease**\n**Disease Name:** Leaf Spot";

    #[test]
    fn test_new_item_keeps_raw_only_without_record() {
        let structured = item(1_700_000_000_000, STRUCTURED);
        assert_eq!(structured.outcome, HistoryOutcome::Structured);
        assert!(structured.raw_response.is_none());
        assert_eq!(structured.diagnosis.as_ref().unwrap().disease_name, "Leaf Spot");
        assert_eq!(structured.timestamp, "2023-11-14T22:13:20.000Z");

        let healthy = item(1, "Great news! This plant looks healthy");
        assert_eq!(healthy.outcome, HistoryOutcome::Healthy);
        assert!(healthy.diagnosis.is_none());
        assert_eq!(
            healthy.raw_response.as_deref(),
            Some("Great news! This plant looks healthy")
        );
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let json = serde_json::to_value(item(5, "no idea")).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["rawResponse"], "no idea");
        assert_eq!(json["outcome"], "unparseable");
        assert_eq!(json["language"], "en");
        assert!(json["diagnosis"].is_null());
    }

    #[test]
    fn test_parse_outcome_round_trips_through_item() {
        for text in [STRUCTURED, "Please upload a clear photo of a plant leaf.", "??"] {
            let entry = item(1, text);
            assert_eq!(entry.parse_outcome(), parse_diagnosis(text));
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(item(1, STRUCTURED).display_name(Language::En), "Leaf Spot");
        assert_eq!(item(1, "  free text  ").display_name(Language::En), "free text");

        let mut blank = item(1, "");
        blank.raw_response = None;
        assert_eq!(blank.display_name(Language::En), "Diagnosis");
        assert_eq!(blank.display_name(Language::Si), "රෝග විනිශ්චය");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::load(&dir.path().join("history.json"), 1024).unwrap();
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        let store = HistoryStore::load(&path, 1024).unwrap();
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_push_prepends_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(&path, 1_000_000).unwrap();
        store.push(item(1, "first")).unwrap();
        store.push(item(2, STRUCTURED)).unwrap();

        let reloaded = HistoryStore::load(&path, 1_000_000).unwrap();
        let ids: Vec<i64> = reloaded.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(reloaded.get(2).unwrap().outcome, HistoryOutcome::Structured);
        assert!(reloaded.get(3).is_none());
    }

    #[test]
    fn test_push_bumps_duplicate_id() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::load(&dir.path().join("history.json"), 1_000_000).unwrap();
        store.push(item(10, "a")).unwrap();
        let id = store.push(item(10, "b")).unwrap();
        assert_eq!(id, Some(11));
        assert_eq!(store.items()[0].id, 11);
    }

    #[test]
    fn test_save_prunes_oldest_until_it_fits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let one = serde_json::to_string(&vec![item(1, "x")]).unwrap().len() as u64;
        // Room for two entries but not three.
        let mut store = HistoryStore::load(&path, one * 2 + 10).unwrap();
        store.push(item(1, "x")).unwrap();
        store.push(item(2, "x")).unwrap();
        assert_eq!(store.push(item(3, "x")).unwrap(), Some(3));

        let ids: Vec<i64> = store.items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert!(fs::metadata(&path).unwrap().len() <= one * 2 + 10);
    }

    #[test]
    fn test_entry_larger_than_limit_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[]").unwrap();

        let mut store = HistoryStore::load(&path, 10).unwrap();
        assert_eq!(store.push(item(1, "x")).unwrap(), None);

        assert!(store.items().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::load(&path, 1_000_000).unwrap();
        store.push(item(1, "x")).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(HistoryStore::load(&path, 1_000_000).unwrap().items().is_empty());
    }
}
