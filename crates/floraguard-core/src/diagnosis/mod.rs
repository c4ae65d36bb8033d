//! Parser turning a model's markdown answer into a structured diagnosis.
//!
//! The model is asked for a fixed layout, but nothing guarantees it keeps
//! to it. Every field is therefore optional except the two needed for the
//! result header (`status` and `disease_name`); without them the response is
//! [`ParseOutcome::Unparseable`] and callers show the raw text instead.
//!
//! Example of a response that parses:
//! ```text
//! ## 🌿 **Status: Likely Disease Detected**
//! **Disease Name:** Early Blight
//! **Confidence:** High
//!
//! ### 👀 What I Saw
//! Brown concentric rings on the lower leaves.
//! ```

mod patterns;

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use self::patterns::{FieldMatcher, alternation};
use crate::locale::{self, FieldLabels, LocaleTable, NoDiagnosisReason, Sentinel};

/// Structured diagnosis extracted from a model response.
///
/// Section fields hold raw markdown, passed through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub status: String,
    pub disease_name: String,
    pub confidence: String,
    #[serde(rename = "whatISaw")]
    pub what_i_saw: String,
    pub how_to_fix_it_organic: String,
    pub prevention: String,
    #[serde(default)]
    pub detailed_care_tips: String,
}

/// Result of parsing one response. Parsing never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ParseOutcome {
    /// A "no diagnosis needed" phrase was present (healthy plant, bad photo).
    NoRecord { reason: NoDiagnosisReason },
    /// Both required fields were found.
    Structured(DiagnosisRecord),
    /// Required fields were missing; show the raw text.
    Unparseable,
}

impl ParseOutcome {
    pub fn record(&self) -> Option<&DiagnosisRecord> {
        match self {
            ParseOutcome::Structured(record) => Some(record),
            _ => None,
        }
    }
}

/// Compiled sentinel list and field patterns for a set of locale tables.
#[derive(Debug)]
pub struct DiagnosisParser {
    sentinels: Vec<Sentinel>,
    status: FieldMatcher,
    disease_name: FieldMatcher,
    confidence: FieldMatcher,
    what_i_saw: FieldMatcher,
    how_to_fix_it_organic: FieldMatcher,
    prevention: FieldMatcher,
    detailed_care_tips: FieldMatcher,
}

static DEFAULT_PARSER: LazyLock<DiagnosisParser> = LazyLock::new(|| {
    DiagnosisParser::new(&locale::tables()).expect("built-in locale labels compile to regexes")
});

/// Parses with the built-in tables for every supported language.
pub fn parse_diagnosis(text: &str) -> ParseOutcome {
    DEFAULT_PARSER.parse(text)
}

impl DiagnosisParser {
    /// Builds a parser accepting the sentinels and labels of all `tables`.
    ///
    /// # Errors
    /// Returns an error if a generated pattern fails to compile.
    pub fn new(tables: &[&LocaleTable]) -> Result<Self, regex::Error> {
        let labels = |field: fn(&FieldLabels) -> &'static str| {
            alternation(tables.iter().map(|t| field(&t.labels)))
        };

        Ok(Self {
            sentinels: tables
                .iter()
                .flat_map(|t| t.sentinels.iter().copied())
                .collect(),
            status: FieldMatcher::status(&labels(|l| l.status))?,
            disease_name: FieldMatcher::labelled_line(&labels(|l| l.disease_name))?,
            confidence: FieldMatcher::labelled_line(&labels(|l| l.confidence))?,
            what_i_saw: FieldMatcher::section(&labels(|l| l.what_i_saw))?,
            how_to_fix_it_organic: FieldMatcher::section(&labels(|l| l.how_to_fix_it_organic))?,
            prevention: FieldMatcher::section(&labels(|l| l.prevention))?,
            detailed_care_tips: FieldMatcher::section(&labels(|l| l.detailed_care_tips))?,
        })
    }

    /// Classifies `text` as no-record, structured, or unparseable.
    pub fn parse(&self, text: &str) -> ParseOutcome {
        if let Some(sentinel) = self.sentinels.iter().find(|s| text.contains(s.phrase)) {
            return ParseOutcome::NoRecord {
                reason: sentinel.reason,
            };
        }

        let record = DiagnosisRecord {
            status: self.status.extract(text),
            disease_name: self.disease_name.extract(text),
            confidence: self.confidence.extract(text),
            what_i_saw: self.what_i_saw.extract(text),
            how_to_fix_it_organic: self.how_to_fix_it_organic.extract(text),
            prevention: self.prevention.extract(text),
            detailed_care_tips: self.detailed_care_tips.extract(text),
        };

        if record.status.is_empty() || record.disease_name.is_empty() {
            tracing::warn!(
                has_status = !record.status.is_empty(),
                has_disease_name = !record.disease_name.is_empty(),
                response_len = text.len(),
                "Could not parse diagnosis from the model's response; displaying raw response"
            );
            tracing::debug!(response = text, "unparseable response");
            return ParseOutcome::Unparseable;
        }

        ParseOutcome::Structured(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Language;

    const FULL_EN: &str = "\
## 🌿 **Status: Likely Disease**
**Disease Name:** Leaf Blight
**Confidence:** High

### 👀 What I Saw
Brown lesions with yellow halos. They cluster near the leaf margins.

### 🌱 How to Fix It (Organic)
1. Remove infected leaves.
2. Spray **neem oil** weekly.

### 🛡️ Prevention Tips
- Water at the base
- Improve airflow

### 🪴 Detailed Plant Care
Keep in bright, indirect light.
";

    #[test]
    fn test_full_english_response_is_structured() {
        let ParseOutcome::Structured(record) = parse_diagnosis(FULL_EN) else {
            panic!("expected structured record");
        };
        assert_eq!(record.status, "Likely Disease");
        assert_eq!(record.disease_name, "Leaf Blight");
        assert_eq!(record.confidence, "High");
        assert_eq!(
            record.what_i_saw,
            "Brown lesions with yellow halos. They cluster near the leaf margins."
        );
        assert_eq!(
            record.how_to_fix_it_organic,
            "1. Remove infected leaves.\n2. Spray **neem oil** weekly."
        );
        assert_eq!(record.prevention, "- Water at the base\n- Improve airflow");
        assert_eq!(record.detailed_care_tips, "Keep in bright, indirect light.");
    }

    #[test]
    fn test_values_are_trimmed() {
        let text = "## **Status:    Pest Damage   **\n**Disease Name:**   Aphids   \n";
        let record = parse_diagnosis(text).record().cloned().unwrap();
        assert_eq!(record.status, "Pest Damage");
        assert_eq!(record.disease_name, "Aphids");
        assert_eq!(record.confidence, "");
    }

    #[test]
    fn test_care_tips_are_optional() {
        let text = "## **Status: Likely Disease**\n**Disease Name:** Rust\n### What I Saw\nOrange pustules.";
        let record = parse_diagnosis(text).record().cloned().unwrap();
        assert_eq!(record.what_i_saw, "Orange pustules.");
        assert!(record.detailed_care_tips.is_empty());
    }

    #[test]
    fn test_status_label_is_case_insensitive() {
        let text = "## **STATUS: Likely Disease**\n**disease name:** Mildew";
        let record = parse_diagnosis(text).record().cloned().unwrap();
        assert_eq!(record.status, "Likely Disease");
        assert_eq!(record.disease_name, "Mildew");
    }

    #[test]
    fn test_unbolded_labels_fall_back() {
        let text = "## **Status: Likely Disease**\nDisease Name: Powdery Mildew\nConfidence: Medium";
        let record = parse_diagnosis(text).record().cloned().unwrap();
        assert_eq!(record.disease_name, "Powdery Mildew");
        assert_eq!(record.confidence, "Medium");
    }

    #[test]
    fn test_sinhala_response_is_structured() {
        let text = "\
## **තත්ත්වය: රෝගයක් හඳුනාගෙන ඇත**
**රෝගයේ නම:** කොළ අංගමාරය
**විශ්වාසය:** ඉහළ

### මා දුටු දේ
කොළ මත දුඹුරු ලප.

### ප්‍රතිකාර ක්‍රම (කාබනික)
- කොහොඹ තෙල් ඉසින්න.
";
        let record = parse_diagnosis(text).record().cloned().unwrap();
        assert_eq!(record.status, "රෝගයක් හඳුනාගෙන ඇත");
        assert_eq!(record.disease_name, "කොළ අංගමාරය");
        assert_eq!(record.confidence, "ඉහළ");
        assert_eq!(record.what_i_saw, "කොළ මත දුඹුරු ලප.");
        assert_eq!(record.how_to_fix_it_organic, "- කොහොඹ තෙල් ඉසින්න.");
    }

    #[test]
    fn test_healthy_sentinel_alone_is_no_record() {
        let outcome = parse_diagnosis("Great news! This plant looks healthy");
        assert_eq!(
            outcome,
            ParseOutcome::NoRecord {
                reason: NoDiagnosisReason::Healthy
            }
        );
    }

    #[test]
    fn test_sentinel_wins_over_structured_content() {
        let text = format!("{FULL_EN}\nPlease upload a clear photo of a plant leaf.");
        assert_eq!(
            parse_diagnosis(&text),
            ParseOutcome::NoRecord {
                reason: NoDiagnosisReason::UnclearPhoto
            }
        );
    }

    #[test]
    fn test_every_sentinel_in_every_language_short_circuits() {
        for lang in Language::all() {
            for sentinel in lang.table().sentinels {
                let text = format!("Some preamble.\n\n{} Thanks!", sentinel.phrase);
                assert_eq!(
                    parse_diagnosis(&text),
                    ParseOutcome::NoRecord {
                        reason: sentinel.reason
                    },
                    "sentinel for {lang} not detected"
                );
            }
        }
    }

    #[test]
    fn test_sentinel_match_is_case_sensitive() {
        let outcome = parse_diagnosis("great news! this plant looks healthy");
        assert_eq!(outcome, ParseOutcome::Unparseable);
    }

    #[test]
    fn test_disease_name_on_line_below_label_is_structured() {
        let text = "## **Status: Likely Disease**\n**Disease Name:**\nLeaf Blight\n**Confidence:** High";
        let record = parse_diagnosis(text).record().cloned().unwrap();
        assert_eq!(record.disease_name, "Leaf Blight");
        assert_eq!(record.confidence, "High");
    }

    #[test]
    fn test_missing_status_is_unparseable() {
        let text = "**Disease Name:** Leaf Blight\n**Confidence:** High\n### What I Saw\nSpots.";
        assert_eq!(parse_diagnosis(text), ParseOutcome::Unparseable);
    }

    #[test]
    fn test_missing_disease_name_is_unparseable() {
        let text = "## **Status: Likely Disease**\n### What I Saw\nSpots everywhere.";
        assert_eq!(parse_diagnosis(text), ParseOutcome::Unparseable);
    }

    #[test]
    fn test_free_text_is_unparseable() {
        assert_eq!(
            parse_diagnosis("I am not sure what this is."),
            ParseOutcome::Unparseable
        );
        assert_eq!(parse_diagnosis(""), ParseOutcome::Unparseable);
    }

    #[test]
    fn test_parse_is_idempotent() {
        for text in [FULL_EN, "nothing useful", "Great news! This plant looks healthy"] {
            assert_eq!(parse_diagnosis(text), parse_diagnosis(text));
        }
    }

    #[test]
    fn test_parser_limited_to_one_table_ignores_other_labels() {
        let parser = DiagnosisParser::new(&[Language::En.table()]).unwrap();
        let text = "## **තත්ත්වය: x**\n**රෝගයේ නම:** y";
        assert_eq!(parser.parse(text), ParseOutcome::Unparseable);
    }

    #[test]
    fn test_outcome_serializes_with_outcome_tag() {
        let json = serde_json::to_value(parse_diagnosis(
            "## **Status: Likely Disease**\n**Disease Name:** Rust",
        ))
        .unwrap();
        assert_eq!(json["outcome"], "structured");
        assert_eq!(json["diseaseName"], "Rust");
        assert_eq!(json["whatISaw"], "");

        let json = serde_json::to_value(ParseOutcome::NoRecord {
            reason: NoDiagnosisReason::UnclearPhoto,
        })
        .unwrap();
        assert_eq!(json["outcome"], "no_record");
        assert_eq!(json["reason"], "unclear_photo");
    }
}
