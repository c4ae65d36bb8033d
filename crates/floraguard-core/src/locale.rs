//! Localized phrase, label and display tables.
//!
//! Every supported language resolves to a [`LocaleTable`] of the same shape.
//! The parser builds its patterns from the union of all tables, so adding a
//! language means adding a table here and nothing else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages a diagnosis can be requested and displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Si,
}

impl Language {
    /// Returns all supported languages.
    pub fn all() -> &'static [Language] {
        &[Language::En, Language::Si]
    }

    /// Returns the language tag used in config files and on the CLI.
    pub fn tag(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Si => "si",
        }
    }

    /// Human-readable language name, in English.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Si => "Sinhala",
        }
    }

    /// Returns the phrase/label/UI table for this language.
    pub fn table(self) -> &'static LocaleTable {
        match self {
            Language::En => &EN,
            Language::Si => &SI,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "si" => Ok(Self::Si),
            other => Err(format!(
                "Unsupported language '{other}'. Expected one of: en, si"
            )),
        }
    }
}

/// Why a response short-circuits without a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDiagnosisReason {
    /// The model judged the plant healthy.
    Healthy,
    /// The photo is not a usable plant-leaf photo.
    UnclearPhoto,
}

/// A phrase whose presence in model output means "no diagnosis needed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel {
    pub phrase: &'static str,
    pub reason: NoDiagnosisReason,
}

/// Field and section labels the model is asked to use.
#[derive(Debug, Clone, Copy)]
pub struct FieldLabels {
    pub status: &'static str,
    pub disease_name: &'static str,
    pub confidence: &'static str,
    pub what_i_saw: &'static str,
    pub how_to_fix_it_organic: &'static str,
    pub prevention: &'static str,
    pub detailed_care_tips: &'static str,
}

/// Strings shown by the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct UiStrings {
    pub app_title: &'static str,
    pub app_subtitle: &'static str,
    pub loading_title: &'static str,
    pub loading_messages: &'static [&'static str],
    pub error_upload: &'static str,
    pub error_diagnosis: &'static str,
    pub confidence: &'static str,
    pub symptoms_title: &'static str,
    pub treatment_title: &'static str,
    pub prevention_title: &'static str,
    pub care_title: &'static str,
    pub healthy_title: &'static str,
    pub unclear_photo_title: &'static str,
    pub history_title: &'static str,
    pub clear_history: &'static str,
    pub no_history: &'static str,
    pub no_history_subtitle: &'static str,
    pub diagnosis: &'static str,
}

/// Everything language-specific, in one shape per language.
#[derive(Debug, Clone, Copy)]
pub struct LocaleTable {
    pub language: Language,
    pub sentinels: &'static [Sentinel],
    pub labels: FieldLabels,
    pub ui: UiStrings,
}

impl LocaleTable {
    /// Returns the sentinel phrase for a given reason, if this table has one.
    pub fn sentinel_for(&self, reason: NoDiagnosisReason) -> Option<&'static str> {
        self.sentinels
            .iter()
            .find(|s| s.reason == reason)
            .map(|s| s.phrase)
    }
}

/// All registered tables, in [`Language::all`] order.
pub fn tables() -> [&'static LocaleTable; 2] {
    [&EN, &SI]
}

static EN: LocaleTable = LocaleTable {
    language: Language::En,
    sentinels: &[
        Sentinel {
            phrase: "Please upload a clear photo of a plant leaf.",
            reason: NoDiagnosisReason::UnclearPhoto,
        },
        Sentinel {
            phrase: "Great news! This plant looks healthy",
            reason: NoDiagnosisReason::Healthy,
        },
    ],
    labels: FieldLabels {
        status: "Status",
        disease_name: "Disease Name",
        confidence: "Confidence",
        what_i_saw: "What I Saw",
        how_to_fix_it_organic: "How to Fix It (Organic)",
        prevention: "Prevention Tips",
        detailed_care_tips: "Detailed Plant Care",
    },
    ui: UiStrings {
        app_title: "FloraGuard",
        app_subtitle: "Your Personal AI Plant Doctor",
        loading_title: "Analyzing your plant...",
        loading_messages: &[
            "Consulting botanical archives...",
            "Analyzing leaf patterns...",
            "Checking for common pests...",
            "Cross-referencing with plant pathology database...",
            "Finalizing diagnosis...",
        ],
        error_upload: "Please upload an image first.",
        error_diagnosis: "An error occurred during diagnosis. Please try again.",
        confidence: "Confidence",
        symptoms_title: "Visual Symptoms",
        treatment_title: "Organic Treatment Plan",
        prevention_title: "Prevention Tips",
        care_title: "Detailed Plant Care",
        healthy_title: "Healthy Plant",
        unclear_photo_title: "Photo Not Usable",
        history_title: "Diagnosis History",
        clear_history: "Clear history",
        no_history: "No diagnoses yet.",
        no_history_subtitle: "Your past analyses will appear here.",
        diagnosis: "Diagnosis",
    },
};

static SI: LocaleTable = LocaleTable {
    language: Language::Si,
    sentinels: &[
        Sentinel {
            phrase: "කරුණාකර පැහැදිලි ශාක පත්‍රයක ඡායාරූපයක් උඩුගත කරන්න",
            reason: NoDiagnosisReason::UnclearPhoto,
        },
        Sentinel {
            phrase: "ශුභ ආරංචියක්! මෙම ශාකය සෞඛ්‍ය සම්පන්නයි",
            reason: NoDiagnosisReason::Healthy,
        },
    ],
    labels: FieldLabels {
        status: "තත්ත්වය",
        disease_name: "රෝගයේ නම",
        confidence: "විශ්වාසය",
        what_i_saw: "මා දුටු දේ",
        how_to_fix_it_organic: "ප්‍රතිකාර ක්‍රම (කාබනික)",
        prevention: "වැළැක්වීමේ උපදෙස්",
        detailed_care_tips: "සවිස්තරාත්මක ශාක රැකවරණය",
    },
    ui: UiStrings {
        app_title: "ෆ්ලෝරාගාර්ඩ්",
        app_subtitle: "ඔබේ පුද්ගලික AI ශාක වෛද්‍යවරයා",
        loading_title: "ඔබේ ශාකය විශ්ලේෂණය කරමින්...",
        loading_messages: &[
            "ශාක විද්‍යාත්මක ලේඛනාගාර පරිශීලනය කරමින්...",
            "පත්ර රටා විශ්ලේෂණය කරමින්...",
            "පොදු පළිබෝධකයන් සඳහා පරීක්ෂා කරමින්...",
            "ශාක ව්‍යාධි දත්ත සමුදාය සමඟ සසඳමින්...",
            "රෝග විනිශ්චය අවසන් කරමින්...",
        ],
        error_upload: "කරුණාකර පළමුව රූපයක් උඩුගත කරන්න.",
        error_diagnosis: "රෝග විනිශ්චය කිරීමේදී දෝෂයක් ඇතිවිය. කරුණාකර නැවත උත්සාහ කරන්න.",
        confidence: "විශ්වාසය",
        symptoms_title: "දෘශ්‍ය රෝග ලක්ෂණ",
        treatment_title: "කාබනික ප්‍රතිකාර සැලැස්ම",
        prevention_title: "වැළැක්වීමේ උපදෙස්",
        care_title: "සවිස්තරාත්මක ශාක රැකවරණය",
        healthy_title: "නිරෝගී ශාකයකි",
        unclear_photo_title: "ඡායාරූපය භාවිත කළ නොහැක",
        history_title: "රෝග විනිශ්චය ඉතිහාසය",
        clear_history: "ඉතිහාසය හිස් කරන්න",
        no_history: "තවමත් රෝග විනිශ්චයන් නොමැත.",
        no_history_subtitle: "ඔබගේ අතීත විශ්ලේෂණයන් මෙහි දිස්වනු ඇත.",
        diagnosis: "රෝග විනිශ්චය",
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parses_tags_case_insensitively() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" SI ".parse::<Language>().unwrap(), Language::Si);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_every_language_has_a_table_for_itself() {
        for lang in Language::all() {
            assert_eq!(lang.table().language, *lang);
        }
    }

    #[test]
    fn test_every_table_has_both_sentinel_reasons() {
        for table in tables() {
            assert!(table.sentinel_for(NoDiagnosisReason::Healthy).is_some());
            assert!(table.sentinel_for(NoDiagnosisReason::UnclearPhoto).is_some());
        }
    }

    #[test]
    fn test_sinhala_sentinels_are_sinhala_script_only() {
        // U+0D80..U+0DFF is the Sinhala block; ZWJ joins conjuncts.
        for sentinel in SI.sentinels {
            for ch in sentinel.phrase.chars() {
                let sinhala = ('\u{0D80}'..='\u{0DFF}').contains(&ch);
                assert!(
                    sinhala || ch.is_ascii() || ch == '\u{200D}',
                    "unexpected {ch:?} in {}",
                    sentinel.phrase
                );
            }
        }
    }

    #[test]
    fn test_language_serde_uses_tags() {
        let json = serde_json::to_string(&Language::Si).unwrap();
        assert_eq!(json, "\"si\"");
    }
}
