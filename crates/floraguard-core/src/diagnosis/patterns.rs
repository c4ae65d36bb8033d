//! Candidate patterns for pulling labelled fields out of model output.
//!
//! Each field owns an ordered list of candidates. The first candidate that
//! yields a non-empty value wins; later candidates are looser fallbacks for
//! formatting drift (missing bold, different heading level).

use regex::Regex;

/// One way of locating a field value.
#[derive(Debug)]
pub(crate) enum FieldPattern {
    /// The value is the first capture group.
    Inline(Regex),
    /// The value runs from the end of `heading` to the next `boundary`
    /// match, or to the end of the text.
    Section { heading: Regex, boundary: Regex },
}

impl FieldPattern {
    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        match self {
            FieldPattern::Inline(re) => re
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            FieldPattern::Section { heading, boundary } => {
                let start = heading.find(text)?.end();
                let rest = &text[start..];
                let end = boundary.find(rest).map_or(rest.len(), |m| m.start());
                Some(&rest[..end])
            }
        }
    }
}

/// Ordered candidates for one field.
#[derive(Debug)]
pub(crate) struct FieldMatcher {
    candidates: Vec<FieldPattern>,
}

impl FieldMatcher {
    /// Returns the first non-empty trimmed value, or an empty string.
    pub(crate) fn extract(&self, text: &str) -> String {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.find(text))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// `## ... **Status: <value>**` (the value may wrap onto the next line),
    /// then an unbolded `Status: <value>` line.
    pub(crate) fn status(labels: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            candidates: vec![
                FieldPattern::Inline(Regex::new(&format!(
                    r"(?i)## [^\n]*?\*\*(?:{labels}):[ \t]*(?:\r?\n[ \t]*)?([^\n]*?)\*\*"
                ))?),
                FieldPattern::Inline(Regex::new(&format!(
                    r"(?im)^[ \t#]*\**(?:{labels})\**:\**[ \t]*([^\n]*?)[ \t*\r]*$"
                ))?),
            ],
        })
    }

    /// `**Label:** <value>`, then `**Label:**` with the value on the next
    /// line, then `Label: <value>` anywhere.
    ///
    /// A next-line value may not open with `*` or `#`, so an empty label
    /// never captures the label or heading below it.
    pub(crate) fn labelled_line(labels: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            candidates: vec![
                FieldPattern::Inline(Regex::new(&format!(
                    r"(?i)\*\*(?:{labels}):\*\*[ \t]*([^\n]*)"
                ))?),
                FieldPattern::Inline(Regex::new(&format!(
                    r"(?i)\*\*(?:{labels}):\*\*[ \t]*\r?\n[ \t]*([^*#\s][^\n]*)"
                ))?),
                FieldPattern::Inline(Regex::new(&format!(
                    r"(?i)(?:{labels}):\**[ \t]*([^\n]*)"
                ))?),
            ],
        })
    }

    /// Content under a `### ... <title>` subheading up to the next `###`;
    /// then under any heading or bold title line up to the next such line.
    pub(crate) fn section(titles: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            candidates: vec![
                FieldPattern::Section {
                    heading: Regex::new(&format!(r"(?i)### [^\n]*?(?:{titles})[^\n]*"))?,
                    boundary: Regex::new("###")?,
                },
                FieldPattern::Section {
                    heading: Regex::new(&format!(
                        r"(?im)^[ \t]*(?:#{{1,6}}[ \t]+|\*\*)[^\n]*?(?:{titles})[^\n]*$"
                    ))?,
                    boundary: Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]|\*\*[^\n]*\*\*:?[ \t\r]*$)")?,
                },
            ],
        })
    }
}

/// Builds a regex alternation from literal labels, longest first so a label
/// that prefixes another never shadows it.
pub(crate) fn alternation<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    let mut labels: Vec<&str> = labels.into_iter().collect();
    labels.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    labels.dedup();
    labels
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}
