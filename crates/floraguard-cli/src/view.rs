//! Terminal presentation for parse outcomes and rendered markdown.
//!
//! Styling is applied only when writing to a terminal; piped output is plain
//! text with the same layout.

use std::io::{self, IsTerminal, Write};

use crossterm::style::Stylize;
use floraguard_core::diagnosis::{DiagnosisRecord, ParseOutcome};
use floraguard_core::locale::{Language, NoDiagnosisReason, UiStrings};
use floraguard_core::markdown::{InlineSpan, RenderBlock, render_markdown};

pub struct View {
    styled: bool,
    ui: &'static UiStrings,
}

impl View {
    /// A view for stdout, styled when stdout is a terminal.
    pub fn stdout(language: Language) -> Self {
        Self::new(language, io::stdout().is_terminal())
    }

    pub fn new(language: Language, styled: bool) -> Self {
        Self {
            styled,
            ui: &language.table().ui,
        }
    }

    pub fn ui(&self) -> &'static UiStrings {
        self.ui
    }

    /// Writes a parse outcome; `raw` is shown for anything but a record.
    pub fn outcome(&self, out: &mut impl Write, outcome: &ParseOutcome, raw: &str) -> io::Result<()> {
        match outcome {
            ParseOutcome::Structured(record) => self.record(out, record),
            ParseOutcome::NoRecord { reason } => {
                let title = match reason {
                    NoDiagnosisReason::Healthy => self.ui.healthy_title,
                    NoDiagnosisReason::UnclearPhoto => self.ui.unclear_photo_title,
                };
                self.heading(out, title)?;
                self.markdown(out, raw)
            }
            ParseOutcome::Unparseable => self.markdown(out, raw),
        }
    }

    fn record(&self, out: &mut impl Write, record: &DiagnosisRecord) -> io::Result<()> {
        let status = record.status.to_uppercase();
        if self.styled {
            writeln!(out, "{}", status.as_str().green().bold())?;
            writeln!(out, "{}", record.disease_name.as_str().bold())?;
        } else {
            writeln!(out, "{status}")?;
            writeln!(out, "{}", record.disease_name)?;
        }
        writeln!(out, "{}: {}", self.ui.confidence, record.confidence)?;

        self.section(out, self.ui.symptoms_title, &record.what_i_saw)?;
        self.section(out, self.ui.treatment_title, &record.how_to_fix_it_organic)?;
        self.section(out, self.ui.prevention_title, &record.prevention)?;
        if !record.detailed_care_tips.is_empty() {
            self.section(out, self.ui.care_title, &record.detailed_care_tips)?;
        }
        Ok(())
    }

    fn section(&self, out: &mut impl Write, title: &str, body: &str) -> io::Result<()> {
        writeln!(out)?;
        self.heading(out, title)?;
        self.markdown(out, body)
    }

    pub fn heading(&self, out: &mut impl Write, title: &str) -> io::Result<()> {
        if self.styled {
            writeln!(out, "{}", title.green().bold())
        } else {
            writeln!(out, "{title}")
        }
    }

    /// Writes markdown as blocks separated by blank lines.
    pub fn markdown(&self, out: &mut impl Write, text: &str) -> io::Result<()> {
        for (i, block) in render_markdown(text).enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            match block {
                RenderBlock::Paragraph(lines) => {
                    for line in &lines {
                        self.spans(out, line)?;
                        writeln!(out)?;
                    }
                }
                RenderBlock::OrderedList(items) => {
                    for (n, item) in items.iter().enumerate() {
                        write!(out, "{}. ", n + 1)?;
                        self.spans(out, item)?;
                        writeln!(out)?;
                    }
                }
                RenderBlock::UnorderedList(items) => {
                    for item in &items {
                        write!(out, "• ")?;
                        self.spans(out, item)?;
                        writeln!(out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn spans(&self, out: &mut impl Write, spans: &[InlineSpan]) -> io::Result<()> {
        for span in spans {
            match span {
                InlineSpan::Bold(text) if self.styled => write!(out, "{}", text.as_str().bold())?,
                InlineSpan::Italic(text) if self.styled => {
                    write!(out, "{}", text.as_str().italic())?;
                }
                InlineSpan::Plain(text) | InlineSpan::Bold(text) | InlineSpan::Italic(text) => {
                    write!(out, "{text}")?;
                }
            }
        }
        Ok(())
    }
}
