//! Prompt templates and rendering.

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, UndefinedBehavior, context};

use crate::locale::{Language, NoDiagnosisReason};

/// Prompt template for the diagnosis request (`MiniJinja`).
pub const DIAGNOSIS_PROMPT_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/diagnosis_prompt.md"
));

/// Renders the diagnosis prompt for `language`.
///
/// The labels and sentinel phrases come from the same locale table the
/// parser is built from, so the requested layout is always parseable.
///
/// # Errors
/// Returns an error if the template fails to render.
pub fn diagnosis_prompt(language: Language) -> Result<String> {
    let table = language.table();
    let labels = &table.labels;
    let sentinel = |reason| {
        table
            .sentinel_for(reason)
            .ok_or_else(|| anyhow!("No {reason:?} sentinel for language '{language}'"))
    };

    let vars = context! {
        language_name => language.display_name(),
        unclear_photo => sentinel(NoDiagnosisReason::UnclearPhoto)?,
        healthy => sentinel(NoDiagnosisReason::Healthy)?,
        labels => context! {
            status => labels.status,
            disease_name => labels.disease_name,
            confidence => labels.confidence,
            what_i_saw => labels.what_i_saw,
            how_to_fix_it_organic => labels.how_to_fix_it_organic,
            prevention => labels.prevention,
            detailed_care_tips => labels.detailed_care_tips,
        },
    };

    render_prompt_template(DIAGNOSIS_PROMPT_TEMPLATE, vars)
}

fn render_prompt_template(template: &str, vars: minijinja::Value) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_template("diagnosis_prompt", template)
        .context("Failed to load diagnosis prompt template")?;

    let output = env
        .get_template("diagnosis_prompt")
        .context("Failed to load diagnosis prompt template")?
        .render(vars)
        .context("Failed to render diagnosis prompt")?;

    Ok(output.replace("\r\n", "\n").trim().to_string())
}
