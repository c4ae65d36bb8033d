//! Core FloraGuard library (diagnosis parsing, rendering, provider, history, config).

pub mod config;
pub mod diagnosis;
pub mod history;
pub mod images;
pub mod interrupt;
pub mod locale;
pub mod markdown;
pub mod pipeline;
pub mod prompts;
pub mod providers;
