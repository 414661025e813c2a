//! Letter drafting and gap analysis for the TPA desk.
//!
//! The desk core hands structured case text to a [`LetterGenerator`] and
//! billed/approved figures to a [`GapAnalyzer`]. The hosted chat-completions
//! client is compiled with the `openai` feature; [`MockGenerator`] covers
//! tests and offline use.

pub mod generator;
pub mod prompts;
pub mod settings;

#[cfg(feature = "openai")]
pub mod client;

#[cfg(feature = "openai")]
pub use client::ChatCompletionsClient;
pub use generator::*;
pub use prompts::*;
pub use settings::GeneratorConfig;
