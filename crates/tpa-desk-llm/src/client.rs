//! Chat-completions client for the hosted generation service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generator::{
    wrap_letter, GapAnalyzer, GenerationError, GenerationResult, LetterGenerator,
};
use crate::prompts::{make_gap_prompt, make_letter_prompt, LetterRequest};
use crate::settings::GeneratorConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Blocking client; one request per letter or analysis, no retries.
pub struct ChatCompletionsClient {
    http: reqwest::blocking::Client,
    config: GeneratorConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: GeneratorConfig) -> GenerationResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Build from `OPENAI_*` environment variables.
    pub fn from_env() -> GenerationResult<Self> {
        Self::new(GeneratorConfig::from_env()?)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn complete(&self, prompt: &str) -> GenerationResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let mut request = self.http.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(model = %self.config.model, "requesting completion");
        let response: ChatResponse = request.send()?.error_for_status()?.json()?;
        first_content(response)
    }
}

fn first_content(response: ChatResponse) -> GenerationResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

impl LetterGenerator for ChatCompletionsClient {
    fn generate_letter(&self, request: &LetterRequest) -> GenerationResult<String> {
        let body = self.complete(&make_letter_prompt(request))?;
        Ok(wrap_letter(&body))
    }
}

impl GapAnalyzer for ChatCompletionsClient {
    fn analyze_gap(
        &self,
        billed: f64,
        approved: f64,
        deductions_json: &str,
    ) -> GenerationResult<String> {
        self.complete(&make_gap_prompt(billed, approved, deductions_json))
    }
}
