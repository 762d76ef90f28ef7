//! Persona-styled summaries of one article.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::{GenerationSettings, LlmSettings};
use crate::error::{Error, Result};
use crate::llm::{ChatMessage, CompletionRequest, TextGenerator, TokenUsage};
use crate::persona::Persona;
use crate::text::excerpt;

use super::SummaryStats;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a creative writer who turns articles into short summaries voiced by different female characters.";

/// Request parameters for summary calls
#[derive(Debug, Clone)]
pub struct SummaryPromptSettings {
    /// Characters of the article included in the prompt
    pub excerpt_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SummaryPromptSettings {
    pub fn from_config(generation: &GenerationSettings, llm: &LlmSettings) -> Self {
        Self {
            excerpt_chars: generation.summary_excerpt_chars,
            temperature: llm.summary_temperature,
            max_tokens: llm.summary_max_tokens,
        }
    }
}

impl Default for SummaryPromptSettings {
    fn default() -> Self {
        Self::from_config(&GenerationSettings::default(), &LlmSettings::default())
    }
}

/// A successful summary call
#[derive(Debug, Clone)]
pub struct GeneratedSummary {
    pub text: String,
    pub elapsed_secs: f64,
    pub usage: TokenUsage,
}

impl GeneratedSummary {
    pub fn stats(&self) -> SummaryStats {
        SummaryStats {
            time_seconds: self.elapsed_secs,
            total_tokens: self.usage.total_tokens,
            prompt_tokens: self.usage.prompt_tokens,
            completion_tokens: self.usage.completion_tokens,
        }
    }
}

pub struct SummaryGenerator {
    client: Arc<dyn TextGenerator>,
    settings: SummaryPromptSettings,
}

impl SummaryGenerator {
    pub fn new(client: Arc<dyn TextGenerator>, settings: SummaryPromptSettings) -> Self {
        Self { client, settings }
    }

    fn prompt(&self, content: &str, title: &str, persona: &Persona) -> String {
        format!(
            "Write a short summary of a technical article in the voice of the character below.\n\n\
             CHARACTER: {description}\n\
             EXAMPLE STYLE: \"{example}\"\n\n\
             ARTICLE TITLE: {title}\n\n\
             ARTICLE CONTENT:\n{excerpt}... (article continues)\n\n\
             Use 1-3 sentences and stay under 280 characters. Capture the article's main topic \
             while fully playing the character. Do not wrap the summary in quotation marks.",
            description = persona.description,
            example = persona.example,
            title = title,
            excerpt = excerpt(content, self.settings.excerpt_chars),
        )
    }

    /// Summarize `content` as `persona`. The reply is only trimmed; an empty
    /// reply counts as a failure.
    pub async fn generate(&self, content: &str, title: &str, persona: &Persona) -> Result<GeneratedSummary> {
        let start = Instant::now();
        let completion = self
            .client
            .complete(CompletionRequest {
                messages: vec![
                    ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
                    ChatMessage::user(self.prompt(content, title, persona)),
                ],
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            })
            .await?;
        let elapsed_secs = start.elapsed().as_secs_f64();

        let text = completion.text.trim().to_string();
        if text.is_empty() {
            return Err(Error::malformed("empty summary reply"));
        }

        debug!(
            persona = %persona.name,
            chars = text.chars().count(),
            elapsed_ms = (elapsed_secs * 1000.0) as u64,
            tokens = completion.usage.total_tokens,
            "Summary generated"
        );

        Ok(GeneratedSummary {
            text,
            elapsed_secs,
            usage: completion.usage,
        })
    }
}
