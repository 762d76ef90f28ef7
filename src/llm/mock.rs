//! Scripted generator for offline runs and tests
//!
//! Reply selection order: forced failure, queued replies, substring rules,
//! then the default reply.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{Error, Result};

use super::{Completion, CompletionRequest, GeneratorStats, TextGenerator, TokenUsage};

// ─────────────────────────────────────────────────────────────────
// Mock Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for mock generator behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Simulated latency per call (ms)
    pub latency_ms: u64,

    /// Fail every call with a transport error
    pub fail_all: bool,

    /// Reply used when nothing else matches
    pub default_reply: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            fail_all: false,
            default_reply: "Offline placeholder summary.".to_string(),
        }
    }
}

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail,
}

// ─────────────────────────────────────────────────────────────────
// Mock Generator
// ─────────────────────────────────────────────────────────────────

pub struct MockGenerator {
    config: MockConfig,
    queue: RwLock<VecDeque<MockReply>>,
    rules: RwLock<Vec<(String, MockReply)>>,
    prompts: RwLock<Vec<String>>,
    total_tokens: RwLock<u64>,
}

impl MockGenerator {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            queue: RwLock::new(VecDeque::new()),
            rules: RwLock::new(Vec::new()),
            prompts: RwLock::new(Vec::new()),
            total_tokens: RwLock::new(0),
        }
    }

    /// Mock whose default reply is `text`
    #[cfg(test)]
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockConfig {
            default_reply: text.into(),
            ..Default::default()
        })
    }

    /// Queue a reply consumed by the next call
    #[cfg(test)]
    pub fn push(&self, reply: MockReply) -> &Self {
        self.queue.write().push_back(reply);
        self
    }

    /// Answer with `reply` whenever the prompt contains `needle`
    #[cfg(test)]
    pub fn on(&self, needle: impl Into<String>, reply: MockReply) -> &Self {
        self.rules.write().push((needle.into(), reply));
        self
    }

    /// Number of completed or failed calls
    pub fn call_count(&self) -> usize {
        self.prompts.read().len()
    }

    /// Every prompt seen so far, messages joined by newlines
    #[cfg(test)]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().clone()
    }

    fn select(&self, prompt: &str) -> MockReply {
        if self.config.fail_all {
            return MockReply::Fail;
        }
        if let Some(reply) = self.queue.write().pop_front() {
            return reply;
        }
        let rules = self.rules.read();
        if let Some((_, reply)) = rules.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            return reply.clone();
        }
        MockReply::Text(self.config.default_reply.clone())
    }
}

fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let reply = self.select(&prompt);
        self.prompts.write().push(prompt.clone());

        match reply {
            MockReply::Fail => Err(Error::transport("mock://", "Scripted failure")),
            MockReply::Text(text) => {
                let usage = TokenUsage::new(word_count(&prompt), word_count(&text));
                *self.total_tokens.write() += u64::from(usage.total_tokens);
                Ok(Completion { text, usage })
            }
        }
    }

    fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            requests: self.call_count() as u64,
            total_tokens: *self.total_tokens.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn ask(text: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user(text)],
            temperature: 1.0,
            max_tokens: 10,
        }
    }

    #[tokio::test]
    async fn test_default_reply() {
        let mock = MockGenerator::replying("fixed");
        let completion = mock.complete(ask("one two three")).await.unwrap();
        assert_eq!(completion.text, "fixed");
        assert_eq!(completion.usage, TokenUsage::new(3, 1));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_queue_before_rules() {
        let mock = MockGenerator::new(MockConfig::default());
        mock.on("persona", MockReply::Text("rule".into()))
            .push(MockReply::Text("queued".into()));

        assert_eq!(mock.complete(ask("persona")).await.unwrap().text, "queued");
        assert_eq!(mock.complete(ask("persona")).await.unwrap().text, "rule");
        assert_eq!(
            mock.complete(ask("other")).await.unwrap().text,
            MockConfig::default().default_reply
        );
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let mock = MockGenerator::new(MockConfig {
            fail_all: true,
            ..Default::default()
        });
        let err = mock.complete(ask("anything")).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(mock.stats().requests, 1);
        assert_eq!(mock.stats().total_tokens, 0);
    }

    #[test]
    fn test_prompts_recorded_outside_runtime() {
        let mock = MockGenerator::replying("ok");
        tokio_test::block_on(async {
            mock.complete(ask("first")).await.unwrap();
            mock.complete(ask("second")).await.unwrap();
        });
        assert_eq!(mock.call_count(), 2);
        assert!(mock.prompts()[1].contains("second"));
    }
}
