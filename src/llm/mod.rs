//! Text-generation clients
//!
//! Every component that needs generated text receives an explicitly
//! constructed [`TextGenerator`]; nothing reads global client state.

mod mock;
mod openai;
mod traits;

pub use mock::{MockConfig, MockGenerator};
#[cfg(test)]
pub use mock::MockReply;
use openai::{OpenAiClient, OpenAiConfig};
pub use traits::*;

use std::sync::Arc;

use crate::config::{LlmProvider, LlmSettings};
use crate::error::Result;

/// Build the generator selected by `llm.provider`
pub fn build_generator(settings: &LlmSettings) -> Result<Arc<dyn TextGenerator>> {
    match settings.provider {
        LlmProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(OpenAiConfig::from(settings))?)),
        LlmProvider::Mock => Ok(Arc::new(MockGenerator::new(MockConfig::default()))),
    }
}
