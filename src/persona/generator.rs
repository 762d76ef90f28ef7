//! Persona generation and per-mode persona-set resolution.
//!
//! Generation failures never propagate out of [`PersonaGenerator::resolve`]:
//! a transport or parse failure is replaced by catalog personas.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{GenerationSettings, LlmSettings};
use crate::error::Result;
use crate::llm::{ChatMessage, CompletionRequest, TextGenerator};
use crate::text::excerpt;

use super::catalog::{fixed_personas, random_fixed, sample_fixed, FIXED_PERSONA_NAMES};
use super::parse::{parse_persona, parse_persona_list};
use super::{Persona, PersonaMode};

const PERSONA_SYSTEM_PROMPT: &str =
    "You are a creative writer who designs vivid, distinctive female character personas.";

/// Catalog personas always included in mixed mode
const MIXED_FIXED_COUNT: usize = 2;

/// Request parameters for persona calls
#[derive(Debug, Clone)]
pub struct PersonaPromptSettings {
    /// Characters of the article included in the prompt
    pub excerpt_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub list_max_tokens: u32,
}

impl PersonaPromptSettings {
    pub fn from_config(generation: &GenerationSettings, llm: &LlmSettings) -> Self {
        Self {
            excerpt_chars: generation.persona_excerpt_chars,
            temperature: llm.persona_temperature,
            max_tokens: llm.persona_max_tokens,
            list_max_tokens: llm.persona_list_max_tokens,
        }
    }
}

impl Default for PersonaPromptSettings {
    fn default() -> Self {
        Self::from_config(&GenerationSettings::default(), &LlmSettings::default())
    }
}

/// The personas chosen for one article
#[derive(Debug, Clone)]
pub struct PersonaSet {
    /// Unique by name, in the order summaries are attempted
    pub personas: Vec<Persona>,
    /// Catalog personas replaced a failed generation
    pub fallback: bool,
}

pub struct PersonaGenerator {
    client: Arc<dyn TextGenerator>,
    settings: PersonaPromptSettings,
}

impl PersonaGenerator {
    pub fn new(client: Arc<dyn TextGenerator>, settings: PersonaPromptSettings) -> Self {
        Self { client, settings }
    }

    fn single_prompt(&self, content: &str, title: &str) -> String {
        format!(
            "Create one distinctive character persona to summarize the article below.\n\n\
             ARTICLE TITLE: {title}\n\n\
             ARTICLE EXCERPT:\n{excerpt}... (article continues)\n\n\
             Give her a memorable personality, a recognizable way of speaking and a clear link \
             to the article's subject.\n\n\
             Reply with JSON only, in exactly this shape:\n\
             {{\"name\": \"character_type_name\", \"description\": \"who she is and how she speaks\", \
             \"example\": \"a short sample of her talking about a technical topic\"}}",
            title = title,
            excerpt = excerpt(content, self.settings.excerpt_chars),
        )
    }

    fn list_prompt(&self, content: &str, title: &str, count: usize) -> String {
        format!(
            "Create {count} distinctive character personas to summarize the article below. \
             They must differ from each other in age, background, style and verbal quirks.\n\n\
             ARTICLE TITLE: {title}\n\n\
             ARTICLE EXCERPT:\n{excerpt}... (article continues)\n\n\
             Reply with JSON only, in exactly this shape:\n\
             {{\"personas\": [{{\"name\": \"character_type_name\", \"description\": \"who she is and how she speaks\", \
             \"example\": \"a short sample of her talking about a technical topic\"}}, ...]}}",
            count = count,
            title = title,
            excerpt = excerpt(content, self.settings.excerpt_chars),
        )
    }

    /// Ask for one persona.
    pub async fn generate_single(&self, content: &str, title: &str) -> Result<Persona> {
        let completion = self
            .client
            .complete(CompletionRequest {
                messages: vec![
                    ChatMessage::system(PERSONA_SYSTEM_PROMPT),
                    ChatMessage::user(self.single_prompt(content, title)),
                ],
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            })
            .await?;

        parse_persona(&completion.text)
    }

    /// Ask for `count` personas. A reply that decodes to nothing yields an
    /// empty list; only transport failures are errors.
    pub async fn generate_many(&self, content: &str, title: &str, count: usize) -> Result<Vec<Persona>> {
        let completion = self
            .client
            .complete(CompletionRequest {
                messages: vec![
                    ChatMessage::system(PERSONA_SYSTEM_PROMPT),
                    ChatMessage::user(self.list_prompt(content, title, count)),
                ],
                temperature: self.settings.temperature,
                max_tokens: self.settings.list_max_tokens,
            })
            .await?;

        let personas = parse_persona_list(&completion.text, count);
        if personas.len() < count {
            debug!(
                title = %title,
                requested = count,
                parsed = personas.len(),
                "Persona list reply was partial"
            );
        }
        Ok(personas)
    }

    /// `count` generated personas, or catalog personas when none could be had.
    async fn generated_or_fallback(&self, content: &str, title: &str, count: usize) -> (Vec<Persona>, bool) {
        match self.generate_many(content, title, count).await {
            Ok(personas) if !personas.is_empty() => (personas, false),
            Ok(_) => {
                warn!(title = %title, "Persona list reply could not be parsed, using catalog personas");
                (sample_fixed(&mut rand::thread_rng(), count), true)
            }
            Err(e) => {
                warn!(title = %title, error = %e, "Persona generation failed, using catalog personas");
                (sample_fixed(&mut rand::thread_rng(), count), true)
            }
        }
    }

    /// Resolve the persona set for one article under `mode`.
    pub async fn resolve(&self, mode: PersonaMode, count: usize, content: &str, title: &str) -> PersonaSet {
        let (personas, fallback) = match mode {
            PersonaMode::Fixed => (fixed_personas(), false),

            PersonaMode::Single => match self.generate_single(content, title).await {
                Ok(persona) => (vec![persona], false),
                Err(e) => {
                    warn!(title = %title, error = %e, "Persona generation failed, using a catalog persona");
                    (vec![random_fixed(&mut rand::thread_rng())], true)
                }
            },

            PersonaMode::Dynamic => self.generated_or_fallback(content, title, count).await,

            PersonaMode::Mixed => {
                let mut personas = sample_fixed(&mut rand::thread_rng(), count.min(MIXED_FIXED_COUNT));
                let generated_count = count.saturating_sub(MIXED_FIXED_COUNT);
                let mut fallback = false;
                if generated_count > 0 {
                    let (generated, used_fallback) =
                        self.generated_or_fallback(content, title, generated_count).await;
                    personas.extend(generated);
                    fallback = used_fallback;
                }
                (personas, fallback)
            }
        };

        let personas = dedupe_by_name(personas);
        info!(
            title = %title,
            mode = %mode,
            personas = personas.len(),
            fallback,
            "Resolved personas"
        );
        PersonaSet { personas, fallback }
    }
}

/// Collapse personas sharing a name: first position, last content.
pub fn dedupe_by_name(personas: Vec<Persona>) -> Vec<Persona> {
    let mut out: Vec<Persona> = Vec::with_capacity(personas.len());
    for persona in personas {
        match out.iter_mut().find(|p| p.name == persona.name) {
            Some(existing) => *existing = persona,
            None => out.push(persona),
        }
    }
    out
}

/// Size of the built-in catalog
pub fn catalog_size() -> usize {
    FIXED_PERSONA_NAMES.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockConfig, MockGenerator, MockReply};
    use crate::persona::is_fixed;

    const ARTICLE: &str = "# Trees\n\nBinary trees store ordered data.";

    fn generator(mock: Arc<MockGenerator>) -> PersonaGenerator {
        PersonaGenerator::new(mock, PersonaPromptSettings::default())
    }

    fn names(set: &PersonaSet) -> Vec<&str> {
        set.personas.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fixed_mode_makes_no_calls() {
        let mock = Arc::new(MockGenerator::new(MockConfig::default()));
        let set = generator(mock.clone()).resolve(PersonaMode::Fixed, 3, ARTICLE, "Trees").await;
        assert_eq!(names(&set), FIXED_PERSONA_NAMES);
        assert!(!set.fallback);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_mode_parses_reply() {
        let mock = Arc::new(MockGenerator::replying(
            r#"{"name":"luna_stardust","description":"An astronomer","example":"Look up!"}"#,
        ));
        let set = generator(mock.clone()).resolve(PersonaMode::Single, 3, ARTICLE, "Trees").await;
        assert_eq!(names(&set), ["luna_stardust"]);
        assert!(!set.fallback);

        let prompt = &mock.prompts()[0];
        assert!(prompt.contains("ARTICLE TITLE: Trees"));
        assert!(prompt.contains("Binary trees"));
    }

    #[tokio::test]
    async fn test_single_mode_unparsable_reply_falls_back() {
        let mock = Arc::new(MockGenerator::replying("Sorry, I can't do JSON today."));
        let set = generator(mock).resolve(PersonaMode::Single, 3, ARTICLE, "Trees").await;
        assert_eq!(set.personas.len(), 1);
        assert!(is_fixed(&set.personas[0].name));
        assert!(set.fallback);
    }

    #[tokio::test]
    async fn test_dynamic_mode_transport_failure_falls_back() {
        let mock = Arc::new(MockGenerator::new(MockConfig {
            fail_all: true,
            ..Default::default()
        }));
        let set = generator(mock).resolve(PersonaMode::Dynamic, 7, ARTICLE, "Trees").await;
        assert_eq!(set.personas.len(), 5);
        assert!(set.personas.iter().all(|p| is_fixed(&p.name)));
        assert!(set.fallback);
    }

    #[tokio::test]
    async fn test_dynamic_mode_keeps_partial_list() {
        let mock = Arc::new(MockGenerator::replying(
            r#"{"personas":[{"name":"a","description":"1"},{"name":"b","description":"2"}]}"#,
        ));
        let set = generator(mock).resolve(PersonaMode::Dynamic, 3, ARTICLE, "Trees").await;
        assert_eq!(names(&set), ["a", "b"]);
        assert!(!set.fallback);
    }

    #[tokio::test]
    async fn test_mixed_mode_two_fixed_then_generated() {
        let mock = Arc::new(MockGenerator::replying(
            r#"{"personas":[{"name":"nova","description":"A DJ"}]}"#,
        ));
        let set = generator(mock.clone()).resolve(PersonaMode::Mixed, 3, ARTICLE, "Trees").await;
        assert_eq!(set.personas.len(), 3);
        assert!(is_fixed(&set.personas[0].name));
        assert!(is_fixed(&set.personas[1].name));
        assert_eq!(set.personas[2].name, "nova");
        assert!(mock.prompts()[0].contains("Create 1 distinctive"));
    }

    #[tokio::test]
    async fn test_mixed_mode_small_count_skips_generation() {
        let mock = Arc::new(MockGenerator::new(MockConfig::default()));
        let set = generator(mock.clone()).resolve(PersonaMode::Mixed, 2, ARTICLE, "Trees").await;
        assert_eq!(set.personas.len(), 2);
        assert_eq!(mock.call_count(), 0);

        let set = generator(mock.clone()).resolve(PersonaMode::Mixed, 1, ARTICLE, "Trees").await;
        assert_eq!(set.personas.len(), 1);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generated_name_collision_overwrites_in_place() {
        let mock = Arc::new(MockGenerator::new(MockConfig::default()));
        mock.push(MockReply::Text(
            r#"[{"name":"a","description":"first"},{"name":"b","description":"x"},{"name":"a","description":"second"}]"#.into(),
        ));
        let set = generator(mock).resolve(PersonaMode::Dynamic, 3, ARTICLE, "Trees").await;
        assert_eq!(names(&set), ["a", "b"]);
        assert_eq!(set.personas[0].description, "second");
    }

    #[test]
    fn test_prompt_respects_excerpt_budget() {
        let mock = Arc::new(MockGenerator::new(MockConfig::default()));
        let generator = PersonaGenerator::new(
            mock,
            PersonaPromptSettings {
                excerpt_chars: 5,
                ..Default::default()
            },
        );
        let prompt = generator.single_prompt("abcdefghij", "T");
        assert!(prompt.contains("abcde..."));
        assert!(!prompt.contains("abcdef"));
    }
}
