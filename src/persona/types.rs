//! Core types for personas and persona selection policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::text;

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// A named character profile used to style a summary.
///
/// Identity is `name`; two personas with the same name are the same persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub example: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            example: example.into(),
        }
    }

    /// Human-readable name, e.g. `Luna Stardust`.
    pub fn display_name(&self) -> String {
        text::display_name(&self.name)
    }

    /// The description/example pair stored in summary records.
    pub fn info(&self) -> PersonaInfo {
        PersonaInfo {
            description: self.description.clone(),
            example: self.example.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Info (record shape)
// ─────────────────────────────────────────────────────────────────

/// Persona metadata as written into a summary record.
///
/// Older records store a bare description string instead of an object;
/// both shapes are accepted on read, the object shape is always written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonaInfo {
    pub description: String,
    pub example: String,
}

impl<'de> Deserialize<'de> for PersonaInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Full {
                #[serde(default)]
                description: String,
                #[serde(default)]
                example: String,
            },
            Bare(String),
        }

        Ok(match Shape::deserialize(deserializer)? {
            Shape::Full {
                description,
                example,
            } => PersonaInfo {
                description,
                example,
            },
            Shape::Bare(description) => PersonaInfo {
                description,
                example: String::new(),
            },
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Mode
// ─────────────────────────────────────────────────────────────────

/// Persona selection policy for a batch run. Also names the pipeline
/// variant in output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaMode {
    /// The built-in catalog, every article.
    Fixed,
    /// One generated persona per article.
    Single,
    /// N generated personas per article.
    Dynamic,
    /// Two catalog personas plus N-2 generated ones.
    Mixed,
}

impl PersonaMode {
    /// Slug used in file names and CLI args.
    pub fn slug(&self) -> &'static str {
        match self {
            PersonaMode::Fixed => "fixed",
            PersonaMode::Single => "single",
            PersonaMode::Dynamic => "dynamic",
            PersonaMode::Mixed => "mixed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PersonaMode::Fixed => "built-in persona catalog",
            PersonaMode::Single => "one generated persona per article",
            PersonaMode::Dynamic => "several generated personas per article",
            PersonaMode::Mixed => "two catalog personas plus generated ones",
        }
    }

    pub fn all() -> &'static [PersonaMode] {
        &[
            PersonaMode::Fixed,
            PersonaMode::Single,
            PersonaMode::Dynamic,
            PersonaMode::Mixed,
        ]
    }

    /// Personas each article is expected to get under this mode.
    pub fn personas_per_article(&self, persona_count: usize, catalog_size: usize) -> usize {
        match self {
            PersonaMode::Fixed => catalog_size,
            PersonaMode::Single => 1,
            PersonaMode::Dynamic | PersonaMode::Mixed => persona_count,
        }
    }
}

impl fmt::Display for PersonaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for PersonaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PersonaMode::all()
            .iter()
            .copied()
            .find(|m| m.slug() == s.trim().to_lowercase())
            .ok_or_else(|| {
                format!(
                    "Unknown mode '{}'. Expected one of: fixed, single, dynamic, mixed",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip_through_str() {
        for mode in PersonaMode::all() {
            assert_eq!(mode.slug().parse::<PersonaMode>().unwrap(), *mode);
        }
        assert_eq!(" MIXED ".parse::<PersonaMode>().unwrap(), PersonaMode::Mixed);
        assert!("multi".parse::<PersonaMode>().is_err());
    }

    #[test]
    fn test_personas_per_article() {
        assert_eq!(PersonaMode::Fixed.personas_per_article(3, 5), 5);
        assert_eq!(PersonaMode::Single.personas_per_article(3, 5), 1);
        assert_eq!(PersonaMode::Dynamic.personas_per_article(4, 5), 4);
        assert_eq!(PersonaMode::Mixed.personas_per_article(3, 5), 3);
    }

    #[test]
    fn test_persona_info_accepts_both_shapes() {
        let full: PersonaInfo =
            serde_json::from_str(r#"{"description":"d","example":"e"}"#).unwrap();
        assert_eq!(full.example, "e");

        let bare: PersonaInfo = serde_json::from_str(r#""just a description""#).unwrap();
        assert_eq!(bare.description, "just a description");
        assert!(bare.example.is_empty());

        let written = serde_json::to_string(&bare).unwrap();
        assert_eq!(written, r#"{"description":"just a description","example":""}"#);
    }

    #[test]
    fn test_persona_display_name() {
        let p = Persona::new("luna_stardust", "d", "e");
        assert_eq!(p.display_name(), "Luna Stardust");
        assert_eq!(p.info().description, "d");
    }
}
