//! Decoding personas out of free-form generation replies.
//!
//! Replies are decoded strictly first (the whole reply as JSON). When that
//! fails, balanced `{...}` / `[...]` spans are tried in order of appearance.
//! Nothing here panics on malformed input.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

use super::Persona;

#[derive(Debug, Deserialize)]
struct RawPersona {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

impl RawPersona {
    fn into_persona(self) -> Option<Persona> {
        let name = self.name?.trim().to_string();
        let description = self.description?.trim().to_string();
        if name.is_empty() || description.is_empty() {
            return None;
        }
        Some(Persona {
            name,
            description,
            example: self.example.unwrap_or_default().trim().to_string(),
        })
    }
}

fn persona_from_value(value: &Value) -> Option<Persona> {
    RawPersona::deserialize(value).ok()?.into_persona()
}

// ─────────────────────────────────────────────────────────────────
// Span extraction
// ─────────────────────────────────────────────────────────────────

/// End offset (exclusive) of the balanced span opening at `start`.
///
/// Only the bracket kind found at `start` is counted; brackets inside JSON
/// strings are ignored.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let open = bytes[start];
    let close = match open {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i + 1);
            }
        }
    }
    None
}

/// Every balanced span opening with `open`, in order of its opening byte.
fn spans(text: &str, open: u8) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(move |&(_, &b)| b == open)
        .filter_map(move |(start, _)| balanced_end(bytes, start).map(|end| &text[start..end]))
}

/// Candidate JSON values: the whole reply, then each balanced span.
fn candidates(text: &str) -> impl Iterator<Item = Value> + '_ {
    let strict = serde_json::from_str::<Value>(text.trim()).ok();
    let lenient = spans(text, b'{')
        .chain(spans(text, b'['))
        .filter_map(|span| serde_json::from_str::<Value>(span).ok());
    strict.into_iter().chain(lenient)
}

// ─────────────────────────────────────────────────────────────────
// Public parsers
// ─────────────────────────────────────────────────────────────────

/// Decode the first well-formed persona object in `reply`.
pub fn parse_persona(reply: &str) -> Result<Persona> {
    candidates(reply)
        .find_map(|value| persona_from_value(&value))
        .ok_or_else(|| {
            Error::persona_parse(format!(
                "no persona object with name and description in {} chars of reply",
                reply.chars().count()
            ))
        })
}

/// Decode up to `expected` personas from a `{"personas": [...]}` object or a
/// bare array. Entries that do not decode are dropped, and when no list
/// survives at all the standalone persona objects in the reply are used.
pub fn parse_persona_list(reply: &str, expected: usize) -> Vec<Persona> {
    if expected == 0 {
        return Vec::new();
    }

    let from_list = candidates(reply).find_map(|value| {
        let items = match &value {
            Value::Object(map) => map.get("personas")?.as_array()?.clone(),
            Value::Array(items) => items.clone(),
            _ => return None,
        };
        let personas: Vec<Persona> = items.iter().filter_map(persona_from_value).collect();
        if personas.is_empty() {
            None
        } else {
            Some(personas)
        }
    });

    let mut personas = from_list.unwrap_or_else(|| {
        // Truncated replies often still hold complete inner objects.
        spans(reply, b'{')
            .filter_map(|span| serde_json::from_str::<Value>(span).ok())
            .filter_map(|value| persona_from_value(&value))
            .collect()
    });

    personas.truncate(expected);
    personas
}
