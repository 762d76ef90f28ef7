//! Persona store: the built-in catalog, generated personas and the
//! per-mode selection policy.

pub mod catalog;
pub mod generator;
pub mod parse;
pub mod types;

pub use catalog::{is_fixed, FIXED_PERSONA_NAMES};
pub use generator::{catalog_size, PersonaGenerator, PersonaPromptSettings};
pub use types::{Persona, PersonaInfo, PersonaMode};
