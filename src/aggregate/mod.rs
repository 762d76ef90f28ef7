//! Aggregator: merges summary records from several directories and
//! pipeline variants into one view per article.

pub mod catalog;
pub mod key;
pub mod matcher;
pub mod variants;

pub use catalog::{Aggregator, UnifiedArticle, UnifiedCatalog};
pub use key::{category_id, persona_slug, KeyStrategy};
pub use matcher::MatchKind;
