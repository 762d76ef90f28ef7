//! Associating free-text headings with unified articles.

use tracing::info;

use super::catalog::{UnifiedArticle, UnifiedCatalog};

/// How a heading was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Heading key equals the article key
    Exact,
    /// One key contains the other
    Partial,
}

#[derive(Debug, Clone, Copy)]
pub struct TitleMatch<'a> {
    pub kind: MatchKind,
    pub article: &'a UnifiedArticle,
}

impl UnifiedCatalog {
    /// Find the article for `heading`.
    ///
    /// Exact key equality is tried first, then containment in either
    /// direction over articles in key order; the first hit wins. Empty keys
    /// never match by containment. Every partial match is logged.
    pub fn match_title(&self, heading: &str) -> Option<TitleMatch<'_>> {
        let wanted = self.strategy().key_for(heading);
        if wanted.is_empty() {
            return None;
        }

        if let Some(article) = self.get(&wanted) {
            return Some(TitleMatch {
                kind: MatchKind::Exact,
                article,
            });
        }

        let article = self
            .entries()
            .map(|(_, article)| article)
            .filter(|article| !article.key.is_empty())
            .find(|article| article.key.contains(wanted.as_str()) || wanted.contains(article.key.as_str()))?;
        info!(
            heading = %heading,
            matched = %article.title,
            key = %article.key,
            "Partial title match"
        );
        Some(TitleMatch {
            kind: MatchKind::Partial,
            article,
        })
    }
}
