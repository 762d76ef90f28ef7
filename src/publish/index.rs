//! Index merger: appends persona summaries to the matching sections of a
//! markdown index document.
//!
//! The document is split on `---\n`. Section 0 is the preamble and is
//! never touched. A section is updated at most once; the inserted block
//! carries a marker that makes later runs skip it.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use crate::aggregate::{MatchKind, UnifiedArticle, UnifiedCatalog};
use crate::error::{Error, Result};
use crate::persona::{is_fixed, FIXED_PERSONA_NAMES};
use crate::summary::NamedMap;
use crate::text::display_name;

/// Section delimiter
pub const SECTION_DELIMITER: &str = "---\n";

/// Sections containing this text are never updated again
pub const SUMMARY_MARKER: &str = "Character Summaries";

/// Default cap on bullets per section
pub const DEFAULT_MAX_PERSONAS: usize = 4;

const BLOCK_HEADER: &str = "\n\n**Character Summaries:**\n\n";

/// `### [Title]` or `### [**Title**]`
const HEADING_PATTERN: &str = r"###\s+\[(?:\*\*)?([^*\]]+)(?:\*\*)?\]";

/// Section counts from one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Sections after the preamble
    pub sections: usize,
    pub updated: usize,
    /// Updated sections whose heading matched by containment only
    pub partial: usize,
    pub already_summarized: usize,
    /// Titled sections with no matching article or no summaries
    pub unmatched: usize,
    /// Sections without a recognizable heading
    pub untitled: usize,
}

/// Result of [`IndexMerger::merge_file`]
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: String,
    pub report: MergeReport,
    pub written: bool,
}

/// Persona names to list for an article: generated personas in encounter
/// order, then catalog personas in catalog order, at most `max`.
pub fn ordered_personas(summaries: &NamedMap<String>, max: usize) -> Vec<&str> {
    let mut names: Vec<&str> = summaries.keys().map(String::as_str).filter(|name| !is_fixed(name)).collect();
    for name in FIXED_PERSONA_NAMES {
        if summaries.contains_key(name) {
            names.push(name);
        }
    }
    names.truncate(max);
    names
}

pub struct IndexMerger<'a> {
    catalog: &'a UnifiedCatalog,
    max_personas: usize,
    heading: Regex,
}

impl<'a> IndexMerger<'a> {
    pub fn new(catalog: &'a UnifiedCatalog, max_personas: usize) -> Result<Self> {
        let heading = Regex::new(HEADING_PATTERN)
            .map_err(|e| Error::Internal(format!("invalid heading pattern: {}", e)))?;
        Ok(Self {
            catalog,
            max_personas,
            heading,
        })
    }

    /// Title captured from the first heading of `section`.
    pub fn section_title<'s>(&self, section: &'s str) -> Option<&'s str> {
        self.heading
            .captures(section)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
    }

    /// Formatted block for `article`, `None` when it has no summaries.
    pub fn summary_block(&self, article: &UnifiedArticle) -> Option<String> {
        let names = ordered_personas(&article.summaries, self.max_personas);
        if names.is_empty() {
            return None;
        }
        let mut block = String::from(BLOCK_HEADER);
        for name in names {
            let summary = article.summaries.get(name).map(String::as_str).unwrap_or_default();
            block.push_str(&format!("- *{}*: {}\n\n", display_name(name), summary));
        }
        Some(block)
    }

    pub fn merge_with_report(&self, document: &str) -> (String, MergeReport) {
        let mut report = MergeReport::default();
        let mut sections: Vec<String> = document.split(SECTION_DELIMITER).map(str::to_string).collect();

        for section in sections.iter_mut().skip(1) {
            if section.trim().is_empty() {
                continue;
            }
            report.sections += 1;

            let Some(title) = self.section_title(section) else {
                report.untitled += 1;
                continue;
            };
            if section.contains(SUMMARY_MARKER) {
                debug!(title = %title, "Section already has summaries");
                report.already_summarized += 1;
                continue;
            }
            let found = self
                .catalog
                .match_title(title)
                .and_then(|m| self.summary_block(m.article).map(|block| (m.kind, block)));
            let Some((kind, block)) = found else {
                debug!(title = %title, "No summaries for section");
                report.unmatched += 1;
                continue;
            };

            let mut updated = section.trim_end().to_string();
            updated.push_str(&block);
            *section = updated;
            report.updated += 1;
            if kind == MatchKind::Partial {
                report.partial += 1;
            }
        }

        (sections.join(SECTION_DELIMITER), report)
    }

    /// Merge the document at `path` in place, or only compute the merged
    /// text when `dry_run` is set.
    pub fn merge_file(&self, path: &Path, dry_run: bool) -> Result<MergeOutcome> {
        let original = fs::read_to_string(path).map_err(|e| Error::io_read(path, e))?;
        let (document, report) = self.merge_with_report(&original);

        let written = !dry_run && report.updated > 0;
        if written {
            fs::write(path, &document).map_err(|e| Error::io_write(path, e))?;
        }
        info!(
            path = %path.display(),
            updated = report.updated,
            partial = report.partial,
            already_summarized = report.already_summarized,
            unmatched = report.unmatched,
            dry_run,
            "Index merge complete"
        );
        Ok(MergeOutcome {
            document,
            report,
            written,
        })
    }
}
