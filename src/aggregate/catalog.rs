//! Unified view over every summary record on disk.
//!
//! Records are merged per article key. Within one article a persona name
//! is unique and the record loaded last wins.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::persona::PersonaInfo;
use crate::summary::{title_from_stem, NamedMap, SummaryRecord};
use crate::text::{display_name, excerpt};

use super::key::{slugify, KeyStrategy};
use super::variants::{is_record_file, strip_variant_suffix, variant_of};

// ─────────────────────────────────────────────────────────────────
// Unified Article
// ─────────────────────────────────────────────────────────────────

/// All summaries known for one article, across variants and directories.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedArticle {
    /// Merge key under the catalog's [`KeyStrategy`]
    pub key: String,
    /// Slug of the title, used for API file names
    pub id: String,
    /// Title of the first record seen for this article
    pub title: String,
    /// First non-empty source path seen
    pub file_path: String,
    pub summaries: NamedMap<String>,
    /// Metadata of personas that have a summary here
    pub personas: NamedMap<PersonaInfo>,
}

impl UnifiedArticle {
    fn new(key: String, title: String) -> Self {
        Self {
            key,
            id: slugify(&title),
            title,
            file_path: String::new(),
            summaries: NamedMap::new(),
            personas: NamedMap::new(),
        }
    }

    fn absorb(&mut self, record: &SummaryRecord) {
        if self.file_path.is_empty() && !record.file_path.is_empty() {
            self.file_path = record.file_path.clone();
        }
        self.summaries
            .extend(record.summaries.iter().map(|(name, text)| (name.clone(), text.clone())));
        for (name, persona) in record.personas.iter() {
            if self.summaries.contains_key(name) {
                self.personas.insert(name.clone(), persona.clone());
            }
        }
    }

    /// Non-empty description recorded for `persona`
    pub fn description(&self, persona: &str) -> Option<&str> {
        self.personas
            .get(persona)
            .map(|p| p.description.as_str())
            .filter(|d| !d.trim().is_empty())
    }

    pub fn has_summaries(&self) -> bool {
        !self.summaries.is_empty()
    }
}

/// A record file that could not be merged.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// One row of the persona directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaEntry {
    pub name: String,
    pub display_name: String,
    /// First description seen for this persona in load order
    pub description: String,
    pub example: String,
    /// Distinct articles holding a summary by this persona
    pub article_count: usize,
}

impl PersonaEntry {
    /// Description of at most `max_chars` characters, ending in "..." when cut.
    pub fn short_description(&self, max_chars: usize) -> String {
        if self.description.chars().count() <= max_chars {
            return self.description.clone();
        }
        format!("{}...", excerpt(&self.description, max_chars.saturating_sub(3)))
    }
}

// ─────────────────────────────────────────────────────────────────
// Unified Catalog
// ─────────────────────────────────────────────────────────────────

/// Result of one aggregation run, ordered by merge key.
#[derive(Debug, Clone, Default)]
pub struct UnifiedCatalog {
    strategy: KeyStrategy,
    articles: BTreeMap<String, UnifiedArticle>,
    persona_info: BTreeMap<String, PersonaInfo>,
    files_loaded: usize,
    skipped: Vec<SkippedFile>,
}

impl UnifiedCatalog {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// Merge one record. `source_name` is the record's own file name, used
    /// when the record carries neither a title nor a source path.
    ///
    /// Returns the key the record was merged under, or `None` when its
    /// title reduces to an empty key.
    pub fn insert_record(&mut self, record: &SummaryRecord, source_name: &str) -> Option<String> {
        let title = record_title(record, source_name);
        let key = self.strategy.key_for(&title);
        if key.is_empty() {
            return None;
        }

        for (name, persona) in record.personas.iter() {
            if persona.description.trim().is_empty() {
                continue;
            }
            self.persona_info
                .entry(name.to_string())
                .or_insert_with(|| persona.clone());
        }

        let article = match self.articles.entry(key.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                debug!(key = %key, title = %title, "New unified article");
                e.insert(UnifiedArticle::new(key.clone(), title))
            }
        };
        article.absorb(record);
        Some(key)
    }

    pub fn get(&self, key: &str) -> Option<&UnifiedArticle> {
        self.articles.get(key)
    }

    /// Articles with at least one summary, in key order.
    pub fn summarized(&self) -> impl Iterator<Item = &UnifiedArticle> {
        self.articles.values().filter(|a| a.has_summaries())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &UnifiedArticle)> {
        self.articles.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn files_loaded(&self) -> usize {
        self.files_loaded
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// First metadata seen for `persona` with a non-empty description
    pub fn persona_info(&self, persona: &str) -> Option<&PersonaInfo> {
        self.persona_info.get(persona)
    }

    /// Every persona with at least one summary, most used first, ties by name.
    pub fn persona_directory(&self) -> Vec<PersonaEntry> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for article in self.articles.values() {
            for name in article.summaries.keys() {
                *counts.entry(name.as_str()).or_default() += 1;
            }
        }

        let mut entries: Vec<PersonaEntry> = counts
            .into_iter()
            .map(|(name, article_count)| {
                let info = self.persona_info(name).cloned().unwrap_or_default();
                PersonaEntry {
                    name: name.to_string(),
                    display_name: display_name(name),
                    description: info.description,
                    example: info.example,
                    article_count,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            b.article_count
                .cmp(&a.article_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries
    }

    /// Articles holding a summary by `persona`, in key order.
    pub fn articles_for_persona<'a>(
        &'a self,
        persona: &'a str,
    ) -> impl Iterator<Item = &'a UnifiedArticle> + 'a {
        self.articles
            .values()
            .filter(move |a| a.summaries.contains_key(persona))
    }
}

/// Title for a record: its own title, else its source stem, else its own
/// file name without the variant suffix.
fn record_title(record: &SummaryRecord, source_name: &str) -> String {
    let title = record.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    let from_source = Path::new(&record.file_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.trim().is_empty());
    match from_source {
        Some(stem) => title_from_stem(&stem),
        None => title_from_stem(strip_variant_suffix(source_name)),
    }
}

// ─────────────────────────────────────────────────────────────────
// Aggregator
// ─────────────────────────────────────────────────────────────────

/// Loads summary records from a list of directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    strategy: KeyStrategy,
}

impl Aggregator {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy }
    }

    /// Record files directly inside `dir`, sorted by name.
    pub fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io_read(dir, e))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_record_file(path))
            .collect();
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Merge every record under `dirs`. Directories are visited in order and
    /// later records overwrite earlier summaries by the same persona.
    ///
    /// Missing directories and unreadable or malformed files are logged and
    /// skipped; this never fails.
    pub fn load_all(&self, dirs: &[PathBuf]) -> UnifiedCatalog {
        let mut catalog = UnifiedCatalog::new(self.strategy);

        for dir in dirs {
            if !dir.exists() {
                debug!(dir = %dir.display(), "Summary directory does not exist, skipping");
                continue;
            }
            let files = match Self::record_files(dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Cannot list summary directory");
                    catalog.skipped.push(SkippedFile {
                        path: dir.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            debug!(dir = %dir.display(), files = files.len(), "Loading summary records");

            for path in files {
                self.load_file(&mut catalog, path);
            }
        }

        info!(
            articles = catalog.len(),
            files = catalog.files_loaded,
            skipped = catalog.skipped.len(),
            "Aggregated summary records"
        );
        catalog
    }

    fn load_file(&self, catalog: &mut UnifiedCatalog, path: PathBuf) {
        let record = match SummaryRecord::load(&path) {
            Ok(record) => record,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable summary record");
                catalog.skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
                return;
            }
        };

        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match catalog.insert_record(&record, &source_name) {
            Some(key) => {
                debug!(
                    file = %path.display(),
                    key = %key,
                    variant = variant_of(&source_name).unwrap_or("plain"),
                    "Merged summary record"
                );
                catalog.files_loaded += 1;
            }
            None => {
                warn!(file = %path.display(), "Summary record title yields an empty key, skipping");
                catalog.skipped.push(SkippedFile {
                    path,
                    reason: "title yields an empty key".to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;
    use crate::summary::SummaryStats;
    use tempfile::TempDir;

    const TITLE: &str = "Foundational Principles of Data Structures";

    fn record(title: &str, summaries: &[(&str, &str)]) -> SummaryRecord {
        let mut r = SummaryRecord::new("blogs/technical/data_structures.md", title);
        for (name, text) in summaries {
            r.add_persona(&Persona::new(*name, format!("{} description", name), ""));
            r.add_summary(name, text.to_string(), SummaryStats::default());
        }
        r
    }

    fn write(dir: &Path, file: &str, record: &SummaryRecord) {
        record.write(&dir.join(file)).unwrap();
    }

    #[test]
    fn test_merges_variants_of_one_article() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "data_structures_fixed_summaries.json",
            &record(TITLE, &[("catgirl", "nya"), ("teacher", "class")]),
        );
        write(
            tmp.path(),
            "data_structures_dynamic_summaries.json",
            &record(TITLE, &[("luna_stardust", "stars")]),
        );

        let catalog = Aggregator::default().load_all(&[tmp.path().to_path_buf()]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.files_loaded(), 2);

        let article = catalog.get("foundational principles of data structures").unwrap();
        assert_eq!(article.title, TITLE);
        assert_eq!(article.id, "foundational-principles-of-data-structures");
        assert_eq!(article.summaries.len(), 3);
        assert_eq!(article.description("teacher"), Some("teacher description"));
    }

    #[test]
    fn test_last_write_wins_by_directory_order() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "x_fixed_summaries.json", &record(TITLE, &[("teacher", "from a"), ("wife", "only a")]));
        write(b.path(), "x_fixed_summaries.json", &record(TITLE, &[("teacher", "from b")]));
        let key = "foundational principles of data structures";

        let ab = Aggregator::default().load_all(&[a.path().to_path_buf(), b.path().to_path_buf()]);
        let ba = Aggregator::default().load_all(&[b.path().to_path_buf(), a.path().to_path_buf()]);

        let ab = &ab.get(key).unwrap().summaries;
        let ba = &ba.get(key).unwrap().summaries;
        assert_eq!(ab.get("teacher").map(String::as_str), Some("from b"));
        assert_eq!(ba.get("teacher").map(String::as_str), Some("from a"));
        // Disjoint personas merge the same either way.
        assert_eq!(ab.get("wife"), ba.get("wife"));
    }

    #[test]
    fn test_malformed_and_missing_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken_summaries.json"), "{ not json").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        write(tmp.path(), "ok_single_summaries.json", &record("Ok", &[("teacher", "t")]));

        let dirs = vec![tmp.path().join("missing"), tmp.path().to_path_buf()];
        let catalog = Aggregator::default().load_all(&dirs);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped().len(), 1);
        assert!(catalog.skipped()[0].path.ends_with("broken_summaries.json"));
    }

    #[test]
    fn test_title_fallbacks() {
        let mut catalog = UnifiedCatalog::new(KeyStrategy::NormalizedTitle);

        let mut from_path = SummaryRecord::new("blogs/graph-theory_basics.md", "");
        from_path.add_summary("teacher", "t".into(), SummaryStats::default());
        assert_eq!(catalog.insert_record(&from_path, "whatever_summaries.json").as_deref(), Some("graph theory basics"));

        let bare = SummaryRecord::new("", "");
        assert_eq!(catalog.insert_record(&bare, "linked_lists_mixed_summaries.json").as_deref(), Some("linked lists"));

        let empty = SummaryRecord::new("", "?!");
        assert_eq!(catalog.insert_record(&empty, "x_summaries.json"), None);
    }

    #[test]
    fn test_descriptions_only_for_summarized_personas() {
        let mut catalog = UnifiedCatalog::new(KeyStrategy::NormalizedTitle);
        let mut r = record(TITLE, &[("teacher", "t")]);
        r.add_persona(&Persona::new("wife", "never summarized", ""));
        catalog.insert_record(&r, "a_summaries.json");

        let (_, article) = catalog.entries().next().unwrap();
        assert!(article.personas.contains_key("teacher"));
        assert!(!article.personas.contains_key("wife"));
    }

    #[test]
    fn test_persona_directory() {
        let mut catalog = UnifiedCatalog::new(KeyStrategy::Slug);
        catalog.insert_record(&record("One", &[("teacher", "a"), ("wife", "b")]), "one_summaries.json");
        catalog.insert_record(&record("Two", &[("teacher", "c")]), "two_summaries.json");
        catalog.insert_record(&record("Two", &[("teacher", "d")]), "two_multi_summaries.json");
        catalog.insert_record(&record("Three", &[("catgirl", "e")]), "three_summaries.json");

        let dir = catalog.persona_directory();
        let rows: Vec<(&str, usize)> = dir.iter().map(|e| (e.name.as_str(), e.article_count)).collect();
        assert_eq!(rows, [("teacher", 2), ("catgirl", 1), ("wife", 1)]);
        assert_eq!(dir[0].display_name, "Teacher");
        assert_eq!(dir[0].description, "teacher description");
        assert_eq!(catalog.articles_for_persona("teacher").count(), 2);
    }

    #[test]
    fn test_short_description() {
        let mut entry = PersonaEntry {
            name: "x".into(),
            display_name: "X".into(),
            description: "a".repeat(200),
            example: String::new(),
            article_count: 1,
        };
        assert_eq!(entry.short_description(200).len(), 200);
        entry.description.push('b');
        let short = entry.short_description(200);
        assert_eq!(short.chars().count(), 200);
        assert!(short.ends_with("aaa..."));
    }
}
