//! On-disk record shapes: one summary record per article and run, plus
//! the batch index written once per run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::persona::{Persona, PersonaInfo, PersonaMode};

/// Persona-keyed map that keeps the order personas were resolved in.
/// Re-inserting a name replaces its value and keeps its position.
pub type NamedMap<V> = IndexMap<String, V>;

/// Suffix shared by every summary record file name
pub const RECORD_SUFFIX: &str = "_summaries.json";

/// Per-persona latency and token counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryStats {
    pub time_seconds: f64,
    pub total_tokens: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Summaries of one article produced by one pipeline run.
///
/// Written once and never edited; a later run writes a new record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub file_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub summaries: NamedMap<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub stats: NamedMap<SummaryStats>,
    #[serde(default, deserialize_with = "nullable")]
    pub personas: NamedMap<PersonaInfo>,
}

/// `null` reads as the empty value
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SummaryRecord {
    pub fn new(file_path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Record the persona's description and example.
    pub fn add_persona(&mut self, persona: &Persona) {
        self.personas.insert(persona.name.clone(), persona.info());
    }

    pub fn add_summary(&mut self, persona_name: &str, text: String, stats: SummaryStats) {
        self.summaries.insert(persona_name.to_string(), text);
        self.stats.insert(persona_name.to_string(), stats);
    }

    /// Read and decode a record file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io_read(path, e))?;
        serde_json::from_str(&content).map_err(|source| Error::RecordParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the record as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

/// Record file names for one batch, in article order.
///
/// An article keeps `<stem>_<mode>_summaries.json` when no other article in
/// the batch shares its stem. Articles sharing a stem are named from their
/// path below `root` instead, `technical/intro.md` giving
/// `technical_intro_<mode>_summaries.json`. Every returned name is distinct.
pub fn record_file_names(articles: &[PathBuf], root: &Path, mode: PersonaMode) -> Vec<String> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for article in articles {
        *stem_counts.entry(article_stem(article)).or_default() += 1;
    }

    let mut taken = HashSet::new();
    articles
        .iter()
        .map(|article| {
            let stem = article_stem(article);
            let base = if stem_counts.get(&stem).copied().unwrap_or(0) > 1 {
                qualified_stem(article, root)
            } else {
                stem
            };

            let mut name = format!("{}_{}{}", base, mode.slug(), RECORD_SUFFIX);
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}-{}_{}{}", base, n, mode.slug(), RECORD_SUFFIX);
                n += 1;
            }
            name
        })
        .collect()
}

fn article_stem(article: &Path) -> String {
    article
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "article".to_string())
}

/// Path below `root` without extension, components joined by `_`
fn qualified_stem(article: &Path, root: &Path) -> String {
    let relative = article.strip_prefix(root).unwrap_or(article).with_extension("");
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        article_stem(article)
    } else {
        parts.join("_")
    }
}

/// Batch-level summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchIndex {
    pub processed_articles: usize,
    /// Articles whose record was written, in completion order
    pub article_files: Vec<String>,
    #[serde(default)]
    pub failed_files: Vec<String>,
    pub mode: PersonaMode,
    pub personas_per_article: usize,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
}

impl BatchIndex {
    pub fn file_name(mode: PersonaMode) -> String {
        format!("summary_index_{}.json", mode.slug())
    }

    pub fn timestamp_now() -> String {
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| Error::io_write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_file_names_unique_stems() {
        let root = Path::new("/blogs");
        let articles = [PathBuf::from("/blogs/technical/ds-basics.md"), PathBuf::from("/blogs/rome.md")];
        assert_eq!(
            record_file_names(&articles, root, PersonaMode::Dynamic),
            ["ds-basics_dynamic_summaries.json", "rome_dynamic_summaries.json"]
        );
        assert_eq!(BatchIndex::file_name(PersonaMode::Mixed), "summary_index_mixed.json");
    }

    #[test]
    fn test_record_file_names_shared_stem_uses_relative_path() {
        let root = Path::new("/blogs");
        let articles = [
            PathBuf::from("/blogs/technical/intro.md"),
            PathBuf::from("/blogs/academic/intro.md"),
            PathBuf::from("/blogs/academic/rome.md"),
        ];
        assert_eq!(
            record_file_names(&articles, root, PersonaMode::Fixed),
            [
                "technical_intro_fixed_summaries.json",
                "academic_intro_fixed_summaries.json",
                "rome_fixed_summaries.json",
            ]
        );
    }

    #[test]
    fn test_record_file_names_never_collide() {
        // `a_b/c.md` and `a/b_c.md` flatten to the same qualified stem
        let root = Path::new("/r");
        let articles = [
            PathBuf::from("/r/a_b/c.md"),
            PathBuf::from("/r/a/b_c.md"),
            PathBuf::from("/r/x/c.md"),
            PathBuf::from("/r/y/b_c.md"),
        ];
        let names = record_file_names(&articles, root, PersonaMode::Single);
        assert_eq!(names[0], "a_b_c_single_summaries.json");
        assert_eq!(names[1], "a_b_c-2_single_summaries.json");
        let distinct: HashSet<&String> = names.iter().collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn test_record_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.json");

        let mut record = SummaryRecord::new("a/b.md", "Title");
        record.add_persona(&Persona::new("zed", "last alphabetically", "z"));
        record.add_persona(&Persona::new("amy", "first alphabetically", "a"));
        record.add_summary("zed", "Z says hi".into(), SummaryStats { time_seconds: 1.5, ..Default::default() });
        record.write(&path).unwrap();

        let loaded = SummaryRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.personas.keys().collect::<Vec<_>>(), ["zed", "amy"]);
    }

    #[test]
    fn test_repeated_summary_keeps_position() {
        let mut record = SummaryRecord::new("a.md", "A");
        record.add_summary("nova", "first".into(), SummaryStats::default());
        record.add_summary("aria", "a".into(), SummaryStats::default());
        record.add_summary("nova", "second".into(), SummaryStats::default());

        assert_eq!(record.summaries.keys().collect::<Vec<_>>(), ["nova", "aria"]);
        assert_eq!(record.summaries.get("nova").map(String::as_str), Some("second"));
        let json = serde_json::to_string(&record.summaries).unwrap();
        assert_eq!(json, r#"{"nova":"second","aria":"a"}"#);
    }

    #[test]
    fn test_record_tolerates_old_shapes() {
        let json = r#"{
            "file_path": "x.md",
            "title": null,
            "summaries": {"teacher": "Class!"},
            "stats": null,
            "personas": {"teacher": "A patient teacher"}
        }"#;
        let record: SummaryRecord = serde_json::from_str(json).unwrap();
        assert!(record.title.is_empty());
        assert!(record.stats.is_empty());
        assert_eq!(record.personas.get("teacher").unwrap().description, "A patient teacher");
    }

    #[test]
    fn test_load_malformed_is_record_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad_summaries.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SummaryRecord::load(&path), Err(Error::RecordParse { .. })));
        assert!(matches!(
            SummaryRecord::load(&dir.path().join("missing.json")),
            Err(Error::IoRead { .. })
        ));
    }

    #[test]
    fn test_batch_index_shape() {
        let index = BatchIndex {
            processed_articles: 1,
            article_files: vec!["a.md".into()],
            failed_files: vec![],
            mode: PersonaMode::Fixed,
            personas_per_article: 5,
            timestamp: "2024-01-02 03:04:05".into(),
        };
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value["mode"], "fixed");
        assert_eq!(value["personas_per_article"], 5);
        assert_eq!(BatchIndex::timestamp_now().len(), 19);
    }
}
