//! Static JSON API: an index resource, one resource per article and one per
//! persona, plus a README describing them.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{category_id, persona_slug, UnifiedCatalog};
use crate::error::{Error, Result};
use crate::summary::{write_json, NamedMap};

use super::category::categorize;

pub const INDEX_FILE: &str = "index.json";
pub const README_FILE: &str = "README.md";

pub fn article_file_name(id: &str) -> String {
    format!("article_{}.json", id)
}

pub fn persona_file_name(name: &str) -> String {
    format!("persona_{}.json", persona_slug(name))
}

// ─────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleEntry {
    pub id: String,
    pub title: String,
    pub category: String,
    pub persona_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaIndexEntry {
    pub name: String,
    pub display_name: String,
    pub article_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub name: String,
    pub id: String,
    pub article_count: usize,
}

/// `index.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiIndex {
    pub articles: Vec<ArticleEntry>,
    pub personas: Vec<PersonaIndexEntry>,
    pub categories: Vec<CategoryEntry>,
}

/// `article_<id>.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleResource {
    pub id: String,
    pub title: String,
    pub category: String,
    pub summaries: NamedMap<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaArticle {
    pub id: String,
    pub title: String,
    pub summary: String,
}

/// `persona_<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonaResource {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub example: String,
    pub article_count: usize,
    pub articles: Vec<PersonaArticle>,
}

/// Every resource of one export, built in memory.
#[derive(Debug, Clone, Default)]
pub struct ApiBundle {
    pub index: ApiIndex,
    pub articles: Vec<ArticleResource>,
    pub personas: Vec<PersonaResource>,
}

impl ApiBundle {
    /// Build all resources from a catalog. Articles without summaries are
    /// left out.
    pub fn from_catalog(catalog: &UnifiedCatalog) -> Self {
        let mut bundle = ApiBundle::default();
        let mut categories: BTreeMap<&'static str, usize> = BTreeMap::new();

        for article in catalog.summarized() {
            let category = categorize(&article.file_path);
            *categories.entry(category).or_default() += 1;

            bundle.index.articles.push(ArticleEntry {
                id: article.id.clone(),
                title: article.title.clone(),
                category: category.to_string(),
                persona_count: article.summaries.len(),
            });
            bundle.articles.push(ArticleResource {
                id: article.id.clone(),
                title: article.title.clone(),
                category: category.to_string(),
                summaries: article.summaries.clone(),
            });
        }

        for entry in catalog.persona_directory() {
            let articles = catalog
                .articles_for_persona(&entry.name)
                .filter_map(|a| {
                    Some(PersonaArticle {
                        id: a.id.clone(),
                        title: a.title.clone(),
                        summary: a.summaries.get(&entry.name)?.clone(),
                    })
                })
                .collect();

            bundle.index.personas.push(PersonaIndexEntry {
                name: entry.name.clone(),
                display_name: entry.display_name.clone(),
                article_count: entry.article_count,
            });
            bundle.personas.push(PersonaResource {
                name: entry.name,
                display_name: entry.display_name,
                description: entry.description,
                example: entry.example,
                article_count: entry.article_count,
                articles,
            });
        }

        bundle.index.categories = categories
            .into_iter()
            .map(|(name, article_count)| CategoryEntry {
                name: name.to_string(),
                id: category_id(name),
                article_count,
            })
            .collect();
        bundle
    }
}

/// Counts from one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub articles: usize,
    pub personas: usize,
    pub categories: usize,
    pub files_written: usize,
}

// ─────────────────────────────────────────────────────────────────
// Exporter
// ─────────────────────────────────────────────────────────────────

pub struct ApiExporter {
    out_dir: PathBuf,
}

impl ApiExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Write every resource of `catalog` into the output directory.
    ///
    /// Two titles with the same slug share one article file; the later one
    /// in key order overwrites the earlier.
    pub fn export(&self, catalog: &UnifiedCatalog) -> Result<ExportReport> {
        fs::create_dir_all(&self.out_dir).map_err(|e| Error::io_write(&self.out_dir, e))?;
        let bundle = ApiBundle::from_catalog(catalog);
        let mut files_written = 0;

        write_json(&self.out_dir.join(INDEX_FILE), &bundle.index)?;
        files_written += 1;

        for article in &bundle.articles {
            let path = self.out_dir.join(article_file_name(&article.id));
            debug!(path = %path.display(), "Writing article resource");
            write_json(&path, article)?;
            files_written += 1;
        }

        for persona in &bundle.personas {
            let path = self.out_dir.join(persona_file_name(&persona.name));
            debug!(path = %path.display(), "Writing persona resource");
            write_json(&path, persona)?;
            files_written += 1;
        }

        let readme = self.out_dir.join(README_FILE);
        fs::write(&readme, readme_text()).map_err(|e| Error::io_write(&readme, e))?;
        files_written += 1;

        let report = ExportReport {
            articles: bundle.articles.len(),
            personas: bundle.personas.len(),
            categories: bundle.index.categories.len(),
            files_written,
        };
        info!(
            dir = %self.out_dir.display(),
            articles = report.articles,
            personas = report.personas,
            files = report.files_written,
            "API export complete"
        );
        Ok(report)
    }
}

fn readme_text() -> String {
    format!(
        r#"# Persona Summaries API

Static JSON resources generated from the persona summary records.

## Resources

### `{index}`

Lists every article, persona and category.

- `articles`: `id`, `title`, `category`, `persona_count`
- `personas`: `name`, `display_name`, `article_count`
- `categories`: `name`, `id`, `article_count`

### `article_[id].json`

One article: `id`, `title`, `category` and `summaries`, a map from persona
name to summary text. The id is the lower-cased title with spaces replaced
by `-`, `&` replaced by `and` and punctuation removed.

### `persona_[name].json`

One persona: `name`, `display_name`, `description`, `example`,
`article_count` and `articles`, a list of `id`, `title` and `summary`.
The name is lower-cased with spaces replaced by `_`.

## Examples

```
GET /api/{index}
GET /api/article_foundational-principles-of-data-structures.json
GET /api/persona_catgirl.json
```
"#,
        index = INDEX_FILE
    )
}
