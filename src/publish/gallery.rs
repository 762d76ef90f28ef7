//! Gallery renderer: one self-contained HTML page listing every summarized
//! article with category filters and per-persona tabs.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{debug, info};

use crate::aggregate::{category_id, UnifiedArticle, UnifiedCatalog};
use crate::error::{Error, Result};
use crate::text::{display_name, truncate_ellipsis};

use super::category::categorize;

/// Characters of the source article shown on each card
pub const EXCERPT_CHARS: usize = 300;

/// Characters of a persona description shown under a summary
pub const DESCRIPTION_CHARS: usize = 300;

/// First paragraph of a markdown document with headings and blank lines
/// removed, cut to `max_chars`.
pub fn markdown_excerpt(content: &str, max_chars: usize) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| truncate_ellipsis(line, max_chars))
        .unwrap_or_default()
}

/// Counts from one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryReport {
    pub articles: usize,
    pub categories: usize,
}

pub struct GalleryRenderer {
    /// Base directory for relative source paths
    source_root: Option<PathBuf>,
}

impl GalleryRenderer {
    pub fn new(source_root: Option<PathBuf>) -> Self {
        Self { source_root }
    }

    fn resolve_source(&self, file_path: &str) -> Option<PathBuf> {
        if file_path.trim().is_empty() {
            return None;
        }
        let path = PathBuf::from(file_path);
        if path.is_file() {
            return Some(path);
        }
        let root = self.source_root.as_ref()?;
        let joined = root.join(&path);
        joined.is_file().then_some(joined)
    }

    /// Excerpt of the article's source, empty when it cannot be read.
    pub fn excerpt(&self, article: &UnifiedArticle) -> String {
        let Some(path) = self.resolve_source(&article.file_path) else {
            return String::new();
        };
        match fs::read_to_string(&path) {
            Ok(content) => markdown_excerpt(&content, EXCERPT_CHARS),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot read article for excerpt");
                String::new()
            }
        }
    }

    pub fn render(&self, catalog: &UnifiedCatalog) -> (String, GalleryReport) {
        let articles: Vec<&UnifiedArticle> = catalog.summarized().collect();
        let categories: BTreeSet<&'static str> =
            articles.iter().map(|a| categorize(&a.file_path)).collect();

        let mut html = String::with_capacity(16 * 1024);
        html.push_str(PAGE_HEAD);

        html.push_str(
            "            <div class=\"category-buttons\">\n                <button class=\"filter-btn active\" data-category=\"all\">All Categories</button>\n",
        );
        for category in &categories {
            let _ = writeln!(
                html,
                "                <button class=\"filter-btn\" data-category=\"{}\">{}</button>",
                encode_double_quoted_attribute(&category_id(category)),
                encode_text(category)
            );
        }
        html.push_str("            </div>\n        </div>\n\n        <div class=\"articles\">\n");

        for article in &articles {
            self.render_card(&mut html, article);
        }

        html.push_str("        </div>\n    </div>\n");
        html.push_str(PAGE_TAIL);

        let report = GalleryReport {
            articles: articles.len(),
            categories: categories.len(),
        };
        (html, report)
    }

    fn render_card(&self, html: &mut String, article: &UnifiedArticle) {
        let category = categorize(&article.file_path);
        let _ = write!(
            html,
            concat!(
                "            <div class=\"article-card\" data-category=\"{cat_id}\">\n",
                "                <div class=\"article-header\">\n",
                "                    <div class=\"category-tag\">{cat}</div>\n",
                "                    <h3 class=\"article-title\">{title}</h3>\n",
                "                </div>\n",
                "                <div class=\"article-excerpt\">\n",
                "                    <p>{excerpt}</p>\n",
                "                </div>\n",
                "                <div class=\"persona-tabs\">\n",
            ),
            cat_id = encode_double_quoted_attribute(&category_id(category)),
            cat = encode_text(category),
            title = encode_text(&article.title),
            excerpt = encode_text(&self.excerpt(article)),
        );

        for (i, name) in article.summaries.keys().enumerate() {
            let _ = writeln!(
                html,
                "                    <button class=\"persona-tab{}\" data-persona=\"{}\">{}</button>",
                if i == 0 { " active" } else { "" },
                encode_double_quoted_attribute(name),
                encode_text(&display_name(name))
            );
        }
        html.push_str("                </div>\n                <div class=\"summaries\">\n");

        for (i, (name, summary)) in article.summaries.iter().enumerate() {
            let _ = write!(
                html,
                concat!(
                    "                    <div class=\"summary{active}\" data-persona=\"{name}\">\n",
                    "                        <div class=\"summary-content\">{summary}</div>\n",
                    "                        <div class=\"persona-info\">\n",
                    "                            <span class=\"persona-name\">{display}</span>\n",
                ),
                active = if i == 0 { " active" } else { "" },
                name = encode_double_quoted_attribute(name),
                summary = encode_text(summary),
                display = encode_text(&display_name(name)),
            );
            if let Some(description) = article.description(name) {
                let _ = write!(
                    html,
                    concat!(
                        "                            <button class=\"show-persona-info\">Show character info</button>\n",
                        "                            <div class=\"persona-description\">{}</div>\n",
                    ),
                    encode_text(&truncate_ellipsis(description, DESCRIPTION_CHARS))
                );
            }
            html.push_str("                        </div>\n                    </div>\n");
        }
        html.push_str("                </div>\n            </div>\n");
    }

    /// Render and write the gallery to `path`, creating parent directories.
    pub fn write(&self, catalog: &UnifiedCatalog, path: &Path) -> Result<GalleryReport> {
        let (html, report) = self.render(catalog);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
        }
        fs::write(path, html).map_err(|e| Error::io_write(path, e))?;
        info!(
            path = %path.display(),
            articles = report.articles,
            categories = report.categories,
            "Gallery written"
        );
        Ok(report)
    }
}

// ─────────────────────────────────────────────────────────────────
// Page template
// ─────────────────────────────────────────────────────────────────

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Blog Articles with Character Summaries</title>
    <style>
        :root {
            --primary-color: #6d4c41;
            --secondary-color: #8d6e63;
            --accent-color: #ff7043;
            --light-bg: #f5f5f5;
            --card-bg: #ffffff;
            --text-color: #333333;
            --header-bg: #5d4037;
        }
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6; color: var(--text-color); background: var(--light-bg); margin: 0; }
        header { background: var(--header-bg); color: #fff; padding: 2rem; text-align: center; }
        h1 { margin: 0; font-size: 2.5rem; }
        .subtitle { font-style: italic; margin-top: 0.5rem; }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        .filters { margin-bottom: 2rem; text-align: center; }
        button { background: var(--secondary-color); color: #fff; border: none; padding: 0.5rem 1rem; margin: 0.25rem; border-radius: 4px; cursor: pointer; }
        button.active { background: var(--accent-color); }
        .articles { display: grid; grid-template-columns: repeat(auto-fill, minmax(350px, 1fr)); gap: 2rem; }
        .article-card { background: var(--card-bg); border-radius: 8px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); overflow: hidden; }
        .article-header { background: var(--primary-color); color: #fff; padding: 1rem; }
        .category-tag { font-size: 0.8rem; text-transform: uppercase; opacity: 0.8; }
        .article-title { margin: 0.5rem 0 0; }
        .article-excerpt { padding: 0 1rem; color: #666; font-size: 0.9rem; }
        .persona-tabs { display: flex; flex-wrap: wrap; padding: 0 1rem; }
        .persona-tab { font-size: 0.8rem; }
        .summary { display: none; padding: 1rem; }
        .summary.active { display: block; }
        .summary-content { white-space: pre-wrap; }
        .persona-info { margin-top: 0.5rem; font-size: 0.85rem; }
        .persona-name { font-weight: bold; color: var(--primary-color); }
        .persona-description { display: none; margin-top: 0.5rem; font-style: italic; }
        footer { text-align: center; padding: 2rem; color: #888; }
        @media (max-width: 768px) {
            .articles { grid-template-columns: 1fr; }
            .container { padding: 1rem; }
        }
    </style>
</head>
<body>
    <header>
        <h1>Blog Articles with Character Summaries</h1>
        <div class="subtitle">Explore articles through the eyes of different characters</div>
    </header>

    <div class="container">
        <div class="filters">
            <h2>Filter by Category</h2>
"#;

const PAGE_TAIL: &str = r#"
    <footer>
        <p>Generated by persona-digest</p>
    </footer>

    <script>
        const filterButtons = document.querySelectorAll('.filter-btn');
        const cards = document.querySelectorAll('.article-card');

        filterButtons.forEach(button => {
            button.addEventListener('click', () => {
                filterButtons.forEach(btn => btn.classList.remove('active'));
                button.classList.add('active');
                const category = button.getAttribute('data-category');
                cards.forEach(card => {
                    const show = category === 'all' || card.getAttribute('data-category') === category;
                    card.style.display = show ? 'block' : 'none';
                });
            });
        });

        document.querySelectorAll('.persona-tab').forEach(tab => {
            tab.addEventListener('click', () => {
                const persona = tab.getAttribute('data-persona');
                const card = tab.closest('.article-card');
                card.querySelectorAll('.persona-tab').forEach(t => t.classList.remove('active'));
                tab.classList.add('active');
                card.querySelectorAll('.summary').forEach(summary => {
                    summary.classList.toggle('active', summary.getAttribute('data-persona') === persona);
                });
            });
        });

        document.querySelectorAll('.show-persona-info').forEach(button => {
            button.addEventListener('click', () => {
                const description = button.nextElementSibling;
                const hidden = description.style.display !== 'block';
                description.style.display = hidden ? 'block' : 'none';
                button.textContent = hidden ? 'Hide character info' : 'Show character info';
            });
        });
    </script>
</body>
</html>
"#;
