//! Markdown article discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Markdown files under `root`, sorted by path, skipping any whose file
/// name is in `exclude`. `limit == 0` means no limit.
///
/// An unreadable root is an error; unreadable entries below it are skipped.
pub fn discover_articles(root: &Path, exclude: &[String], limit: usize) -> Result<Vec<PathBuf>> {
    fs::read_dir(root).map_err(|e| Error::io_read(root, e))?;

    let mut articles = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if exclude.iter().any(|ex| ex.as_str() == name) {
            debug!(path = %entry.path().display(), "Excluded");
            continue;
        }

        articles.push(entry.into_path());
        if limit > 0 && articles.len() == limit {
            break;
        }
    }

    Ok(articles)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}
