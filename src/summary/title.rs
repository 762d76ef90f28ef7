//! Article title derivation.

use std::path::Path;

use crate::text::excerpt;

/// Longest title taken from a plain first line
const FIRST_LINE_TITLE_CHARS: usize = 100;

/// Title of a markdown article.
///
/// The first `# ` heading wins; otherwise the first non-blank line cut to
/// 100 characters; otherwise the file stem with underscores as spaces.
pub fn derive_title(content: &str, path: &Path) -> String {
    if let Some(heading) = content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("# "))
    {
        let title = heading.trim_start_matches('#').trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    if let Some(line) = content.lines().map(str::trim).find(|line| !line.is_empty()) {
        return excerpt(line, FIRST_LINE_TITLE_CHARS).to_string();
    }

    path.file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

/// Title recovered from a file name: `foo_bar-baz` becomes `foo bar baz`.
pub fn title_from_stem(stem: &str) -> String {
    stem.replace(['_', '-'], " ").trim().to_string()
}
