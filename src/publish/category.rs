//! Path-based article categories.

/// Substring rules, first match wins.
const RULES: [(&str, &str); 6] = [
    ("technical/", "Technical"),
    ("academic-historical/", "Academic & Historical"),
    ("reverse-engineering/", "Reverse Engineering"),
    ("chinese-studies/", "Chinese Studies"),
    ("media-analysis/", "Media Analysis"),
    ("dev-tutorials/", "Development Tutorials"),
];

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const GENERAL: &str = "General";

/// Category for an article's source path.
pub fn categorize(file_path: &str) -> &'static str {
    if file_path.trim().is_empty() {
        return UNCATEGORIZED;
    }
    let normalized = file_path.replace('\\', "/");
    RULES
        .iter()
        .find(|(needle, _)| normalized.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(GENERAL)
}
