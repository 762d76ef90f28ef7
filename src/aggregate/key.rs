//! Merge keys and file-name slugs derived from titles and persona names.

/// Characters dropped from article ids. Path separators and characters
/// rejected by common filesystems are dropped as well.
const SLUG_DROPPED: &[char] = &[
    '\'', '"', ':', ',', '.', '(', ')', '/', '\\', '?', '*', '<', '>', '|',
];

/// Case-folded, punctuation-insensitive form of a title.
///
/// Every run of non-alphanumeric characters becomes a single space, so
/// `"Rust: Ownership_and-Borrowing"` and `"rust ownership and borrowing"`
/// normalize identically.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_space = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Article id used in API file names: lower-cased, spaces become `-`,
/// `&` becomes `and`, quotes and punctuation are stripped.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.trim().chars() {
        match c {
            ' ' => out.push('-'),
            '&' => out.push_str("and"),
            c if SLUG_DROPPED.contains(&c) => {}
            c => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Persona file-name component: spaces become `_`, lower-cased.
pub fn persona_slug(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !SLUG_DROPPED.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Category id used in markup classes and the API index.
pub fn category_id(category: &str) -> String {
    category.to_lowercase().replace(" & ", "-").replace(' ', "-")
}

/// How the aggregator keys unified articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStrategy {
    /// [`normalize_title`]; used for matching document headings.
    #[default]
    NormalizedTitle,
    /// [`slugify`]; used where keys become file names.
    Slug,
}

impl KeyStrategy {
    pub fn key_for(&self, title: &str) -> String {
        match self {
            KeyStrategy::NormalizedTitle => normalize_title(title),
            KeyStrategy::Slug => slugify(title),
        }
    }
}
