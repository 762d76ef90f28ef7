//! Recognized record file names.
//!
//! Every pipeline variant writes `<stem>_<variant>_summaries.json`; records
//! from older runs use `_multi_` or no variant at all.

use std::path::Path;

use crate::summary::RECORD_SUFFIX;

/// Variant suffixes, most specific first.
pub const VARIANT_SUFFIXES: [&str; 6] = [
    "_fixed_summaries.json",
    "_single_summaries.json",
    "_dynamic_summaries.json",
    "_mixed_summaries.json",
    "_multi_summaries.json",
    RECORD_SUFFIX,
];

fn matching_suffix(file_name: &str) -> Option<&'static str> {
    VARIANT_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix))
}

/// Whether `path` names a summary record.
pub fn is_record_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| matching_suffix(n).is_some())
        .unwrap_or(false)
}

/// Variant name encoded in a record file name (`"fixed"`, `"multi"`, ...),
/// `None` for plain `_summaries.json` records and non-record files.
pub fn variant_of(file_name: &str) -> Option<&'static str> {
    let suffix = matching_suffix(file_name)?;
    suffix
        .strip_prefix('_')
        .and_then(|s| s.strip_suffix(RECORD_SUFFIX))
}

/// Article stem of a record file name.
pub fn strip_variant_suffix(file_name: &str) -> &str {
    match matching_suffix(file_name) {
        Some(suffix) => &file_name[..file_name.len() - suffix.len()],
        None => file_name,
    }
}
