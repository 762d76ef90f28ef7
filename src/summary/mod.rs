//! Summary generation and the record formats it writes.

mod generator;
mod record;
mod title;

pub use generator::{SummaryGenerator, SummaryPromptSettings};
pub use record::{record_file_names, BatchIndex, NamedMap, SummaryRecord, SummaryStats, RECORD_SUFFIX};
pub(crate) use record::write_json;
pub use title::{derive_title, title_from_stem};
