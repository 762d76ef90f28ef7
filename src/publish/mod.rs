//! Publishers built on the aggregated catalog: the index merger, the HTML
//! gallery and the static JSON API.

pub mod api;
pub mod category;
pub mod gallery;
pub mod index;

pub use api::ApiExporter;
pub use gallery::GalleryRenderer;
pub use index::{IndexMerger, DEFAULT_MAX_PERSONAS};
