//! Service layer: image acquisition and batch import.

pub mod images;
pub mod import;

pub use images::{is_map_image, ImageStore, MAP_IMAGE_MARKER};
pub use import::{BatchReport, ImportService, IngestError};
