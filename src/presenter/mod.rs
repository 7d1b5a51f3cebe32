pub mod download;
pub mod extract;

pub use download::{export_references, fetch_reference_bytes, ExportOutcome, PresenterError};
pub use extract::{extract_image_references, queued_job, ImageReference};
