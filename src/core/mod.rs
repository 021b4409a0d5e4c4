//! Core data model: value types, per-image records, the session registry,
//! and the view events the host renders from.

pub mod events;
pub mod record;
pub mod registry;
pub mod types;

pub use events::{ItemView, NullUiSink, UiEvent, UiSink};
pub use record::{ImageRecord, RecordId, RecordState, new_record_id};
pub use registry::Registry;
pub use types::{
    Bitmap, Blob, DEFAULT_QUALITY, JPEG_MIME, PickedFile, SourceFile, quality_percent,
    validate_quality,
};
