// Module declarations in dependency order
pub mod app;
pub mod core;
pub mod export;
pub mod intake;
pub mod processing;
pub mod render;
pub mod utils;

// Public exports for external consumers
pub use app::App;
pub use crate::core::{
    Bitmap, Blob, DEFAULT_QUALITY, ImageRecord, ItemView, JPEG_MIME, NullUiSink, PickedFile,
    RecordId, RecordState, Registry, UiEvent, UiSink,
};
pub use export::{
    ArchiveBuilder, ArchiveCapability, ArchiveEngine, ArchiveEngineLoader, BundledZipLoader,
    DownloadTrigger, Exporter, NullDownloadTrigger, ZIP_MIME, ZipArchiveEngine,
};
pub use processing::{CompressOutcome, Compressor, ImageCodec, ImageRsCodec};
pub use render::Renderer;
pub use utils::{CompressorError, CompressorResult, ValidationError, format_size, output_filename};
