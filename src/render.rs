//! Builds list-item views and pushes their updates to the host sink.

use std::sync::Arc;

use tracing::debug;

use crate::core::{ImageRecord, ItemView, RecordId, UiEvent, UiSink, quality_percent};
use crate::utils::format_size;

/// Placeholder shown while the first compression is in flight.
pub const PROCESSING_LABEL: &str = "Processing...";

/// Translates record changes into [`UiEvent`]s.
///
/// Holds no view state of its own: the registry record is the single source
/// of truth and every emit is derived from it at call time.
#[derive(Clone)]
pub struct Renderer {
    sink: Arc<dyn UiSink>,
}

impl Renderer {
    pub fn new(sink: Arc<dyn UiSink>) -> Self {
        Self { sink }
    }

    /// Makes the results list visible; fired on the first accepted intake.
    pub fn show_list(&self) {
        self.sink.emit(UiEvent::ListShown);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("UI warning: {}", message);
        self.sink.emit(UiEvent::Warning { message });
    }

    /// Emits the initial list item for a freshly decoded record.
    pub fn create_item(&self, record: &ImageRecord) {
        let view = ItemView {
            id: record.id.clone(),
            filename: record.source.name.clone(),
            original_preview: record.source.as_blob(),
            original_size_label: format_size(record.source.size()),
            compressed_size_label: PROCESSING_LABEL.to_string(),
            quality_label: format!("{}%", quality_percent(record.quality)),
        };
        self.sink.emit(UiEvent::ItemCreated { view });
    }

    /// Refreshes the compressed preview and size label after an encode lands.
    pub fn update_compressed(&self, record: &ImageRecord) {
        let Some(blob) = &record.compressed else {
            return;
        };
        self.sink.emit(UiEvent::CompressedUpdated {
            id: record.id.clone(),
            preview: blob.clone(),
            compressed_size_label: format_size(blob.size()),
        });
    }

    /// Mirrors a quality change onto the item's slider label.
    pub fn update_quality(&self, record: &ImageRecord) {
        self.sink.emit(UiEvent::QualityChanged {
            id: record.id.clone(),
            quality_label: format!("{}%", quality_percent(record.quality)),
        });
    }

    /// Badges an item whose latest compression failed.
    pub fn mark_failed(&self, id: &RecordId) {
        self.sink.emit(UiEvent::ItemFailed { id: id.clone() });
    }
}
