//! View events emitted to the host UI.
//!
//! The core never touches a widget tree; it describes every visual change as
//! a [`UiEvent`] and hands it to the host's [`UiSink`]. Payloads are small
//! and serializable so a host can also bridge them over a string pipe.

use serde::Serialize;

use crate::core::record::RecordId;
use crate::core::types::Blob;

/// Visual state of one list item at creation time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: RecordId,
    pub filename: String,
    /// Original image bytes for the host's preview element
    pub original_preview: Blob,
    pub original_size_label: String,
    /// Starts at the processing placeholder until the first encode lands
    pub compressed_size_label: String,
    /// Percent label mirroring the item's quality slider
    pub quality_label: String,
}

/// A single visual change for the host to apply.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UiEvent {
    /// The results list becomes visible on first accepted intake
    ListShown,
    /// User-facing warning (rejected batch, decode failure, capability load)
    Warning { message: String },
    /// A new list item for a freshly decoded image
    ItemCreated { view: ItemView },
    /// A finished compression: new preview blob and formatted size
    CompressedUpdated {
        id: RecordId,
        preview: Blob,
        compressed_size_label: String,
    },
    /// A quality slider/label refresh for one item
    QualityChanged { id: RecordId, quality_label: String },
    /// The latest compression for this item failed
    ItemFailed { id: RecordId },
}

impl UiEvent {
    /// JSON payload for hosts that forward events as strings.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Receiver for view events, implemented by the host.
pub trait UiSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

/// Sink that drops every event, for headless use.
#[derive(Debug, Default)]
pub struct NullUiSink;

impl UiSink for NullUiSink {
    fn emit(&self, _event: UiEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_payloads_are_tagged_and_camel_cased() {
        let event = UiEvent::QualityChanged {
            id: crate::core::record::new_record_id(),
            quality_label: "45%".to_string(),
        };
        let payload = event.to_payload();
        assert_eq!(payload["type"], "qualityChanged");
        assert_eq!(payload["qualityLabel"], "45%");
    }

    #[test]
    fn compressed_update_carries_blob_summary() {
        let event = UiEvent::CompressedUpdated {
            id: crate::core::record::new_record_id(),
            preview: Blob::new(vec![0u8; 10], "image/jpeg"),
            compressed_size_label: "10 Bytes".to_string(),
        };
        let payload = event.to_payload();
        assert_eq!(payload["preview"]["mime"], "image/jpeg");
        assert_eq!(payload["preview"]["size"], 10);
    }
}
