//! Per-image record state and id generation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::core::types::{Bitmap, Blob, SourceFile};

/// Opaque identifier for one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a session-unique record id.
///
/// Epoch-millis timestamp plus a process-wide counter suffix; the counter
/// alone guarantees no collision within the session, the timestamp keeps ids
/// recognizable across runs.
pub fn new_record_id() -> RecordId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    RecordId(format!("image-{}-{}", millis, suffix))
}

/// Lifecycle of a record's compressed side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordState {
    /// Compression has been requested but no result has landed yet
    Processing,
    /// The latest committed compression succeeded
    Compressed,
    /// The latest committed compression failed
    Failed,
}

/// Everything kept for one uploaded image: source bytes, decoded bitmap,
/// current quality, and the most recent compression result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: RecordId,
    pub source: SourceFile,
    #[serde(skip)]
    pub bitmap: Bitmap,
    /// Quality fraction in [0, 1] used for the next compression
    pub quality: f64,
    /// Present once compression has completed at least once
    pub compressed: Option<Blob>,
    pub state: RecordState,
    /// Stamp of the most recently issued compression request
    #[serde(skip)]
    compress_seq: u64,
}

impl ImageRecord {
    pub fn new(source: SourceFile, bitmap: Bitmap, quality: f64) -> Self {
        Self {
            id: new_record_id(),
            source,
            bitmap,
            quality,
            compressed: None,
            state: RecordState::Processing,
            compress_seq: 0,
        }
    }

    /// Stamps a new compression request and returns its sequence number.
    ///
    /// Completions carrying an older stamp must be discarded; see
    /// [`ImageRecord::is_current`].
    pub fn begin_compression(&mut self) -> u64 {
        self.compress_seq += 1;
        self.compress_seq
    }

    /// Whether a completion with the given stamp is still the latest request.
    pub fn is_current(&self, seq: u64) -> bool {
        self.compress_seq == seq
    }
}
