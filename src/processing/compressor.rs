//! Sequence-stamped re-encoding of registry records.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::core::{RecordId, RecordState, Registry};
use crate::processing::codec::{ImageCodec, jpeg_blob};
use crate::render::Renderer;
use crate::utils::{CompressorError, CompressorResult};

/// How a compression request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressOutcome {
    /// The encode finished and its result was committed to the record
    Completed,
    /// A newer request was issued while this one was in flight; the result
    /// was discarded
    Superseded,
}

/// Re-encodes records at their current quality and commits results.
///
/// Every request stamps the record before encoding and re-checks the stamp
/// before committing, so the record's blob always reflects the most recently
/// issued quality even when completions arrive out of order.
#[derive(Clone)]
pub struct Compressor {
    registry: Arc<Mutex<Registry>>,
    codec: Arc<dyn ImageCodec>,
    renderer: Renderer,
}

impl Compressor {
    pub fn new(
        registry: Arc<Mutex<Registry>>,
        codec: Arc<dyn ImageCodec>,
        renderer: Renderer,
    ) -> Self {
        Self {
            registry,
            codec,
            renderer,
        }
    }

    /// Runs one compression cycle for the record.
    ///
    /// The registry lock is held only to snapshot inputs and to commit; the
    /// encode itself runs unlocked so other records keep making progress.
    pub async fn compress(&self, id: &RecordId) -> CompressorResult<CompressOutcome> {
        let (bitmap, quality, seq) = {
            let mut registry = self.registry.lock().await;
            let record = registry
                .get_mut(id)
                .ok_or_else(|| CompressorError::unknown_record(id))?;
            let seq = record.begin_compression();
            (record.bitmap.clone(), record.quality, seq)
        };
        debug!("Compressing {} at quality {:.2} (seq {})", id, quality, seq);

        let encoded = self.codec.encode_jpeg(&bitmap, quality).await;

        let mut registry = self.registry.lock().await;
        let record = registry
            .get_mut(id)
            .ok_or_else(|| CompressorError::unknown_record(id))?;
        if !record.is_current(seq) {
            debug!("Discarding superseded compression for {} (seq {})", id, seq);
            return Ok(CompressOutcome::Superseded);
        }

        match encoded {
            Ok(bytes) => {
                record.compressed = Some(jpeg_blob(bytes));
                record.state = RecordState::Compressed;
                self.renderer.update_compressed(record);
                Ok(CompressOutcome::Completed)
            }
            Err(e) => {
                warn!("Compression failed for {}: {}", id, e);
                record.state = RecordState::Failed;
                self.renderer.mark_failed(id);
                Err(e)
            }
        }
    }

    /// Fans out independent recompressions, one task per record.
    ///
    /// Individual failures are already surfaced on their items, so the
    /// fan-out itself never fails the batch.
    pub async fn compress_all(&self, ids: Vec<RecordId>) {
        let mut tasks = JoinSet::new();
        for id in ids {
            let compressor = self.clone();
            tasks.spawn(async move { compressor.compress(&id).await });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Recompression failed: {}", e),
                Err(e) => warn!("Recompression task panicked: {}", e),
            }
        }
    }
}
