//! Session orchestration: wires intake, decoding, the registry, rendering,
//! compression, and export together behind one owned handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::{
    DEFAULT_QUALITY, ImageRecord, PickedFile, RecordId, Registry, SourceFile, UiSink,
    validate_quality,
};
use crate::export::{
    ArchiveCapability, ArchiveEngineLoader, BundledZipLoader, DownloadTrigger, Exporter,
};
use crate::intake;
use crate::processing::{CompressOutcome, Compressor, ImageCodec, ImageRsCodec};
use crate::render::Renderer;
use crate::utils::{CompressorError, CompressorResult};

/// One compression session.
///
/// Owns all per-image state for its lifetime; dropping the `App` drops the
/// session. Clones share the same session, so hosts can hand handles to
/// event callbacks freely.
#[derive(Clone)]
pub struct App {
    registry: Arc<Mutex<Registry>>,
    global_quality: Arc<Mutex<f64>>,
    list_visible: Arc<AtomicBool>,
    codec: Arc<dyn ImageCodec>,
    renderer: Renderer,
    compressor: Compressor,
    exporter: Exporter,
}

impl App {
    /// Builds a session with the production codec and the bundled zip
    /// engine.
    pub fn new(sink: Arc<dyn UiSink>, downloads: Arc<dyn DownloadTrigger>) -> Self {
        Self::with_collaborators(
            Arc::new(ImageRsCodec),
            Arc::new(BundledZipLoader),
            sink,
            downloads,
        )
    }

    /// Builds a session with every host collaborator supplied explicitly.
    pub fn with_collaborators(
        codec: Arc<dyn ImageCodec>,
        loader: Arc<dyn ArchiveEngineLoader>,
        sink: Arc<dyn UiSink>,
        downloads: Arc<dyn DownloadTrigger>,
    ) -> Self {
        let registry = Arc::new(Mutex::new(Registry::new()));
        let renderer = Renderer::new(sink);
        let compressor = Compressor::new(
            Arc::clone(&registry),
            Arc::clone(&codec),
            renderer.clone(),
        );
        let exporter = Exporter::new(
            Arc::clone(&registry),
            ArchiveCapability::new(loader),
            downloads,
            renderer.clone(),
        );
        Self {
            registry,
            global_quality: Arc::new(Mutex::new(DEFAULT_QUALITY)),
            list_visible: Arc::new(AtomicBool::new(false)),
            codec,
            renderer,
            compressor,
            exporter,
        }
    }

    /// Ingests a picked or dropped batch.
    ///
    /// Non-image files are filtered out; a batch with nothing left is
    /// rejected with a warning and no state change. Every decoded file
    /// becomes a registry record with a rendered list item and an initial
    /// compression at the current global quality. Files that fail to
    /// decode are reported and skipped.
    ///
    /// Returns the ids of the records created, in display order.
    pub async fn add_files(&self, files: Vec<PickedFile>) -> CompressorResult<Vec<RecordId>> {
        let accepted = match intake::accept(files) {
            Ok(accepted) => accepted,
            Err(e) => {
                self.renderer.warn("Please select image files.");
                return Err(e);
            }
        };

        if !self.list_visible.swap(true, Ordering::SeqCst) {
            self.renderer.show_list();
        }

        let mut ids = Vec::with_capacity(accepted.len());
        for file in accepted {
            let source = SourceFile::new(file.name, file.mime, file.bytes);
            let bitmap = match self.codec.decode(source.shared_bytes()).await {
                Ok(bitmap) => bitmap,
                Err(e) => {
                    warn!("Decode failed for {}: {}", source.name, e);
                    self.renderer
                        .warn(format!("Could not read {} as an image.", source.name));
                    continue;
                }
            };

            let quality = *self.global_quality.lock().await;
            let record = ImageRecord::new(source, bitmap, quality);
            let id = record.id.clone();
            {
                let mut registry = self.registry.lock().await;
                registry.insert(record)?;
                if let Some(record) = registry.get(&id) {
                    self.renderer.create_item(record);
                }
            }

            // Initial encode; a failure is already badged on the item.
            if let Err(e) = self.compressor.compress(&id).await {
                warn!("Initial compression failed for {}: {}", id, e);
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Updates one record's quality and recompresses it.
    pub async fn set_item_quality(
        &self,
        id: &RecordId,
        fraction: f64,
    ) -> CompressorResult<CompressOutcome> {
        validate_quality(fraction)?;
        {
            let mut registry = self.registry.lock().await;
            let record = registry
                .get_mut(id)
                .ok_or_else(|| CompressorError::unknown_record(id))?;
            record.quality = fraction;
            self.renderer.update_quality(record);
        }
        self.compressor.compress(id).await
    }

    /// Overwrites every record's quality and fans out recompressions.
    pub async fn set_global_quality(&self, fraction: f64) -> CompressorResult<()> {
        validate_quality(fraction)?;
        *self.global_quality.lock().await = fraction;

        let ids = {
            let mut registry = self.registry.lock().await;
            let ids = registry.ids();
            for id in &ids {
                if let Some(record) = registry.get_mut(id) {
                    record.quality = fraction;
                    self.renderer.update_quality(record);
                }
            }
            ids
        };
        debug!(
            "Global quality set to {:.2}; recompressing {} records",
            fraction,
            ids.len()
        );
        self.compressor.compress_all(ids).await;
        Ok(())
    }

    /// The quality fraction new records start at.
    pub async fn global_quality(&self) -> f64 {
        *self.global_quality.lock().await
    }

    /// Downloads one record's compressed blob.
    pub async fn download(&self, id: &RecordId) -> CompressorResult<()> {
        self.exporter.download_single(id).await
    }

    /// Downloads a zip archive of every finished compression.
    pub async fn download_all(&self) -> CompressorResult<()> {
        self.exporter.download_all().await
    }

    /// Snapshot of one record.
    pub async fn record(&self, id: &RecordId) -> Option<ImageRecord> {
        self.registry.lock().await.get(id).cloned()
    }

    /// Snapshot of all records in display order.
    pub async fn records(&self) -> Vec<ImageRecord> {
        self.registry.lock().await.iter().cloned().collect()
    }
}
