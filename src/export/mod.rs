//! Download paths: single compressed blobs and bulk zip archives.

mod archive;
mod capability;

pub use archive::{ArchiveBuilder, ArchiveEngine, ZipArchiveEngine};
pub use capability::{ArchiveCapability, ArchiveEngineLoader, BundledZipLoader};

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::debug;

use crate::core::{Blob, RecordId, Registry};
use crate::render::Renderer;
use crate::utils::{CompressorError, CompressorResult, output_filename};

/// MIME type of the bulk export archive.
pub const ZIP_MIME: &str = "application/zip";

/// Save prompt for a finished blob, implemented by the host.
pub trait DownloadTrigger: Send + Sync {
    fn save(&self, blob: &Blob, filename: &str) -> anyhow::Result<()>;
}

/// Trigger that drops every download, for headless use.
#[derive(Debug, Default)]
pub struct NullDownloadTrigger;

impl DownloadTrigger for NullDownloadTrigger {
    fn save(&self, _blob: &Blob, _filename: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reads finished blobs out of the registry and hands them to the host.
#[derive(Clone)]
pub struct Exporter {
    registry: Arc<Mutex<Registry>>,
    capability: ArchiveCapability,
    downloads: Arc<dyn DownloadTrigger>,
    renderer: Renderer,
}

impl Exporter {
    pub fn new(
        registry: Arc<Mutex<Registry>>,
        capability: ArchiveCapability,
        downloads: Arc<dyn DownloadTrigger>,
        renderer: Renderer,
    ) -> Self {
        Self {
            registry,
            capability,
            downloads,
            renderer,
        }
    }

    /// Downloads one record's compressed blob under the
    /// `compressed_<stem>.<ext>` convention.
    ///
    /// A record whose compression is still in flight is skipped silently.
    pub async fn download_single(&self, id: &RecordId) -> CompressorResult<()> {
        let registry = self.registry.lock().await;
        let record = registry
            .get(id)
            .ok_or_else(|| CompressorError::unknown_record(id))?;
        let Some(blob) = &record.compressed else {
            debug!("Download skipped for {}: no compressed blob yet", id);
            return Ok(());
        };
        let filename = output_filename(&record.source.name, blob.mime());
        debug!("Downloading {} as {}", id, filename);
        self.downloads
            .save(blob, &filename)
            .map_err(|e| CompressorError::io(e.to_string()))
    }

    /// Bundles every finished blob into one zip archive and downloads it.
    ///
    /// Records still compressing are excluded from the archive. If the
    /// archive capability is not ready yet, the user is notified and the
    /// export proceeds as soon as the shared load settles.
    pub async fn download_all(&self) -> CompressorResult<()> {
        if self.registry.lock().await.is_empty() {
            debug!("Bulk export skipped: no records");
            return Ok(());
        }

        if !self.capability.is_ready().await {
            self.renderer
                .warn("Preparing archive support, your download will start shortly...");
        }
        let engine = match self.capability.ensure_ready().await {
            Ok(engine) => engine,
            Err(e) => {
                self.renderer
                    .warn("Archive support is unavailable, please try again shortly.");
                return Err(e);
            }
        };

        let (entries, total) = {
            let registry = self.registry.lock().await;
            let entries: Vec<(String, Arc<Vec<u8>>)> = registry
                .iter()
                .filter_map(|record| {
                    record.compressed.as_ref().map(|blob| {
                        (
                            output_filename(&record.source.name, blob.mime()),
                            blob.shared_bytes(),
                        )
                    })
                })
                .collect();
            (entries, registry.len())
        };
        let included = entries.len();
        if included < total {
            debug!(
                "Bulk export: {}/{} records finished, the rest are excluded",
                included, total
            );
        }

        // Archive generation stays off the async threads.
        let bytes = tokio::task::spawn_blocking(move || -> CompressorResult<Vec<u8>> {
            let mut builder = engine.new_archive();
            for (name, bytes) in &entries {
                builder.add_entry(name, bytes)?;
            }
            builder.finish()
        })
        .await
        .map_err(|e| CompressorError::archive(format!("Archive task failed: {}", e)))??;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let filename = format!("compressed_images_{}.zip", stamp);
        debug!("Downloading {} ({} entries)", filename, included);
        self.downloads
            .save(&Blob::new(bytes, ZIP_MIME), &filename)
            .map_err(|e| CompressorError::io(e.to_string()))
    }
}
