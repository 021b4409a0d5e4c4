//! Lazy loading of the archive capability.
//!
//! The engine behind bulk export is not assumed to be available up front;
//! it is fetched on first need through a host-supplied loader. The state
//! machine below guarantees at most one outstanding load: concurrent
//! exporters attach to the same pending load instead of issuing another.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::export::archive::{ArchiveEngine, ZipArchiveEngine};
use crate::utils::{CompressorError, CompressorResult};

/// Asynchronous source of the archive engine.
///
/// Hosts that pull the engine from somewhere remote implement this; the
/// bundled loader just hands out the in-crate zip engine.
#[async_trait]
pub trait ArchiveEngineLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<Arc<dyn ArchiveEngine>>;
}

/// Loader for the statically linked zip engine.
#[derive(Debug, Default)]
pub struct BundledZipLoader;

#[async_trait]
impl ArchiveEngineLoader for BundledZipLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn ArchiveEngine>> {
        Ok(Arc::new(ZipArchiveEngine))
    }
}

type LoadResult = Result<Arc<dyn ArchiveEngine>, String>;

enum LoadState {
    Unloaded,
    /// A load is in flight; the receiver resolves when it settles
    Loading(watch::Receiver<Option<LoadResult>>),
    Ready(Arc<dyn ArchiveEngine>),
}

/// Shared {unloaded, loading, ready} gate in front of the archive engine.
#[derive(Clone)]
pub struct ArchiveCapability {
    inner: Arc<Inner>,
}

struct Inner {
    loader: Arc<dyn ArchiveEngineLoader>,
    state: Mutex<LoadState>,
}

impl ArchiveCapability {
    pub fn new(loader: Arc<dyn ArchiveEngineLoader>) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                state: Mutex::new(LoadState::Unloaded),
            }),
        }
    }

    /// Whether the engine is already loaded, without triggering a load.
    pub async fn is_ready(&self) -> bool {
        matches!(*self.inner.state.lock().await, LoadState::Ready(_))
    }

    /// Returns the engine, starting or joining a load as needed.
    ///
    /// A failed load reverts the state to unloaded so a later call retries.
    pub async fn ensure_ready(&self) -> CompressorResult<Arc<dyn ArchiveEngine>> {
        let mut rx = {
            let mut state = self.inner.state.lock().await;
            match &*state {
                LoadState::Ready(engine) => return Ok(Arc::clone(engine)),
                LoadState::Loading(rx) => rx.clone(),
                LoadState::Unloaded => {
                    debug!("Starting archive capability load");
                    let (tx, rx) = watch::channel(None);
                    *state = LoadState::Loading(rx.clone());
                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        let outcome: LoadResult = match inner.loader.load().await {
                            Ok(engine) => {
                                *inner.state.lock().await = LoadState::Ready(Arc::clone(&engine));
                                debug!("Archive capability ready");
                                Ok(engine)
                            }
                            Err(e) => {
                                warn!("Archive capability load failed: {}", e);
                                *inner.state.lock().await = LoadState::Unloaded;
                                Err(e.to_string())
                            }
                        };
                        let _ = tx.send(Some(outcome));
                    });
                    rx
                }
            }
        };

        loop {
            if let Some(outcome) = rx.borrow_and_update().clone() {
                return outcome.map_err(CompressorError::capability);
            }
            rx.changed()
                .await
                .map_err(|_| CompressorError::capability("Archive capability load was dropped"))?;
        }
    }
}
