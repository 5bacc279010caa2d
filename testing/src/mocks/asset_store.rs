//! Scripted asset store.

use gatepass_core::providers::{Asset, AssetStore};
use gatepass_core::{PassError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Asset store that fails a fixed number of uploads before succeeding.
///
/// Successful uploads are kept and receive identifiers `asset-1`, `asset-2`, ...
#[derive(Debug, Clone, Default)]
pub struct ScriptedAssetStore {
    failures_remaining: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
    uploads: Arc<Mutex<Vec<(String, Asset)>>>,
}

impl ScriptedAssetStore {
    /// Store that accepts every upload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects the first `failures` uploads.
    #[must_use]
    pub fn failing(failures: usize) -> Self {
        let store = Self::default();
        store.failures_remaining.store(failures, Ordering::SeqCst);
        store
    }

    /// Store that never accepts an upload.
    #[must_use]
    pub fn always_failing() -> Self {
        Self::failing(usize::MAX)
    }

    /// Number of upload attempts seen so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successfully stored assets with their identifiers.
    #[must_use]
    pub fn uploads(&self) -> Vec<(String, Asset)> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl AssetStore for ScriptedAssetStore {
    fn upload(&self, asset: &Asset) -> impl Future<Output = Result<String>> + Send {
        let failures_remaining = Arc::clone(&self.failures_remaining);
        let attempts = Arc::clone(&self.attempts);
        let uploads = Arc::clone(&self.uploads);
        let asset = asset.clone();

        async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

            let should_fail = failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if should_fail {
                return Err(PassError::UpstreamFailure {
                    attempts: attempt,
                    reason: "scripted upload failure".to_string(),
                });
            }

            let mut uploads = uploads
                .lock()
                .map_err(|_| PassError::Internal("Mutex lock failed".into()))?;
            let id = format!("asset-{}", uploads.len() + 1);
            uploads.push((id.clone(), asset));

            Ok(id)
        }
    }
}
