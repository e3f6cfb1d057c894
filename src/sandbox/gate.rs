//! Template readiness gate.
//!
//! Holds the readiness flag and the lock that decides who builds the
//! template. The flag starts `false`, flips to `true` after the first
//! successful preparation, and only goes back through [`TemplateGate::reset`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use crate::errors::Result;

static GLOBAL_GATE: Lazy<Arc<TemplateGate>> = Lazy::new(|| Arc::new(TemplateGate::new()));

/// Readiness flag plus the preparation lock.
#[derive(Debug, Default)]
pub struct TemplateGate {
    ready: AtomicBool,
    lock: Mutex<()>,
    preparations: AtomicU64,
}

impl TemplateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide gate.
    ///
    /// Providers created without an explicit gate all share this instance.
    pub fn global() -> Arc<TemplateGate> {
        GLOBAL_GATE.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Number of times `init` ran to completion through [`ensure`](Self::ensure)
    pub fn preparations(&self) -> u64 {
        self.preparations.load(Ordering::Acquire)
    }

    /// Forget readiness, as if the process had just started.
    ///
    /// The next [`ensure`](Self::ensure) runs its initializer again.
    pub fn reset(&self) {
        self.ready.store(false, Ordering::Release);
    }

    /// Run `init` unless the gate is already open.
    ///
    /// Concurrent callers collapse into one `init` run: the first holds the
    /// lock while the rest wait, then see the flag set and return `None`.
    /// A failed `init` leaves the flag clear so the next caller retries.
    pub async fn ensure<T, F, Fut>(&self, init: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.is_ready() {
            return Ok(None);
        }

        let _guard = self.lock.lock().await;
        if self.is_ready() {
            return Ok(None);
        }

        let value = init().await?;
        self.preparations.fetch_add(1, Ordering::AcqRel);
        self.ready.store(true, Ordering::Release);
        Ok(Some(value))
    }
}
