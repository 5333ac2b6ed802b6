//! Snapshot sources driven by the test.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crowd3d::polling::{FetchError, SnapshotSource};
use crowd3d::Snapshot;

#[derive(Debug, Default)]
struct Shared {
    next: Mutex<Option<Snapshot>>,
    calls: AtomicUsize,
}

/// Serves whatever snapshot the test last set, or fails when told to.
///
/// Clones share state, so a test can keep one handle and give another to
/// the app.
#[derive(Debug, Clone, Default)]
pub struct SwitchableSource {
    shared: Arc<Shared>,
}

impl SwitchableSource {
    /// Creates a source serving `snapshot`.
    #[must_use]
    pub fn serving(snapshot: Snapshot) -> Self {
        let source = Self::default();
        source.set(snapshot);
        source
    }

    /// Serves `snapshot` from the next fetch on.
    pub fn set(&self, snapshot: Snapshot) {
        *self.lock() = Some(snapshot);
    }

    /// Fails every fetch from now on until [`set`](Self::set) is called.
    pub fn fail(&self) {
        *self.lock() = None;
    }

    /// Number of fetches made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Snapshot>> {
        self.shared
            .next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotSource for SwitchableSource {
    fn fetch(&self) -> Result<Snapshot, FetchError> {
        self.shared.calls.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .clone()
            .ok_or_else(|| FetchError::Transport("relay switched off by test".into()))
    }
}
