//! A headless crowd `App` that rspec scenario state can carry around.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bevy::prelude::App;

struct AppCell(App);

// SAFETY: the app is only reached through `SharedApp::with`, which holds the
// mutex for the whole call, and scenarios run on one thread.
unsafe impl Send for AppCell {}

/// Cloneable handle to one app; clones drive the same world.
#[derive(Clone)]
pub struct SharedApp(Arc<Mutex<AppCell>>);

impl SharedApp {
    /// Takes ownership of a configured app.
    pub fn new(app: App) -> Self {
        Self(Arc::new(Mutex::new(AppCell(app))))
    }

    /// Runs `f` with exclusive access to the app.
    ///
    /// A scenario that panicked mid-frame leaves the app usable for the next.
    pub fn with<R>(&self, f: impl FnOnce(&mut App) -> R) -> R {
        let mut cell = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cell.0)
    }
}

impl fmt::Debug for SharedApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedApp")
    }
}
