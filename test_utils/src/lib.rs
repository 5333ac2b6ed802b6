//! Test doubles shared by the crowd3d integration tests.
//!
//! - [`loader`]: a model loader that answers requests without assets.
//! - [`sources`]: snapshot sources the test controls.
//! - [`store`]: an in-memory record store for the relay.

pub mod loader;
pub mod sources;
pub mod store;

pub use loader::{release_held_models, HeldModelRequests, InstantModelPlugin};
pub use sources::SwitchableSource;
pub use store::MemoryStore;

use crowd3d::{FieldMap, Snapshot};

/// Builds a snapshot from `(id, x, y)` sensor readings.
#[must_use]
pub fn snapshot_of(readings: &[(&str, f64, f64)]) -> Snapshot {
    readings
        .iter()
        .map(|&(id, x, y)| {
            let fields: FieldMap = [("x", x), ("y", y)].into_iter().collect();
            (id, fields)
        })
        .collect()
}

/// Sensor reading that lands on scene position `(scene_x, 0, scene_z)`.
#[must_use]
pub fn sensor_for_scene(scene_x: f64, scene_z: f64) -> (f64, f64) {
    (scene_z * 40.0 - 700.0, scene_x * 40.0 + 700.0)
}
