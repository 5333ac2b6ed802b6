//! Calibration and tuning constants shared across the viewer and the relay.
//!
//! The sensor calibration values map the tracking system's coordinate space
//! onto scene units and must stay bit-for-bit stable: the deployed sensors
//! were calibrated against them.

/// Offset subtracted from / added to sensor coordinates before scaling.
pub const SENSOR_OFFSET: f64 = 700.0;
/// Sensor units per scene unit.
pub const SENSOR_SCALE: f64 = 40.0;
/// Fraction of the remaining distance an avatar covers each frame.
///
/// Applied per frame rather than per second, so movement speed follows the
/// display refresh rate.
pub const STEP_FRACTION: f32 = 0.0185;
/// Distance below which an avatar counts as arrived and stops turning.
pub const ARRIVAL_EPSILON: f32 = 0.001;
/// Playback rate applied to avatar walk cycles.
pub const ANIMATION_TIME_SCALE: f32 = 0.8;
/// Rolls above this value pick the alternate avatar model.
pub const ALTERNATE_VARIANT_THRESHOLD: f64 = 0.9;

/// Interval between snapshot fetches in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 1000;
/// Relay endpoint path serving the snapshot.
pub const SNAPSHOT_PATH: &str = "/api/redis-data";
/// Default relay URL polled by the viewer.
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000/api/redis-data";
/// Default address the relay binds to.
pub const DEFAULT_RELAY_BIND: &str = "0.0.0.0:3000";
/// Default Redis connection URL for the relay.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";
/// Redis list holding the identifiers of currently tracked people.
pub const DEFAULT_LIST_KEY: &str = "id_list";

/// Horizontal shift applied to every static scene object.
pub const SCENE_SHIFT_X: f32 = -5.0;
/// Depth shift applied to every static scene object.
pub const SCENE_SHIFT_Z: f32 = 10.0;
