//! Wire types for the crowd snapshot served by the relay.
//!
//! A [`Snapshot`] maps each tracked identifier to its [`FieldMap`]. Field
//! values are floats; values the relay could not parse travel as JSON `null`
//! and decode back to `NaN`, so a snapshot always round-trips through
//! `serde_json` without rejecting the whole payload.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{SENSOR_OFFSET, SENSOR_SCALE};

/// Stable identifier of a tracked person, as listed by the relay.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvatarId(String);

impl AvatarId {
    /// Creates an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AvatarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AvatarId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AvatarId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Field name to value mapping for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(#[serde(deserialize_with = "nan_for_null")] BTreeMap<String, f64>);

fn nan_for_null<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<f64>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| (name, value.unwrap_or(f64::NAN)))
        .collect())
}

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Returns the value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Sensor-space coordinates carried by this entry.
    ///
    /// Missing `x` or `y` fields read as `NaN`, matching an unparsable value.
    #[must_use]
    pub fn sensor_point(&self) -> SensorPoint {
        SensorPoint {
            x: self.get("x").unwrap_or(f64::NAN),
            y: self.get("y").unwrap_or(f64::NAN),
        }
    }

    /// Scene-space target position for this entry.
    #[must_use]
    pub fn scene_position(&self) -> Vec3 {
        self.sensor_point().to_scene()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A position reported by the tracking sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPoint {
    /// Sensor X coordinate.
    pub x: f64,
    /// Sensor Y coordinate.
    pub y: f64,
}

impl SensorPoint {
    /// Maps sensor coordinates onto the scene floor.
    ///
    /// `x' = (-700 + y) / 40`, `y' = 0`, `z' = (700 + x) / 40`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crowd3d::snapshot::SensorPoint;
    /// let scene = SensorPoint { x: 0.0, y: 0.0 }.to_scene();
    /// assert_eq!(scene.to_array(), [-17.5, 0.0, 17.5]);
    /// ```
    #[expect(
        clippy::cast_possible_truncation,
        reason = "scene coordinates are single precision; NaN and overflow propagate as-is"
    )]
    #[must_use]
    pub const fn to_scene(self) -> Vec3 {
        let scene_x = (-SENSOR_OFFSET + self.y) / SENSOR_SCALE;
        let scene_z = (SENSOR_OFFSET + self.x) / SENSOR_SCALE;
        Vec3::new(scene_x as f32, 0.0, scene_z as f32)
    }
}

/// Full identifier to fields mapping returned by one relay request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<AvatarId, FieldMap>);

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parses a relay response body.
    ///
    /// # Errors
    /// Returns the `serde_json` error when the body is not a JSON object of
    /// field maps.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, id: impl Into<AvatarId>, fields: FieldMap) {
        self.0.insert(id.into(), fields);
    }

    /// Looks up the fields recorded for `id`.
    #[must_use]
    pub fn get(&self, id: &AvatarId) -> Option<&FieldMap> {
        self.0.get(id)
    }

    /// Whether `id` is present.
    #[must_use]
    pub fn contains(&self, id: &AvatarId) -> bool {
        self.0.contains_key(id)
    }

    /// Number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot holds no identifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&AvatarId, &FieldMap)> {
        self.0.iter()
    }

    /// Iterates identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &AvatarId> {
        self.0.keys()
    }
}

impl<K: Into<AvatarId>> FromIterator<(K, FieldMap)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, FieldMap)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
