//! Periodic snapshot polling.
//!
//! A repeating timer schedules one fetch on Bevy's [`IoTaskPool`]; the result
//! is picked up on a later frame and handed to [`LatestSnapshot`]. The first
//! fetch fires on the first frame. A tick that lands while a fetch is still in
//! flight is skipped rather than queued.

mod source;

pub use source::{FetchError, HttpSnapshotSource, SnapshotSource};

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, IoTaskPool, Task};
use log::{debug, warn};

use crate::avatar_sync::CrowdSystems;
use crate::snapshot::Snapshot;
use crate::{DEFAULT_RELAY_URL, POLL_INTERVAL_MS};

/// The most recent successfully fetched snapshot.
///
/// Written only by [`receive_snapshot_system`]; a failed fetch leaves the
/// previous snapshot in place.
#[derive(Resource, Debug, Default, Clone)]
pub struct LatestSnapshot {
    snapshot: Snapshot,
    received: u64,
    consecutive_failures: u32,
}

impl LatestSnapshot {
    /// The snapshot reconcile passes read.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replaces the snapshot wholesale and clears the failure streak.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.received += 1;
        self.consecutive_failures = 0;
    }

    /// Counts a failed fetch; the snapshot is untouched.
    pub const fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// Number of snapshots received so far.
    #[must_use]
    pub const fn received(&self) -> u64 {
        self.received
    }

    /// Failed fetches since the last success.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

/// Where and how often to poll.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct PollingSettings {
    /// Relay endpoint returning the snapshot JSON.
    pub url: String,
    /// Time between fetches.
    pub interval: Duration,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_RELAY_URL.to_owned(),
            interval: Duration::from_millis(POLL_INTERVAL_MS),
            timeout: None,
        }
    }
}

/// The snapshot source the poller calls.
#[derive(Resource, Clone)]
pub struct SnapshotFeed(pub Arc<dyn SnapshotSource>);

impl SnapshotFeed {
    /// Wraps a source.
    pub fn new(source: impl SnapshotSource) -> Self {
        Self(Arc::new(source))
    }
}

/// Poll timer and the fetch currently in flight.
#[derive(Resource, Debug)]
pub struct SnapshotPoller {
    timer: Timer,
    in_flight: Option<Task<Result<Snapshot, FetchError>>>,
    started: bool,
}

impl SnapshotPoller {
    /// Creates a poller firing every `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: Timer::new(interval, TimerMode::Repeating),
            in_flight: None,
            started: false,
        }
    }

    /// Whether a fetch is outstanding.
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Starts a fetch when the timer fires and none is in flight.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn schedule_snapshot_fetch_system(
    time: Res<Time>,
    feed: Res<SnapshotFeed>,
    mut poller: ResMut<SnapshotPoller>,
) {
    poller.timer.tick(time.delta());
    let due = !poller.started || poller.timer.just_finished();
    if !due || poller.is_fetching() {
        return;
    }

    poller.started = true;
    let source = Arc::clone(&feed.0);
    poller.in_flight = Some(IoTaskPool::get().spawn(async move { source.fetch() }));
}

/// Hands a finished fetch over to [`LatestSnapshot`].
pub fn receive_snapshot_system(
    mut poller: ResMut<SnapshotPoller>,
    mut latest: ResMut<LatestSnapshot>,
) {
    let Some(task) = poller.in_flight.as_mut() else {
        return;
    };
    let Some(result) = block_on(future::poll_once(task)) else {
        return;
    };
    poller.in_flight = None;

    match result {
        Ok(snapshot) => {
            debug!("snapshot with {} avatars received", snapshot.len());
            latest.replace(snapshot);
        }
        Err(err) => {
            latest.record_failure();
            warn!(
                "snapshot fetch failed ({} in a row): {err}",
                latest.consecutive_failures()
            );
        }
    }
}

/// Plugin polling the relay and maintaining [`LatestSnapshot`].
///
/// Uses the app's [`PollingSettings`] and [`SnapshotFeed`] when present;
/// otherwise defaults and an [`HttpSnapshotSource`] for the configured URL.
#[derive(Debug, Default)]
pub struct PollingPlugin;

impl Plugin for PollingPlugin {
    fn build(&self, app: &mut App) {
        let settings = app
            .world_mut()
            .get_resource_or_insert_with(PollingSettings::default)
            .clone();
        if !app.world().contains_resource::<SnapshotFeed>() {
            app.insert_resource(SnapshotFeed::new(HttpSnapshotSource::new(
                settings.url.clone(),
                settings.timeout,
            )));
        }

        app.init_resource::<LatestSnapshot>()
            .insert_resource(SnapshotPoller::new(settings.interval))
            .add_systems(
                Update,
                (schedule_snapshot_fetch_system, receive_snapshot_system)
                    .chain()
                    .in_set(CrowdSystems::Receive),
            );
    }
}
