#![cfg_attr(docsrs, feature(doc_cfg))]
//! Live 3D crowd visualisation.
//!
//! The crate has two halves sharing one snapshot format:
//!
//! - the [`relay`], which lists crowd records in Redis and serves them as one
//!   JSON [`Snapshot`] over HTTP;
//! - the viewer, which [`polling`] keeps fed with snapshots and whose
//!   [`avatar`] core creates, moves and removes one animated model per
//!   tracked identifier.
//!
//! The avatar core is engine-agnostic; [`avatar_sync`] binds it to Bevy.
pub mod avatar;
pub mod avatar_sync;
pub mod constants;
pub mod logging;
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub mod model_loader;
pub mod polling;
pub mod presentation;
pub mod relay;
pub mod scene;
pub mod snapshot;
pub mod styling;
pub use constants::*;

pub use avatar::{AvatarRegistry, AvatarVariant, MotionSettings, SceneBackend};
pub use avatar_sync::{AvatarPlugin, CrowdSystems};
pub use logging::init as init_logging;
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub use model_loader::ModelLoaderPlugin;
pub use polling::{LatestSnapshot, PollingPlugin, PollingSettings};
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub use presentation::PresentationPlugin;
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub use scene::ScenePlugin;
pub use snapshot::{AvatarId, FieldMap, Snapshot};
#[cfg(feature = "render")]
#[cfg_attr(docsrs, doc(cfg(feature = "render")))]
pub use styling::MaterialStylePlugin;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use crowd3d::prelude::*;
    //! ```

    pub use crate::avatar::{AvatarRegistry, LoadOutcome, MotionSettings, SceneBackend};
    pub use crate::avatar_sync::{AvatarModelReady, AvatarModelRequested, AvatarPlugin};
    pub use crate::polling::{LatestSnapshot, PollingPlugin, SnapshotFeed, SnapshotSource};
    pub use crate::snapshot::{AvatarId, FieldMap, Snapshot};
}
