//! Mounting and driving one authenticated view.
//!
//! [`LifecycleBuilder::mount`] spawns a shell task owning the activity and
//! visibility monitors, the auto-logout controller and the dashboard
//! refresher. The returned [`LifecycleHandle`] feeds it inputs and observes
//! events and snapshots.
//! Snapshots are derived from the last published [`LifecycleView`] when
//! read, so their countdowns are current between loop steps.

pub mod handle;
mod shell;
pub mod types;

pub use handle::{LifecycleBuilder, LifecycleHandle};
pub use types::{
    LifecycleConfig, LifecycleEvent, LifecycleHooks, LifecycleInput, LifecycleSnapshot, LifecycleView,
    NoopHooks,
};
