//! # viewlink-core — building blocks for linked viewports
//!
//! Small, single-threaded primitives shared by the sync engine and its hosts.
//!
//! ## Modules
//!
//! - [`signal`]: observable values with cancelable subscriptions
//! - [`scheduler`]: next-tick deferral (`Scheduler`, `TickQueue`)
//! - [`view`]: the `SyncView` adapter trait a rendering layer implements
//! - [`scene`]: `SceneView`, an in-memory viewport for tests and headless runs
//!
//! Everything here is `!Send` on purpose: a sync group lives on the thread
//! that owns the viewports.

pub mod scene;
pub mod scheduler;
pub mod signal;
pub mod view;

pub use scene::{SceneView, Viewpoint};
pub use scheduler::{Scheduler, Task, TickHandle, TickQueue};
pub use signal::{Signal, Subscription};
pub use view::{SignalCallback, SyncView, ViewId, ViewSignal, ViewpointCallback};
