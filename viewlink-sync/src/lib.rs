//! # viewlink-sync — leader/follower camera sync for linked viewports
//!
//! Keeps N independently rendered views of the same scene looking at the same
//! place while the user navigates any one of them.
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────┐   add / remove_view    ┌──────────────┐
//!  │  ViewSync    │ ─────────────────────► │   PeerSet    │
//!  │ (public API) │     rebuild as a unit  └──────┬───────┘
//!  └──────┬───────┘                               │ one per member
//!         ▼                                       ▼
//!  ┌──────────────┐                       ┌──────────────────┐
//!  │  SyncGroup   │ ────────────────────► │ LinkController   │ ── Idle/Armed/Streaming
//!  └──────────────┘                       └────────┬─────────┘
//!                                                  │ schedule_next_tick
//!                                                  ▼
//!                                         ┌──────────────────┐
//!                                         │    Scheduler     │
//!                                         └──────────────────┘
//! ```
//!
//! Leadership goes to whichever view most recently started interacting.
//! Conflicts are resolved by cross-cancellation, never by locking: a view
//! that engages clears every peer controller that was Armed or Streaming.
//!
//! ## Modules
//!
//! - [`link`]: the per-view state machine
//! - [`group`]: membership (`PeerSet`) and its controllers (`SyncGroup`)
//! - [`handle`]: `ViewSync`, the public surface
//! - [`config`]: `LinkConfig`
//! - [`error`]: `SyncError`

pub mod config;
pub mod error;
pub mod group;
pub mod handle;
pub mod link;

pub use config::LinkConfig;
pub use error::SyncError;
pub use group::{PeerSet, SyncGroup};
pub use handle::ViewSync;
pub use link::{LinkController, LinkPhase, LinkStats};
