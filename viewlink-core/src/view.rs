//! View adapter capability.
//!
//! A rendering layer exposes each of its viewports through [`SyncView`]:
//! three boolean navigation signals, a readable/writable viewpoint, and a way
//! to observe both. The sync engine never inspects the viewpoint; it only
//! clones it and hands the copies to peers.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signal::Subscription;

/// Stable identity of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell views apart in logs.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}

/// Boolean navigation signals exposed by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSignal {
    /// The user is actively navigating (drag, pinch, key navigation).
    Interacting,
    /// A camera animation (go-to, inertia) is running.
    Animation,
    /// The camera has come to rest.
    Stationary,
}

/// Callback invoked with the new value of a boolean signal.
pub type SignalCallback = Rc<dyn Fn(bool)>;

/// Callback invoked with the new viewpoint.
pub type ViewpointCallback<P> = Rc<dyn Fn(&P)>;

/// A viewport that can take part in a sync group.
///
/// Implementations must notify watchers synchronously and only on change.
/// `current_viewpoint` must return an independent copy: mutating what one
/// peer receives must never affect the source or another peer.
pub trait SyncView {
    /// Opaque camera pose.
    type Viewpoint: Clone + 'static;

    fn id(&self) -> ViewId;

    fn current_viewpoint(&self) -> Self::Viewpoint;

    fn set_viewpoint(&self, viewpoint: Self::Viewpoint);

    /// Current value of a boolean signal.
    fn signal(&self, signal: ViewSignal) -> bool;

    /// Observe changes of a boolean signal.
    fn watch(&self, signal: ViewSignal, callback: SignalCallback) -> Subscription;

    /// Observe changes of the viewpoint.
    fn watch_viewpoint(&self, callback: ViewpointCallback<Self::Viewpoint>) -> Subscription;

    fn is_interacting(&self) -> bool {
        self.signal(ViewSignal::Interacting)
    }

    fn is_animating(&self) -> bool {
        self.signal(ViewSignal::Animation)
    }

    fn is_stationary(&self) -> bool {
        self.signal(ViewSignal::Stationary)
    }
}
