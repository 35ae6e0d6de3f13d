//! Link behaviour switches.

use serde::{Deserialize, Serialize};

use viewlink_core::ViewSignal;

/// Per-group configuration applied to every link controller.
///
/// The defaults reproduce the reference behaviour; hosts normally never
/// change them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Copy the leader's pose to every peer the moment it engages, when it
    /// is not animating.
    pub immediate_sync: bool,
    /// Treat the `animation` signal as engagement alongside `interacting`,
    /// both for arming a controller and for cancelling a conflicting one.
    pub follow_animation: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            immediate_sync: true,
            follow_animation: true,
        }
    }
}

impl LinkConfig {
    /// Signals whose rising edge means "this view is being driven".
    pub fn engagement_signals(&self) -> &'static [ViewSignal] {
        if self.follow_animation {
            &[ViewSignal::Interacting, ViewSignal::Animation]
        } else {
            &[ViewSignal::Interacting]
        }
    }
}
