//! In-memory scene view.
//!
//! [`SceneView`] is a headless stand-in for a rendered 3D viewport. It keeps
//! its navigation state in [`Signal`]s so that everything a real rendering
//! toolkit would report can be driven by hand from tests, benches, or a
//! scripted scenario.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::signal::{Signal, Subscription};
use crate::view::{SignalCallback, SyncView, ViewId, ViewSignal, ViewpointCallback};

/// Camera pose of a scene view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    /// Camera position (x, y, z) in scene coordinates.
    pub position: [f64; 3],
    /// Compass heading in degrees.
    pub heading: f64,
    /// Tilt in degrees; 0 looks straight down.
    pub tilt: f64,
    /// Map scale denominator.
    pub scale: f64,
}

impl Viewpoint {
    pub fn new(position: [f64; 3], heading: f64, tilt: f64, scale: f64) -> Self {
        Self {
            position,
            heading,
            tilt,
            scale,
        }
    }

    /// Same pose, moved by `(dx, dy, dz)`.
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> Self {
        let [x, y, z] = self.position;
        Self {
            position: [x + dx, y + dy, z + dz],
            ..*self
        }
    }

    /// Same pose, rotated by `degrees` around the vertical axis.
    pub fn rotated(&self, degrees: f64) -> Self {
        Self {
            heading: (self.heading + degrees).rem_euclid(360.0),
            ..*self
        }
    }
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1_000.0],
            heading: 0.0,
            tilt: 0.0,
            scale: 50_000.0,
        }
    }
}

/// Headless viewport with observable navigation state.
pub struct SceneView {
    id: ViewId,
    name: String,
    interacting: Signal<bool>,
    animation: Signal<bool>,
    stationary: Signal<bool>,
    viewpoint: Signal<Viewpoint>,
    /// Number of times the viewpoint actually changed.
    writes: Rc<Cell<u64>>,
    _write_counter: Subscription,
}

impl SceneView {
    /// Create a view at rest with the given initial pose.
    pub fn new(name: impl Into<String>, viewpoint: Viewpoint) -> Self {
        let viewpoint = Signal::new(viewpoint);
        let writes = Rc::new(Cell::new(0));
        let counter = writes.clone();
        let write_counter = viewpoint.subscribe(move |_| counter.set(counter.get() + 1));

        Self {
            id: ViewId::new(),
            name: name.into(),
            interacting: Signal::new(false),
            animation: Signal::new(false),
            stationary: Signal::new(true),
            viewpoint,
            writes,
            _write_counter: write_counter,
        }
    }

    /// Convenience for `Rc::new(SceneView::new(..))`.
    pub fn shared(name: impl Into<String>, viewpoint: Viewpoint) -> Rc<Self> {
        Rc::new(Self::new(name, viewpoint))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn viewpoint(&self) -> Viewpoint {
        self.viewpoint.get()
    }

    /// How many times the viewpoint has changed since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.get()
    }

    // ── Raw signal setters ─────────────────────────────────────────

    // Rising interacting/animation lowers `stationary` first; falling edges
    // leave it to `set_stationary`.

    pub fn set_interacting(&self, value: bool) {
        if value {
            self.stationary.set(false);
        }
        self.interacting.set(value);
    }

    pub fn set_animation(&self, value: bool) {
        if value {
            self.stationary.set(false);
        }
        self.animation.set(value);
    }

    pub fn set_stationary(&self, value: bool) {
        self.stationary.set(value);
    }

    // ── Gestures ───────────────────────────────────────────────────

    /// User grabs the view: no longer stationary, now interacting.
    pub fn begin_interaction(&self) {
        self.stationary.set(false);
        self.interacting.set(true);
    }

    /// User releases the view and the camera settles.
    pub fn end_interaction(&self) {
        self.interacting.set(false);
        if !self.animation.get() {
            self.stationary.set(true);
        }
    }

    /// A camera animation starts (fly-to, inertia).
    pub fn begin_animation(&self) {
        self.stationary.set(false);
        self.animation.set(true);
    }

    /// The running animation completes.
    pub fn end_animation(&self) {
        self.animation.set(false);
        if !self.interacting.get() {
            self.stationary.set(true);
        }
    }

    /// Move the camera. Equivalent to the renderer reporting a new pose.
    pub fn go_to(&self, viewpoint: Viewpoint) {
        self.viewpoint.set(viewpoint);
    }

    fn signal_ref(&self, signal: ViewSignal) -> &Signal<bool> {
        match signal {
            ViewSignal::Interacting => &self.interacting,
            ViewSignal::Animation => &self.animation,
            ViewSignal::Stationary => &self.stationary,
        }
    }
}

impl SyncView for SceneView {
    type Viewpoint = Viewpoint;

    fn id(&self) -> ViewId {
        self.id
    }

    fn current_viewpoint(&self) -> Viewpoint {
        self.viewpoint.get()
    }

    fn set_viewpoint(&self, viewpoint: Viewpoint) {
        self.viewpoint.set(viewpoint);
    }

    fn signal(&self, signal: ViewSignal) -> bool {
        self.signal_ref(signal).get()
    }

    fn watch(&self, signal: ViewSignal, callback: SignalCallback) -> Subscription {
        self.signal_ref(signal).subscribe(move |value| callback(*value))
    }

    fn watch_viewpoint(&self, callback: ViewpointCallback<Viewpoint>) -> Subscription {
        self.viewpoint.subscribe(move |viewpoint| callback(viewpoint))
    }
}

impl fmt::Debug for SceneView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneView")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("interacting", &self.interacting.get())
            .field("animation", &self.animation.get())
            .field("stationary", &self.stationary.get())
            .field("viewpoint", &self.viewpoint.get())
            .finish()
    }
}
