//! Scripted navigation scenarios.
//!
//! A scenario names a set of viewports and a frame-indexed list of gestures
//! to apply to them. It is plain JSON so sessions can be replayed by hand:
//!
//! ```json
//! {
//!   "frame_ms": 16,
//!   "views": [
//!     { "name": "main" },
//!     { "name": "fresnel-1", "deferred": true }
//!   ],
//!   "steps": [
//!     { "frame": 0, "view": "main", "action": "begin_interaction" },
//!     { "frame": 2, "view": "main", "action": { "pan": { "dx": 40.0, "dy": 0.0 } } },
//!     { "frame": 3, "view": "main", "action": "end_interaction" },
//!     { "frame": 4, "view": "fresnel-1", "action": "add_view" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use viewlink_core::Viewpoint;
use viewlink_sync::{LinkConfig, SyncError};

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Scenario declares no views")]
    NoViews,
    #[error("View declared twice: {0}")]
    DuplicateView(String),
    #[error("Step references unknown view: {0}")]
    UnknownView(String),
    #[error("View is already linked: {0}")]
    AlreadyLinked(String),
    #[error("View is not linked: {0}")]
    NotLinked(String),
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

/// One viewport taking part in the scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSpec {
    pub name: String,
    #[serde(default)]
    pub viewpoint: Viewpoint,
    /// Created up front but only linked by an `add_view` step.
    #[serde(default)]
    pub deferred: bool,
}

/// A gesture or membership change applied to one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    BeginInteraction,
    EndInteraction,
    BeginAnimation,
    EndAnimation,
    GoTo(Viewpoint),
    Pan { dx: f64, dy: f64 },
    Rotate { degrees: f64 },
    /// Link the view, opening it at the pose of the first linked view.
    AddView,
    RemoveView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub frame: u64,
    pub view: String,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default)]
    pub link: LinkConfig,
    pub views: Vec<ViewSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Total frames to run; defaults to two past the last step.
    #[serde(default)]
    pub frames: Option<u64>,
}

fn default_frame_ms() -> u64 {
    16
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check names are unique and every step targets a declared view.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.views.is_empty() {
            return Err(ScenarioError::NoViews);
        }
        let mut names = HashSet::new();
        for view in &self.views {
            if !names.insert(view.name.as_str()) {
                return Err(ScenarioError::DuplicateView(view.name.clone()));
            }
        }
        for step in &self.steps {
            if !names.contains(step.view.as_str()) {
                return Err(ScenarioError::UnknownView(step.view.clone()));
            }
        }
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.unwrap_or_else(|| {
            self.steps.iter().map(|s| s.frame).max().map_or(1, |last| last.saturating_add(2))
        })
    }

    /// Steps scheduled for `frame`, in declaration order.
    pub fn steps_at(&self, frame: u64) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(move |s| s.frame == frame)
    }

    /// The demo session run when no scenario file is given.
    ///
    /// A main view is navigated, two analysis views open and join the
    /// group, one of them while the main view is still streaming, and the
    /// views then trade leadership, including a near-simultaneous grab.
    pub fn builtin() -> Self {
        let step = |frame, view: &str, action| Step {
            frame,
            view: view.to_string(),
            action,
        };
        let home = Viewpoint::new([4_500.0, 2_200.0, 1_800.0], 30.0, 65.0, 24_000.0);

        Self {
            frame_ms: default_frame_ms(),
            link: LinkConfig::default(),
            views: vec![
                ViewSpec { name: "main".into(), viewpoint: home, deferred: false },
                ViewSpec { name: "fresnel-1".into(), viewpoint: Viewpoint::default(), deferred: true },
                ViewSpec { name: "fresnel-2".into(), viewpoint: Viewpoint::default(), deferred: true },
            ],
            steps: vec![
                step(1, "fresnel-1", Action::AddView),
                step(2, "main", Action::BeginInteraction),
                step(4, "main", Action::Pan { dx: 120.0, dy: -40.0 }),
                step(5, "main", Action::Rotate { degrees: 15.0 }),
                step(6, "fresnel-2", Action::AddView),
                step(7, "main", Action::Pan { dx: 10.0, dy: 10.0 }),
                step(8, "main", Action::EndInteraction),
                step(10, "fresnel-2", Action::BeginInteraction),
                step(12, "fresnel-2", Action::Rotate { degrees: -45.0 }),
                step(13, "fresnel-2", Action::EndInteraction),
                step(15, "fresnel-1", Action::BeginInteraction),
                step(15, "main", Action::BeginInteraction),
                step(17, "main", Action::Pan { dx: -300.0, dy: 0.0 }),
                step(18, "fresnel-1", Action::EndInteraction),
                step(18, "main", Action::EndInteraction),
                step(20, "main", Action::BeginAnimation),
                step(22, "main", Action::GoTo(home)),
                step(23, "main", Action::EndAnimation),
            ],
            frames: None,
        }
    }
}
