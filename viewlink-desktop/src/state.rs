//! Driver state: the scene views, their sync handle and the tick queue.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use viewlink_core::{SceneView, SyncView, TickQueue, Viewpoint};
use viewlink_sync::{LinkStats, ViewSync};

use crate::scenario::{Action, Scenario, ScenarioError, Step};

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub steps_applied: usize,
    pub tasks_run: usize,
}

/// Final pose of one view after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewReport {
    pub name: String,
    pub linked: bool,
    pub viewpoint: Viewpoint,
    pub writes: u64,
}

pub struct AppState {
    pub queue: Rc<TickQueue>,
    views: Vec<Rc<SceneView>>,
    by_name: HashMap<String, usize>,
    sync: ViewSync<SceneView>,
    pub frame_count: u64,
}

impl AppState {
    /// Create every declared view and link the non-deferred ones.
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let queue = Rc::new(TickQueue::new());
        let mut views = Vec::with_capacity(scenario.views.len());
        let mut by_name = HashMap::new();
        for (index, spec) in scenario.views.iter().enumerate() {
            views.push(SceneView::shared(spec.name.clone(), spec.viewpoint));
            by_name.insert(spec.name.clone(), index);
        }

        let initial: Vec<Rc<SceneView>> = scenario
            .views
            .iter()
            .zip(&views)
            .filter(|(spec, _)| !spec.deferred)
            .map(|(_, view)| view.clone())
            .collect();
        let sync = ViewSync::with_config(initial, queue.clone(), scenario.link);

        info!(
            "Driver state ready: {} views, {} linked",
            views.len(),
            sync.len()
        );

        Ok(Self {
            queue,
            views,
            by_name,
            sync,
            frame_count: 0,
        })
    }

    pub fn view(&self, name: &str) -> Result<&Rc<SceneView>, ScenarioError> {
        self.by_name
            .get(name)
            .map(|&index| &self.views[index])
            .ok_or_else(|| ScenarioError::UnknownView(name.to_string()))
    }

    pub fn sync(&self) -> &ViewSync<SceneView> {
        &self.sync
    }

    /// Apply one scripted step.
    pub fn apply(&mut self, step: &Step) -> Result<(), ScenarioError> {
        let view = self.view(&step.view)?.clone();
        debug!("frame {}: {} {:?}", self.frame_count, step.view, step.action);

        match &step.action {
            Action::BeginInteraction => view.begin_interaction(),
            Action::EndInteraction => view.end_interaction(),
            Action::BeginAnimation => view.begin_animation(),
            Action::EndAnimation => view.end_animation(),
            Action::GoTo(viewpoint) => view.go_to(*viewpoint),
            Action::Pan { dx, dy } => view.go_to(view.viewpoint().translated(*dx, *dy, 0.0)),
            Action::Rotate { degrees } => view.go_to(view.viewpoint().rotated(*degrees)),
            Action::AddView => {
                if self.sync.contains(view.id()) {
                    return Err(ScenarioError::AlreadyLinked(step.view.clone()));
                }
                // A freshly opened view starts where the first linked view is looking.
                if let Some(anchor) = self.linked_views().next() {
                    view.go_to(anchor.viewpoint());
                }
                self.sync.try_add(view)?;
                info!("{} joined the sync set ({} views)", step.view, self.sync.len());
            }
            Action::RemoveView => {
                if !self.sync.contains(view.id()) {
                    return Err(ScenarioError::NotLinked(step.view.clone()));
                }
                self.sync.remove_view(view.id())?;
                info!("{} left the sync set ({} views)", step.view, self.sync.len());
            }
        }
        Ok(())
    }

    /// Apply this frame's steps, then run one scheduler tick.
    pub fn advance(&mut self, scenario: &Scenario) -> Result<FrameStats, ScenarioError> {
        let mut stats = FrameStats::default();
        for step in scenario.steps_at(self.frame_count) {
            self.apply(step)?;
            stats.steps_applied += 1;
        }
        stats.tasks_run = self.queue.run_tick();
        self.frame_count += 1;
        Ok(stats)
    }

    pub fn linked_views(&self) -> impl Iterator<Item = &Rc<SceneView>> {
        self.views.iter().filter(|view| self.sync.contains(view.id()))
    }

    /// Whether every linked view shows the same pose.
    pub fn converged(&self) -> bool {
        let mut poses = self.linked_views().map(|view| view.viewpoint());
        match poses.next() {
            Some(first) => poses.all(|pose| pose == first),
            None => true,
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.sync.stats()
    }

    pub fn report(&self) -> Vec<ViewReport> {
        self.views
            .iter()
            .map(|view| ViewReport {
                name: view.name().to_string(),
                linked: self.sync.contains(view.id()),
                viewpoint: view.viewpoint(),
                writes: view.write_count(),
            })
            .collect()
    }
}
