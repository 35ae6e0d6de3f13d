//! Public entry point: a live set of linked views.

use std::fmt;
use std::rc::Rc;

use viewlink_core::{Scheduler, SyncView, ViewId};

use crate::config::LinkConfig;
use crate::error::SyncError;
use crate::group::{PeerSet, SyncGroup};
use crate::link::LinkStats;

/// Keeps the camera poses of a set of views in step.
///
/// Every membership change rebuilds the underlying [`SyncGroup`] from
/// scratch. Dropping the handle tears everything down.
///
/// ```rust,ignore
/// let queue = Rc::new(TickQueue::new());
/// let mut sync = ViewSync::create(vec![left.clone()], queue.clone());
/// sync.add(right.clone());
///
/// left.begin_interaction();   // right jumps to left's pose
/// queue.run_tick();           // left now streams every change to right
/// left.end_interaction();     // streaming stops
/// ```
pub struct ViewSync<V: SyncView + 'static> {
    peers: PeerSet<V>,
    group: Option<SyncGroup<V>>,
    scheduler: Rc<dyn Scheduler>,
    config: LinkConfig,
}

impl<V: SyncView + 'static> ViewSync<V> {
    /// Link `initial_views` with the default configuration.
    pub fn create(initial_views: impl IntoIterator<Item = Rc<V>>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_config(initial_views, scheduler, LinkConfig::default())
    }

    pub fn with_config(
        initial_views: impl IntoIterator<Item = Rc<V>>,
        scheduler: Rc<dyn Scheduler>,
        config: LinkConfig,
    ) -> Self {
        let mut peers = PeerSet::new();
        for view in initial_views {
            peers.add(view);
        }
        let mut sync = Self {
            peers,
            group: None,
            scheduler,
            config,
        };
        sync.rebuild();
        sync
    }

    /// Link one more view and rebuild the group.
    ///
    /// `view` must not already be linked (checked in debug builds only; see
    /// [`ViewSync::try_add`] for a checked variant).
    pub fn add(&mut self, view: Rc<V>) {
        log::debug!("adding view {} to sync set", view.id());
        self.teardown_group();
        self.peers.add(view);
        self.rebuild();
    }

    /// Like [`ViewSync::add`], but rejects a view that is already linked.
    pub fn try_add(&mut self, view: Rc<V>) -> Result<(), SyncError> {
        if self.peers.contains(view.id()) {
            return Err(SyncError::DuplicateView(view.id()));
        }
        self.add(view);
        Ok(())
    }

    /// Unlink one view and rebuild the group over the remaining members.
    pub fn remove_view(&mut self, id: ViewId) -> Result<Rc<V>, SyncError> {
        if !self.peers.contains(id) {
            return Err(SyncError::UnknownView(id));
        }
        self.teardown_group();
        let removed = self.peers.remove(id).ok_or(SyncError::UnknownView(id))?;
        log::debug!("removed view {id} from sync set");
        self.rebuild();
        Ok(removed)
    }

    /// Tear down every controller. Idempotent.
    ///
    /// Membership is kept, so a later [`ViewSync::add`] relinks everyone.
    pub fn remove(&mut self) {
        self.teardown_group();
    }

    /// Whether a sync group is currently live.
    pub fn is_active(&self) -> bool {
        self.group.is_some()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.peers.contains(id)
    }

    pub fn view_ids(&self) -> Vec<ViewId> {
        self.peers.ids()
    }

    pub fn config(&self) -> LinkConfig {
        self.config
    }

    /// The view currently authorized to broadcast, if any.
    pub fn leader(&self) -> Option<ViewId> {
        self.group.as_ref().and_then(|g| g.leader())
    }

    /// Counters of the live group (reset on every rebuild).
    pub fn stats(&self) -> LinkStats {
        self.group.as_ref().map(|g| g.stats()).unwrap_or_default()
    }

    pub fn group(&self) -> Option<&SyncGroup<V>> {
        self.group.as_ref()
    }

    fn teardown_group(&mut self) {
        if let Some(mut group) = self.group.take() {
            group.teardown();
        }
    }

    fn rebuild(&mut self) {
        if self.peers.is_empty() {
            return;
        }
        self.group = Some(SyncGroup::build(&self.peers, &self.scheduler, self.config));
    }
}

impl<V: SyncView + 'static> Drop for ViewSync<V> {
    fn drop(&mut self) {
        self.remove();
    }
}

impl<V: SyncView + 'static> fmt::Debug for ViewSync<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSync")
            .field("views", &self.peers.ids())
            .field("active", &self.is_active())
            .field("leader", &self.leader())
            .field("config", &self.config)
            .finish()
    }
}
