//! Membership and the controllers bound to it.
//!
//! A [`PeerSet`] is the ordered list of linked views. A [`SyncGroup`] is one
//! [`LinkController`] per member, each broadcasting to "everyone else".
//! Groups are never patched in place: any membership change tears the whole
//! group down and builds a fresh one, so no controller can hold a stale
//! peer list.

use std::rc::Rc;

use viewlink_core::{Scheduler, SyncView, ViewId};

use crate::config::LinkConfig;
use crate::link::{LinkController, LinkPhase, LinkStats};

// ───────────────────────────────────────────────────────────────────
// PeerSet
// ───────────────────────────────────────────────────────────────────

/// Ordered set of linked views, unique by [`ViewId`].
pub struct PeerSet<V: SyncView> {
    views: Vec<Rc<V>>,
}

impl<V: SyncView> Default for PeerSet<V> {
    fn default() -> Self {
        Self { views: Vec::new() }
    }
}

impl<V: SyncView> PeerSet<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `view`.
    ///
    /// The caller guarantees `view` is not already a member; this is only
    /// checked in debug builds.
    pub fn add(&mut self, view: Rc<V>) {
        debug_assert!(
            !self.contains(view.id()),
            "view {} added to a peer set twice",
            view.id()
        );
        self.views.push(view);
    }

    /// Remove the member with `id`, preserving the order of the rest.
    pub fn remove(&mut self, id: ViewId) -> Option<Rc<V>> {
        let index = self.views.iter().position(|v| v.id() == id)?;
        Some(self.views.remove(index))
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.views.iter().any(|v| v.id() == id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<V>> {
        self.views.iter()
    }

    pub fn ids(&self) -> Vec<ViewId> {
        self.views.iter().map(|v| v.id()).collect()
    }

    /// Every member except the one at `index`, in membership order.
    pub fn others(&self, index: usize) -> Vec<Rc<V>> {
        self.views
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

// ───────────────────────────────────────────────────────────────────
// SyncGroup
// ───────────────────────────────────────────────────────────────────

/// Exactly one link controller per member of a peer set.
pub struct SyncGroup<V: SyncView + 'static> {
    links: Vec<LinkController<V>>,
}

impl<V: SyncView + 'static> SyncGroup<V> {
    /// Build controllers for every member of `peers`.
    pub fn build(peers: &PeerSet<V>, scheduler: &Rc<dyn Scheduler>, config: LinkConfig) -> Self {
        let links = peers
            .iter()
            .enumerate()
            .map(|(index, view)| {
                LinkController::new(view.clone(), peers.others(index), scheduler.clone(), config)
            })
            .collect::<Vec<_>>();
        log::info!("sync group built with {} views", links.len());
        Self { links }
    }

    /// Shut down every controller and release them. Idempotent.
    pub fn teardown(&mut self) {
        if self.links.is_empty() {
            return;
        }
        for link in &mut self.links {
            link.shutdown();
        }
        log::debug!("sync group torn down ({} views)", self.links.len());
        self.links.clear();
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[LinkController<V>] {
        &self.links
    }

    /// The view currently streaming, else the one armed, if any.
    pub fn leader(&self) -> Option<ViewId> {
        let in_phase = |phase: LinkPhase| {
            self.links
                .iter()
                .find(|l| l.phase() == phase)
                .map(|l| l.view_id())
        };
        in_phase(LinkPhase::Streaming).or_else(|| in_phase(LinkPhase::Armed))
    }

    /// Number of controllers currently streaming.
    pub fn streaming_count(&self) -> usize {
        self.links
            .iter()
            .filter(|l| l.phase() == LinkPhase::Streaming)
            .count()
    }

    /// Counters summed over every controller.
    pub fn stats(&self) -> LinkStats {
        let mut total = LinkStats::default();
        for link in &self.links {
            total += link.stats();
        }
        total
    }
}

impl<V: SyncView + 'static> Drop for SyncGroup<V> {
    fn drop(&mut self) {
        self.teardown();
    }
}
