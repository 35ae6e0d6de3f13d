//! Per-view leadership state machine.
//!
//! ```text
//!            engage ↑ (own interacting/animation rises)
//!   ┌──────┐ ─────────────────────────────────► ┌───────┐
//!   │ Idle │   one-shot copy (if not animating)  │ Armed │
//!   └──────┘ ◄───────────────────────────────── └───┬───┘
//!       ▲        clear: stationary ↑ or             │ next tick
//!       │        peer engage ↑                      ▼
//!       │                                      ┌───────────┐
//!       └───────────────────────────────────── │ Streaming │ ── viewpoint Δ ──► peers
//!                      clear                   └───────────┘
//! ```
//!
//! The next-tick gap between Armed and Streaming is where a later "second
//! mover" cancels an earlier leader, so the most recently engaged view always
//! ends up as the sole broadcaster.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::AddAssign;
use std::rc::Rc;

use viewlink_core::{Scheduler, Subscription, SyncView, TickHandle, ViewId, ViewSignal};

use crate::config::LinkConfig;

/// Where a controller is in its leadership cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkPhase {
    /// Waiting for its own view to engage.
    Idle,
    /// Engaged; streaming starts on the next tick unless cleared first.
    Armed,
    /// Broadcasting every viewpoint change to peers.
    Streaming,
}

/// Counters for one controller (or a whole group when merged).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Immediate copies made on arming.
    pub one_shot_syncs: u64,
    /// Viewpoint changes forwarded while streaming.
    pub streamed_updates: u64,
    /// Clears that interrupted an Armed or Streaming cycle.
    pub cancellations: u64,
}

impl AddAssign for LinkStats {
    fn add_assign(&mut self, other: Self) {
        self.one_shot_syncs += other.one_shot_syncs;
        self.streamed_updates += other.streamed_updates;
        self.cancellations += other.cancellations;
    }
}

/// Shared state reachable from signal callbacks through `Weak` references.
struct LinkState<V: SyncView> {
    view: Rc<V>,
    peers: Vec<Rc<V>>,
    scheduler: Rc<dyn Scheduler>,
    config: LinkConfig,
    phase: Cell<LinkPhase>,
    pending_tick: RefCell<Option<TickHandle>>,
    viewpoint_watch: RefCell<Option<Subscription>>,
    stationary_watch: RefCell<Option<Subscription>>,
    peer_watches: RefCell<Vec<Subscription>>,
    stats: Cell<LinkStats>,
}

impl<V: SyncView + 'static> LinkState<V> {
    fn on_engage(self: &Rc<Self>, engaged: bool) {
        if !engaged || self.phase.get() != LinkPhase::Idle {
            return;
        }
        self.phase.set(LinkPhase::Armed);
        log::debug!("link {}: armed ({} peers)", self.view.id(), self.peers.len());

        // Discrete jumps (no animation) reach peers without waiting a tick.
        if self.config.immediate_sync && !self.view.is_animating() {
            self.broadcast(self.view.current_viewpoint());
            self.record(|s| s.one_shot_syncs += 1);
        }

        let weak = Rc::downgrade(self);
        let tick = self.scheduler.schedule_next_tick(Box::new(move || {
            if let Some(link) = weak.upgrade() {
                link.start_streaming();
            }
        }));
        *self.pending_tick.borrow_mut() = Some(tick);

        let weak = Rc::downgrade(self);
        let stationary = self.view.watch(
            ViewSignal::Stationary,
            Rc::new(move |stationary| {
                if stationary {
                    if let Some(link) = weak.upgrade() {
                        link.clear();
                    }
                }
            }),
        );
        *self.stationary_watch.borrow_mut() = Some(stationary);

        let mut watches = Vec::with_capacity(self.peers.len() * 2);
        for peer in &self.peers {
            for &signal in self.config.engagement_signals() {
                let weak = Rc::downgrade(self);
                watches.push(peer.watch(
                    signal,
                    Rc::new(move |engaged| {
                        if engaged {
                            if let Some(link) = weak.upgrade() {
                                link.clear();
                            }
                        }
                    }),
                ));
            }
        }
        *self.peer_watches.borrow_mut() = watches;
    }

    fn start_streaming(self: &Rc<Self>) {
        self.pending_tick.borrow_mut().take();
        if self.phase.get() != LinkPhase::Armed {
            return;
        }
        self.phase.set(LinkPhase::Streaming);
        log::debug!("link {}: streaming", self.view.id());

        let weak = Rc::downgrade(self);
        let watch = self.view.watch_viewpoint(Rc::new(move |viewpoint: &V::Viewpoint| {
            if let Some(link) = weak.upgrade() {
                link.broadcast(viewpoint.clone());
                link.record(|s| s.streamed_updates += 1);
            }
        }));
        *self.viewpoint_watch.borrow_mut() = Some(watch);
    }

    /// Return to Idle, releasing the pending tick and every cycle watch.
    fn clear(&self) {
        let was = self.phase.replace(LinkPhase::Idle);

        let tick = self.pending_tick.borrow_mut().take();
        if let Some(tick) = tick {
            tick.cancel();
        }
        // Take first, drop after: unsubscribing must not run under our borrows.
        let viewpoint_watch = self.viewpoint_watch.borrow_mut().take();
        let stationary_watch = self.stationary_watch.borrow_mut().take();
        let peer_watches = std::mem::take(&mut *self.peer_watches.borrow_mut());
        drop(viewpoint_watch);
        drop(stationary_watch);
        drop(peer_watches);

        if was != LinkPhase::Idle {
            self.record(|s| s.cancellations += 1);
            log::debug!("link {}: cleared from {:?}", self.view.id(), was);
        }
    }

    fn broadcast(&self, viewpoint: V::Viewpoint) {
        log::trace!("link {}: broadcast to {} peers", self.view.id(), self.peers.len());
        for peer in &self.peers {
            peer.set_viewpoint(viewpoint.clone());
        }
    }

    fn record(&self, update: impl FnOnce(&mut LinkStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

/// Decides when one view leads and streams its pose to its peers.
///
/// Dropping the controller shuts it down; no callback fires afterwards.
pub struct LinkController<V: SyncView + 'static> {
    state: Rc<LinkState<V>>,
    /// Idle-state watches on the own view's engagement signals.
    engage_watches: Vec<Subscription>,
}

impl<V: SyncView + 'static> LinkController<V> {
    /// Bind a controller to `view`, broadcasting to `peers`.
    ///
    /// An empty peer list is valid: the controller still cycles through its
    /// phases but never writes anywhere.
    pub fn new(
        view: Rc<V>,
        peers: Vec<Rc<V>>,
        scheduler: Rc<dyn Scheduler>,
        config: LinkConfig,
    ) -> Self {
        let state = Rc::new(LinkState {
            view,
            peers,
            scheduler,
            config,
            phase: Cell::new(LinkPhase::Idle),
            pending_tick: RefCell::new(None),
            viewpoint_watch: RefCell::new(None),
            stationary_watch: RefCell::new(None),
            peer_watches: RefCell::new(Vec::new()),
            stats: Cell::new(LinkStats::default()),
        });

        let engage_watches = config
            .engagement_signals()
            .iter()
            .map(|&signal| {
                let weak = Rc::downgrade(&state);
                state.view.watch(
                    signal,
                    Rc::new(move |engaged| {
                        if let Some(link) = weak.upgrade() {
                            link.on_engage(engaged);
                        }
                    }),
                )
            })
            .collect();

        Self {
            state,
            engage_watches,
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.state.view.id()
    }

    pub fn view(&self) -> &Rc<V> {
        &self.state.view
    }

    pub fn peer_ids(&self) -> Vec<ViewId> {
        self.state.peers.iter().map(|p| p.id()).collect()
    }

    pub fn phase(&self) -> LinkPhase {
        self.state.phase.get()
    }

    pub fn stats(&self) -> LinkStats {
        self.state.stats.get()
    }

    /// Abort the current cycle, if any. Idempotent.
    pub fn clear(&self) {
        self.state.clear();
    }

    /// Clear and stop listening to the own view. Idempotent.
    pub fn shutdown(&mut self) {
        self.state.clear();
        self.engage_watches.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.engage_watches.is_empty()
    }
}

impl<V: SyncView + 'static> Drop for LinkController<V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<V: SyncView + 'static> fmt::Debug for LinkController<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkController")
            .field("view", &self.view_id())
            .field("peers", &self.state.peers.len())
            .field("phase", &self.phase())
            .field("stats", &self.stats())
            .finish()
    }
}
