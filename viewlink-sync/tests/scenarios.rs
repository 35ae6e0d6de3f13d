//! Scenario tests for linked viewports.
//!
//! Each test wires real `SceneView`s to a `ViewSync` and drives them through
//! navigation gestures, advancing the `TickQueue` by hand.

use std::rc::Rc;

use viewlink_core::{SceneView, SyncView, TickQueue, ViewId, Viewpoint};
use viewlink_sync::{LinkConfig, LinkPhase, LinkStats, SyncError, ViewSync};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pose(x: f64) -> Viewpoint {
    Viewpoint::default().translated(x, 0.0, 0.0)
}

/// `n` views at distinct poses plus the queue that drives them.
fn linked(n: usize) -> (Rc<TickQueue>, Vec<Rc<SceneView>>, ViewSync<SceneView>) {
    init_logging();
    let queue = Rc::new(TickQueue::new());
    let views: Vec<Rc<SceneView>> = (0..n)
        .map(|i| SceneView::shared(format!("view-{i}"), pose(-(i as f64) - 1.0)))
        .collect();
    let sync = ViewSync::create(views.clone(), queue.clone());
    (queue, views, sync)
}

fn phase_of(sync: &ViewSync<SceneView>, id: ViewId) -> LinkPhase {
    sync.group()
        .and_then(|g| g.links().iter().find(|l| l.view_id() == id))
        .map(|l| l.phase())
        .expect("view is linked")
}

// ─── Two-view walkthrough ────────────────────────────────────────

#[test]
fn test_two_view_walkthrough() {
    let (queue, views, _sync) = linked(2);
    let (v1, v2) = (&views[0], &views[1]);

    v1.go_to(pose(1.0));
    v1.begin_interaction();
    assert_eq!(v2.viewpoint(), pose(1.0));
    assert_eq!(v2.write_count(), 1);

    queue.run_tick();
    v1.go_to(pose(2.0));
    assert_eq!(v2.viewpoint(), pose(2.0));
    assert_eq!(v2.write_count(), 2);

    v1.set_stationary(true);
    v1.go_to(pose(3.0));
    assert_eq!(v2.viewpoint(), pose(2.0));
    assert_eq!(v2.write_count(), 2);
}

#[test]
fn test_two_view_walkthrough_with_raw_signals() {
    let (queue, views, _sync) = linked(2);
    let (v1, v2) = (&views[0], &views[1]);

    v1.go_to(pose(1.0));
    v1.set_animation(false);
    v1.set_interacting(true);
    assert_eq!(v2.viewpoint(), pose(1.0));

    queue.run_tick();
    v1.go_to(pose(2.0));
    assert_eq!(v2.viewpoint(), pose(2.0));
    let writes = v2.write_count();

    v1.set_stationary(true);
    v1.go_to(pose(3.0));
    assert_eq!(v2.viewpoint(), pose(2.0));
    assert_eq!(v2.write_count(), writes);
}

#[test]
fn test_raw_interacting_signal_arms_link() {
    let (_queue, views, _sync) = linked(2);
    views[0].go_to(pose(4.0));
    views[0].set_interacting(true);
    assert_eq!(views[1].viewpoint(), pose(4.0));
}

// ─── Single-pulse bound ──────────────────────────────────────────

#[test]
fn test_single_pulse_writes_each_peer_once() {
    let (queue, views, _sync) = linked(3);
    let before: Vec<u64> = views.iter().map(|v| v.write_count()).collect();

    views[0].go_to(pose(5.0));
    views[0].begin_interaction();
    views[0].end_interaction();
    queue.run_until_idle(10);

    views[0].go_to(pose(6.0));
    views[0].go_to(pose(7.0));

    for (view, before) in views.iter().zip(&before).skip(1) {
        assert_eq!(view.write_count() - before, 1);
        assert_eq!(view.viewpoint(), pose(5.0));
    }
    assert_eq!(queue.pending(), 0);
}

// ─── Conflict resolution ─────────────────────────────────────────

#[test]
fn test_second_mover_wins_before_tick() {
    let (queue, views, sync) = linked(3);
    let (a, b, c) = (&views[0], &views[1], &views[2]);

    a.begin_interaction();
    b.go_to(pose(20.0));
    b.begin_interaction();
    assert_eq!(phase_of(&sync, a.id()), LinkPhase::Idle);
    assert_eq!(phase_of(&sync, b.id()), LinkPhase::Armed);

    queue.run_tick();
    assert_eq!(phase_of(&sync, a.id()), LinkPhase::Idle);
    assert_eq!(phase_of(&sync, b.id()), LinkPhase::Streaming);
    assert_eq!(sync.leader(), Some(b.id()));
    assert_eq!(sync.group().map(|g| g.streaming_count()), Some(1));

    b.go_to(pose(21.0));
    assert_eq!(a.viewpoint(), pose(21.0));
    assert_eq!(c.viewpoint(), pose(21.0));

    let a_stats = sync
        .group()
        .and_then(|g| g.links().iter().find(|l| l.view_id() == a.id()).map(|l| l.stats()))
        .unwrap();
    assert_eq!(a_stats.streamed_updates, 0);
    assert_eq!(a_stats.cancellations, 1);
}

#[test]
fn test_takeover_while_leader_streams() {
    let (queue, views, sync) = linked(3);
    let (a, b, c) = (&views[0], &views[1], &views[2]);

    a.begin_interaction();
    queue.run_tick();
    a.go_to(pose(30.0));
    assert_eq!(b.viewpoint(), pose(30.0));

    // b grabs its own view while a is still being dragged
    b.go_to(pose(31.0));
    b.begin_interaction();
    assert_eq!(phase_of(&sync, a.id()), LinkPhase::Idle);
    queue.run_tick();
    assert_eq!(sync.leader(), Some(b.id()));

    b.go_to(pose(32.0));
    a.end_interaction();
    b.end_interaction();
    queue.run_until_idle(10);

    assert_eq!(a.viewpoint(), pose(32.0));
    assert_eq!(c.viewpoint(), pose(32.0));
    assert_eq!(sync.leader(), None);
}

#[test]
fn test_peer_starting_animation_cancels_leader() {
    let (queue, views, sync) = linked(2);
    views[0].begin_interaction();
    queue.run_tick();

    views[1].begin_animation();
    assert_eq!(phase_of(&sync, views[0].id()), LinkPhase::Idle);
    assert_eq!(phase_of(&sync, views[1].id()), LinkPhase::Armed);
}

// ─── Convergence ─────────────────────────────────────────────────

#[test]
fn test_views_converge_on_most_recent_leader() {
    let (queue, views, sync) = linked(4);
    let n = views.len();
    let mut last_leader = 0;

    for round in 0..24usize {
        let leader = &views[(round * 7 + 3) % n];
        leader.begin_interaction();
        queue.run_tick();
        leader.go_to(pose(100.0 + round as f64));
        leader.go_to(pose(100.5 + round as f64));

        // every third round a second view cuts in before the first lets go
        if round % 3 == 0 {
            let cutter = &views[(round * 5 + 1) % n];
            if cutter.id() != leader.id() {
                cutter.begin_interaction();
                queue.run_tick();
                cutter.go_to(pose(200.0 + round as f64));
                leader.end_interaction();
                cutter.end_interaction();
                last_leader = (round * 5 + 1) % n;
                queue.run_until_idle(10);
                continue;
            }
        }

        leader.end_interaction();
        last_leader = (round * 7 + 3) % n;
        queue.run_until_idle(10);
    }

    let expected = views[last_leader].viewpoint();
    for view in &views {
        assert_eq!(view.viewpoint(), expected, "{} diverged", view.name());
    }
    assert_eq!(sync.leader(), None);
}

// ─── Animation asymmetry ─────────────────────────────────────────

#[test]
fn test_engaging_during_animation_skips_immediate_copy() {
    let (queue, views, _sync) = linked(2);
    views[0].go_to(pose(40.0));
    views[0].begin_animation();
    assert_eq!(views[1].viewpoint(), pose(-2.0));

    queue.run_tick();
    views[0].go_to(pose(41.0));
    assert_eq!(views[1].viewpoint(), pose(41.0));
}

#[test]
fn test_interaction_during_animation_without_following_animation() {
    init_logging();
    let queue = Rc::new(TickQueue::new());
    let a = SceneView::shared("a", pose(50.0));
    let b = SceneView::shared("b", pose(0.0));
    let config = LinkConfig {
        follow_animation: false,
        ..LinkConfig::default()
    };
    let _sync = ViewSync::with_config(vec![a.clone(), b.clone()], queue.clone(), config);

    a.begin_animation();
    assert_eq!(b.viewpoint(), pose(0.0));
    a.begin_interaction();
    assert_eq!(b.viewpoint(), pose(0.0));

    queue.run_tick();
    a.go_to(pose(51.0));
    assert_eq!(b.viewpoint(), pose(51.0));
}

#[test]
fn test_inertia_keeps_streaming_until_stationary() {
    let (queue, views, _sync) = linked(2);
    views[0].begin_interaction();
    queue.run_tick();
    views[0].begin_animation();
    views[0].end_interaction();

    views[0].go_to(pose(60.0));
    assert_eq!(views[1].viewpoint(), pose(60.0));

    views[0].end_animation();
    views[0].go_to(pose(61.0));
    assert_eq!(views[1].viewpoint(), pose(60.0));
}

// ─── Membership changes ──────────────────────────────────────────

#[test]
fn test_add_integrates_new_view_in_both_roles() {
    let (queue, mut views, mut sync) = linked(2);
    views[0].begin_interaction();
    queue.run_tick();
    views[0].go_to(pose(70.0));
    views[0].end_interaction();

    let newcomer = SceneView::shared("newcomer", pose(0.0));
    sync.add(newcomer.clone());
    views.push(newcomer.clone());
    assert_eq!(sync.len(), 3);

    // prior member leads: newcomer follows
    views[1].begin_interaction();
    queue.run_tick();
    views[1].go_to(pose(71.0));
    views[1].end_interaction();
    assert_eq!(newcomer.viewpoint(), pose(71.0));

    // newcomer leads: prior members follow
    newcomer.begin_interaction();
    queue.run_tick();
    newcomer.go_to(pose(72.0));
    newcomer.end_interaction();
    assert_eq!(views[0].viewpoint(), pose(72.0));
    assert_eq!(views[1].viewpoint(), pose(72.0));
}

#[test]
fn test_add_while_streaming_tears_down_stale_controller() {
    let (queue, views, mut sync) = linked(2);
    let (v1, v2) = (&views[0], &views[1]);

    v1.begin_interaction();
    queue.run_tick();
    v1.go_to(pose(80.0));
    assert_eq!(v2.viewpoint(), pose(80.0));
    let writes = v2.write_count();

    let v3 = SceneView::shared("v3", pose(0.0));
    sync.add(v3.clone());
    assert_eq!(sync.leader(), None);

    // v1 is still mid-drag, but the rebuilt group starts Idle
    v1.go_to(pose(81.0));
    assert_eq!(v2.write_count(), writes);
    assert_eq!(v3.viewpoint(), pose(0.0));
    queue.run_until_idle(10);

    v1.end_interaction();
    v2.go_to(pose(82.0));
    v2.begin_interaction();
    assert_eq!(v1.viewpoint(), pose(82.0));
    assert_eq!(v3.viewpoint(), pose(82.0));
}

#[test]
fn test_add_while_armed_cancels_pending_tick() {
    let (queue, views, mut sync) = linked(2);
    views[0].begin_interaction();
    assert_eq!(queue.pending(), 1);

    sync.add(SceneView::shared("late", pose(0.0)));
    assert_eq!(queue.pending(), 0);
    assert_eq!(queue.run_tick(), 0);
}

#[test]
fn test_try_add_duplicate_leaves_group_untouched() {
    let (queue, views, mut sync) = linked(2);
    views[0].begin_interaction();

    let err = sync.try_add(views[1].clone()).unwrap_err();
    assert_eq!(err, SyncError::DuplicateView(views[1].id()));
    // no rebuild happened: the armed controller still reaches Streaming
    queue.run_tick();
    assert_eq!(sync.leader(), Some(views[0].id()));
    assert_eq!(phase_of(&sync, views[0].id()), LinkPhase::Streaming);
}

#[test]
fn test_remove_view_drops_both_roles() {
    let (queue, views, mut sync) = linked(3);
    let gone = sync.remove_view(views[2].id()).unwrap();
    assert_eq!(gone.id(), views[2].id());
    assert_eq!(sync.view_ids(), vec![views[0].id(), views[1].id()]);

    let parked = views[2].viewpoint();
    views[0].begin_interaction();
    queue.run_tick();
    views[0].go_to(pose(90.0));
    views[0].end_interaction();
    assert_eq!(views[1].viewpoint(), pose(90.0));
    assert_eq!(views[2].viewpoint(), parked);

    views[2].begin_interaction();
    queue.run_tick();
    views[2].go_to(pose(91.0));
    assert_eq!(views[0].viewpoint(), pose(90.0));
    assert_eq!(views[1].viewpoint(), pose(90.0));
}

// ─── Teardown ────────────────────────────────────────────────────

#[test]
fn test_remove_is_idempotent() {
    let (queue, views, mut sync) = linked(2);
    views[0].begin_interaction();
    sync.remove();
    let writes: Vec<u64> = views.iter().map(|v| v.write_count()).collect();
    sync.remove();

    assert!(!sync.is_active());
    assert_eq!(sync.stats(), LinkStats::default());
    assert_eq!(queue.run_tick(), 0);
    views[0].go_to(pose(95.0));
    assert_eq!(views[1].write_count(), writes[1]);
}

#[test]
fn test_no_callbacks_after_drop() {
    let (queue, views, sync) = linked(2);
    views[0].begin_interaction();
    queue.run_tick();
    drop(sync);

    let writes = views[1].write_count();
    views[0].go_to(pose(99.0));
    views[0].end_interaction();
    views[0].begin_interaction();
    queue.run_until_idle(10);
    views[0].go_to(pose(100.0));
    assert_eq!(views[1].write_count(), writes);
}

#[test]
fn test_lone_view_never_broadcasts() {
    init_logging();
    let queue = Rc::new(TickQueue::new());
    let solo = SceneView::shared("solo", pose(0.0));
    let sync = ViewSync::create(vec![solo.clone()], queue.clone());

    solo.begin_interaction();
    queue.run_tick();
    solo.go_to(pose(1.0));
    solo.end_interaction();

    let stats = sync.stats();
    assert_eq!(stats.one_shot_syncs, 1);
    assert_eq!(stats.streamed_updates, 1);
    assert_eq!(solo.write_count(), 1);
}
