//! Viewlink Desktop — headless driver for linked scene views.
//!
//! Replays a scripted navigation session against a set of [`SceneView`]s
//! kept in step by `viewlink-sync`. Each frame applies the scripted
//! gestures and then runs exactly one scheduler tick, so "next tick"
//! deferrals land one frame later, as they would behind a real event loop.
//!
//! ```text
//! viewlink-desktop [scenario.json]
//! ```
//!
//! With no argument a built-in session is played. Logging goes through
//! `env_logger`; set `RUST_LOG=debug` to watch controllers arm and clear.
//!
//! [`SceneView`]: viewlink_core::SceneView

mod scenario;
mod state;

use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::time::{interval, MissedTickBehavior};

use scenario::{Scenario, ScenarioError};
use state::AppState;

/// Play `scenario` to completion on the current task, one frame per interval.
async fn run(scenario: &Scenario) -> Result<AppState, ScenarioError> {
    let mut state = AppState::new(scenario)?;
    let frames = scenario.frame_count();

    let mut frame_timer = interval(Duration::from_millis(scenario.frame_ms.max(1)));
    frame_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for _ in 0..frames {
        frame_timer.tick().await;
        let stats = state.advance(scenario)?;
        if stats.steps_applied > 0 || stats.tasks_run > 0 {
            debug!(
                "frame {}: {} steps, {} deferred tasks",
                state.frame_count - 1,
                stats.steps_applied,
                stats.tasks_run
            );
        }
    }

    // Let anything scheduled on the final frame settle.
    let drained = state.queue.run_until_idle(16);
    if state.queue.pending() > 0 {
        warn!("{} tasks still pending after {} drain ticks", state.queue.pending(), drained);
    }
    Ok(state)
}

fn print_report(state: &AppState) {
    for view in state.report() {
        let vp = view.viewpoint;
        info!(
            "{:<12} {:<8} pos=({:.1}, {:.1}, {:.1}) heading={:.1} tilt={:.1} scale={:.0} writes={}",
            view.name,
            if view.linked { "linked" } else { "detached" },
            vp.position[0],
            vp.position[1],
            vp.position[2],
            vp.heading,
            vp.tilt,
            vp.scale,
            view.writes
        );
    }

    let stats = state.stats();
    info!(
        "Sync: {} one-shot, {} streamed, {} cancellations over {} frames",
        stats.one_shot_syncs, stats.streamed_updates, stats.cancellations, state.frame_count
    );
    if let Some(leader) = state.sync().leader() {
        warn!("View {leader} still holds leadership");
    }
    if state.converged() {
        info!("All linked views converged");
    } else {
        warn!("Linked views did not converge");
    }
}

fn load_scenario() -> Result<Scenario, ScenarioError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading scenario from {path}");
            Scenario::load(path)
        }
        None => {
            info!("No scenario given, playing the built-in session");
            Ok(Scenario::builtin())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scenario = match load_scenario() {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    info!(
        "Viewlink Desktop: {} views, {} steps, {} frames @ {}ms",
        scenario.views.len(),
        scenario.steps.len(),
        scenario.frame_count(),
        scenario.frame_ms
    );

    match run(&scenario).await {
        Ok(state) => print_report(&state),
        Err(e) => {
            error!("Scenario failed: {e}");
            std::process::exit(1);
        }
    }
}
