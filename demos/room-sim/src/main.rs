//! Room Simulation
//!
//! Drives one agent through a room snapshot at a fixed tick with no
//! renderer attached. Knocks the target over on a swipe hit, stands it back
//! up after a delay, and optionally drops catnip at a scheduled time.
//!
//! Run with: cargo run -p room-sim -- [world.json] [agent.json] [--trace]

mod sim_config;

use prowl_ai::prelude::*;
use prowl_nav::{find_safe_ground_point, GridPlanner};
use sim_config::SimConfig;
use std::collections::BTreeMap;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimConfig::load();
    config.log_summary();

    if let Err(e) = run(&config) {
        log::error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

#[derive(Default)]
struct RunStats {
    transitions: usize,
    hits: usize,
    recoveries: usize,
    nudges: usize,
    time_in_state: BTreeMap<&'static str, f32>,
}

fn run(config: &SimConfig) -> Result<()> {
    let mut world = match &config.world_path {
        Some(path) => World::from_json_file(path)?,
        None => World::study_room(),
    };
    let agent_config = match &config.agent_path {
        Some(path) => AgentConfig::from_json_file(path)?,
        None => AgentConfig::default(),
    };

    // Never start inside furniture
    let start = {
        let planner = GridPlanner::new(agent_config.nav.clone());
        let nav = world.nav(&planner);
        find_safe_ground_point(&nav, config.start, config.start)
    };
    if start != config.start {
        log::info!("Start moved from {} to {}", config.start, start);
    }

    let mut machine = BehaviorMachine::new(agent_config, start, config.start_yaw)?;
    let dt = config.dt();
    let mut stats = RunStats::default();
    let mut toppled_at: Option<f32> = None;
    let mut catnip_pending = config.catnip_at;

    log::info!("Agent at {} is {}", start, machine.status());

    for _ in 0..config.total_ticks() {
        world.time += dt;

        if let Some(at) = catnip_pending {
            if world.time >= at {
                catnip_pending = None;
                if machine.place_distraction(&mut world, config.catnip_spot) {
                    log::info!("[{:6.2}s] Catnip dropped at {}", world.time, config.catnip_spot);
                } else {
                    log::warn!("[{:6.2}s] Catnip spot {} rejected", world.time, config.catnip_spot);
                }
            }
        }

        let out = machine.tick(&mut world, dt);
        *stats.time_in_state.entry(out.state.label()).or_default() += dt;
        report(&out, world.time, &mut stats);

        if out.hit() && !world.target.toppled {
            world.target.toppled = true;
            toppled_at = Some(world.time);
        }
        if let Some(at) = toppled_at {
            if world.time - at >= config.target_reset_delay {
                world.target.toppled = false;
                toppled_at = None;
                log::info!("[{:6.2}s] Target stood back up", world.time);
            }
        }

        if config.trace {
            println!("{}", serde_json::to_string(&out)?);
        }
    }

    log::info!(
        "Done after {:.1}s: {} transitions, {} hits, {} recoveries, {} nudges",
        world.time,
        stats.transitions,
        stats.hits,
        stats.recoveries,
        stats.nudges
    );
    for (state, seconds) in &stats.time_in_state {
        log::info!("  {:<20} {:6.2}s", state, seconds);
    }
    Ok(())
}

fn report(out: &TickOutput, time: f32, stats: &mut RunStats) {
    for event in &out.events {
        match event {
            BehaviorEvent::StateChanged { from, to } => {
                stats.transitions += 1;
                log::info!("[{:6.2}s] {} -> {} ({})", time, from, to, out.status);
            }
            BehaviorEvent::SwipeHit { target, .. } => {
                stats.hits += 1;
                log::info!("[{:6.2}s] Swipe hit target at {}", time, target);
            }
            BehaviorEvent::Recovered { position } => {
                stats.recoveries += 1;
                log::warn!("[{:6.2}s] Recovered to {}", time, position);
            }
            BehaviorEvent::Nudged { id } => {
                stats.nudges += 1;
                log::debug!("[{:6.2}s] Nudged movable {}", time, id);
            }
            BehaviorEvent::JumpStarted { phase, to } => {
                log::debug!("[{:6.2}s] Jump {:?} toward {}", time, phase, to);
            }
            BehaviorEvent::DistractionReached => {
                log::info!("[{:6.2}s] Reached the catnip", time);
            }
            BehaviorEvent::DistractionExpired => {
                log::info!("[{:6.2}s] Catnip wore off", time);
            }
        }
    }
}
