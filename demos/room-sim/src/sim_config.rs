//! Simulation settings
//!
//! Loaded in order:
//! 1. Defaults
//! 2. Environment variables (`PROWL_SECONDS`, `PROWL_TICK_RATE`, `PROWL_CATNIP_AT`, `PROWL_TRACE`)
//! 3. Command line: `room-sim [world.json] [agent.json] [--trace] [--seconds=N]`

use prowl_math::Vec2;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Room snapshot; the built-in study room when absent
    pub world_path: Option<PathBuf>,
    /// Nav and behavior tuning; defaults when absent
    pub agent_path: Option<PathBuf>,
    /// Simulated duration in seconds
    pub seconds: f32,
    /// Fixed ticks per second
    pub tick_rate: f32,
    pub start: Vec2,
    pub start_yaw: f32,
    /// Drop catnip at this simulation time
    pub catnip_at: Option<f32>,
    pub catnip_spot: Vec2,
    /// Stand the target back up this long after it was knocked over
    pub target_reset_delay: f32,
    /// Print every tick as a JSON line
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_path: None,
            agent_path: None,
            seconds: 60.0,
            tick_rate: 60.0,
            start: Vec2::new(1.5, 1.7),
            start_yaw: 0.0,
            catnip_at: None,
            catnip_spot: Vec2::new(0.0, 0.0),
            target_reset_delay: 4.0,
            trace: false,
        }
    }
}

impl SimConfig {
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(seconds) = env_f32("PROWL_SECONDS") {
            config.seconds = seconds;
        }
        if let Some(rate) = env_f32("PROWL_TICK_RATE") {
            config.tick_rate = rate;
        }
        if let Some(at) = env_f32("PROWL_CATNIP_AT") {
            config.catnip_at = Some(at);
            log::info!("Catnip scheduled at {:.1}s", at);
        }
        if std::env::var("PROWL_TRACE").map(|v| v == "1" || v == "true").unwrap_or(false) {
            config.trace = true;
        }

        config.apply_args(std::env::args().skip(1));
        config.sanitize();
        config
    }

    fn apply_args(&mut self, args: impl Iterator<Item = String>) {
        let mut positional = 0;
        for arg in args {
            if arg == "--trace" {
                self.trace = true;
                continue;
            }
            if let Some(value) = arg.strip_prefix("--seconds=") {
                match value.parse() {
                    Ok(seconds) => self.seconds = seconds,
                    Err(_) => log::warn!("Ignoring bad --seconds value: {}", value),
                }
                continue;
            }
            if arg.starts_with("--") {
                log::warn!("Unknown flag: {}", arg);
                continue;
            }
            match positional {
                0 => self.world_path = Some(PathBuf::from(&arg)),
                1 => self.agent_path = Some(PathBuf::from(&arg)),
                _ => log::warn!("Extra argument ignored: {}", arg),
            }
            positional += 1;
        }
    }

    fn sanitize(&mut self) {
        if self.tick_rate.is_nan() || self.tick_rate <= 0.0 {
            log::warn!("Tick rate {} is not positive, using 60", self.tick_rate);
            self.tick_rate = 60.0;
        }
        self.seconds = self.seconds.max(0.0);
    }

    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate
    }

    pub fn total_ticks(&self) -> u64 {
        (self.seconds * self.tick_rate).ceil() as u64
    }

    pub fn log_summary(&self) {
        log::info!("Simulation settings:");
        match &self.world_path {
            Some(path) => log::info!("  World: {}", path.display()),
            None => log::info!("  World: built-in study room"),
        }
        match &self.agent_path {
            Some(path) => log::info!("  Agent: {}", path.display()),
            None => log::info!("  Agent: defaults"),
        }
        log::info!("  Duration: {:.1}s at {} Hz", self.seconds, self.tick_rate);
        log::info!("  Trace: {}", self.trace);
    }
}

fn env_f32(name: &str) -> Option<f32> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_positional_paths() {
        let mut config = SimConfig::default();
        config.apply_args(args(&["room.json", "agent.json"]));
        assert_eq!(config.world_path, Some(PathBuf::from("room.json")));
        assert_eq!(config.agent_path, Some(PathBuf::from("agent.json")));
    }

    #[test]
    fn test_flags() {
        let mut config = SimConfig::default();
        config.apply_args(args(&["--trace", "--seconds=12.5", "--bogus"]));
        assert!(config.trace);
        assert_eq!(config.seconds, 12.5);
        assert!(config.world_path.is_none());
    }

    #[test]
    fn test_tick_count() {
        let config = SimConfig {
            seconds: 2.0,
            tick_rate: 30.0,
            ..Default::default()
        };
        assert_eq!(config.total_ticks(), 60);
    }

    #[test]
    fn test_sanitize_bad_rate() {
        let mut config = SimConfig {
            tick_rate: 0.0,
            seconds: -1.0,
            ..Default::default()
        };
        config.sanitize();
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.seconds, 0.0);
    }
}
