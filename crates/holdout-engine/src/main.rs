//! Holdout binary.
//!
//! Generates a city, drops an autopilot player into its center district,
//! and plays world turns with the background simulation thread keeping
//! the surrounding districts in step. Every so often the player walks into
//! a neighbouring district, which is caught up to world time first.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `holdout-config.yaml` (or the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Load the autopilot run settings
//! 4. Generate the district grid and spawn the population
//! 5. Open a session around the player's district
//! 6. Start the background simulation thread
//! 7. Play turns until the player dies or the turn budget runs out
//! 8. Shut down the worker and log the result

mod error;
mod spawner;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use holdout_core::{
    AutopilotCollaborators, CatchUpProgress, LoggingConfig, Session, SimulationConfig,
};
use holdout_types::DistrictPos;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file read when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "holdout-config.yaml";

/// Settings of the autopilot run, read from the `autopilot` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct AutopilotConfig {
    /// World turns to play before stopping.
    #[serde(default = "default_max_turns")]
    max_turns: u64,

    /// The player changes district every this many turns (0: never).
    #[serde(default = "default_district_hop_turns")]
    district_hop_turns: u64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            district_hop_turns: default_district_hop_turns(),
        }
    }
}

const fn default_max_turns() -> u64 {
    2160
}

const fn default_district_hop_turns() -> u64 {
    240
}

/// Logs catch-up progress instead of drawing it.
struct LogProgress {
    district: DistrictPos,
}

impl CatchUpProgress for LogProgress {
    fn report(&mut self, done: u64, total: u64) {
        info!(district = %self.district, done, total, "Catching up");
    }

    fn cancel_requested(&mut self) -> bool {
        false
    }
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration; logging is set up from it.
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        sim_ratio = ?config.simulation.sim_ratio,
        sim_thread_enabled = config.simulation.sim_thread_enabled,
        "holdout-engine starting"
    );

    // 3. Autopilot settings.
    let autopilot = load_autopilot_config(&config_path)?;
    info!(
        max_turns = autopilot.max_turns,
        district_hop_turns = autopilot.district_hop_turns,
        "Autopilot configuration loaded"
    );

    // 4. Generate the world.
    let mut rng = SmallRng::seed_from_u64(config.world.seed);
    let world = spawner::generate_world(&config, &mut rng)?;

    // 5. Open the session.
    let progress_interval = config.logging.progress_interval_turns.max(1);
    let mut session = Session::new(
        Arc::new(config),
        Arc::new(world.grid),
        world.player_district,
        Arc::new(AutopilotCollaborators),
    )?;

    // 6. Background simulation.
    if session.start_background()? {
        info!("Background simulation started");
    } else {
        info!("Background simulation disabled");
    }

    // 7. Play.
    let result = play(&mut session, &autopilot, progress_interval, &mut rng);

    // 8. Shut down, even after a failed run.
    let outcome = session.shutdown()?;
    let status = serde_json::to_string(&session.sim_thread_status())?;
    let played = result?;
    info!(
        turns_played = played,
        world_turn = session.world().time.turn(),
        day = session.world().time.day(),
        player_dead = session.is_player_dead(),
        district = %session.current_district(),
        worker = status,
        ?outcome,
        "holdout-engine shutdown complete"
    );
    Ok(())
}

/// Play world turns until the player dies or `max_turns` is reached.
/// Returns the number of turns played.
fn play(
    session: &mut Session,
    autopilot: &AutopilotConfig,
    progress_interval: u64,
    rng: &mut impl Rng,
) -> Result<u64, EngineError> {
    let mut played = 0_u64;
    while played < autopilot.max_turns {
        let report = session.play_turn()?;
        if !report.is_completed() {
            warn!(outcome = ?report.outcome, "Turn did not complete");
            break;
        }
        played = played.saturating_add(1);
        for event in &report.events {
            info!(kind = ?event.kind, count = event.count, turn = event.turn, "Scripted event");
        }

        if session.is_player_dead() {
            info!(turn = session.world().time.turn(), "The player has died");
            break;
        }
        if played.checked_rem(progress_interval) == Some(0) {
            let status = session.sim_thread_status();
            info!(
                world_turn = session.world().time.turn(),
                day = session.world().time.day(),
                weather = ?session.world().weather,
                district = %session.current_district(),
                worker_state = ?status.state,
                districts_advanced = status.districts_advanced,
                "Progress"
            );
        }
        if autopilot.district_hop_turns > 0
            && played.checked_rem(autopilot.district_hop_turns) == Some(0)
        {
            let neighbors = session.grid().neighbors(session.current_district());
            if !neighbors.is_empty() {
                let index = rng.random_range(0..neighbors.len());
                if let Some(&to) = neighbors.get(index) {
                    let report = session.change_district(to, &mut LogProgress { district: to })?;
                    info!(
                        district = %to,
                        turns_simulated = report.turns_simulated,
                        outcome = ?report.outcome,
                        "Player changed district"
                    );
                }
            }
        }
    }
    Ok(played)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_names(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .init();
    }
}

/// Load the simulation configuration, falling back to defaults when the
/// file does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.simulation.apply_env_overrides();
        Ok(config)
    }
}

/// Load the `autopilot` section of the config file.
///
/// Missing file or section yields the defaults.
fn load_autopilot_config(path: &Path) -> Result<AutopilotConfig, EngineError> {
    if !path.exists() {
        return Ok(AutopilotConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Autopilot {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| EngineError::Autopilot {
            message: format!("failed to parse config YAML: {e}"),
        })?;
    let Some(section) = raw.get("autopilot") else {
        return Ok(AutopilotConfig::default());
    };
    serde_yml::from_value(section.clone()).map_err(|e| EngineError::Autopilot {
        message: format!("failed to parse autopilot config: {e}"),
    })
}
