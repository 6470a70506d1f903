//! Configuration loading and typed config structures for the Holdout
//! simulation.
//!
//! The canonical configuration lives in `holdout-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads the file. Every key is optional; a
//! missing key takes the default documented on its field.

use std::path::Path;

use holdout_agents::VitalsConfig;
use serde::Deserialize;

use crate::flags::SimRatio;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World generation settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Scheduling, detail ratio, and background thread settings.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Population caps and starting population.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Scripted event tuning.
    #[serde(default)]
    pub events: EventsConfig,

    /// Corpse decay and reanimation.
    #[serde(default)]
    pub corpses: CorpseConfig,

    /// Per-actor survival rates.
    #[serde(default)]
    pub vitals: VitalsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the live-tunable
    /// simulation options:
    /// - `HOLDOUT_SIM_RATIO` overrides `simulation.sim_ratio`
    /// - `HOLDOUT_SIM_THREAD` overrides `simulation.sim_thread_enabled`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.simulation.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// World generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for world generation, weather, and event rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Districts per row.
    #[serde(default = "default_grid_size")]
    pub grid_width: i32,

    /// Districts per column.
    #[serde(default = "default_grid_size")]
    pub grid_height: i32,

    /// Width of every map in tiles.
    #[serde(default = "default_map_size")]
    pub map_width: i32,

    /// Height of every map in tiles.
    #[serde(default = "default_map_size")]
    pub map_height: i32,

    /// Row of districts crossed by the subway line (negative: no subway).
    #[serde(default = "default_subway_row")]
    pub subway_row: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            grid_width: default_grid_size(),
            grid_height: default_grid_size(),
            map_width: default_map_size(),
            map_height: default_map_size(),
            subway_row: default_subway_row(),
        }
    }
}

/// What to do when an AI misbehaves (stuck in a free-action loop, returns
/// an illegal action, or fails to decide).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Recover locally: force or substitute a wait and log a warning.
    #[default]
    Production,
    /// Surface AI bugs: let loops run and fail on illegal actions.
    Debug,
}

/// Scheduling, detail ratio, and background thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSettings {
    /// Full/low detail ratio for districts the player is not in.
    #[serde(default)]
    pub sim_ratio: SimRatio,

    /// Whether the background worker advances neighboring districts.
    #[serde(default = "default_true")]
    pub sim_thread_enabled: bool,

    /// Whether neighbors are advanced while the player sleeps.
    #[serde(default = "default_true")]
    pub simulate_while_sleeping: bool,

    /// Milliseconds the worker sleeps between passes.
    #[serde(default = "default_sim_thread_sleep_ms")]
    pub sim_thread_sleep_ms: u64,

    /// Milliseconds to wait for the worker to acknowledge a stop.
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,

    /// Catch-up progress is reported every this many turns.
    #[serde(default = "default_catch_up_redraw_turns")]
    pub catch_up_redraw_turns: u64,

    /// Selections of one non-player actor within one map pass, interleaved
    /// or not, past which the actor counts as looping.
    #[serde(default = "default_ai_loop_threshold")]
    pub ai_loop_threshold: u32,

    /// Recovery policy for AI failures.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Whether evolving undead gain skills at dusk.
    #[serde(default = "default_true")]
    pub undead_upgrades: bool,
}

impl SimulationSettings {
    /// Apply `HOLDOUT_SIM_RATIO` and `HOLDOUT_SIM_THREAD` overrides.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOLDOUT_SIM_RATIO") {
            match val.parse() {
                Ok(ratio) => self.sim_ratio = ratio,
                Err(reason) => tracing::warn!(%reason, "Ignoring HOLDOUT_SIM_RATIO"),
            }
        }
        if let Ok(val) = std::env::var("HOLDOUT_SIM_THREAD") {
            match val.trim().to_lowercase().as_str() {
                "1" | "true" | "on" => self.sim_thread_enabled = true,
                "0" | "false" | "off" => self.sim_thread_enabled = false,
                other => tracing::warn!(value = other, "Ignoring HOLDOUT_SIM_THREAD"),
            }
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            sim_ratio: SimRatio::default(),
            sim_thread_enabled: true,
            simulate_while_sleeping: true,
            sim_thread_sleep_ms: default_sim_thread_sleep_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            catch_up_redraw_turns: default_catch_up_redraw_turns(),
            ai_loop_threshold: default_ai_loop_threshold(),
            failure_policy: FailurePolicy::default(),
            undead_upgrades: true,
        }
    }
}

/// Population caps and starting population per district.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Living actors above which refugees stop arriving.
    #[serde(default = "default_max_civilians")]
    pub max_civilians: usize,

    /// Undead cap per map for invasions.
    #[serde(default = "default_max_undeads")]
    pub max_undeads: usize,

    /// Civilians generated on each surface map.
    #[serde(default = "default_starting_civilians")]
    pub starting_civilians: usize,

    /// Policemen generated on each surface map.
    #[serde(default = "default_starting_police")]
    pub starting_police: usize,

    /// Undead generated on each surface map.
    #[serde(default = "default_starting_undead")]
    pub starting_undead: usize,

    /// Rat zombies generated in each sewer.
    #[serde(default = "default_starting_sewer_undead")]
    pub starting_sewer_undead: usize,

    /// Food items lying around each surface map.
    #[serde(default = "default_food_items")]
    pub food_items: usize,

    /// Explosives lying around each surface map.
    #[serde(default = "default_explosives")]
    pub explosives: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            max_civilians: default_max_civilians(),
            max_undeads: default_max_undeads(),
            starting_civilians: default_starting_civilians(),
            starting_police: default_starting_police(),
            starting_undead: default_starting_undead(),
            starting_sewer_undead: default_starting_sewer_undead(),
            food_items: default_food_items(),
            explosives: default_explosives(),
        }
    }
}

/// Day window, cooldown, chance, and size of one cooldown-gated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RaidConfig {
    /// First day the event may fire.
    pub min_day: u64,
    /// Last day the event may fire.
    pub max_day: u64,
    /// Percent chance per hour strike.
    pub chance: u32,
    /// Days between two firings.
    pub cooldown_days: u64,
    /// Actors spawned (or items dropped).
    pub size: usize,
}

/// Scripted event tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventsConfig {
    /// Percent of `max_undeads` targeted by the invasion on day 0.
    #[serde(default = "default_invasion_day0_pct")]
    pub zombie_invasion_day0_pct: u64,

    /// Percent added to the invasion target each day.
    #[serde(default = "default_invasion_daily_pct")]
    pub zombie_invasion_daily_pct: u64,

    /// Percent chance per hour strike of a sewers invasion.
    #[serde(default = "default_sewers_invasion_chance")]
    pub sewers_invasion_chance: u32,

    /// Percent of `max_undeads` the sewers can hold.
    #[serde(default = "default_sewers_undead_pct")]
    pub sewers_undead_pct: usize,

    /// Percent chance of refugees at each midday strike.
    #[serde(default = "default_refugees_chance")]
    pub refugees_chance: u32,

    /// Percent of `max_civilians` arriving per refugee wave.
    #[serde(default = "default_refugees_wave_pct")]
    pub refugees_wave_pct: usize,

    /// Percent scaling applied to the national guard and army supplies
    /// chances (100 leaves them unchanged).
    #[serde(default = "default_chance_factor_pct")]
    pub chance_factor_pct: u32,

    /// National guard squad.
    #[serde(default = "default_national_guard")]
    pub national_guard: RaidConfig,

    /// Undead-to-living percent ratio needed to send the guard.
    #[serde(default = "default_national_guard_ratio_pct")]
    pub national_guard_ratio_pct: usize,

    /// Army food drop; `size` is the number of rations.
    #[serde(default = "default_army_supplies")]
    pub army_supplies: RaidConfig,

    /// Food points per living actor under which supplies are dropped.
    #[serde(default = "default_army_food_threshold")]
    pub army_supplies_food_threshold: i64,

    /// Biker raid.
    #[serde(default = "default_bikers")]
    pub bikers: RaidConfig,

    /// Gangsta raid.
    #[serde(default = "default_gangsta")]
    pub gangsta: RaidConfig,

    /// Black ops raid.
    #[serde(default = "default_blackops")]
    pub blackops: RaidConfig,

    /// Survivor band.
    #[serde(default = "default_survivors")]
    pub survivors: RaidConfig,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            zombie_invasion_day0_pct: default_invasion_day0_pct(),
            zombie_invasion_daily_pct: default_invasion_daily_pct(),
            sewers_invasion_chance: default_sewers_invasion_chance(),
            sewers_undead_pct: default_sewers_undead_pct(),
            refugees_chance: default_refugees_chance(),
            refugees_wave_pct: default_refugees_wave_pct(),
            chance_factor_pct: default_chance_factor_pct(),
            national_guard: default_national_guard(),
            national_guard_ratio_pct: default_national_guard_ratio_pct(),
            army_supplies: default_army_supplies(),
            army_supplies_food_threshold: default_army_food_threshold(),
            bikers: default_bikers(),
            gangsta: default_gangsta(),
            blackops: default_blackops(),
            survivors: default_survivors(),
        }
    }
}

/// Corpse decay and reanimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CorpseConfig {
    /// Map turns until a corpse has fully rotted away.
    #[serde(default = "default_rot_turns")]
    pub rot_turns: u32,

    /// Map turns before a corpse may rise.
    #[serde(default = "default_reanimation_delay")]
    pub reanimation_delay: u32,

    /// Per-mille chance per turn that an eligible corpse rises.
    #[serde(default = "default_reanimation_chance")]
    pub reanimation_chance: u32,

    /// Extra per-mille chance for corpses that died infected.
    #[serde(default = "default_infected_reanimation_bonus")]
    pub infected_reanimation_bonus: u32,
}

impl Default for CorpseConfig {
    fn default() -> Self {
        Self {
            rot_turns: default_rot_turns(),
            reanimation_delay: default_reanimation_delay(),
            reanimation_chance: default_reanimation_chance(),
            infected_reanimation_bonus: default_infected_reanimation_bonus(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,

    /// Log a progress line every this many world turns.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_turns: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            progress_interval_turns: default_progress_interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (used by serde)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Holdout".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_grid_size() -> i32 {
    3
}

const fn default_map_size() -> i32 {
    30
}

const fn default_subway_row() -> i32 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_sim_thread_sleep_ms() -> u64 {
    10
}

const fn default_stop_timeout_ms() -> u64 {
    2000
}

const fn default_catch_up_redraw_turns() -> u64 {
    30
}

const fn default_ai_loop_threshold() -> u32 {
    64
}

const fn default_max_civilians() -> usize {
    25
}

const fn default_max_undeads() -> usize {
    40
}

const fn default_starting_civilians() -> usize {
    8
}

const fn default_starting_police() -> usize {
    2
}

const fn default_starting_undead() -> usize {
    6
}

const fn default_starting_sewer_undead() -> usize {
    3
}

const fn default_food_items() -> usize {
    6
}

const fn default_explosives() -> usize {
    1
}

const fn default_invasion_day0_pct() -> u64 {
    30
}

const fn default_invasion_daily_pct() -> u64 {
    10
}

const fn default_sewers_invasion_chance() -> u32 {
    10
}

const fn default_sewers_undead_pct() -> usize {
    50
}

const fn default_refugees_chance() -> u32 {
    50
}

const fn default_refugees_wave_pct() -> usize {
    20
}

const fn default_chance_factor_pct() -> u32 {
    100
}

const fn default_national_guard() -> RaidConfig {
    RaidConfig {
        min_day: 3,
        max_day: 14,
        chance: 10,
        cooldown_days: 3,
        size: 5,
    }
}

const fn default_national_guard_ratio_pct() -> usize {
    200
}

const fn default_army_supplies() -> RaidConfig {
    RaidConfig {
        min_day: 3,
        max_day: 1000,
        chance: 10,
        cooldown_days: 2,
        size: 8,
    }
}

const fn default_army_food_threshold() -> i64 {
    300
}

const fn default_bikers() -> RaidConfig {
    RaidConfig {
        min_day: 2,
        max_day: 14,
        chance: 5,
        cooldown_days: 5,
        size: 5,
    }
}

const fn default_gangsta() -> RaidConfig {
    RaidConfig {
        min_day: 7,
        max_day: 21,
        chance: 5,
        cooldown_days: 5,
        size: 5,
    }
}

const fn default_blackops() -> RaidConfig {
    RaidConfig {
        min_day: 14,
        max_day: 1000,
        chance: 3,
        cooldown_days: 7,
        size: 3,
    }
}

const fn default_survivors() -> RaidConfig {
    RaidConfig {
        min_day: 10,
        max_day: 1000,
        chance: 5,
        cooldown_days: 7,
        size: 4,
    }
}

const fn default_rot_turns() -> u32 {
    1440
}

const fn default_reanimation_delay() -> u32 {
    180
}

const fn default_reanimation_chance() -> u32 {
    5
}

const fn default_infected_reanimation_bonus() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_progress_interval() -> u64 {
    90
}
