//! Simulation context and the state shared between the main thread and the
//! background worker.
//!
//! The main thread owns [`WorldState`] (world clock, weather schedule,
//! current district, message log). The worker never touches it: everything
//! it needs is published through the lock-free [`WorldSignals`] block.
//! Each thread that advances districts owns one [`SimContext`] holding its
//! own random generator and AI collaborators.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use holdout_types::{ActorId, DistrictPos, Weather};
use holdout_world::{WeatherSystem, WorldTime};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

use crate::config::SimulationConfig;
use crate::decision::{DecisionSource, StubDecisionSource, WanderDecisionSource};
use crate::executor::{ActionExecutor, RulesActionExecutor};

/// Messages kept in the world message log.
const MESSAGE_LOG_CAP: usize = 64;

const fn weather_code(weather: Weather) -> u8 {
    match weather {
        Weather::Clear => 0,
        Weather::Cloudy => 1,
        Weather::Rain => 2,
        Weather::HeavyRain => 3,
    }
}

const fn weather_from_code(code: u8) -> Weather {
    match code {
        1 => Weather::Cloudy,
        2 => Weather::Rain,
        3 => Weather::HeavyRain,
        _ => Weather::Clear,
    }
}

/// World facts published by the main thread, read by everyone.
#[derive(Debug)]
pub struct WorldSignals {
    world_turn: AtomicU64,
    weather: AtomicU8,
    player_dead: AtomicBool,
    load_generation: AtomicU64,
}

impl WorldSignals {
    /// Create the signal block for a world at `turn` with `weather`.
    pub const fn new(turn: u64, weather: Weather) -> Self {
        Self {
            world_turn: AtomicU64::new(turn),
            weather: AtomicU8::new(weather_code(weather)),
            player_dead: AtomicBool::new(false),
            load_generation: AtomicU64::new(0),
        }
    }

    /// Published world turn.
    pub fn world_turn(&self) -> u64 {
        self.world_turn.load(Ordering::Acquire)
    }

    /// Publish a new world turn.
    pub fn publish_world_turn(&self, turn: u64) {
        self.world_turn.store(turn, Ordering::Release);
    }

    /// Current weather.
    pub fn weather(&self) -> Weather {
        weather_from_code(self.weather.load(Ordering::Acquire))
    }

    /// Publish a weather change.
    pub fn publish_weather(&self, weather: Weather) {
        self.weather.store(weather_code(weather), Ordering::Release);
    }

    /// Whether the player has died.
    pub fn is_player_dead(&self) -> bool {
        self.player_dead.load(Ordering::Acquire)
    }

    /// Flag (or clear) the player's death.
    pub fn set_player_dead(&self, dead: bool) {
        self.player_dead.store(dead, Ordering::Release);
    }

    /// Counter bumped every time a game is loaded.
    pub fn load_generation(&self) -> u64 {
        self.load_generation.load(Ordering::Acquire)
    }

    /// Signal that a game was loaded; in-flight advances bail out.
    pub fn bump_load_generation(&self) -> u64 {
        self.load_generation
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1)
    }
}

/// Main-thread world state.
#[derive(Debug, Clone)]
pub struct WorldState {
    /// World clock; the player's district local time follows it.
    pub time: WorldTime,
    /// Current weather.
    pub weather: Weather,
    /// World turn of the next scheduled weather change.
    pub next_weather_change: u64,
    /// District the player is in.
    pub current_district: DistrictPos,
    /// The player's actor.
    pub player: ActorId,
    /// Most recent world messages, oldest first.
    pub messages: VecDeque<String>,
    weather_system: WeatherSystem,
}

impl WorldState {
    /// Create the world state at `turn`, with the first weather change
    /// scheduled from there.
    pub fn new(seed: u64, turn: u64, current_district: DistrictPos, player: ActorId) -> Self {
        let weather_system = WeatherSystem::new(seed);
        Self {
            time: WorldTime::at(turn),
            weather: Weather::Clear,
            next_weather_change: weather_system.next_change_turn(turn),
            current_district,
            player,
            messages: VecDeque::new(),
            weather_system,
        }
    }

    /// Deterministic weather generator of this world.
    pub const fn weather_system(&self) -> WeatherSystem {
        self.weather_system
    }

    /// Append a message to the log, dropping the oldest past capacity.
    pub fn push_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(turn = self.time.turn(), %message, "World message");
        if self.messages.len() >= MESSAGE_LOG_CAP {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }
}

/// Builds the AI collaborators of a simulation context.
///
/// The background worker needs its own decision source and executor; the
/// factory lets the session build them without knowing their concrete
/// types.
pub trait CollaboratorFactory: Send + Sync {
    /// A decision source seeded with `seed`.
    fn decisions(&self, seed: u64) -> Box<dyn DecisionSource>;

    /// An action executor.
    fn executor(&self) -> Box<dyn ActionExecutor>;
}

/// [`WanderDecisionSource`] with [`RulesActionExecutor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AutopilotCollaborators;

impl CollaboratorFactory for AutopilotCollaborators {
    fn decisions(&self, seed: u64) -> Box<dyn DecisionSource> {
        Box::new(WanderDecisionSource::new(seed))
    }

    fn executor(&self) -> Box<dyn ActionExecutor> {
        Box::new(RulesActionExecutor)
    }
}

/// [`StubDecisionSource`] with [`RulesActionExecutor`]: every actor waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleCollaborators;

impl CollaboratorFactory for IdleCollaborators {
    fn decisions(&self, _seed: u64) -> Box<dyn DecisionSource> {
        Box::new(StubDecisionSource)
    }

    fn executor(&self) -> Box<dyn ActionExecutor> {
        Box::new(RulesActionExecutor)
    }
}

/// Everything a thread needs to advance districts.
pub struct SimContext {
    /// Shared configuration.
    pub config: Arc<SimulationConfig>,
    /// Published world facts.
    pub signals: Arc<WorldSignals>,
    /// Raised to make in-flight advances bail out between actor turns.
    pub abort: Arc<AtomicBool>,
    /// This thread's random generator.
    pub rng: SmallRng,
    /// AI decisions.
    pub decisions: Box<dyn DecisionSource>,
    /// Action validation and execution.
    pub executor: Box<dyn ActionExecutor>,
}

impl SimContext {
    /// Create a context with collaborators from `factory`.
    pub fn new(
        config: Arc<SimulationConfig>,
        signals: Arc<WorldSignals>,
        seed: u64,
        factory: &dyn CollaboratorFactory,
    ) -> Self {
        Self {
            config,
            signals,
            abort: Arc::new(AtomicBool::new(false)),
            rng: SmallRng::seed_from_u64(seed),
            decisions: factory.decisions(seed),
            executor: factory.executor(),
        }
    }

    /// Share an existing abort flag instead of the context's own.
    #[must_use]
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    /// Whether an abort has been requested.
    pub fn is_abort_requested(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimContext")
            .field("world_turn", &self.signals.world_turn())
            .field("abort", &self.is_abort_requested())
            .finish_non_exhaustive()
    }
}
