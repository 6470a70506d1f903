//! District advancement: one world turn for one district.
//!
//! [`advance_district`] locks the district, runs every lagging map through
//! the scheduler until nobody can act, applies the map turn effects, moves
//! the world clock when this is the player's district, and fires the
//! district's scripted events. When the player sleeps, the lagging
//! neighbors are then advanced one by one, each under its own lock.

use holdout_types::{Action, ActorId, DistrictPos};
use holdout_world::{District, DistrictGrid, Map};
use tracing::{debug, info, warn};

use crate::config::FailurePolicy;
use crate::context::{SimContext, WorldState};
use crate::error::SimError;
use crate::events::{ScriptedEvent, run_scripted_events};
use crate::flags::SimFlags;
use crate::scheduler::{BASE_ACTION_COST, LoopGuard, LoopVerdict, next_actor_to_act};
use crate::turn_effects::next_map_turn;

/// Why an advance stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The player died.
    PlayerDied,
    /// A saved game was loaded; the district state is stale.
    GameLoaded,
    /// The background worker was told to stop immediately.
    StopRequested,
}

/// How an advance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Every lagging map consumed one local turn.
    Completed,
    /// The advance bailed out between actor turns.
    Aborted(AbortReason),
}

/// What one district advance did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceReport {
    /// The district advanced.
    pub district: DistrictPos,
    /// How the advance ended.
    pub outcome: AdvanceOutcome,
    /// District local turn after the advance.
    pub district_turn: u64,
    /// Actions performed.
    pub actions: usize,
    /// Waits forced on looping actors.
    pub forced_waits: usize,
    /// Maps that consumed a local turn.
    pub map_turns: usize,
    /// Scripted events that fired.
    pub events: Vec<ScriptedEvent>,
    /// Whether the player is here and asleep.
    pub player_sleeping: bool,
    /// Neighbors advanced while the player slept.
    pub neighbors_advanced: usize,
}

impl AdvanceReport {
    fn new(district: DistrictPos) -> Self {
        Self {
            district,
            outcome: AdvanceOutcome::Completed,
            district_turn: 0,
            actions: 0,
            forced_waits: 0,
            map_turns: 0,
            events: Vec::new(),
            player_sleeping: false,
            neighbors_advanced: 0,
        }
    }

    /// Whether the advance completed.
    pub fn is_completed(&self) -> bool {
        self.outcome == AdvanceOutcome::Completed
    }
}

/// Advance the district at `pos` by one turn.
///
/// Pass `world` for the player's district only: the world clock, weather,
/// and messages then move with it.
///
/// # Errors
///
/// Returns [`SimError::Invariant`] on inconsistent world state, and
/// [`SimError::Decision`] or [`SimError::IllegalAction`] under the debug
/// failure policy.
pub fn advance_district(
    ctx: &mut SimContext,
    grid: &DistrictGrid,
    pos: DistrictPos,
    flags: SimFlags,
    world: Option<&mut WorldState>,
) -> Result<AdvanceReport, SimError> {
    let is_player_district = world.is_some();
    let mut report = {
        let mut district = grid.lock(pos)?;
        advance_locked(ctx, &mut district, flags, world)?
    };

    // 4. Advance the neighbors while the player sleeps
    if is_player_district
        && report.is_completed()
        && report.player_sleeping
        && ctx.config.simulation.simulate_while_sleeping
        && !ctx.config.simulation.sim_ratio.is_off()
    {
        let target = ctx.signals.world_turn();
        for neighbor in grid.neighbors(pos) {
            if let Some(advanced) = advance_if_behind(ctx, grid, neighbor, target)? {
                if !advanced.is_completed() {
                    break;
                }
                report.neighbors_advanced = report.neighbors_advanced.saturating_add(1);
            }
        }
    }
    Ok(report)
}

/// Advance an off-screen district by one turn if it lags `target`.
///
/// The lag check and the advance happen under one lock. Returns `None` when
/// the district is already current.
///
/// # Errors
///
/// Same as [`advance_district`].
pub fn advance_if_behind(
    ctx: &mut SimContext,
    grid: &DistrictGrid,
    pos: DistrictPos,
    target: u64,
) -> Result<Option<AdvanceReport>, SimError> {
    let mut district = grid.lock(pos)?;
    let turn = district.local_turn();
    if turn >= target {
        return Ok(None);
    }
    let flags = SimFlags::for_turn(ctx.config.simulation.sim_ratio, turn);
    advance_locked(ctx, &mut district, flags, None).map(Some)
}

/// Steps 1 to 3 of a district advance, with the district already locked.
fn advance_locked(
    ctx: &mut SimContext,
    district: &mut District,
    flags: SimFlags,
    world: Option<&mut WorldState>,
) -> Result<AdvanceReport, SimError> {
    let mut report = AdvanceReport::new(district.pos());
    let load_generation = ctx.signals.load_generation();
    let district_turn = district.local_turn();

    // 1. Advance every map still at the district turn
    let mut announcements = Vec::new();
    let mut aborted = None;
    for map in district
        .maps
        .iter_mut()
        .filter(|m| m.local_time().turn() == district_turn)
    {
        aborted = advance_map(ctx, map, load_generation, &mut report)?;
        if aborted.is_some() {
            break;
        }
        let effects = next_map_turn(ctx, map, flags)?;
        report.map_turns = report.map_turns.saturating_add(1);
        announcements.extend(effects.announcements);
    }
    if let Some(reason) = aborted {
        report.outcome = AdvanceOutcome::Aborted(reason);
        report.district_turn = district.local_turn();
        debug!(district = %report.district, ?reason, "District advance aborted");
        return Ok(report);
    }

    // 2. World time, when this is the player's district
    if let Some(world) = world {
        let turn = world.time.increment()?;
        ctx.signals.publish_world_turn(turn);
        for message in announcements {
            world.push_message(message);
        }
        announce_time_of_day(world);
        if turn >= world.next_weather_change {
            let weather = world.weather_system().next_weather(world.weather, turn);
            world.weather = weather;
            world.next_weather_change = world.weather_system().next_change_turn(turn);
            ctx.signals.publish_weather(weather);
            world.push_message(format!("The weather turns {weather:?}."));
        }
    }

    // 3. Scripted events, once per entry-map turn
    let entry_turn = district.entry_map_mut()?.local_time().turn();
    if district.claim_event_turn(entry_turn) {
        report.events = run_scripted_events(ctx, district)?;
    }

    report.district_turn = district.local_turn();
    report.player_sleeping = district.is_player_sleeping();
    debug!(
        district = %report.district,
        turn = report.district_turn,
        actions = report.actions,
        map_turns = report.map_turns,
        events = report.events.len(),
        "District advanced"
    );
    Ok(report)
}

/// Dawn, dusk, and midnight messages on the hour they strike.
fn announce_time_of_day(world: &mut WorldState) {
    let time = world.time;
    if time.is_strike_of_midnight() {
        world.push_message(format!("Midnight. Day {} begins.", time.day()));
        info!(day = time.day(), "New day");
    } else if time.is_strike_of_hour() && time.hour() == 6 {
        world.push_message("The sun rises.");
    } else if time.is_strike_of_hour() && time.hour() == 18 {
        world.push_message("The sun sets.");
    }
}

/// Why the in-flight advance must stop, if it must.
fn abort_reason(ctx: &SimContext, load_generation: u64) -> Option<AbortReason> {
    if ctx.signals.is_player_dead() {
        Some(AbortReason::PlayerDied)
    } else if ctx.signals.load_generation() != load_generation {
        Some(AbortReason::GameLoaded)
    } else if ctx.is_abort_requested() {
        Some(AbortReason::StopRequested)
    } else {
        None
    }
}

/// Let actors act until the scheduler runs dry.
fn advance_map(
    ctx: &mut SimContext,
    map: &mut Map,
    load_generation: u64,
    report: &mut AdvanceReport,
) -> Result<Option<AbortReason>, SimError> {
    let mut guard = LoopGuard::new(ctx.config.simulation.ai_loop_threshold);
    let turn = map.local_time().turn();
    loop {
        if let Some(reason) = abort_reason(ctx, load_generation) {
            return Ok(Some(reason));
        }
        let Some(index) = next_actor_to_act(map, turn) else {
            return Ok(None);
        };
        if act(ctx, map, index, turn, &mut guard)? {
            report.forced_waits = report.forced_waits.saturating_add(1);
        } else {
            report.actions = report.actions.saturating_add(1);
        }
    }
}

/// One actor turn. Returns `true` when a wait was forced on a looping actor.
fn act(
    ctx: &mut SimContext,
    map: &mut Map,
    index: usize,
    turn: u64,
    guard: &mut LoopGuard,
) -> Result<bool, SimError> {
    let policy = ctx.config.simulation.failure_policy;
    let (actor_id, verdict) = {
        let actor = map.actors.get(index).ok_or_else(|| SimError::Invariant {
            reason: format!("scheduler returned empty slot {index} on map {}", map.id()),
        })?;
        (actor.id, guard.observe(actor))
    };

    if let LoopVerdict::Looping { selections } = verdict {
        if policy == FailurePolicy::Production {
            warn!(actor = %actor_id, selections, "AI loop detected, forcing a wait");
            if let Some(actor) = map.actors.get_mut(index) {
                actor.action_points = actor.action_points.saturating_sub(BASE_ACTION_COST);
                actor.last_action_turn = Some(turn);
            }
            return Ok(true);
        }
        warn!(actor = %actor_id, selections, "AI loop detected");
    }

    let action = match ctx.decisions.decide(map, index) {
        Ok(action) => action,
        Err(source) if policy == FailurePolicy::Production => {
            warn!(actor = %actor_id, error = %source, "Decision failed, waiting instead");
            Action::Wait
        }
        Err(source) => {
            return Err(SimError::Decision {
                actor: actor_id,
                source,
            });
        }
    };

    let action = if ctx.executor.is_legal(map, index, &action) {
        action
    } else if policy == FailurePolicy::Production {
        warn!(actor = %actor_id, ?action, "Illegal action, waiting instead");
        Action::Wait
    } else {
        return Err(SimError::IllegalAction {
            actor: actor_id,
            action,
        });
    };

    let outcome = ctx.executor.perform(map, index, &action)?;
    if let Some(actor) = map.actors.get_mut(index) {
        actor.last_action_turn = Some(turn);
    }
    if killed_player(map, &outcome.killed) {
        ctx.signals.set_player_dead(true);
        info!(killer = %actor_id, "Player killed");
    }
    Ok(false)
}

fn killed_player(map: &Map, killed: &[ActorId]) -> bool {
    map.player().is_some_and(|p| killed.contains(&p.id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::context::{CollaboratorFactory, IdleCollaborators, WorldSignals};
    use crate::decision::{DecisionError, DecisionSource};
    use crate::events::EventKind;
    use crate::executor::ActionExecutor;
    use holdout_types::{Actor, ActorModel, Direction, MapKind, Point, Weather};
    use holdout_world::{District, DistrictGrid, TURNS_PER_DAY, TURNS_PER_HOUR};

    /// A 3x3 grid; the center holds the player, every district a few
    /// civilians.
    fn world(config: SimulationConfig, factory: &dyn CollaboratorFactory) -> (SimContext, DistrictGrid, WorldState) {
        let center = DistrictPos::new(1, 1);
        let mut player_id = None;
        let mut districts = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                let pos = DistrictPos::new(x, y);
                let mut surface = Map::new(MapKind::Surface, 10, 10);
                for i in 0..3 {
                    let mut actor = Actor::new("c", ActorModel::Civilian, Point::new(2 + i, 5));
                    actor.action_points = BASE_ACTION_COST;
                    surface.spawn_actor(actor);
                }
                if pos == center {
                    let mut player = Actor::new("p", ActorModel::Survivor, Point::new(5, 8));
                    player.is_player = true;
                    player_id = Some(player.id);
                    surface.spawn_actor(player);
                }
                // Start mid-morning so no scripted event strikes.
                surface.jump_to(9 * TURNS_PER_HOUR + 1);
                districts.push(District::new(pos, vec![surface, Map::new(MapKind::Sewers, 10, 10)]));
            }
        }
        for district in &mut districts {
            district.jump_to(9 * TURNS_PER_HOUR + 1);
        }
        let grid = DistrictGrid::new(3, 3, districts).unwrap();
        let signals = Arc::new(WorldSignals::new(9 * TURNS_PER_HOUR + 1, Weather::Clear));
        let ctx = SimContext::new(Arc::new(config), signals, 11, factory);
        let mut state = WorldState::new(11, 9 * TURNS_PER_HOUR + 1, center, player_id.unwrap());
        state.next_weather_change = u64::MAX;
        (ctx, grid, state)
    }

    #[test]
    fn player_district_moves_world_time() {
        let (mut ctx, grid, mut state) = world(SimulationConfig::default(), &IdleCollaborators);
        let start = state.time.turn();
        let center = state.current_district;
        let report = advance_district(&mut ctx, &grid, center, SimFlags::NOT_SIMULATING, Some(&mut state)).unwrap();

        assert!(report.is_completed());
        assert_eq!(report.map_turns, 2);
        assert_eq!(report.actions, 3);
        assert_eq!(state.time.turn(), start + 1);
        assert_eq!(ctx.signals.world_turn(), start + 1);
        assert_eq!(report.district_turn, start + 1);
        let neighbor = grid.lock(DistrictPos::new(0, 0)).unwrap();
        assert_eq!(neighbor.local_turn(), start);
    }

    #[test]
    fn off_screen_district_leaves_world_time() {
        let (mut ctx, grid, state) = world(SimulationConfig::default(), &IdleCollaborators);
        let start = state.time.turn();
        let report = advance_district(
            &mut ctx,
            &grid,
            DistrictPos::new(0, 0),
            SimFlags::HIDETAIL_TURN,
            None,
        )
        .unwrap();
        assert_eq!(report.district_turn, start + 1);
        assert_eq!(ctx.signals.world_turn(), start);
    }

    #[test]
    fn only_lagging_maps_advance() {
        let (mut ctx, grid, _) = world(SimulationConfig::default(), &IdleCollaborators);
        let pos = DistrictPos::new(2, 2);
        let ahead = {
            let mut district = grid.lock(pos).unwrap();
            let sewers = district.map_mut(MapKind::Sewers).unwrap();
            sewers.jump_to(sewers.local_time().turn() + 1);
            sewers.local_time().turn()
        };
        let report = advance_district(&mut ctx, &grid, pos, SimFlags::HIDETAIL_TURN, None).unwrap();
        assert_eq!(report.map_turns, 1);
        let district = grid.lock(pos).unwrap();
        assert!(district.maps.iter().all(|m| m.local_time().turn() == ahead));
    }

    #[test]
    fn sleeping_player_pulls_neighbors_along() {
        let (mut ctx, grid, mut state) = world(SimulationConfig::default(), &IdleCollaborators);
        let center = state.current_district;
        {
            let mut district = grid.lock(center).unwrap();
            let entry = district.entry_map_mut().unwrap();
            let player = state.player;
            let sleeper = entry.actor_mut(player).unwrap();
            sleeper.is_sleeping = true;
            sleeper.sleep.set(100);
        }
        let report = advance_district(&mut ctx, &grid, center, SimFlags::NOT_SIMULATING, Some(&mut state)).unwrap();
        assert!(report.player_sleeping);
        assert_eq!(report.neighbors_advanced, 8);
        for pos in grid.neighbors(center) {
            assert_eq!(grid.lock(pos).unwrap().local_turn(), state.time.turn());
        }
    }

    #[test]
    fn weather_changes_on_schedule() {
        let (mut ctx, grid, mut state) = world(SimulationConfig::default(), &IdleCollaborators);
        state.next_weather_change = state.time.turn() + 1;
        let center = state.current_district;
        advance_district(&mut ctx, &grid, center, SimFlags::NOT_SIMULATING, Some(&mut state)).unwrap();
        assert_ne!(state.weather, Weather::Clear);
        assert_eq!(ctx.signals.weather(), state.weather);
        assert!(state.next_weather_change > state.time.turn());
    }

    /// Returns a fixed action and never pays for it.
    struct Fixed(Action);

    impl DecisionSource for Fixed {
        fn decide(&mut self, _map: &Map, _index: usize) -> Result<Action, DecisionError> {
            Ok(self.0)
        }
    }

    struct FreeWaits;

    impl ActionExecutor for FreeWaits {
        fn is_legal(&self, _map: &Map, _index: usize, _action: &Action) -> bool {
            true
        }

        fn perform(
            &mut self,
            _map: &mut Map,
            _index: usize,
            _action: &Action,
        ) -> Result<holdout_types::ActionOutcome, holdout_world::WorldError> {
            Ok(holdout_types::ActionOutcome::default())
        }
    }

    #[test]
    fn looping_ai_gets_a_forced_wait() {
        let mut config = SimulationConfig::default();
        config.simulation.ai_loop_threshold = 5;
        let (mut ctx, grid, _) = world(config, &IdleCollaborators);
        ctx.executor = Box::new(FreeWaits);
        let report = advance_district(&mut ctx, &grid, DistrictPos::new(0, 0), SimFlags::HIDETAIL_TURN, None).unwrap();
        assert!(report.is_completed());
        assert_eq!(report.forced_waits, 3);
        assert_eq!(report.actions, 15);
    }

    #[test]
    fn illegal_action_becomes_wait_in_production() {
        let (mut ctx, grid, _) = world(SimulationConfig::default(), &IdleCollaborators);
        ctx.decisions = Box::new(Fixed(Action::Move {
            dir: Direction::North,
        }));
        {
            let mut district = grid.lock(DistrictPos::new(0, 0)).unwrap();
            for actor in &mut district.entry_map_mut().unwrap().actors {
                actor.pos.y = 0;
            }
        }
        let report = advance_district(&mut ctx, &grid, DistrictPos::new(0, 0), SimFlags::HIDETAIL_TURN, None).unwrap();
        assert_eq!(report.actions, 3);
    }

    #[test]
    fn illegal_action_is_an_error_in_debug() {
        let mut config = SimulationConfig::default();
        config.simulation.failure_policy = FailurePolicy::Debug;
        let (mut ctx, grid, _) = world(config, &IdleCollaborators);
        ctx.decisions = Box::new(Fixed(Action::Attack {
            target: ActorId::new(),
        }));
        let err = advance_district(&mut ctx, &grid, DistrictPos::new(0, 0), SimFlags::HIDETAIL_TURN, None).unwrap_err();
        assert!(matches!(err, SimError::IllegalAction { .. }));
    }

    /// Loads a game in the middle of the advance.
    struct Loader(Arc<WorldSignals>);

    impl DecisionSource for Loader {
        fn decide(&mut self, _map: &Map, _index: usize) -> Result<Action, DecisionError> {
            self.0.bump_load_generation();
            Ok(Action::Wait)
        }
    }

    #[test]
    fn load_aborts_the_advance() {
        let (mut ctx, grid, _) = world(SimulationConfig::default(), &IdleCollaborators);
        ctx.decisions = Box::new(Loader(Arc::clone(&ctx.signals)));
        let pos = DistrictPos::new(0, 0);
        let before = grid.lock(pos).unwrap().local_turn();
        let report = advance_district(&mut ctx, &grid, pos, SimFlags::HIDETAIL_TURN, None).unwrap();
        assert_eq!(report.outcome, AdvanceOutcome::Aborted(AbortReason::GameLoaded));
        assert_eq!(report.actions, 1);
        assert_eq!(grid.lock(pos).unwrap().local_turn(), before);
    }

    /// Bumps the load generation on its first decision only.
    struct LoadOnce {
        signals: Arc<WorldSignals>,
        fired: bool,
    }

    impl DecisionSource for LoadOnce {
        fn decide(&mut self, _map: &Map, _index: usize) -> Result<Action, DecisionError> {
            if !self.fired {
                self.fired = true;
                self.signals.bump_load_generation();
            }
            Ok(Action::Wait)
        }
    }

    /// One district one turn before midnight: an empty surface and a
    /// sewers map holding a single ready civilian.
    fn eve_of_midnight() -> DistrictGrid {
        let pos = DistrictPos::new(0, 0);
        let surface = Map::new(MapKind::Surface, 10, 10);
        let mut sewers = Map::new(MapKind::Sewers, 10, 10);
        let mut rat = Actor::new("c", ActorModel::Civilian, Point::new(3, 3));
        rat.action_points = BASE_ACTION_COST;
        sewers.spawn_actor(rat);
        let mut district = District::new(pos, vec![surface, sewers]);
        district.jump_to(TURNS_PER_DAY - 1);
        DistrictGrid::new(1, 1, vec![district]).unwrap()
    }

    #[test]
    fn events_run_once_the_aborted_turn_completes() {
        let grid = eve_of_midnight();
        let signals = Arc::new(WorldSignals::new(TURNS_PER_DAY, Weather::Clear));
        let mut ctx = SimContext::new(Arc::new(SimulationConfig::default()), Arc::clone(&signals), 3, &IdleCollaborators);
        ctx.decisions = Box::new(LoadOnce { signals, fired: false });
        let pos = DistrictPos::new(0, 0);

        // The surface reaches midnight, then the sewers pass is cut short.
        let first = advance_district(&mut ctx, &grid, pos, SimFlags::HIDETAIL_TURN, None).unwrap();
        assert_eq!(first.outcome, AdvanceOutcome::Aborted(AbortReason::GameLoaded));
        assert!(first.events.is_empty());
        assert_eq!(grid.lock(pos).unwrap().last_event_turn, None);

        // Only the sewers advance, and midnight's invasion rolls now.
        let second = advance_district(&mut ctx, &grid, pos, SimFlags::HIDETAIL_TURN, None).unwrap();
        assert!(second.is_completed());
        let invasions = second.events.iter().filter(|e| e.kind == EventKind::ZombieInvasion).count();
        assert_eq!(invasions, 1);
        assert_eq!(grid.lock(pos).unwrap().last_event_turn, Some(TURNS_PER_DAY));
    }

    #[test]
    fn lagging_map_pass_does_not_reroll_events() {
        let grid = eve_of_midnight();
        let pos = DistrictPos::new(0, 0);
        {
            let mut district = grid.lock(pos).unwrap();
            district.entry_map_mut().unwrap().jump_to(TURNS_PER_DAY);
            district.last_event_turn = Some(TURNS_PER_DAY);
        }
        let (mut ctx, _, _) = world(SimulationConfig::default(), &IdleCollaborators);

        let report = advance_district(&mut ctx, &grid, pos, SimFlags::HIDETAIL_TURN, None).unwrap();

        assert!(report.is_completed());
        assert_eq!(report.map_turns, 1);
        assert!(report.events.is_empty());
        assert_eq!(grid.lock(pos).unwrap().local_turn(), TURNS_PER_DAY);
    }

    #[test]
    fn dead_player_aborts_the_advance() {
        let (mut ctx, grid, mut state) = world(SimulationConfig::default(), &IdleCollaborators);
        ctx.signals.set_player_dead(true);
        let center = state.current_district;
        let start = state.time.turn();
        let report = advance_district(&mut ctx, &grid, center, SimFlags::NOT_SIMULATING, Some(&mut state)).unwrap();
        assert_eq!(report.outcome, AdvanceOutcome::Aborted(AbortReason::PlayerDied));
        assert_eq!(state.time.turn(), start);
    }

    #[test]
    fn abort_flag_stops_between_actors() {
        let (mut ctx, grid, _) = world(SimulationConfig::default(), &IdleCollaborators);
        ctx.abort.store(true, std::sync::atomic::Ordering::Release);
        let report = advance_district(&mut ctx, &grid, DistrictPos::new(0, 0), SimFlags::HIDETAIL_TURN, None).unwrap();
        assert_eq!(report.outcome, AdvanceOutcome::Aborted(AbortReason::StopRequested));
        assert_eq!(report.actions, 0);
    }
}
