//! The main-thread game session.
//!
//! [`Session`] owns the world clock, the player's whereabouts, the main
//! thread's simulation context, and the background worker handle. It is the
//! only coordinator of the worker: the worker is stopped before anything
//! that must not race with it (district changes, shutdown) and restarted
//! afterwards.

use std::sync::Arc;

use holdout_types::{Actor, ActorId, DistrictPos, Point, Weather};
use holdout_world::{DistrictGrid, Map, WorldError};
use tracing::{info, warn};

use crate::advancer::{AdvanceReport, advance_district};
use crate::catch_up::{CatchUpProgress, CatchUpReport, catch_up};
use crate::config::SimulationConfig;
use crate::context::{CollaboratorFactory, SimContext, WorldSignals, WorldState};
use crate::error::{SessionError, SimError, SimThreadError};
use crate::flags::SimFlags;
use crate::sim_thread::{SimThread, SimThreadParams, SimThreadStatus, StopMode, StopOutcome};

/// Salt separating the worker's random stream from the main thread's.
const WORKER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// A running game.
pub struct Session {
    config: Arc<SimulationConfig>,
    grid: Arc<DistrictGrid>,
    signals: Arc<WorldSignals>,
    factory: Arc<dyn CollaboratorFactory>,
    ctx: SimContext,
    world: WorldState,
    sim_thread: SimThread,
    worker_starts: u64,
}

impl Session {
    /// Open a session on a generated world whose player stands in
    /// `player_district`. World time starts at that district's turn.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PlayerMissing`] if the district holds no
    /// player.
    pub fn new(
        config: Arc<SimulationConfig>,
        grid: Arc<DistrictGrid>,
        player_district: DistrictPos,
        factory: Arc<dyn CollaboratorFactory>,
    ) -> Result<Self, SessionError> {
        let (turn, player) = {
            let district = grid.lock(player_district)?;
            let player = district
                .maps
                .iter()
                .find_map(Map::player)
                .map(|p| p.id)
                .ok_or(SessionError::PlayerMissing(player_district))?;
            (district.local_turn(), player)
        };

        let signals = Arc::new(WorldSignals::new(turn, Weather::Clear));
        let world = WorldState::new(config.world.seed, turn, player_district, player);
        let ctx = SimContext::new(
            Arc::clone(&config),
            Arc::clone(&signals),
            config.world.seed,
            factory.as_ref(),
        );
        info!(
            world = %config.world.name,
            district = %player_district,
            turn,
            "Session opened"
        );
        Ok(Self {
            config,
            grid,
            signals,
            factory,
            ctx,
            world,
            sim_thread: SimThread::new(),
            worker_starts: 0,
        })
    }

    /// Shared configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The world grid.
    pub fn grid(&self) -> &DistrictGrid {
        &self.grid
    }

    /// Main-thread world state.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Published world facts.
    pub fn signals(&self) -> &WorldSignals {
        &self.signals
    }

    /// The district the player is in.
    pub const fn current_district(&self) -> DistrictPos {
        self.world.current_district
    }

    /// The player's actor id.
    pub const fn player(&self) -> ActorId {
        self.world.player
    }

    /// Whether the player has died.
    pub fn is_player_dead(&self) -> bool {
        self.signals.is_player_dead()
    }

    /// Background worker diagnostics.
    pub fn sim_thread_status(&self) -> SimThreadStatus {
        self.sim_thread.status()
    }

    /// Start the background worker for the current district. Returns
    /// `false` when background simulation is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Thread`] if the worker cannot be spawned or
    /// is already running.
    pub fn start_background(&mut self) -> Result<bool, SessionError> {
        let seed = self
            .config
            .world
            .seed
            .wrapping_add(WORKER_SEED_SALT.wrapping_mul(self.worker_starts.wrapping_add(1)));
        let params = SimThreadParams {
            config: Arc::clone(&self.config),
            grid: Arc::clone(&self.grid),
            signals: Arc::clone(&self.signals),
            player_district: self.world.current_district,
            seed,
            factory: Arc::clone(&self.factory),
        };
        match self.sim_thread.start(&params) {
            Ok(()) => {
                self.worker_starts = self.worker_starts.saturating_add(1);
                Ok(true)
            }
            Err(SimThreadError::Disabled) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Stop the worker, escalating to an abort if a graceful stop times out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Thread`] on unexpected worker errors.
    pub fn stop_background(&mut self) -> Result<StopOutcome, SessionError> {
        match self.sim_thread.stop(StopMode::Graceful) {
            Ok(outcome) => Ok(outcome),
            Err(SimThreadError::StopTimeout { waited_ms }) => {
                warn!(waited_ms, "Graceful stop timed out, aborting the simulation thread");
                Ok(self.sim_thread.stop(StopMode::Abort)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Advance the player's district by one world turn at full detail.
    ///
    /// The worker is stopped as soon as the player is found dead.
    ///
    /// # Errors
    ///
    /// Propagates [`SimError`]s from the advance.
    pub fn play_turn(&mut self) -> Result<AdvanceReport, SessionError> {
        let report = advance_district(
            &mut self.ctx,
            &self.grid,
            self.world.current_district,
            SimFlags::NOT_SIMULATING,
            Some(&mut self.world),
        )?;
        if self.signals.is_player_dead() && self.sim_thread.is_running() {
            info!(turn = self.world.time.turn(), "Player died, stopping background simulation");
            self.sim_thread.stop(StopMode::Abort)?;
        }
        Ok(report)
    }

    /// Move the player to another district.
    ///
    /// The worker is stopped, the new district is caught up to world time,
    /// the player leaves the old district for the new district's entry
    /// map, and the worker is restarted around the new district. On any
    /// error the player stays where it was and a worker that was running
    /// is restarted around the old district.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::World`] if `to` is off the grid,
    /// [`SessionError::PlayerMissing`] if the player is not where the
    /// session expects it, and propagates catch-up errors.
    pub fn change_district(
        &mut self,
        to: DistrictPos,
        progress: &mut dyn CatchUpProgress,
    ) -> Result<CatchUpReport, SessionError> {
        if !self.grid.contains(to) {
            return Err(WorldError::DistrictNotFound(to).into());
        }
        let from = self.world.current_district;
        let was_running = self.sim_thread.is_running();
        if was_running {
            self.stop_background()?;
        }

        let result = self.enter_district(from, to, progress);
        match &result {
            Ok(report) => {
                self.world.current_district = to;
                self.world
                    .push_message(format!("You enter district {to}."));
                info!(%from, %to, outcome = ?report.outcome, "District changed");
            }
            Err(e) => warn!(%from, %to, error = %e, "District change failed, player stays"),
        }

        if was_running {
            match self.start_background() {
                Ok(_) => {}
                Err(e) if result.is_ok() => return Err(e),
                Err(e) => warn!(district = %from, error = %e, "Failed to restart the simulation thread"),
            }
        }
        result
    }

    /// Signal that a saved game was loaded; in-flight advances bail out.
    pub fn mark_game_loaded(&mut self) -> u64 {
        let generation = self.signals.bump_load_generation();
        info!(generation, "Game loaded");
        generation
    }

    /// Abort-stop the worker.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Thread`] on unexpected worker errors.
    pub fn shutdown(&mut self) -> Result<StopOutcome, SessionError> {
        let outcome = self.sim_thread.stop(StopMode::Abort)?;
        info!(turn = self.world.time.turn(), ?outcome, "Session shut down");
        Ok(outcome)
    }

    /// Catch `to` up, then move the player onto its entry map. Every
    /// fallible step runs before the player is taken out of `from`.
    fn enter_district(
        &mut self,
        from: DistrictPos,
        to: DistrictPos,
        progress: &mut dyn CatchUpProgress,
    ) -> Result<CatchUpReport, SessionError> {
        let report = catch_up(&mut self.ctx, &self.grid, to, self.world.time.turn(), progress)?;
        if to == from {
            return Ok(report);
        }

        let near = self.player_pos(from)?;
        let mut district = self.grid.lock(to)?;
        let entry = district.entry_map_mut()?;
        let pos = free_tile_near(entry, near).ok_or_else(|| SimError::Invariant {
            reason: format!("no free tile for the player in district {to}"),
        })?;
        let mut player = self.take_player(from)?;
        player.pos = pos;
        entry.spawn_actor(player);
        Ok(report)
    }

    fn player_pos(&self, from: DistrictPos) -> Result<Point, SessionError> {
        let district = self.grid.lock(from)?;
        district
            .maps
            .iter()
            .find_map(|map| map.actor(self.world.player))
            .map(|p| p.pos)
            .ok_or(SessionError::PlayerMissing(from))
    }

    fn take_player(&self, from: DistrictPos) -> Result<Actor, SessionError> {
        let mut district = self.grid.lock(from)?;
        district
            .maps
            .iter_mut()
            .find_map(|map| {
                let index = map.actor_index(self.world.player)?;
                map.remove_actor(index)
            })
            .ok_or(SessionError::PlayerMissing(from))
    }
}

/// Nearest walkable tile to `near`, searching outward ring by ring.
fn free_tile_near(map: &Map, near: Point) -> Option<Point> {
    let near = Point::new(
        near.x.clamp(0, map.width().saturating_sub(1)),
        near.y.clamp(0, map.height().saturating_sub(1)),
    );
    let max_ring = map.width().max(map.height());
    (0..=max_ring).find_map(|ring| {
        let low = ring.saturating_neg();
        (low..=ring)
            .flat_map(move |dy| (low..=ring).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx.unsigned_abs() == ring.unsigned_abs() || dy.unsigned_abs() == ring.unsigned_abs())
            .map(|(dx, dy)| near.offset(dx, dy))
            .find(|&p| map.is_walkable(p))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, MapKind};

    #[test]
    fn free_tile_prefers_the_spot_itself() {
        let map = Map::new(MapKind::Surface, 5, 5);
        assert_eq!(free_tile_near(&map, Point::new(2, 2)), Some(Point::new(2, 2)));
    }

    #[test]
    fn free_tile_clamps_and_steps_aside() {
        let mut map = Map::new(MapKind::Surface, 5, 5);
        map.spawn_actor(Actor::new("a", ActorModel::Civilian, Point::new(4, 4)));
        let found = free_tile_near(&map, Point::new(9, 9)).unwrap();
        assert!(found.is_adjacent(Point::new(4, 4)));
    }

    #[test]
    fn full_map_has_no_free_tile() {
        let mut map = Map::new(MapKind::Surface, 1, 1);
        map.spawn_actor(Actor::new("a", ActorModel::Civilian, Point::new(0, 0)));
        assert_eq!(free_tile_near(&map, Point::new(0, 0)), None);
    }
}
