//! Background simulation worker.
//!
//! While the player plays, a single worker thread advances the districts
//! around the player's one so that they are already close to world time
//! when the player walks in. The worker never touches the player's
//! district and never touches [`WorldState`](crate::context::WorldState);
//! it reads world facts from [`WorldSignals`] and takes each district's
//! mutex for exactly one advance at a time.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! Stopped --start--> Starting --worker up--> Running
//! Running --stop--> StopRequested --worker acknowledges--> Stopped
//! ```
//!
//! Errors and panics inside the worker are caught, logged, and recorded
//! for [`SimThread::status`]; they are never re-thrown on the main thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use holdout_types::DistrictPos;
use holdout_world::DistrictGrid;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::advancer::{AbortReason, AdvanceOutcome, advance_if_behind};
use crate::config::SimulationConfig;
use crate::context::{CollaboratorFactory, SimContext, WorldSignals};
use crate::error::{SimError, SimThreadError};

/// Name of the worker thread.
pub const SIM_THREAD_NAME: &str = "holdout-sim";

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimThreadState {
    /// No worker is running.
    #[default]
    Stopped,
    /// A worker was spawned and has not reported in yet.
    Starting,
    /// The worker is advancing districts.
    Running,
    /// A stop was requested; the worker has not acknowledged it yet.
    StopRequested,
}

/// How hard to stop the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Let the district being advanced finish.
    Graceful,
    /// Also bail out of the current advance between two actor turns.
    Abort,
}

/// How a stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no worker to stop.
    AlreadyStopped,
    /// The worker acknowledged and exited.
    Stopped,
    /// The worker never acknowledged an abort and was left to finish on
    /// its own.
    Detached,
}

/// Snapshot of the worker for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimThreadStatus {
    /// Lifecycle state.
    pub state: SimThreadState,
    /// When the current (or last) worker started.
    pub started_at: Option<DateTime<Utc>>,
    /// Passes over the neighborhood since start.
    pub passes: u64,
    /// District advances since start.
    pub districts_advanced: u64,
    /// Error that terminated the last worker, if any.
    pub last_error: Option<String>,
}

/// Everything a worker needs.
pub struct SimThreadParams {
    /// Shared configuration.
    pub config: Arc<SimulationConfig>,
    /// The world grid.
    pub grid: Arc<DistrictGrid>,
    /// Published world facts.
    pub signals: Arc<WorldSignals>,
    /// The district the player is in; never advanced by the worker.
    pub player_district: DistrictPos,
    /// Seed of the worker's random generator and decision source.
    pub seed: u64,
    /// Builds the worker's AI collaborators.
    pub factory: Arc<dyn CollaboratorFactory>,
}

#[derive(Debug, Default)]
struct WorkerStats {
    started_at: Option<DateTime<Utc>>,
    passes: u64,
    districts_advanced: u64,
    last_error: Option<String>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<SimThreadState>,
    changed: Condvar,
    stats: Mutex<WorkerStats>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SimThreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stats(&self) -> MutexGuard<'_, WorkerStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SimThreadState) {
        *self.state() = state;
        self.changed.notify_all();
    }
}

/// Handle on the background worker, owned by the main thread.
#[derive(Debug)]
pub struct SimThread {
    shared: Arc<Shared>,
    abort: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    ack_rx: Option<Receiver<()>>,
    handle: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl Default for SimThread {
    fn default() -> Self {
        Self::new()
    }
}

impl SimThread {
    /// A stopped worker handle.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            abort: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            ack_rx: None,
            handle: None,
            stop_timeout: Duration::ZERO,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SimThreadState {
        *self.shared.state()
    }

    /// Whether a worker exists (starting, running, or stopping).
    pub fn is_running(&self) -> bool {
        self.state() != SimThreadState::Stopped
    }

    /// Error that terminated the last worker, if any.
    pub fn last_error(&self) -> Option<String> {
        self.shared.stats().last_error.clone()
    }

    /// Diagnostics snapshot.
    pub fn status(&self) -> SimThreadStatus {
        let state = self.state();
        let stats = self.shared.stats();
        SimThreadStatus {
            state,
            started_at: stats.started_at,
            passes: stats.passes,
            districts_advanced: stats.districts_advanced,
            last_error: stats.last_error.clone(),
        }
    }

    /// Spawn the worker and wait until it reports running.
    ///
    /// # Errors
    ///
    /// Returns [`SimThreadError::Disabled`] when background simulation is
    /// off, [`SimThreadError::AlreadyRunning`] when a worker exists, and
    /// [`SimThreadError::Spawn`] when the OS refuses the thread.
    pub fn start(&mut self, params: &SimThreadParams) -> Result<(), SimThreadError> {
        let settings = &params.config.simulation;
        if !settings.sim_thread_enabled || settings.sim_ratio.is_off() {
            return Err(SimThreadError::Disabled);
        }
        if self.handle.is_some() && self.state() == SimThreadState::Stopped {
            // The previous worker terminated on its own.
            self.reap();
        }
        {
            let mut state = self.shared.state();
            if *state != SimThreadState::Stopped {
                return Err(SimThreadError::AlreadyRunning);
            }
            *state = SimThreadState::Starting;
        }
        self.shared.changed.notify_all();

        let sleep = Duration::from_millis(settings.sim_thread_sleep_ms);
        self.stop_timeout = Duration::from_millis(settings.stop_timeout_ms);
        self.abort.store(false, Ordering::Release);
        *self.shared.stats() = WorkerStats {
            started_at: Some(Utc::now()),
            ..WorkerStats::default()
        };

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        let ctx = SimContext::new(
            Arc::clone(&params.config),
            Arc::clone(&params.signals),
            params.seed,
            params.factory.as_ref(),
        )
        .with_abort(Arc::clone(&self.abort));
        let worker = Worker {
            shared: Arc::clone(&self.shared),
            ctx,
            grid: Arc::clone(&params.grid),
            player_district: params.player_district,
            sleep,
            stop_rx,
            ack_tx,
        };

        let spawned = thread::Builder::new()
            .name(SIM_THREAD_NAME.to_owned())
            .spawn(move || worker.run());
        let handle = match spawned {
            Ok(handle) => handle,
            Err(source) => {
                self.shared.set_state(SimThreadState::Stopped);
                return Err(SimThreadError::Spawn { source });
            }
        };
        self.handle = Some(handle);
        self.stop_tx = Some(stop_tx);
        self.ack_rx = Some(ack_rx);

        let guard = self.shared.state();
        let (state, _) = self
            .shared
            .changed
            .wait_timeout_while(guard, self.stop_timeout, |s| *s == SimThreadState::Starting)
            .unwrap_or_else(PoisonError::into_inner);
        info!(
            player_district = %params.player_district,
            state = ?*state,
            "Simulation thread started"
        );
        Ok(())
    }

    /// Stop the worker.
    ///
    /// A graceful stop lets the current district advance finish. An abort
    /// additionally interrupts it between two actor turns; if even that is
    /// not acknowledged in time, the worker is detached.
    ///
    /// # Errors
    ///
    /// Returns [`SimThreadError::StopTimeout`] when a graceful stop is not
    /// acknowledged in time. The worker keeps its `StopRequested` state and
    /// the caller may escalate to [`StopMode::Abort`].
    pub fn stop(&mut self, mode: StopMode) -> Result<StopOutcome, SimThreadError> {
        if self.handle.is_none() {
            return Ok(StopOutcome::AlreadyStopped);
        }
        {
            let mut state = self.shared.state();
            if *state == SimThreadState::Stopped {
                // The worker terminated on its own.
                drop(state);
                self.reap();
                return Ok(StopOutcome::Stopped);
            }
            *state = SimThreadState::StopRequested;
        }
        self.shared.changed.notify_all();

        if mode == StopMode::Abort {
            self.abort.store(true, Ordering::Release);
        }
        if let Some(stop_tx) = &self.stop_tx {
            // A full channel already holds a stop request.
            if stop_tx.try_send(()).is_err() {
                debug!("Stop request already pending");
            }
        }

        if self.wait_for_ack() {
            self.reap();
            info!(?mode, "Simulation thread stopped");
            return Ok(StopOutcome::Stopped);
        }

        let waited_ms = u64::try_from(self.stop_timeout.as_millis()).unwrap_or(u64::MAX);
        match mode {
            StopMode::Graceful => {
                warn!(waited_ms, "Simulation thread did not acknowledge stop");
                Err(SimThreadError::StopTimeout { waited_ms })
            }
            StopMode::Abort => {
                warn!(waited_ms, "Simulation thread did not acknowledge abort, detaching it");
                self.detach();
                Ok(StopOutcome::Detached)
            }
        }
    }

    fn wait_for_ack(&self) -> bool {
        let Some(ack_rx) = &self.ack_rx else {
            return true;
        };
        match ack_rx.recv_timeout(self.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Join a finished worker and drop its channels.
    fn reap(&mut self) {
        self.stop_tx = None;
        self.ack_rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Simulation thread panicked outside its guard");
            }
        }
        self.shared.set_state(SimThreadState::Stopped);
    }

    /// Forget a worker that will not stop; the next start uses fresh shared
    /// state so the stray worker cannot be confused with it.
    fn detach(&mut self) {
        self.stop_tx = None;
        self.ack_rx = None;
        self.handle = None;
        let last_error = self.last_error();
        self.shared = Arc::new(Shared::default());
        self.shared.stats().last_error = last_error;
        self.abort = Arc::new(AtomicBool::new(false));
    }
}

impl Drop for SimThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop(StopMode::Abort) {
                warn!(error = %e, "Failed to stop simulation thread on drop");
            }
        }
    }
}

/// The worker side.
struct Worker {
    shared: Arc<Shared>,
    ctx: SimContext,
    grid: Arc<DistrictGrid>,
    player_district: DistrictPos,
    sleep: Duration,
    stop_rx: Receiver<()>,
    ack_tx: Sender<()>,
}

impl Worker {
    fn run(mut self) {
        self.shared.set_state(SimThreadState::Running);
        debug!(player_district = %self.player_district, "Simulation thread running");

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_loop()));
        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                error!(error = %e, "Simulation thread terminated by an error");
                Some(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Simulation thread panicked");
                Some(format!("panic: {message}"))
            }
        };
        if failure.is_some() {
            self.shared.stats().last_error = failure;
        }

        self.shared.set_state(SimThreadState::Stopped);
        if self.ack_tx.try_send(()).is_err() {
            debug!("Nobody waiting for the stop acknowledgement");
        }
    }

    fn stop_pending(&self) -> bool {
        matches!(
            self.stop_rx.try_recv(),
            Ok(()) | Err(TryRecvError::Disconnected)
        )
    }

    fn run_loop(&mut self) -> Result<(), SimError> {
        loop {
            match self.stop_rx.recv_timeout(self.sleep) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {}
            }
            if self.ctx.signals.is_player_dead() {
                continue;
            }

            let target = self.ctx.signals.world_turn();
            for pos in self.grid.neighbors(self.player_district) {
                if pos == self.player_district {
                    continue;
                }
                if self.stop_pending() {
                    return Ok(());
                }
                let Some(report) = advance_if_behind(&mut self.ctx, &self.grid, pos, target)? else {
                    continue;
                };
                match report.outcome {
                    AdvanceOutcome::Completed => {
                        let mut stats = self.shared.stats();
                        stats.districts_advanced = stats.districts_advanced.saturating_add(1);
                    }
                    AdvanceOutcome::Aborted(AbortReason::StopRequested) => return Ok(()),
                    AdvanceOutcome::Aborted(reason) => {
                        debug!(district = %pos, ?reason, "Background advance aborted");
                        break;
                    }
                }
            }
            let mut stats = self.shared.stats();
            stats.passes = stats.passes.saturating_add(1);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown panic payload"))
}
