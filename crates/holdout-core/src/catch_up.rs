//! Synchronous catch-up of a lagging district.
//!
//! When the player enters a district that fell behind world time, the
//! district is advanced turn by turn at the configured off-screen detail
//! until it is current. The caller can watch progress and cancel, in which
//! case the district jumps straight to the target turn.

use holdout_types::DistrictPos;
use holdout_world::DistrictGrid;
use tracing::{debug, info};

use crate::advancer::{AbortReason, AdvanceOutcome, advance_district};
use crate::context::SimContext;
use crate::error::SimError;
use crate::flags::SimFlags;

/// Observer of a running catch-up.
pub trait CatchUpProgress {
    /// `done` of `total` turns have been simulated.
    fn report(&mut self, done: u64, total: u64);

    /// Whether the user asked to skip the rest of the catch-up.
    fn cancel_requested(&mut self) -> bool;
}

/// Progress observer that ignores reports and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl CatchUpProgress for NoProgress {
    fn report(&mut self, _done: u64, _total: u64) {}

    fn cancel_requested(&mut self) -> bool {
        false
    }
}

/// How a catch-up ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUpOutcome {
    /// The district was not behind.
    AlreadyCurrent,
    /// Every lagging turn was simulated.
    Completed,
    /// Cancelled by the user; the rest was skipped.
    Cancelled,
    /// Off-screen simulation is off; the district jumped.
    Skipped,
    /// An advance bailed out.
    Aborted(AbortReason),
}

/// What a catch-up did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchUpReport {
    /// The district caught up.
    pub district: DistrictPos,
    /// How it ended.
    pub outcome: CatchUpOutcome,
    /// District turn before the catch-up.
    pub from_turn: u64,
    /// Turn the district was brought to.
    pub to_turn: u64,
    /// Turns actually simulated.
    pub turns_simulated: u64,
    /// Scripted events fired along the way.
    pub events: usize,
}

/// Bring the district at `pos` up to `target`.
///
/// Unless an advance aborts, every map of the district ends at exactly
/// `target` local turns.
///
/// # Errors
///
/// Propagates the first [`SimError`] of an advance.
pub fn catch_up(
    ctx: &mut SimContext,
    grid: &DistrictGrid,
    pos: DistrictPos,
    target: u64,
    progress: &mut dyn CatchUpProgress,
) -> Result<CatchUpReport, SimError> {
    let from_turn = grid.lock(pos)?.local_turn();
    let mut report = CatchUpReport {
        district: pos,
        outcome: CatchUpOutcome::Completed,
        from_turn,
        to_turn: target,
        turns_simulated: 0,
        events: 0,
    };
    if from_turn >= target {
        report.outcome = CatchUpOutcome::AlreadyCurrent;
        report.to_turn = from_turn;
        return Ok(report);
    }

    let ratio = ctx.config.simulation.sim_ratio;
    if ratio.is_off() {
        grid.lock(pos)?.jump_to(target);
        report.outcome = CatchUpOutcome::Skipped;
        debug!(district = %pos, from_turn, target, "Catch-up skipped");
        return Ok(report);
    }

    let total = target.saturating_sub(from_turn);
    let redraw = ctx.config.simulation.catch_up_redraw_turns.max(1);
    info!(district = %pos, from_turn, target, turns = total, "Catching up district");

    let mut turn = from_turn;
    while turn < target {
        if progress.cancel_requested() {
            grid.lock(pos)?.jump_to(target);
            report.outcome = CatchUpOutcome::Cancelled;
            info!(district = %pos, skipped = target.saturating_sub(turn), "Catch-up cancelled");
            return Ok(report);
        }
        let advance = advance_district(ctx, grid, pos, SimFlags::for_turn(ratio, turn), None)?;
        if let AdvanceOutcome::Aborted(reason) = advance.outcome {
            report.outcome = CatchUpOutcome::Aborted(reason);
            report.to_turn = advance.district_turn;
            return Ok(report);
        }
        turn = advance.district_turn;
        report.turns_simulated = report.turns_simulated.saturating_add(1);
        report.events = report.events.saturating_add(advance.events.len());
        if report.turns_simulated.checked_rem(redraw) == Some(0) {
            progress.report(turn.saturating_sub(from_turn), total);
        }
    }

    info!(district = %pos, turns = report.turns_simulated, events = report.events, "Catch-up complete");
    Ok(report)
}
