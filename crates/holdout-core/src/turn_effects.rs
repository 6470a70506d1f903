//! Per-map turn effects.
//!
//! [`next_map_turn`] runs once per map every time the scheduler reports
//! that nobody can act. The full-detail tier (corpses, infection, scents,
//! vitals, sleep, batteries, explosives, rain) is skipped on low-detail
//! turns; the always-run tier (removals, timers, clock, action points,
//! dawn and dusk upgrades) runs every time so that time keeps moving and
//! scheduling stays live.

use std::collections::{BTreeSet, VecDeque};

use holdout_agents::{
    DeathCause, InfectionSymptom, SleepOutcome, apply_infection_turn, apply_sleep_turn,
    apply_trust_drift, apply_vital_tick, check_death, kill, upgrade_living_npc, upgrade_undead,
};
use holdout_agents::chance::{roll_per_mille, roll_percent};
use holdout_types::{Actor, ActorId, ActorModel, ItemId, ItemKind, Point, ScentKind};
use holdout_world::{Map, SCENT_DECAY_PER_TURN, SCENT_EMIT_STRENGTH, TimerTask, fire_extinguish_chance};
use tracing::{debug, info};

use crate::context::SimContext;
use crate::error::SimError;
use crate::flags::SimFlags;
use crate::scheduler::regenerate_action_points;

/// Decoration left by a vomiting actor.
pub const VOMIT_DECORATION: &str = "vomit";

/// Map turns before a vomit puddle dries up.
const VOMIT_DECORATION_TURNS: u32 = 90;

/// Map turns a blast fire burns before going out on its own.
const FIRE_BURN_TURNS: u32 = 30;

/// What happened during one map turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnEffectsReport {
    /// Local turn of the map after the increment.
    pub local_turn: u64,
    /// Whether the full-detail tier ran.
    pub full_detail: bool,
    /// Corpses that rose as undead.
    pub reanimated: usize,
    /// Corpses that rotted away.
    pub rotted_away: usize,
    /// Infection symptoms triggered.
    pub symptoms: usize,
    /// Actors that died during the turn effects, with the cause.
    pub deaths: Vec<(ActorId, DeathCause)>,
    /// Explosives that went off (chained blasts included).
    pub explosions: usize,
    /// Fires put out by rain.
    pub fires_extinguished: usize,
    /// Timers that completed.
    pub timers_fired: usize,
    /// Messages from completed announcement timers.
    pub announcements: Vec<String>,
    /// Dead actors removed from the arena.
    pub removed: Vec<ActorId>,
    /// Skills learned at dawn or dusk.
    pub upgrades: usize,
}

/// Advance `map` by one local turn.
///
/// # Errors
///
/// Returns [`SimError::Invariant`] when a tracked explosive lies outside
/// the map, and propagates clock and per-actor rule failures.
pub fn next_map_turn(
    ctx: &mut SimContext,
    map: &mut Map,
    flags: SimFlags,
) -> Result<TurnEffectsReport, SimError> {
    let mut report = TurnEffectsReport {
        full_detail: !flags.is_low_detail(),
        ..TurnEffectsReport::default()
    };

    if report.full_detail {
        update_corpses(ctx, map, &mut report);
        update_infection(ctx, map, &mut report)?;
        update_scents(map);
        update_vitals(ctx, map, &mut report)?;
        update_sleep(ctx, map);
        drain_batteries(map);
        update_explosives(map, &mut report)?;
        rain_on_fires(ctx, map, &mut report);
    }

    // Always-run tier.
    if map.player().is_some_and(|p| p.is_dead) {
        ctx.signals.set_player_dead(true);
    }
    report.removed = map.remove_dead()?;

    for task in map.timers.tick() {
        report.timers_fired = report.timers_fired.saturating_add(1);
        if let Some(message) = map.apply_timer_task(task) {
            report.announcements.push(message);
        }
    }

    let was_night = map.local_time().is_night();
    report.local_turn = map.advance_local_turn()?;
    let is_night = map.local_time().is_night();

    regenerate_action_points(map);

    if was_night && !is_night {
        for actor in &mut map.actors {
            if upgrade_living_npc(actor, &mut ctx.rng).is_some() {
                report.upgrades = report.upgrades.saturating_add(1);
            }
        }
    } else if !was_night && is_night && ctx.config.simulation.undead_upgrades {
        for actor in &mut map.actors {
            if upgrade_undead(actor, &mut ctx.rng).is_some() {
                report.upgrades = report.upgrades.saturating_add(1);
            }
        }
    }

    debug!(
        map = %map.id(),
        turn = report.local_turn,
        full_detail = report.full_detail,
        removed = report.removed.len(),
        "Map turn advanced"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Full-detail steps
// ---------------------------------------------------------------------------

/// Rot corpses, remove the rotten ones, and roll reanimation.
fn update_corpses(ctx: &mut SimContext, map: &mut Map, report: &mut TurnEffectsReport) {
    let cfg = ctx.config.corpses;
    let rot_limit = i32::try_from(cfg.rot_turns).unwrap_or(i32::MAX);
    let corpses = std::mem::take(&mut map.corpses);
    for mut corpse in corpses {
        corpse.turns_dead = corpse.turns_dead.saturating_add(1);
        corpse.rot = corpse.rot.saturating_add(1);
        if corpse.rot >= rot_limit {
            report.rotted_away = report.rotted_away.saturating_add(1);
            continue;
        }
        let chance = if corpse.is_infected {
            cfg.reanimation_chance
                .saturating_add(cfg.infected_reanimation_bonus)
        } else {
            cfg.reanimation_chance
        };
        if corpse.turns_dead >= cfg.reanimation_delay
            && map.actor_at(corpse.pos).is_none()
            && roll_per_mille(&mut ctx.rng, chance)
        {
            let mut zombie = Actor::new(format!("{} (undead)", corpse.name), ActorModel::Zombie, corpse.pos);
            zombie.action_points = 0;
            info!(map = %map.id(), corpse = %corpse.actor, pos = ?corpse.pos, "Corpse reanimated");
            map.spawn_actor(zombie);
            report.reanimated = report.reanimated.saturating_add(1);
            continue;
        }
        map.corpses.push(corpse);
    }
}

/// Progress infections; vomit leaves a puddle that dries up later.
fn update_infection(
    ctx: &mut SimContext,
    map: &mut Map,
    report: &mut TurnEffectsReport,
) -> Result<(), SimError> {
    let vitals = &ctx.config.vitals;
    let mut puddles = Vec::new();
    for actor in &mut map.actors {
        let Some(symptom) = apply_infection_turn(actor, vitals, &mut ctx.rng)? else {
            continue;
        };
        report.symptoms = report.symptoms.saturating_add(1);
        match symptom {
            InfectionSymptom::Vomit => puddles.push(actor.pos),
            InfectionSymptom::Death => report.deaths.push((actor.id, DeathCause::Infection)),
            InfectionSymptom::Weak | InfectionSymptom::Tired | InfectionSymptom::Bleed => {}
        }
    }
    for pos in puddles {
        map.add_decoration(pos, VOMIT_DECORATION);
        map.timers.schedule(
            VOMIT_DECORATION_TURNS,
            TimerTask::RemoveDecoration {
                pos,
                name: VOMIT_DECORATION.to_owned(),
            },
        );
    }
    Ok(())
}

/// Decay old scent, then let every actor lay fresh scent.
fn update_scents(map: &mut Map) {
    map.scents.decay(SCENT_DECAY_PER_TURN);
    for actor in map.actors.iter().filter(|a| a.is_alive()) {
        let kind = if actor.is_undead() {
            ScentKind::Undead
        } else {
            ScentKind::Living
        };
        map.scents.emit(actor.pos, kind, SCENT_EMIT_STRENGTH);
    }
}

/// Gauge decay for the living and trust drift for followers.
fn update_vitals(
    ctx: &mut SimContext,
    map: &mut Map,
    report: &mut TurnEffectsReport,
) -> Result<(), SimError> {
    let vitals = &ctx.config.vitals;
    let present: BTreeSet<ActorId> = map
        .actors
        .iter()
        .filter(|a| a.is_alive())
        .map(|a| a.id)
        .collect();
    for actor in map.actors.iter_mut().filter(|a| a.is_alive() && !a.is_undead()) {
        let tick = apply_vital_tick(actor, vitals, &mut ctx.rng)?;
        if let Some(cause) = tick.death {
            report.deaths.push((actor.id, cause));
            continue;
        }
        let leader_nearby = actor.leader.is_some_and(|leader| present.contains(&leader));
        apply_trust_drift(actor, leader_nearby, vitals)?;
    }
    Ok(())
}

/// Sleep regeneration and waking, against a snapshot of hostile adjacency.
fn update_sleep(ctx: &mut SimContext, map: &mut Map) {
    let threatened: Vec<bool> = map
        .actors
        .iter()
        .map(|sleeper| {
            sleeper.is_sleeping
                && map.actors.iter().any(|other| {
                    other.is_alive()
                        && other.id != sleeper.id
                        && other.pos.is_adjacent(sleeper.pos)
                        && other.is_enemy_of(sleeper)
                })
        })
        .collect();
    for (actor, hostile_adjacent) in map.actors.iter_mut().zip(threatened) {
        if let SleepOutcome::Woke(reason) =
            apply_sleep_turn(actor, &ctx.config.vitals, hostile_adjacent, &mut ctx.rng)
        {
            debug!(actor = %actor.id, ?reason, "Actor woke up");
        }
    }
}

/// Drain equipped lights and trackers.
fn drain_batteries(map: &mut Map) {
    for actor in map.actors.iter_mut().filter(|a| a.is_alive()) {
        for item in &mut actor.equipped {
            if let ItemKind::Light { battery } | ItemKind::Tracker { battery } = &mut item.kind {
                *battery = battery.saturating_sub(1).max(0);
            }
        }
    }
}

/// A pending detonation.
#[derive(Debug, Clone, Copy)]
struct Blast {
    pos: Point,
    radius: i32,
    damage: i32,
}

/// Count fuses down, detonate the expired ones, and chain every explosive
/// caught in a blast.
fn update_explosives(map: &mut Map, report: &mut TurnEffectsReport) -> Result<(), SimError> {
    let map_id = map.id();
    let (width, height) = (map.width(), map.height());
    let mut blasts = VecDeque::new();

    // Ground explosives.
    let mut expired: Vec<(Point, ItemId)> = Vec::new();
    for (pos, stack) in &mut map.ground {
        for item in stack.iter_mut() {
            if let ItemKind::Explosive {
                fuse: Some(fuse),
                radius,
                damage,
            } = &mut item.kind
            {
                if !(pos.x >= 0 && pos.y >= 0 && pos.x < width && pos.y < height) {
                    return Err(SimError::Invariant {
                        reason: format!("explosive {} at {pos:?} is outside map {map_id}", item.id),
                    });
                }
                *fuse = fuse.saturating_sub(1);
                if *fuse == 0 {
                    expired.push((*pos, item.id));
                    blasts.push_back(Blast {
                        pos: *pos,
                        radius: *radius,
                        damage: *damage,
                    });
                }
            }
        }
    }
    for (pos, id) in expired {
        map.take_item(pos, id);
    }

    // Carried explosives blow up in their carrier's hands.
    for actor in &mut map.actors {
        let pos = actor.pos;
        for bag in [&mut actor.inventory, &mut actor.equipped] {
            bag.retain_mut(|item| {
                if let ItemKind::Explosive {
                    fuse: Some(fuse),
                    radius,
                    damage,
                } = &mut item.kind
                {
                    *fuse = fuse.saturating_sub(1);
                    if *fuse == 0 {
                        blasts.push_back(Blast {
                            pos,
                            radius: *radius,
                            damage: *damage,
                        });
                        return false;
                    }
                }
                true
            });
        }
    }

    while let Some(blast) = blasts.pop_front() {
        report.explosions = report.explosions.saturating_add(1);
        info!(map = %map_id, pos = ?blast.pos, radius = blast.radius, "Explosion");

        for actor in map.actors.iter_mut().filter(|a| a.is_alive()) {
            let distance = actor.pos.distance(blast.pos);
            if distance > blast.radius {
                continue;
            }
            let falloff = blast
                .damage
                .saturating_mul(distance)
                .checked_div(blast.radius.saturating_add(1))
                .unwrap_or(0);
            actor.hp.sub(blast.damage.saturating_sub(falloff));
            actor.is_sleeping = false;
            if check_death(actor).is_some() {
                report.deaths.push((actor.id, kill(actor, DeathCause::Explosion)));
            }
        }

        let caught: Vec<(Point, ItemId, i32, i32)> = map
            .ground
            .iter()
            .filter(|(pos, _)| pos.distance(blast.pos) <= blast.radius)
            .flat_map(|(pos, stack)| {
                stack.iter().filter_map(move |item| match item.kind {
                    ItemKind::Explosive { radius, damage, .. } => Some((*pos, item.id, radius, damage)),
                    _ => None,
                })
            })
            .collect();
        for (pos, id, radius, damage) in caught {
            if map.take_item(pos, id).is_some() {
                blasts.push_back(Blast { pos, radius, damage });
            }
        }

        if map.kind().is_outdoor() && map.ignite(blast.pos) {
            map.timers
                .schedule(FIRE_BURN_TURNS, TimerTask::BurnOut { pos: blast.pos });
        }
    }
    Ok(())
}

/// Rain puts out fires on outdoor maps.
fn rain_on_fires(ctx: &mut SimContext, map: &mut Map, report: &mut TurnEffectsReport) {
    let weather = ctx.signals.weather();
    if !map.kind().is_outdoor() || !weather.is_rain() {
        return;
    }
    let chance = fire_extinguish_chance(weather);
    let burning: Vec<Point> = map.fires.iter().copied().collect();
    for pos in burning {
        if roll_percent(&mut ctx.rng, chance) && map.extinguish(pos) {
            report.fires_extinguished = report.fires_extinguished.saturating_add(1);
        }
    }
}
