//! Scripted district events: invasions, refugees, raids.
//!
//! Every event has a pure predicate (`check_*`) deciding whether it fires
//! and a spawn routine carrying it out. [`run_scripted_events`] evaluates
//! them in a fixed order against a district's entry map and sewers map
//! right after the district has advanced one turn.

use holdout_agents::chance::roll_percent;
use holdout_types::{
    Actor, ActorModel, Item, ItemKind, MapKind, Point, RaidType,
};
use holdout_world::{District, Map, TURNS_PER_DAY, TimerTask, WorldTime};
use rand::Rng;
use tracing::info;

use crate::config::{EventsConfig, PopulationConfig, RaidConfig};
use crate::context::SimContext;
use crate::error::SimError;

/// Random edge tiles tried before scanning the whole border.
const EDGE_ATTEMPTS: usize = 32;

/// Nutrition of a dropped army ration.
const ARMY_RATION_NUTRITION: i32 = 600;

/// Nutrition of the ration each refugee carries.
const REFUGEE_RATION_NUTRITION: i32 = 300;

/// Kind of scripted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Undead pour into the surface at midnight.
    ZombieInvasion,
    /// Rat zombies crawl into the sewers.
    SewersInvasion,
    /// Civilians flee into the district.
    Refugees,
    /// Cooldown-gated raid or drop.
    Raid(RaidType),
}

/// An event that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedEvent {
    /// What happened.
    pub kind: EventKind,
    /// Actors spawned, or items dropped for supplies.
    pub count: usize,
    /// Local turn of the map it fired on.
    pub turn: u64,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Zombie invasion: the strike of midnight with room for more undead.
pub const fn check_zombie_invasion(time: WorldTime, undead: usize, population: &PopulationConfig) -> bool {
    time.is_strike_of_midnight() && undead < population.max_undeads
}

/// Undead count an invasion fills the map up to on `day`.
///
/// The target grows linearly from `zombie_invasion_day0_pct` of
/// `max_undeads`, saturates at `max_undeads`, and is never below one.
pub fn zombie_invasion_target(day: u64, population: &PopulationConfig, events: &EventsConfig) -> usize {
    let pct = events
        .zombie_invasion_day0_pct
        .saturating_add(day.saturating_mul(events.zombie_invasion_daily_pct))
        .min(100);
    let pct = usize::try_from(pct).unwrap_or(100);
    (population.max_undeads.saturating_mul(pct) / 100).max(1)
}

/// Sewers invasion: hourly chance while the sewers are below their cap.
pub fn check_sewers_invasion(
    time: WorldTime,
    undead: usize,
    population: &PopulationConfig,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> bool {
    time.is_strike_of_hour()
        && undead < sewers_cap(population, events)
        && roll_percent(rng, events.sewers_invasion_chance)
}

/// Refugees: a chance at every midday from day 1 while there is room.
pub fn check_refugees(
    time: WorldTime,
    living: usize,
    population: &PopulationConfig,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> bool {
    time.is_strike_of_midday()
        && time.day() >= 1
        && living < population.max_civilians
        && roll_percent(rng, events.refugees_chance)
}

/// Whether a cooldown-gated event may roll at `time`: hour strike, inside
/// the day window, and past the cooldown since `last_fired`.
pub fn raid_window_open(time: WorldTime, last_fired: Option<u64>, raid: &RaidConfig) -> bool {
    let day = time.day();
    let cooled_down = last_fired.is_none_or(|last| {
        time.turn().saturating_sub(last) >= raid.cooldown_days.saturating_mul(TURNS_PER_DAY)
    });
    time.is_strike_of_hour() && day >= raid.min_day && day <= raid.max_day && cooled_down
}

/// Bikers, gangsta, black ops, survivors: window and chance.
pub fn check_raid(time: WorldTime, last_fired: Option<u64>, raid: &RaidConfig, rng: &mut impl Rng) -> bool {
    raid_window_open(time, last_fired, raid) && roll_percent(rng, raid.chance)
}

/// National guard: window, scaled chance, and enough undead per living.
pub fn check_national_guard(
    time: WorldTime,
    last_fired: Option<u64>,
    undead: usize,
    living: usize,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> bool {
    let ratio_pct = undead.saturating_mul(100) / living.max(1);
    raid_window_open(time, last_fired, &events.national_guard)
        && ratio_pct >= events.national_guard_ratio_pct
        && roll_percent(rng, scaled_chance(events.national_guard.chance, events))
}

/// Army supplies: window, scaled chance, and food running short.
pub fn check_army_supplies(
    time: WorldTime,
    last_fired: Option<u64>,
    food_per_living: i64,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> bool {
    raid_window_open(time, last_fired, &events.army_supplies)
        && food_per_living < events.army_supplies_food_threshold
        && roll_percent(rng, scaled_chance(events.army_supplies.chance, events))
}

fn scaled_chance(chance: u32, events: &EventsConfig) -> u32 {
    chance.saturating_mul(events.chance_factor_pct) / 100
}

fn sewers_cap(population: &PopulationConfig, events: &EventsConfig) -> usize {
    population.max_undeads.saturating_mul(events.sewers_undead_pct) / 100
}

/// Food points available per living actor on the map: rations on the
/// ground and in the packs of the living. `i64::MAX` when nobody lives.
pub fn food_per_living(map: &Map) -> i64 {
    let nutrition = |item: &Item| match item.kind {
        ItemKind::Food { nutrition } => i64::from(nutrition),
        _ => 0,
    };
    let ground: i64 = map.ground.values().flatten().map(nutrition).sum();
    let carried: i64 = map
        .actors
        .iter()
        .filter(|a| a.is_alive() && !a.is_undead())
        .flat_map(|a| a.inventory.iter())
        .map(nutrition)
        .sum();
    let living = i64::try_from(map.count_living()).unwrap_or(i64::MAX);
    if living == 0 {
        return i64::MAX;
    }
    ground.saturating_add(carried) / living
}

// ---------------------------------------------------------------------------
// Spawn routines
// ---------------------------------------------------------------------------

/// A free tile on the border of the map.
fn edge_tile(map: &Map, rng: &mut impl Rng) -> Option<Point> {
    let (w, h) = (map.width(), map.height());
    for _ in 0..EDGE_ATTEMPTS {
        let pos = match rng.random_range(0..4) {
            0 => Point::new(rng.random_range(0..w), 0),
            1 => Point::new(rng.random_range(0..w), h.saturating_sub(1)),
            2 => Point::new(0, rng.random_range(0..h)),
            _ => Point::new(w.saturating_sub(1), rng.random_range(0..h)),
        };
        if map.is_walkable(pos) {
            return Some(pos);
        }
    }
    let top_bottom = (0..w).flat_map(|x| [Point::new(x, 0), Point::new(x, h.saturating_sub(1))]);
    let sides = (0..h).flat_map(|y| [Point::new(0, y), Point::new(w.saturating_sub(1), y)]);
    top_bottom.chain(sides).find(|&p| map.is_walkable(p))
}

/// A free tile anywhere on the map.
fn free_tile(map: &Map, rng: &mut impl Rng) -> Option<Point> {
    for _ in 0..EDGE_ATTEMPTS {
        let pos = Point::new(rng.random_range(0..map.width()), rng.random_range(0..map.height()));
        if map.is_walkable(pos) {
            return Some(pos);
        }
    }
    edge_tile(map, rng)
}

/// Spawn up to `count` actors of `model` on the border. Returns how many
/// found room.
fn spawn_on_edge(map: &mut Map, model: ActorModel, count: usize, rng: &mut impl Rng) -> usize {
    let mut spawned = 0_usize;
    for _ in 0..count {
        let Some(pos) = edge_tile(map, rng) else {
            break;
        };
        map.spawn_actor(Actor::new(format!("{model:?}"), model, pos));
        spawned = spawned.saturating_add(1);
    }
    spawned
}

/// Spawn a band: a leader followed by `size - 1` followers.
fn spawn_band(map: &mut Map, model: ActorModel, size: usize, rng: &mut impl Rng) -> usize {
    let Some(pos) = edge_tile(map, rng) else {
        return 0;
    };
    let leader = Actor::new(format!("{model:?} leader"), model, pos);
    let leader_id = leader.id;
    map.spawn_actor(leader);
    let mut spawned = 1_usize;
    for _ in 1..size {
        let Some(pos) = edge_tile(map, rng) else {
            break;
        };
        let mut follower = Actor::new(format!("{model:?}"), model, pos);
        follower.leader = Some(leader_id);
        map.spawn_actor(follower);
        spawned = spawned.saturating_add(1);
    }
    spawned
}

/// Undead model of an invader on `day`.
fn invader_model(day: u64, rng: &mut impl Rng) -> ActorModel {
    if day < 2 && rng.random_range(0..2) == 0 {
        ActorModel::Skeleton
    } else if day >= 7 && roll_percent(rng, 10) {
        ActorModel::ZombieMaster
    } else {
        ActorModel::Zombie
    }
}

/// Fill the map up to the invasion target. Returns the number spawned.
pub fn fire_zombie_invasion(
    map: &mut Map,
    population: &PopulationConfig,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> usize {
    let day = map.local_time().day();
    let target = zombie_invasion_target(day, population, events);
    let missing = target.saturating_sub(map.count_undead());
    let mut spawned = 0_usize;
    for _ in 0..missing {
        let model = invader_model(day, rng);
        if spawn_on_edge(map, model, 1, rng) == 0 {
            break;
        }
        spawned = spawned.saturating_add(1);
    }
    spawned
}

/// Rat zombies crawl in, without exceeding the sewers cap.
pub fn fire_sewers_invasion(
    map: &mut Map,
    population: &PopulationConfig,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> usize {
    let room = sewers_cap(population, events).saturating_sub(map.count_undead());
    spawn_on_edge(map, ActorModel::RatZombie, room.min(3), rng)
}

/// A wave of civilians, each with a ration.
pub fn fire_refugees(
    map: &mut Map,
    population: &PopulationConfig,
    events: &EventsConfig,
    rng: &mut impl Rng,
) -> usize {
    let wave = (population.max_civilians.saturating_mul(events.refugees_wave_pct) / 100).max(1);
    let room = population.max_civilians.saturating_sub(map.count_living());
    let before = map.actors.len();
    let spawned = spawn_on_edge(map, ActorModel::Civilian, wave.min(room), rng);
    for refugee in map.actors.iter_mut().skip(before) {
        refugee
            .inventory
            .push(Item::new(ItemKind::Food {
                nutrition: REFUGEE_RATION_NUTRITION,
            }));
    }
    spawned
}

/// Drop army rations across the map and announce the flyover.
pub fn fire_army_supplies(map: &mut Map, rations: usize, rng: &mut impl Rng) -> Result<usize, SimError> {
    let mut dropped = 0_usize;
    for _ in 0..rations {
        let Some(pos) = free_tile(map, rng) else {
            break;
        };
        map.drop_item(
            pos,
            Item::new(ItemKind::Food {
                nutrition: ARMY_RATION_NUTRITION,
            }),
        )?;
        dropped = dropped.saturating_add(1);
    }
    map.timers.schedule(
        1,
        TimerTask::Announcement {
            message: String::from("An army helicopter drops supplies."),
        },
    );
    Ok(dropped)
}

/// Model of the band sent by a raid.
const fn raid_model(raid: RaidType) -> ActorModel {
    match raid {
        RaidType::NationalGuard | RaidType::ArmySupplies => ActorModel::Soldier,
        RaidType::Bikers => ActorModel::Biker,
        RaidType::Gangsta => ActorModel::Gangster,
        RaidType::BlackOps => ActorModel::BlackOps,
        RaidType::Survivors => ActorModel::Survivor,
    }
}

const fn raid_config(events: &EventsConfig, raid: RaidType) -> &RaidConfig {
    match raid {
        RaidType::NationalGuard => &events.national_guard,
        RaidType::ArmySupplies => &events.army_supplies,
        RaidType::Bikers => &events.bikers,
        RaidType::Gangsta => &events.gangsta,
        RaidType::BlackOps => &events.blackops,
        RaidType::Survivors => &events.survivors,
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Evaluate every scripted event of the district in order and fire the ones
/// whose predicate holds.
///
/// # Errors
///
/// Returns a [`SimError`] if a spawn routine touches a missing map or an
/// invalid tile.
pub fn run_scripted_events(ctx: &mut SimContext, district: &mut District) -> Result<Vec<ScriptedEvent>, SimError> {
    let population = &ctx.config.population;
    let events = &ctx.config.events;
    let rng = &mut ctx.rng;
    let mut fired = Vec::new();

    let entry = district.entry_map_mut()?;
    let time = entry.local_time();

    // 1. Zombie invasion
    if check_zombie_invasion(time, entry.count_undead(), population) {
        let count = fire_zombie_invasion(entry, population, events, rng);
        fired.push(ScriptedEvent {
            kind: EventKind::ZombieInvasion,
            count,
            turn: time.turn(),
        });
    }

    // 2. Sewers invasion
    if let Ok(sewers) = district.map_mut(MapKind::Sewers) {
        let sewers_time = sewers.local_time();
        if check_sewers_invasion(sewers_time, sewers.count_undead(), population, events, rng) {
            let count = fire_sewers_invasion(sewers, population, events, rng);
            fired.push(ScriptedEvent {
                kind: EventKind::SewersInvasion,
                count,
                turn: sewers_time.turn(),
            });
        }
    }

    // 3. Refugees
    let entry = district.entry_map_mut()?;
    if check_refugees(time, entry.count_living(), population, events, rng) {
        let count = fire_refugees(entry, population, events, rng);
        fired.push(ScriptedEvent {
            kind: EventKind::Refugees,
            count,
            turn: time.turn(),
        });
    }

    // 4-9. Cooldown-gated raids
    for raid in [
        RaidType::NationalGuard,
        RaidType::ArmySupplies,
        RaidType::Bikers,
        RaidType::Gangsta,
        RaidType::BlackOps,
        RaidType::Survivors,
    ] {
        let last = district.last_raid_turn(raid);
        let entry = district.entry_map_mut()?;
        let cfg = raid_config(events, raid);
        let fires = match raid {
            RaidType::NationalGuard => check_national_guard(
                time,
                last,
                entry.count_undead(),
                entry.count_living(),
                events,
                rng,
            ),
            RaidType::ArmySupplies => check_army_supplies(time, last, food_per_living(entry), events, rng),
            RaidType::Bikers | RaidType::Gangsta | RaidType::BlackOps | RaidType::Survivors => {
                check_raid(time, last, cfg, rng)
            }
        };
        if !fires {
            continue;
        }
        let count = if raid == RaidType::ArmySupplies {
            fire_army_supplies(entry, cfg.size, rng)?
        } else {
            spawn_band(entry, raid_model(raid), cfg.size, rng)
        };
        district.record_raid(raid, time.turn());
        fired.push(ScriptedEvent {
            kind: EventKind::Raid(raid),
            count,
            turn: time.turn(),
        });
    }

    for event in &fired {
        info!(
            district = %district.pos(),
            kind = ?event.kind,
            count = event.count,
            turn = event.turn,
            "Scripted event fired"
        );
    }
    Ok(fired)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SimulationConfig;
    use crate::context::{IdleCollaborators, WorldSignals};
    use holdout_types::{DistrictPos, Weather};
    use holdout_world::TURNS_PER_HOUR;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn population(max_undeads: usize) -> PopulationConfig {
        PopulationConfig {
            max_undeads,
            ..PopulationConfig::default()
        }
    }

    fn map_with(models: &[ActorModel]) -> Map {
        let mut map = Map::new(MapKind::Surface, 12, 12);
        for (i, model) in models.iter().enumerate() {
            let x = i32::try_from(i % 10).unwrap() + 1;
            let y = i32::try_from(i / 10).unwrap() + 1;
            map.spawn_actor(Actor::new("a", *model, Point::new(x, y)));
        }
        map
    }

    #[test]
    fn invasion_fires_at_midnight_below_cap() {
        let pop = population(10);
        let map = map_with(&[ActorModel::Zombie, ActorModel::Zombie]);
        assert!(check_zombie_invasion(WorldTime::at(0), map.count_undead(), &pop));
    }

    #[test]
    fn invasion_holds_at_cap() {
        let pop = population(10);
        let map = map_with(&[ActorModel::Zombie; 10]);
        assert!(!check_zombie_invasion(WorldTime::at(0), map.count_undead(), &pop));
    }

    #[test]
    fn invasion_needs_midnight() {
        let pop = population(10);
        assert!(!check_zombie_invasion(WorldTime::at(1), 0, &pop));
        assert!(check_zombie_invasion(WorldTime::at(TURNS_PER_DAY * 3), 0, &pop));
    }

    #[test]
    fn invasion_fills_to_day_target() {
        let pop = population(10);
        let events = EventsConfig::default();
        let mut map = map_with(&[ActorModel::Zombie, ActorModel::Zombie]);
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(zombie_invasion_target(0, &pop, &events), 3);
        assert_eq!(fire_zombie_invasion(&mut map, &pop, &events, &mut rng), 1);
        assert_eq!(map.count_undead(), 3);
    }

    #[test]
    fn invasion_target_saturates_and_has_a_floor() {
        let events = EventsConfig::default();
        assert_eq!(zombie_invasion_target(100, &population(10), &events), 10);
        assert_eq!(zombie_invasion_target(0, &population(1), &events), 1);
    }

    #[test]
    fn raid_window_respects_days_and_cooldown() {
        let raid = RaidConfig {
            min_day: 2,
            max_day: 5,
            chance: 100,
            cooldown_days: 2,
            size: 3,
        };
        let day = |d: u64| WorldTime::at(d * TURNS_PER_DAY + TURNS_PER_HOUR);
        assert!(!raid_window_open(day(1), None, &raid));
        assert!(raid_window_open(day(2), None, &raid));
        assert!(!raid_window_open(day(6), None, &raid));
        assert!(!raid_window_open(day(3), Some(day(2).turn()), &raid));
        assert!(raid_window_open(day(4), Some(day(2).turn()), &raid));
        assert!(!raid_window_open(WorldTime::at(2 * TURNS_PER_DAY + 1), None, &raid));
    }

    #[test]
    fn refugees_wait_for_day_one_midday() {
        let pop = PopulationConfig::default();
        let events = EventsConfig {
            refugees_chance: 100,
            ..EventsConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let midday = |d: u64| WorldTime::at(d * TURNS_PER_DAY + TURNS_PER_DAY / 2);
        assert!(!check_refugees(midday(0), 0, &pop, &events, &mut rng));
        assert!(check_refugees(midday(1), 0, &pop, &events, &mut rng));
        assert!(!check_refugees(midday(1), pop.max_civilians, &pop, &events, &mut rng));
    }

    #[test]
    fn national_guard_needs_undead_majority() {
        let mut events = EventsConfig::default();
        events.national_guard.chance = 100;
        let mut rng = SmallRng::seed_from_u64(1);
        let time = WorldTime::at(events.national_guard.min_day * TURNS_PER_DAY);
        assert!(check_national_guard(time, None, 10, 2, &events, &mut rng));
        assert!(!check_national_guard(time, None, 2, 10, &events, &mut rng));
    }

    #[test]
    fn food_per_living_counts_ground_and_packs() {
        let mut map = map_with(&[ActorModel::Civilian, ActorModel::Civilian, ActorModel::Zombie]);
        map.drop_item(Point::new(5, 5), Item::new(ItemKind::Food { nutrition: 100 }))
            .unwrap();
        map.actors[0]
            .inventory
            .push(Item::new(ItemKind::Food { nutrition: 300 }));
        assert_eq!(food_per_living(&map), 200);
        assert_eq!(food_per_living(&Map::new(MapKind::Surface, 3, 3)), i64::MAX);
    }

    #[test]
    fn band_followers_track_their_leader() {
        let mut map = Map::new(MapKind::Surface, 10, 10);
        let mut rng = SmallRng::seed_from_u64(9);
        assert_eq!(spawn_band(&mut map, ActorModel::Biker, 4, &mut rng), 4);
        let leader = map.actors[0].id;
        assert!(map.actors[0].leader.is_none());
        assert!(map.actors[1..].iter().all(|a| a.leader == Some(leader)));
        assert!(map.actors.iter().all(|a| {
            a.pos.x == 0 || a.pos.y == 0 || a.pos.x == 9 || a.pos.y == 9
        }));
    }

    #[test]
    fn district_events_record_raids() {
        let mut config = SimulationConfig::default();
        config.events.bikers = RaidConfig {
            min_day: 0,
            max_day: 10,
            chance: 100,
            cooldown_days: 1,
            size: 2,
        };
        let mut ctx = SimContext::new(
            Arc::new(config),
            Arc::new(WorldSignals::new(0, Weather::Clear)),
            5,
            &IdleCollaborators,
        );
        let mut surface = Map::new(MapKind::Surface, 10, 10);
        surface.jump_to(TURNS_PER_HOUR);
        let mut sewers = Map::new(MapKind::Sewers, 10, 10);
        sewers.jump_to(TURNS_PER_HOUR);
        let mut district = District::new(DistrictPos::new(0, 0), vec![surface, sewers]);

        let fired = run_scripted_events(&mut ctx, &mut district).unwrap();

        assert!(fired.iter().any(|e| e.kind == EventKind::Raid(RaidType::Bikers) && e.count == 2));
        assert_eq!(district.last_raid_turn(RaidType::Bikers), Some(TURNS_PER_HOUR));
        let again = run_scripted_events(&mut ctx, &mut district).unwrap();
        assert!(!again.iter().any(|e| e.kind == EventKind::Raid(RaidType::Bikers)));
    }

    #[test]
    fn midnight_district_run_invades_the_surface() {
        let mut ctx = SimContext::new(
            Arc::new(SimulationConfig::default()),
            Arc::new(WorldSignals::new(0, Weather::Clear)),
            5,
            &IdleCollaborators,
        );
        let surface = Map::new(MapKind::Surface, 10, 10);
        let mut district = District::new(DistrictPos::new(0, 0), vec![surface]);
        let fired = run_scripted_events(&mut ctx, &mut district).unwrap();
        assert_eq!(fired[0].kind, EventKind::ZombieInvasion);
        assert!(fired[0].count > 0);
    }
}
