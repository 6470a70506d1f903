//! World generation for a new game.
//!
//! Every district gets a surface and a sewer map; districts on the
//! configured subway row also get a subway map. The surface is seeded with
//! civilians, police, undead, food and explosives, the sewers with rat
//! zombies, and the player starts in the center district.

use holdout_core::SimulationConfig;
use holdout_types::{Actor, ActorModel, DistrictPos, Item, ItemKind, MapKind, Point};
use holdout_world::{District, DistrictGrid, Map};
use rand::Rng;
use tracing::{debug, info};

use crate::error::EngineError;

/// Nutrition of a seeded ration.
const RATION_NUTRITION: i32 = 300;

/// Damage bonus of a police baton.
const BATON_DAMAGE: i32 = 2;

/// Battery turns of the player's flashlight.
const FLASHLIGHT_BATTERY: i32 = 480;

/// Random placement attempts before giving up on a map.
const PLACEMENT_ATTEMPTS: u32 = 200;

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Given names for the living.
const NAME_POOL: &[&str] = &[
    "Abby", "Bruno", "Carla", "Dmitri", "Edna", "Felix", "Gwen", "Hector",
    "Ines", "Jonah", "Kiri", "Luis", "Mara", "Nils", "Olga", "Pavel",
    "Quinn", "Rosa", "Sven", "Tara", "Ugo", "Vera", "Walt", "Yusuf", "Zoe",
];

// -----------------------------------------------------------------------
// Result
// -----------------------------------------------------------------------

/// A freshly generated world.
#[derive(Debug)]
pub struct GeneratedWorld {
    /// Every district of the city.
    pub grid: DistrictGrid,
    /// Where the player starts.
    pub player_district: DistrictPos,
    /// Actors created, player included.
    pub actors: usize,
}

// -----------------------------------------------------------------------
// Generation
// -----------------------------------------------------------------------

/// Generate the district grid described by `config`.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if a map is too crowded to place an
/// actor, and [`EngineError::World`] if the grid dimensions are invalid.
pub fn generate_world(
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> Result<GeneratedWorld, EngineError> {
    let world = &config.world;
    let player_district = DistrictPos::new(world.grid_width / 2, world.grid_height / 2);
    let mut districts = Vec::new();
    let mut actors = 0_usize;

    for y in 0..world.grid_height {
        for x in 0..world.grid_width {
            let pos = DistrictPos::new(x, y);
            let mut surface = Map::new(MapKind::Surface, world.map_width, world.map_height);
            actors = actors.saturating_add(populate_surface(&mut surface, config, rng)?);

            let mut sewers = Map::new(MapKind::Sewers, world.map_width, world.map_height);
            for _ in 0..config.population.starting_sewer_undead {
                spawn_random(&mut sewers, "rat", ActorModel::RatZombie, rng)?;
                actors = actors.saturating_add(1);
            }

            let mut maps = vec![surface, sewers];
            if y == world.subway_row {
                maps.push(Map::new(MapKind::Subway, world.map_width, world.map_height));
            }

            if pos == player_district {
                place_player(&mut maps, world.map_width, world.map_height)?;
                actors = actors.saturating_add(1);
            }
            debug!(district = %pos, maps = maps.len(), "District generated");
            districts.push(District::new(pos, maps));
        }
    }

    let grid = DistrictGrid::new(world.grid_width, world.grid_height, districts)?;
    info!(
        world_name = world.name,
        districts = grid.positions().len(),
        actors,
        player_district = %player_district,
        "World generated"
    );
    Ok(GeneratedWorld {
        grid,
        player_district,
        actors,
    })
}

/// Seed a surface map; returns the number of actors created.
fn populate_surface(
    map: &mut Map,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> Result<usize, EngineError> {
    let population = &config.population;
    let civilians = population.starting_civilians.min(population.max_civilians);
    let undead = population.starting_undead.min(population.max_undeads);

    for _ in 0..civilians {
        let name = random_name(rng);
        spawn_random(map, name, ActorModel::Civilian, rng)?;
    }
    for _ in 0..population.starting_police {
        let name = random_name(rng);
        let index = spawn_random(map, name, ActorModel::Policeman, rng)?;
        if let Some(cop) = map.actors.get_mut(index) {
            cop.equipped.push(Item::new(ItemKind::Weapon {
                damage: BATON_DAMAGE,
            }));
        }
    }
    for _ in 0..undead {
        let model = if rng.random_bool(0.25) {
            ActorModel::Skeleton
        } else {
            ActorModel::Zombie
        };
        spawn_random(map, "undead", model, rng)?;
    }

    for _ in 0..population.food_items {
        let pos = random_tile(map, rng);
        map.drop_item(pos, Item::new(ItemKind::Food {
            nutrition: RATION_NUTRITION,
        }))?;
    }
    for _ in 0..population.explosives {
        let pos = random_tile(map, rng);
        map.drop_item(pos, Item::new(ItemKind::Explosive {
            fuse: None,
            radius: 2,
            damage: 12,
        }))?;
    }

    Ok(civilians
        .saturating_add(population.starting_police)
        .saturating_add(undead))
}

/// Put the player in the middle of the entry map, with a ration and a light.
fn place_player(maps: &mut [Map], width: i32, height: i32) -> Result<(), EngineError> {
    let surface = maps.first_mut().ok_or_else(|| EngineError::Spawner {
        message: String::from("district has no surface map"),
    })?;
    let center = Point::new(width / 2, height / 2);
    let pos = (0..width.max(height))
        .flat_map(|d| [center.offset(d, 0), center.offset(0, d), center.offset(d, d)])
        .find(|&p| surface.is_walkable(p))
        .ok_or_else(|| EngineError::Spawner {
            message: String::from("no free tile for the player"),
        })?;

    let mut player = Actor::new("Player", ActorModel::Civilian, pos);
    player.is_player = true;
    player.inventory.push(Item::new(ItemKind::Food {
        nutrition: RATION_NUTRITION,
    }));
    player.equipped.push(Item::new(ItemKind::Light {
        battery: FLASHLIGHT_BATTERY,
    }));
    surface.spawn_actor(player);
    Ok(())
}

fn spawn_random(
    map: &mut Map,
    name: &str,
    model: ActorModel,
    rng: &mut impl Rng,
) -> Result<usize, EngineError> {
    let pos = (0..PLACEMENT_ATTEMPTS)
        .map(|_| random_tile(map, rng))
        .find(|&p| map.is_walkable(p))
        .ok_or_else(|| EngineError::Spawner {
            message: format!("no free tile for a {model:?} on a {:?} map", map.kind()),
        })?;
    Ok(map.spawn_actor(Actor::new(name, model, pos)))
}

fn random_tile(map: &Map, rng: &mut impl Rng) -> Point {
    Point::new(
        rng.random_range(0..map.width()),
        rng.random_range(0..map.height()),
    )
}

fn random_name(rng: &mut impl Rng) -> &'static str {
    let index = rng.random_range(0..NAME_POOL.len());
    NAME_POOL.get(index).copied().unwrap_or("Anon")
}
