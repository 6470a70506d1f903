//! Enumeration types for the Holdout simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Factions and actor models
// ---------------------------------------------------------------------------

/// Allegiance of an actor. Hostility is derived from faction pairs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Ordinary townsfolk and the player.
    Civilians,
    /// Local police force.
    Police,
    /// National guard and army units.
    Army,
    /// Biker gang raiders.
    Bikers,
    /// Gangsta raiders.
    Gangsta,
    /// Corporate black ops teams.
    BlackOps,
    /// Independent armed survivor bands.
    Survivors,
    /// Every kind of walking dead.
    Undead,
}

impl Faction {
    /// Whether actors of `self` attack actors of `other` on sight.
    ///
    /// The undead hate every living faction. Raider factions (bikers,
    /// gangsta, black ops) are hostile to everyone outside their own gang.
    /// Civilians, police, army, and survivors are mutually at peace.
    pub const fn is_enemy_of(self, other: Self) -> bool {
        if self as u8 == other as u8 {
            return false;
        }
        match (self, other) {
            (Self::Undead, _)
            | (_, Self::Undead)
            | (Self::Bikers | Self::Gangsta | Self::BlackOps, _)
            | (_, Self::Bikers | Self::Gangsta | Self::BlackOps) => true,
            _ => false,
        }
    }
}

/// The body plan of an actor; fixes its faction, base speed, and base hit
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActorModel {
    /// Unarmed townsperson (also used for the player).
    Civilian,
    /// Police officer.
    Policeman,
    /// National guard soldier.
    Soldier,
    /// Biker gang member.
    Biker,
    /// Gangsta gang member.
    Gangster,
    /// Black ops operative.
    BlackOps,
    /// Member of a survivor band.
    Survivor,
    /// Slow, brittle undead.
    Skeleton,
    /// Standard shambling undead; evolves at dusk.
    Zombie,
    /// Fast, intelligent undead leader; evolves at dusk.
    ZombieMaster,
    /// Undead vermin of the sewers.
    RatZombie,
}

impl ActorModel {
    /// Faction the model belongs to.
    pub const fn faction(self) -> Faction {
        match self {
            Self::Civilian => Faction::Civilians,
            Self::Policeman => Faction::Police,
            Self::Soldier => Faction::Army,
            Self::Biker => Faction::Bikers,
            Self::Gangster => Faction::Gangsta,
            Self::BlackOps => Faction::BlackOps,
            Self::Survivor => Faction::Survivors,
            Self::Skeleton | Self::Zombie | Self::ZombieMaster | Self::RatZombie => {
                Faction::Undead
            }
        }
    }

    /// Whether the model is one of the undead.
    pub const fn is_undead(self) -> bool {
        matches!(self.faction(), Faction::Undead)
    }

    /// Whether this undead branch gains skills at dusk.
    pub const fn evolves_at_dusk(self) -> bool {
        matches!(self, Self::Zombie | Self::ZombieMaster)
    }

    /// Action points regenerated per map turn.
    pub const fn base_speed(self) -> i32 {
        match self {
            Self::Skeleton => 80,
            Self::Zombie => 60,
            Self::RatZombie | Self::BlackOps => 120,
            _ => 100,
        }
    }

    /// Starting maximum hit points.
    pub const fn base_hp(self) -> i32 {
        match self {
            Self::Civilian | Self::Survivor => 15,
            Self::Policeman | Self::Biker | Self::Gangster => 20,
            Self::Soldier | Self::BlackOps => 30,
            Self::Skeleton => 8,
            Self::Zombie => 12,
            Self::ZombieMaster => 25,
            Self::RatZombie => 4,
        }
    }
}

/// Trainable skills. Living NPCs pick from the first set at dawn, evolving
/// undead pick from the `Zombie*` set at dusk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    /// Better dodge, cheaper movement.
    Agile,
    /// Needs less sleep.
    Awake,
    /// Better aim with guns.
    Firearms,
    /// Better healing while asleep.
    Medic,
    /// Harder melee hits.
    Strong,
    /// More hit points.
    Toughness,
    /// Undead agility.
    ZombieAgile,
    /// Undead strength.
    ZombieStrong,
    /// Undead toughness.
    ZombieToughness,
}

impl Skill {
    /// Skills a living NPC may gain at dawn.
    pub const LIVING: [Self; 6] = [
        Self::Agile,
        Self::Awake,
        Self::Firearms,
        Self::Medic,
        Self::Strong,
        Self::Toughness,
    ];

    /// Skills an evolving undead may gain at dusk.
    pub const UNDEAD: [Self; 3] = [Self::ZombieAgile, Self::ZombieStrong, Self::ZombieToughness];
}

// ---------------------------------------------------------------------------
// Maps and environment
// ---------------------------------------------------------------------------

/// The layer a map represents within its district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MapKind {
    /// Streets and buildings; the district's entry map.
    Surface,
    /// Sewer network under the district.
    Sewers,
    /// Subway line (only some districts).
    Subway,
}

impl MapKind {
    /// Whether weather and fire spreading apply to this layer.
    pub const fn is_outdoor(self) -> bool {
        matches!(self, Self::Surface)
    }
}

/// World weather, shared by every outdoor map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weather {
    /// No precipitation.
    Clear,
    /// Overcast, no precipitation.
    Cloudy,
    /// Light rain; may put out fires.
    Rain,
    /// Heavy rain; likely to put out fires.
    HeavyRain,
}

impl Weather {
    /// Whether the weather can extinguish fires.
    pub const fn is_rain(self) -> bool {
        matches!(self, Self::Rain | Self::HeavyRain)
    }
}

/// Coarse time-of-day phase derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayPhase {
    /// Hour 0.
    Midnight,
    /// Hours 1 to 5.
    DeepNight,
    /// Hour 6, the first day hour.
    Sunrise,
    /// Hours 7 to 11.
    Morning,
    /// Hour 12.
    Midday,
    /// Hours 13 to 17.
    Afternoon,
    /// Hour 18, the first night hour.
    Sunset,
    /// Hours 19 to 23.
    Evening,
}

/// Kind of scent laid on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScentKind {
    /// Left by living actors; followed by the undead.
    Living,
    /// Left by undead actors.
    Undead,
}

/// Scripted district events subject to a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RaidType {
    /// National guard squad sent to contain the outbreak.
    NationalGuard,
    /// Army helicopter food drop.
    ArmySupplies,
    /// Biker gang raid.
    Bikers,
    /// Gangsta raid.
    Gangsta,
    /// Black ops extraction team.
    BlackOps,
    /// Wandering band of survivors.
    Survivors,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undead_hate_the_living() {
        assert!(Faction::Undead.is_enemy_of(Faction::Civilians));
        assert!(Faction::Police.is_enemy_of(Faction::Undead));
        assert!(!Faction::Undead.is_enemy_of(Faction::Undead));
    }

    #[test]
    fn peaceful_factions_are_allied() {
        assert!(!Faction::Civilians.is_enemy_of(Faction::Police));
        assert!(!Faction::Army.is_enemy_of(Faction::Survivors));
    }

    #[test]
    fn raiders_hate_everyone_else() {
        assert!(Faction::Bikers.is_enemy_of(Faction::Gangsta));
        assert!(Faction::Civilians.is_enemy_of(Faction::BlackOps));
        assert!(!Faction::Bikers.is_enemy_of(Faction::Bikers));
    }

    #[test]
    fn only_zombie_branches_evolve() {
        assert!(ActorModel::Zombie.evolves_at_dusk());
        assert!(ActorModel::ZombieMaster.evolves_at_dusk());
        assert!(!ActorModel::Skeleton.evolves_at_dusk());
        assert!(!ActorModel::Civilian.evolves_at_dusk());
    }

    #[test]
    fn surface_is_the_only_outdoor_layer() {
        assert!(MapKind::Surface.is_outdoor());
        assert!(!MapKind::Sewers.is_outdoor());
        assert!(!MapKind::Subway.is_outdoor());
    }
}
