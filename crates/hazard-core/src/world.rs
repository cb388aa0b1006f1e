//! Interfaces to the world around the field map.
//!
//! The engine never reaches for global state. Everything it needs from the
//! host (terrain properties, items, weather, creatures, vehicles) comes in
//! through the traits here, bundled into a [`WorldView`] for the duration of
//! one call. Actors are passed individually to exposure.
//!
//! All lookups must tolerate off-grid coordinates by reporting "nothing
//! there": empty flags, zero movement cost, no items.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use miasma::{NpcComplaint, TimeDuration, Tripoint};

// =============================================================================
// Terrain
// =============================================================================

bitflags! {
    /// Combined terrain and furniture properties of a tile.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TerrainFlags: u32 {
        /// Burns readily (wood floors, grass, furniture).
        const FLAMMABLE = 1 << 0;
        /// Burns reluctantly (tree trunks, heavy beams).
        const FLAMMABLE_HARD = 1 << 1;
        /// Burns down to ash or bare ground.
        const FLAMMABLE_ASH = 1 << 2;
        /// Open air: things fall through.
        const NO_FLOOR = 1 << 3;
        /// Water.
        const SWIMMABLE = 1 << 4;
        /// Holds fire safely (braziers, stoves).
        const FIRE_CONTAINER = 1 << 5;
        /// Closed container: contents are shielded.
        const SEALED = 1 << 6;
        /// Sealed but still reached by field effects.
        const ALLOW_FIELD_EFFECT = 1 << 7;
        /// Fire here makes no smoke.
        const SUPPRESS_SMOKE = 1 << 8;
        /// Gas passes even though walkers cannot.
        const PERMEABLE = 1 << 9;
        /// Pit; fire inside only spreads to other pits.
        const PIT = 1 << 10;
        /// Fungal growth.
        const FUNGUS = 1 << 11;
    }
}

impl TerrainFlags {
    /// Any flammability class.
    pub const ANY_FLAMMABLE: Self = Self::FLAMMABLE
        .union(Self::FLAMMABLE_HARD)
        .union(Self::FLAMMABLE_ASH);
}

/// Terrain and furniture of the grid.
pub trait Terrain {
    /// Flags of a tile; empty off-grid.
    fn flags(&self, p: Tripoint) -> TerrainFlags;

    /// Movement cost of a tile; zero means impassable (and off-grid).
    fn movement_cost(&self, p: Tripoint) -> i32;

    /// Whether the tile is open to the sky.
    fn is_outside(&self, p: Tripoint) -> bool;

    /// Whether the tile is shielded from wind.
    fn is_sheltered(&self, p: Tripoint) -> bool;

    /// Turn burnt terrain/furniture into its burnt-out variant, or remove it.
    fn burn_out(&mut self, p: Tripoint);

    /// Convert the tile to fungal growth.
    fn spread_fungus(&mut self, _p: Tripoint) {}

    /// Kill fungal growth on the tile.
    fn kill_fungus(&mut self, _p: Tripoint) {}

    /// Add (or remove) radiation on the tile.
    fn adjust_radiation(&mut self, _p: Tripoint, _amount: i32) {}

    /// Reduce scent within a radius.
    fn neutralize_scent(&mut self, _p: Tripoint, _radius: i32, _amount: i32) {}

    /// Whether a tile has all of the given flags.
    fn has_flag(&self, p: Tripoint, flag: TerrainFlags) -> bool {
        self.flags(p).contains(flag)
    }

    /// Whether a tile burns at all.
    fn is_flammable(&self, p: Tripoint) -> bool {
        self.flags(p).intersects(TerrainFlags::ANY_FLAMMABLE)
    }

    /// Whether walkers can enter the tile.
    fn is_passable(&self, p: Tripoint) -> bool {
        self.movement_cost(p) > 0
    }

    /// Whether something can move between two vertically adjacent tiles.
    ///
    /// Going down needs an open floor at `from`; going up needs one at `to`.
    fn valid_move(&self, from: Tripoint, to: Tripoint) -> bool {
        if to.z < from.z {
            self.has_flag(from, TerrainFlags::NO_FLOOR)
        } else if to.z > from.z {
            self.has_flag(to, TerrainFlags::NO_FLOOR)
        } else {
            true
        }
    }
}

// =============================================================================
// Stored objects
// =============================================================================

/// Opaque handle to an item lying on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// State of a fire while it burns through the items on its tile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FireData {
    /// Fire intensity.
    pub intensity: i32,
    /// Whether the fire sits in a fire container.
    pub contained: bool,
    /// Fuel produced so far, in turns of burn time.
    pub fuel_produced: f32,
    /// Smoke produced so far.
    pub smoke_produced: f32,
}

impl FireData {
    /// Fresh state for a fire of the given intensity.
    #[must_use]
    pub fn new(intensity: i32, contained: bool) -> Self {
        Self {
            intensity,
            contained,
            fuel_produced: 0.0,
            smoke_produced: 0.0,
        }
    }
}

/// Outcome of one item burning for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BurnResult {
    /// The item was consumed entirely.
    pub destroyed: bool,
    /// Mass lost this tick, in grams.
    pub mass_lost: u32,
}

/// Totals of one tick of item burning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BurnSummary {
    /// Fuel produced, in turns.
    pub fuel: f32,
    /// Smoke produced.
    pub smoke: f32,
    /// Items destroyed.
    pub consumed: u32,
}

/// Items lying on tiles, and their combustion.
pub trait StoredObjects {
    /// Items on a tile, in the order they should burn.
    fn items_at(&self, p: Tripoint) -> Vec<ItemId>;

    /// Whether any item on the tile can burn.
    fn has_flammable_items(&self, p: Tripoint) -> bool;

    /// Burn one item for one tick, adding its fuel and smoke to `fire`.
    fn burn(&mut self, p: Tripoint, item: ItemId, fire: &mut FireData) -> BurnResult;

    /// Leave ash and other residue for mass lost from an item.
    fn spawn_byproducts(&mut self, p: Tripoint, item: ItemId, mass_lost: u32);

    /// Burn items on a tile until `max_consume` are destroyed or none remain.
    fn simulate_burn(&mut self, p: Tripoint, fire: &mut FireData, max_consume: u32) -> BurnSummary {
        let mut consumed = 0;
        for item in self.items_at(p) {
            if consumed >= max_consume {
                break;
            }
            let result = self.burn(p, item, fire);
            if result.mass_lost > 0 {
                self.spawn_byproducts(p, item, result.mass_lost);
            }
            if result.destroyed {
                consumed += 1;
            }
        }
        BurnSummary {
            fuel: fire.fuel_produced,
            smoke: fire.smoke_produced,
            consumed,
        }
    }
}

// =============================================================================
// Weather, creatures, vehicles
// =============================================================================

/// Wind at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wind {
    /// Compass bearing the wind blows from, in degrees (0 = north).
    pub direction: i32,
    /// Wind power, roughly 0..=100.
    pub speed: i32,
}

/// Weather source.
pub trait Weather {
    /// Wind at a position.
    fn wind_at(&self, p: Tripoint) -> Wind;
}

/// Creature spawning and bystander reactions.
pub trait Creatures {
    /// Spawn up to `count` creatures of `group` within `radius` of `center`.
    /// Returns how many actually appeared.
    fn spawn(&mut self, group: &str, count: u32, center: Tripoint, radius: u32) -> u32;

    /// Let nearby bystanders complain about a field.
    fn complain(&mut self, _p: Tripoint, _complaint: &NpcComplaint) {}
}

/// Vehicles parked on the grid.
pub trait Vehicles {
    /// Apply heat damage to the vehicle part on a tile.
    /// Returns whether there was one.
    fn heat_damage(&mut self, p: Tripoint, amount: i32) -> bool;
}

// =============================================================================
// Null collaborators
// =============================================================================

/// No items anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObjects;

impl StoredObjects for NoObjects {
    fn items_at(&self, _p: Tripoint) -> Vec<ItemId> {
        Vec::new()
    }

    fn has_flammable_items(&self, _p: Tripoint) -> bool {
        false
    }

    fn burn(&mut self, _p: Tripoint, _item: ItemId, _fire: &mut FireData) -> BurnResult {
        BurnResult::default()
    }

    fn spawn_byproducts(&mut self, _p: Tripoint, _item: ItemId, _mass_lost: u32) {}
}

/// The same wind everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWind(pub Wind);

impl Weather for UniformWind {
    fn wind_at(&self, _p: Tripoint) -> Wind {
        self.0
    }
}

/// No creatures spawn and nobody complains.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCreatures;

impl Creatures for NoCreatures {
    fn spawn(&mut self, _group: &str, _count: u32, _center: Tripoint, _radius: u32) -> u32 {
        0
    }
}

/// No vehicles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVehicles;

impl Vehicles for NoVehicles {
    fn heat_damage(&mut self, _p: Tripoint, _amount: i32) -> bool {
        false
    }
}

// =============================================================================
// WorldView
// =============================================================================

/// Borrowed handles to every collaborator a tick needs.
pub struct WorldView<'w> {
    /// Terrain and furniture.
    pub terrain: &'w mut dyn Terrain,
    /// Items.
    pub objects: &'w mut dyn StoredObjects,
    /// Weather.
    pub weather: &'w dyn Weather,
    /// Creatures.
    pub creatures: &'w mut dyn Creatures,
    /// Vehicles.
    pub vehicles: &'w mut dyn Vehicles,
}

impl<'w> WorldView<'w> {
    /// Bundle collaborator handles.
    pub fn new(
        terrain: &'w mut dyn Terrain,
        objects: &'w mut dyn StoredObjects,
        weather: &'w dyn Weather,
        creatures: &'w mut dyn Creatures,
        vehicles: &'w mut dyn Vehicles,
    ) -> Self {
        Self {
            terrain,
            objects,
            weather,
            creatures,
            vehicles,
        }
    }
}

impl std::fmt::Debug for WorldView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldView").finish_non_exhaustive()
    }
}

// =============================================================================
// Actors
// =============================================================================

bitflags! {
    /// Innate and equipment-granted properties of an actor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActorTraits: u32 {
        /// Walks over webs.
        const WEB_WALKER = 1 << 0;
        /// Immune to acid.
        const ACID_PROOF = 1 << 1;
        /// Immune to heat.
        const HEAT_IMMUNE = 1 << 2;
        /// Immune to electricity.
        const ELECTRIC_IMMUNE = 1 << 3;
        /// Does not breathe.
        const NO_BREATHE = 1 << 4;
        /// Flies over ground-level hazards.
        const FLYER = 1 << 5;
        /// Burrows; untouched by any field.
        const DIGGER = 1 << 6;
        /// Submerged.
        const UNDERWATER = 1 << 7;
        /// Sealed against gases.
        const GAS_PROOF = 1 << 8;
        /// Immune to fungal spores.
        const FUNGUS_IMMUNE = 1 << 9;
        /// Is itself fungal.
        const FUNGAL = 1 << 10;
        /// Shielded from radiation.
        const RADIATION_PROOF = 1 << 11;
        /// Wades through sludge.
        const SLUDGE_PROOF = 1 << 12;
        /// Hide resistant to burning.
        const HEAT_RESISTANT = 1 << 13;
    }
}

/// Where an actor is relative to a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VehicleOccupancy {
    /// Not in a vehicle.
    #[default]
    None,
    /// On an open vehicle tile.
    Exposed,
    /// Under cover inside a vehicle.
    Inside,
}

/// Damage categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Burns.
    Heat,
    /// Corrosion.
    Acid,
    /// Shock.
    Electric,
    /// Stings and other piercing.
    Stab,
    /// Radiation dose.
    Radiation,
    /// Unresisted damage.
    Pure,
}

/// Timed status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Stuck in a web.
    Webbed,
    /// Covered in sap.
    Sap,
    /// Being eaten by acid.
    Corroding,
    /// Coughing in smoke.
    Smoke,
    /// Eyes burning from tear gas.
    TearGas,
    /// Cannot see.
    Blind,
    /// Sedated.
    Relaxed,
    /// Poisoned.
    Poison,
    /// Badly poisoned.
    BadPoison,
    /// Infected with spores.
    Fungus,
    /// Burning.
    OnFire,
    /// Stung.
    Stung,
    /// Pulled through a rift.
    Teleported,
}

/// Something that can stand in a field.
pub trait Actor {
    /// Where the actor stands.
    fn position(&self) -> Tripoint;

    /// Immunities and other properties.
    fn traits(&self) -> ActorTraits;

    /// Vehicle situation.
    fn vehicle_occupancy(&self) -> VehicleOccupancy {
        VehicleOccupancy::None
    }

    /// Whether the actor is prone.
    fn is_on_ground(&self) -> bool {
        false
    }

    /// Deal damage; returns the amount actually taken.
    fn apply_damage(&mut self, kind: DamageKind, amount: i32) -> i32;

    /// Apply a timed effect.
    fn apply_status_effect(&mut self, effect: StatusEffect, duration: TimeDuration, magnitude: i32);

    /// Spend movement points.
    fn spend_moves(&mut self, _moves: i32) {}

    /// Whether the actor sits covered inside a vehicle.
    fn is_inside_vehicle(&self) -> bool {
        self.vehicle_occupancy() == VehicleOccupancy::Inside
    }

    /// Whether the actor is in a vehicle at all.
    fn is_in_vehicle(&self) -> bool {
        self.vehicle_occupancy() != VehicleOccupancy::None
    }
}
