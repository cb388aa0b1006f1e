//! Test doubles for the world collaborators and engine setup shortcuts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use miasma::registry::FieldTypeDef;
use miasma::{FieldTypeRegistry, MapConfig, NpcComplaint, TimeDuration, Tripoint};

use crate::engine::HazardEngine;
use crate::world::{
    Actor, ActorTraits, BurnResult, Creatures, DamageKind, FireData, ItemId, NoVehicles,
    StatusEffect, StoredObjects, Terrain, TerrainFlags, UniformWind, VehicleOccupancy, Wind,
    WorldView,
};

// =============================================================================
// Terrain
// =============================================================================

/// In-memory terrain: open floor everywhere unless told otherwise.
#[derive(Debug, Default)]
pub struct TestTerrain {
    /// Per-tile flags.
    pub flags: HashMap<Tripoint, TerrainFlags>,
    /// Flags of tiles not in `flags`.
    pub default_flags: TerrainFlags,
    /// Impassable tiles.
    pub walls: HashSet<Tripoint>,
    /// Every tile is open to the sky.
    pub outside: bool,
    /// Every tile is shielded from wind.
    pub sheltered: bool,
    /// Tiles whose terrain burnt out, in order.
    pub burnt: Vec<Tripoint>,
    /// Tiles fungus spread to.
    pub fungus_spread: Vec<Tripoint>,
    /// Radiation added per tile.
    pub radiation: HashMap<Tripoint, i32>,
}

impl TestTerrain {
    /// Set the flags of one tile.
    pub fn set(&mut self, p: Tripoint, flags: TerrainFlags) {
        self.flags.insert(p, flags);
    }

    /// Make a tile impassable.
    pub fn wall(&mut self, p: Tripoint) {
        self.walls.insert(p);
    }
}

impl Terrain for TestTerrain {
    fn flags(&self, p: Tripoint) -> TerrainFlags {
        self.flags.get(&p).copied().unwrap_or(self.default_flags)
    }

    fn movement_cost(&self, p: Tripoint) -> i32 {
        if self.walls.contains(&p) {
            0
        } else {
            2
        }
    }

    fn is_outside(&self, _p: Tripoint) -> bool {
        self.outside
    }

    fn is_sheltered(&self, _p: Tripoint) -> bool {
        self.sheltered
    }

    fn burn_out(&mut self, p: Tripoint) {
        let remaining = self.flags(p) - TerrainFlags::ANY_FLAMMABLE;
        self.flags.insert(p, remaining);
        self.burnt.push(p);
    }

    fn spread_fungus(&mut self, p: Tripoint) {
        self.fungus_spread.push(p);
    }

    fn adjust_radiation(&mut self, p: Tripoint, amount: i32) {
        *self.radiation.entry(p).or_insert(0) += amount;
    }
}

// =============================================================================
// Items, creatures
// =============================================================================

/// Piles of identical flammable items.
#[derive(Debug, Default)]
pub struct TestObjects {
    /// Item count per tile.
    pub piles: HashMap<Tripoint, u32>,
    /// Items burnt so far.
    pub burnt: u32,
}

impl StoredObjects for TestObjects {
    fn items_at(&self, p: Tripoint) -> Vec<ItemId> {
        let count = self.piles.get(&p).copied().unwrap_or(0);
        (0..u64::from(count)).map(ItemId).collect()
    }

    fn has_flammable_items(&self, p: Tripoint) -> bool {
        self.piles.get(&p).is_some_and(|&n| n > 0)
    }

    fn burn(&mut self, p: Tripoint, _item: ItemId, fire: &mut FireData) -> BurnResult {
        fire.fuel_produced += 2.0;
        fire.smoke_produced += 1.0;
        if let Some(count) = self.piles.get_mut(&p) {
            *count = count.saturating_sub(1);
        }
        self.burnt += 1;
        BurnResult {
            destroyed: true,
            mass_lost: 50,
        }
    }

    fn spawn_byproducts(&mut self, _p: Tripoint, _item: ItemId, _mass_lost: u32) {}
}

/// Records spawn requests and complaints.
#[derive(Debug, Default)]
pub struct TestCreatures {
    /// `(group, center)` of every spawn request.
    pub spawned: Vec<(String, Tripoint)>,
    /// `(issue, tile)` of every complaint.
    pub complaints: Vec<(String, Tripoint)>,
}

impl Creatures for TestCreatures {
    fn spawn(&mut self, group: &str, count: u32, center: Tripoint, _radius: u32) -> u32 {
        self.spawned.push((group.to_string(), center));
        count
    }

    fn complain(&mut self, p: Tripoint, complaint: &NpcComplaint) {
        self.complaints.push((complaint.issue.clone(), p));
    }
}

// =============================================================================
// World
// =============================================================================

/// Owns one of each collaborator.
#[derive(Debug, Default)]
pub struct TestWorld {
    /// Terrain.
    pub terrain: TestTerrain,
    /// Items.
    pub objects: TestObjects,
    /// Wind.
    pub weather: UniformWind,
    /// Creatures.
    pub creatures: TestCreatures,
    /// Vehicles.
    pub vehicles: NoVehicles,
}

impl TestWorld {
    /// Windless, indoor open floor.
    pub fn calm() -> Self {
        Self::default()
    }

    /// Same, with a uniform wind.
    pub fn windy(direction: i32, speed: i32) -> Self {
        Self {
            weather: UniformWind(Wind { direction, speed }),
            ..Self::default()
        }
    }

    /// Borrow everything for one engine call.
    pub fn view(&mut self) -> WorldView<'_> {
        WorldView::new(
            &mut self.terrain,
            &mut self.objects,
            &self.weather,
            &mut self.creatures,
            &mut self.vehicles,
        )
    }
}

// =============================================================================
// Actor
// =============================================================================

/// An actor that records everything done to it.
#[derive(Debug, Default)]
pub struct TestActor {
    /// Position.
    pub pos: Tripoint,
    /// Traits.
    pub traits: ActorTraits,
    /// Vehicle situation.
    pub occupancy: VehicleOccupancy,
    /// Lying down.
    pub on_ground: bool,
    /// Damage taken, in order.
    pub damage: Vec<(DamageKind, i32)>,
    /// Effects applied, in order.
    pub effects: Vec<(StatusEffect, TimeDuration, i32)>,
    /// Moves spent.
    pub moves_spent: i32,
}

impl TestActor {
    /// Plain actor at a position.
    pub fn at(pos: Tripoint) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    /// Actor with traits.
    pub fn with_traits(pos: Tripoint, traits: ActorTraits) -> Self {
        Self {
            pos,
            traits,
            ..Self::default()
        }
    }

    /// Whether an effect was applied.
    pub fn has_effect(&self, effect: StatusEffect) -> bool {
        self.effects.iter().any(|(e, _, _)| *e == effect)
    }

    /// Total damage of a kind.
    pub fn damage_of(&self, kind: DamageKind) -> i32 {
        self.damage
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, n)| n)
            .sum()
    }
}

impl Actor for TestActor {
    fn position(&self) -> Tripoint {
        self.pos
    }

    fn traits(&self) -> ActorTraits {
        self.traits
    }

    fn vehicle_occupancy(&self) -> VehicleOccupancy {
        self.occupancy
    }

    fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    fn apply_damage(&mut self, kind: DamageKind, amount: i32) -> i32 {
        self.damage.push((kind, amount));
        amount
    }

    fn apply_status_effect(&mut self, effect: StatusEffect, duration: TimeDuration, magnitude: i32) {
        self.effects.push((effect, duration, magnitude));
    }

    fn spend_moves(&mut self, moves: i32) {
        self.moves_spent += moves;
    }
}

// =============================================================================
// Engine setup
// =============================================================================

/// 24x24 tiles on a single level.
pub fn small_flat_config() -> MapConfig {
    MapConfig::flat(2, 2)
}

/// 24x24 tiles on levels -1..=1.
pub fn small_layered_config() -> MapConfig {
    MapConfig {
        min_z: -1,
        max_z: 1,
        ..MapConfig::with_size(2, 2)
    }
}

/// The bundled catalogue.
pub fn standard_registry() -> Arc<FieldTypeRegistry> {
    Arc::new(FieldTypeRegistry::standard().expect("bundled catalogue loads"))
}

/// The bundled catalogue with some definitions tuned.
pub fn tuned_registry(tune: impl Fn(&mut FieldTypeDef)) -> Arc<FieldTypeRegistry> {
    let mut defs = FieldTypeRegistry::standard_defs().expect("bundled catalogue parses");
    defs.iter_mut().for_each(tune);
    Arc::new(FieldTypeRegistry::from_defs(defs).expect("tuned catalogue loads"))
}

/// Engine over a small flat map with the bundled catalogue.
pub fn flat_engine(seed: u64) -> HazardEngine {
    HazardEngine::new_with_seed(small_flat_config(), standard_registry(), seed)
}

/// Advance `ticks` turns.
pub fn run_ticks(engine: &mut HazardEngine, world: &mut TestWorld, ticks: usize) {
    for _ in 0..ticks {
        engine.advance_tick(&mut world.view());
    }
}

/// Sum of intensities of one type over the whole map.
pub fn total_intensity(engine: &HazardEngine, type_id: miasma::FieldTypeId) -> i32 {
    engine
        .map()
        .live_entries()
        .filter(|(_, e)| e.type_id() == type_id)
        .map(|(_, e)| e.intensity())
        .sum()
}

/// Route engine logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Shorthand for a tile on level 0.
pub fn pt(x: i32, y: i32) -> Tripoint {
    Tripoint::new(x, y, 0)
}
