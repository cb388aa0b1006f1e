//! The hazard engine: field map, random source and tick counter.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::info;

use miasma::{
    FieldEntry, FieldMap, FieldTypeId, FieldTypeRegistry, MapConfig, RegionCoord, RegistryError,
    TimeDuration, Tripoint,
};

use crate::emit::{self, Emission};
use crate::exposure::{ActorExposure, ExposureReport};
use crate::rng::SimRng;
use crate::tick::{TickProcessor, TickReport};
use crate::world::{Actor, Terrain, WorldView};

/// Environmental hazard simulation over one map.
///
/// The engine owns the field state and the only random source. The world
/// around it (terrain, items, weather, creatures, vehicles) is lent in per
/// call, so nothing is cached between ticks.
#[derive(Debug, Clone)]
pub struct HazardEngine {
    map: FieldMap,
    rng: SimRng,
    tick: u64,
}

impl HazardEngine {
    /// Engine with seed 0.
    #[must_use]
    pub fn new(config: MapConfig, registry: Arc<FieldTypeRegistry>) -> Self {
        Self::new_with_seed(config, registry, 0)
    }

    /// Engine with an explicit seed.
    ///
    /// # Arguments
    ///
    /// * `config` - Map shape
    /// * `registry` - Field type catalogue, shared and immutable
    /// * `seed` - Seed of the engine's random source
    #[must_use]
    pub fn new_with_seed(config: MapConfig, registry: Arc<FieldTypeRegistry>, seed: u64) -> Self {
        let map = FieldMap::new(config, registry);
        info!(
            width = map.config().width(),
            height = map.config().height(),
            levels = map.config().depth(),
            field_types = map.registry().len(),
            seed,
            "hazard engine created"
        );
        Self {
            map,
            rng: SimRng::new(seed),
            tick: 0,
        }
    }

    /// Engine using the built-in field catalogue.
    ///
    /// # Errors
    ///
    /// Fails if the built-in catalogue does not load.
    pub fn with_standard_types(config: MapConfig, seed: u64) -> Result<Self, RegistryError> {
        let registry = FieldTypeRegistry::standard()?;
        Ok(Self::new_with_seed(config, Arc::new(registry), seed))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The field map.
    #[must_use]
    pub fn map(&self) -> &FieldMap {
        &self.map
    }

    /// The field map, for restoring saved state.
    pub fn map_mut(&mut self) -> &mut FieldMap {
        &mut self.map
    }

    /// The field type catalogue.
    #[must_use]
    pub fn registry(&self) -> &Arc<FieldTypeRegistry> {
        self.map.registry()
    }

    /// Ticks processed so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed the random source started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Restart the random source.
    pub fn reset_rng(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Advance all fields by one turn.
    ///
    /// Returns whether anything affecting line of sight changed.
    pub fn advance_tick(&mut self, world: &mut WorldView<'_>) -> bool {
        self.advance_tick_report(world).visibility_changed
    }

    /// Advance all fields by one turn and report what happened.
    pub fn advance_tick_report(&mut self, world: &mut WorldView<'_>) -> TickReport {
        let report = TickProcessor::new(&mut self.map, &mut self.rng, world, self.tick).run();
        self.tick += 1;
        report
    }

    /// Add a field or merge into the existing one.
    ///
    /// Returns `true` only if a new entry was created.
    pub fn add_field(
        &mut self,
        p: Tripoint,
        type_id: FieldTypeId,
        intensity: i32,
        age: TimeDuration,
    ) -> bool {
        self.map.add_field(p, type_id, intensity, age)
    }

    /// Remove a field type from a tile.
    pub fn remove_field(&mut self, p: Tripoint, type_id: FieldTypeId) -> bool {
        self.map.remove_field(p, type_id)
    }

    /// The live entry of a type on a tile.
    #[must_use]
    pub fn field_at(&self, p: Tripoint, type_id: FieldTypeId) -> Option<FieldEntry> {
        self.map.find(p, type_id).copied()
    }

    /// Apply the fields on the actor's tile to the actor.
    pub fn expose_actor(&mut self, actor: &mut dyn Actor) -> ExposureReport {
        ActorExposure::new(&mut self.map, &mut self.rng).apply(actor)
    }

    /// Whether a region holds any field slot.
    #[must_use]
    pub fn region_has_activity(&self, region: RegionCoord) -> bool {
        self.map.region_has_activity(region)
    }

    /// Spread a quantity of a field outward from a point.
    pub fn propagate_field(
        &mut self,
        terrain: &dyn Terrain,
        center: Tripoint,
        type_id: FieldTypeId,
        amount: i32,
        max_intensity: i32,
    ) -> i32 {
        emit::propagate_field(
            &mut self.map,
            &mut self.rng,
            terrain,
            center,
            type_id,
            amount,
            max_intensity,
        )
    }

    /// Roll an emission at a point.
    pub fn emit_field(
        &mut self,
        terrain: &dyn Terrain,
        pos: Tripoint,
        emission: &Emission,
        multiplier: f32,
    ) -> i32 {
        emit::emit_field(&mut self.map, &mut self.rng, terrain, pos, emission, multiplier)
    }

    /// Digest of the simulation state, for replay comparison.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.rng.seed().hash(&mut hasher);
        miasma::hash::hash_into(&self.map, &mut hasher);
        hasher.finish()
    }
}
