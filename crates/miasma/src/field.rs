//! Field type parameters and concrete field entries.
//!
//! A *field type* is immutable catalogue data (how fast it decays, how it
//! spreads, what it does to actors). A [`FieldEntry`] is one live instance of
//! a type on one tile, carrying the mutable intensity and age.

use serde::{Deserialize, Serialize};

use crate::time::TimeDuration;

/// Default intensity cap for field types that do not declare one.
pub const DEFAULT_MAX_INTENSITY: i32 = 3;

/// Index of a field type inside a [`FieldTypeRegistry`](crate::FieldTypeRegistry).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FieldTypeId(u16);

impl FieldTypeId {
    /// Wrap a raw registry index.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw registry index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Per-tick behaviour family of a field type.
///
/// The tick processor matches on this exhaustively, so adding a variant
/// forces every dispatch site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// No per-tick rule beyond aging (webs, sap, sludge, emitters).
    Inert,
    /// Splatter that washes away quickly in water.
    Residue,
    /// Liquid that eats through things and falls through open floors.
    Corrosive,
    /// Fire.
    Combustion,
    /// Plain gas: diffuses and nothing else.
    Gas,
    /// Electric discharge that seeks ground.
    Electrical,
    /// One half of a vent pair that toggles into its companion field.
    CyclicVent {
        /// While above minimum intensity, the vent settles by one level
        /// with chance `1 in settle_one_in`.
        settle_one_in: u32,
    },
    /// Periodically floods its surroundings with acid.
    AcidVent,
    /// Periodically discharges electric bolts.
    ShockVent,
    /// Spore haze: diffuses and converts terrain to fungus.
    Fungal,
    /// Fungicide: diffuses and kills fungal terrain.
    Fungicidal,
    /// Incendiary gas: diffuses and ignites flammable neighbours.
    Incendiary,
    /// Insect swarm: diffuses slowly and dies in hostile fields.
    Swarm,
}

impl FieldCategory {
    /// Whether this category moves with the diffusion engine.
    #[must_use]
    pub const fn diffuses(self) -> bool {
        matches!(
            self,
            Self::Gas | Self::Fungal | Self::Fungicidal | Self::Incendiary | Self::Swarm
        )
    }
}

/// What a field type does to an actor standing in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureKind {
    /// Harmless.
    #[default]
    None,
    /// Entangles, and is torn apart by the actor.
    Web,
    /// Sticky sap; each contact uses some up.
    Sap,
    /// Deep sludge that drains movement and is churned away.
    Sludge,
    /// Corrosive burns to the lower body.
    Acid,
    /// Burns.
    Fire,
    /// Short jet of flame from a vent.
    FlameBurst,
    /// Coughing.
    Smoke,
    /// Stinging eyes and blindness.
    TearGas,
    /// Sedation.
    RelaxGas,
    /// Poisoning.
    ToxicGas,
    /// Radiation.
    NukeGas,
    /// Fungal spores.
    FungalHaze,
    /// Fungicide; poisonous, lethal to fungal life.
    Fungicidal,
    /// Blinding light.
    Dazzling,
    /// Shocks.
    Electricity,
    /// Space-bending rift that displaces actors.
    Fatigue,
    /// Vent that shuts down when stepped on.
    VentShutdown,
    /// Stings.
    Bees,
    /// Sets actors alight.
    Incendiary,
}

// =============================================================================
// Optional parameter blocks
// =============================================================================

/// Bystanders complain about the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcComplaint {
    /// Chance `1 in chance` per tick.
    pub chance: u32,
    /// Complaint key, used by the listener for rate limiting.
    pub issue: String,
    /// How long the listener should stay quiet about this issue.
    pub cooldown: TimeDuration,
    /// Speech line.
    pub speech: String,
}

/// Radiation emitted into the tile every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiationYield {
    /// Minimum per-tick amount.
    pub min: i32,
    /// Maximum per-tick amount.
    pub max: i32,
}

/// Creatures that crawl out of the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    /// Chance `1 in chance` per tick.
    pub chance: u32,
    /// Creature group name.
    pub group: String,
    /// Spawn radius around the tile.
    pub radius: u32,
    /// Number of creatures per spawn.
    pub count: u32,
    /// Spawning only happens at or above this intensity.
    #[serde(default = "one")]
    pub min_intensity: i32,
}

/// Slow self-reinforcement of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityUpgrade {
    /// Chance `1 in chance` each time the interval elapses.
    pub chance: u32,
    /// Interval between growth checks.
    pub interval: TimeDuration,
}

fn one() -> i32 {
    1
}

// =============================================================================
// FieldTypeParams
// =============================================================================

/// Immutable, resolved parameters of one field type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTypeParams {
    /// Registry id string (e.g. `fd_fire`).
    pub name: String,
    /// Behaviour family.
    pub category: FieldCategory,
    /// Highest valid intensity.
    pub max_intensity: i32,
    /// Age scale of the probabilistic decay check; zero disables it.
    pub half_life: TimeDuration,
    /// Chance in percent that a diffusing instance tries to spread.
    pub diffusion_percent: u32,
    /// Extra aging per tick when outdoors.
    pub outdoor_age_speedup: TimeDuration,
    /// Whether blasts of this type pass through gas-permeable tiles.
    pub is_gas: bool,
    /// Changes to this type invalidate line-of-sight caches.
    pub dirties_transparency: bool,
    /// Partner type of a cyclic vent.
    pub companion_field: Option<FieldTypeId>,
    /// Type emitted around this one, radius scaled by intensity.
    pub wandering_field: Option<FieldTypeId>,
    /// Bystander complaint trigger.
    pub npc_complaint: Option<NpcComplaint>,
    /// Radiation emitted into the tile.
    pub radiation_yield: Option<RadiationYield>,
    /// Creature spawning.
    pub monster_spawn: Option<MonsterSpawn>,
    /// Slow growth.
    pub intensity_upgrade: Option<IntensityUpgrade>,
    /// Scent removed around a diffusing instance.
    pub scent_neutralization: i32,
    /// Effect on actors.
    pub exposure: ExposureKind,
    /// Whether actors are affected on the tick the field appears.
    pub immediate_exposure: bool,
}

impl FieldTypeParams {
    /// Parameters for an inert type with the given name, as a starting point
    /// for hand-built catalogues.
    #[must_use]
    pub fn inert(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: FieldCategory::Inert,
            max_intensity: DEFAULT_MAX_INTENSITY,
            half_life: TimeDuration::ZERO,
            diffusion_percent: 0,
            outdoor_age_speedup: TimeDuration::ZERO,
            is_gas: false,
            dirties_transparency: false,
            companion_field: None,
            wandering_field: None,
            npc_complaint: None,
            radiation_yield: None,
            monster_spawn: None,
            intensity_upgrade: None,
            scent_neutralization: 0,
            exposure: ExposureKind::None,
            immediate_exposure: false,
        }
    }

    /// Clamp an intensity into `1..=max_intensity`.
    #[must_use]
    pub fn clamp_intensity(&self, intensity: i32) -> i32 {
        intensity.clamp(1, self.max_intensity)
    }
}

// =============================================================================
// FieldEntry
// =============================================================================

/// One live field instance on one tile.
///
/// Intensity never goes below zero; dropping it to zero marks the entry dead.
/// Dead entries stay in their cell until the next compaction so that a sweep
/// in progress never sees its container shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldEntry {
    type_id: FieldTypeId,
    intensity: i32,
    age: TimeDuration,
    alive: bool,
}

impl FieldEntry {
    /// Create a live entry. Non-positive intensities produce a dead entry.
    #[must_use]
    pub fn new(type_id: FieldTypeId, intensity: i32, age: TimeDuration) -> Self {
        Self {
            type_id,
            intensity: intensity.max(0),
            age,
            alive: intensity > 0,
        }
    }

    /// The field type.
    #[must_use]
    pub fn type_id(&self) -> FieldTypeId {
        self.type_id
    }

    /// Current intensity.
    #[must_use]
    pub fn intensity(&self) -> i32 {
        self.intensity
    }

    /// Current age.
    #[must_use]
    pub fn age(&self) -> TimeDuration {
        self.age
    }

    /// Whether the entry is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Set intensity; zero or below kills the entry.
    pub fn set_intensity(&mut self, intensity: i32) {
        self.intensity = intensity.max(0);
        if self.intensity == 0 {
            self.alive = false;
        }
    }

    /// Adjust intensity by `delta`.
    pub fn mod_intensity(&mut self, delta: i32) {
        self.set_intensity(self.intensity.saturating_add(delta));
    }

    /// Set age.
    pub fn set_age(&mut self, age: TimeDuration) {
        self.age = age;
    }

    /// Adjust age by `delta`.
    pub fn mod_age(&mut self, delta: TimeDuration) {
        self.age += delta;
    }

    /// Mark the entry dead without touching its age.
    pub fn kill(&mut self) {
        self.set_intensity(0);
    }

    /// Bring a dead slot back to life as a fresh instance.
    pub(crate) fn revive(&mut self, intensity: i32, age: TimeDuration) {
        self.intensity = intensity.max(0);
        self.age = age;
        self.alive = self.intensity > 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_intensity_is_dead() {
        let entry = FieldEntry::new(FieldTypeId::new(0), 0, TimeDuration::ZERO);
        assert!(!entry.is_alive());
        assert_eq!(entry.intensity(), 0);
    }

    #[test]
    fn test_mod_intensity_kills_at_zero() {
        let mut entry = FieldEntry::new(FieldTypeId::new(1), 2, TimeDuration::ZERO);
        entry.mod_intensity(-1);
        assert!(entry.is_alive());
        entry.mod_intensity(-5);
        assert!(!entry.is_alive());
        assert_eq!(entry.intensity(), 0);
    }

    #[test]
    fn test_category_diffusion() {
        assert!(FieldCategory::Gas.diffuses());
        assert!(FieldCategory::Swarm.diffuses());
        assert!(!FieldCategory::Combustion.diffuses());
        assert!(!FieldCategory::CyclicVent { settle_one_in: 3 }.diffuses());
    }

    #[test]
    fn test_category_serde_names() {
        let gas: FieldCategory = serde_json::from_str("\"gas\"").unwrap();
        assert_eq!(gas, FieldCategory::Gas);
        let vent: FieldCategory =
            serde_json::from_str(r#"{"cyclic_vent":{"settle_one_in":3}}"#).unwrap();
        assert_eq!(vent, FieldCategory::CyclicVent { settle_one_in: 3 });
    }

    #[test]
    fn test_clamp_intensity() {
        let params = FieldTypeParams::inert("fd_test");
        assert_eq!(params.clamp_intensity(7), 3);
        assert_eq!(params.clamp_intensity(-2), 1);
    }
}
