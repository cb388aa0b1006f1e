//! The field type catalogue.
//!
//! Types are described by [`FieldTypeDef`] records (usually JSON), validated
//! and resolved once into a [`FieldTypeRegistry`]. After loading, the registry
//! is read-only and shared by the map and the tick processor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RegistryError;
use crate::field::{
    ExposureKind, FieldCategory, FieldTypeId, FieldTypeParams, IntensityUpgrade, MonsterSpawn,
    NpcComplaint, RadiationYield, DEFAULT_MAX_INTENSITY,
};
use crate::time::TimeDuration;

/// The bundled standard catalogue.
const STANDARD_CATALOGUE: &str = include_str!("../data/field_types.json");

/// Ids that must be present in every catalogue.
pub const MANDATORY_TYPES: [&str; 5] = ["fd_fire", "fd_smoke", "fd_web", "fd_acid", "fd_electricity"];

/// Ids of the optional hot-air decoys, indexed by intensity - 1.
pub const HOT_AIR_TYPES: [&str; 4] = ["fd_hot_air1", "fd_hot_air2", "fd_hot_air3", "fd_hot_air4"];

// =============================================================================
// FieldTypeDef
// =============================================================================

/// Unresolved, serializable definition of one field type.
///
/// Cross-references (`companion_field`, `wandering_field`) are by id string
/// and resolved when the registry is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldTypeDef {
    /// Unique id, e.g. `fd_fire`.
    pub id: String,
    /// Behaviour family.
    pub category: FieldCategory,
    /// Highest valid intensity.
    #[serde(default = "default_max_intensity")]
    pub max_intensity: i32,
    /// Decay age scale, in turns. Zero disables decay.
    #[serde(default)]
    pub half_life: TimeDuration,
    /// Spread chance in percent, 0..=100.
    #[serde(default)]
    pub diffusion_percent: u32,
    /// Extra aging per tick outdoors, in turns.
    #[serde(default)]
    pub outdoor_age_speedup: TimeDuration,
    /// Passes through gas-permeable tiles.
    #[serde(default)]
    pub is_gas: bool,
    /// Changes invalidate line-of-sight caches.
    #[serde(default)]
    pub dirties_transparency: bool,
    /// Partner of a cyclic vent.
    #[serde(default)]
    pub companion_field: Option<String>,
    /// Type emitted around this one.
    #[serde(default)]
    pub wandering_field: Option<String>,
    /// Bystander complaint trigger.
    #[serde(default)]
    pub npc_complaint: Option<NpcComplaint>,
    /// Radiation emitted into the tile.
    #[serde(default)]
    pub radiation_yield: Option<RadiationYield>,
    /// Creature spawning.
    #[serde(default)]
    pub monster_spawn: Option<MonsterSpawn>,
    /// Slow growth.
    #[serde(default)]
    pub intensity_upgrade: Option<IntensityUpgrade>,
    /// Scent removed around a diffusing instance.
    #[serde(default)]
    pub scent_neutralization: i32,
    /// Effect on actors.
    #[serde(default)]
    pub exposure: ExposureKind,
    /// Actors are affected on the tick the field appears.
    #[serde(default)]
    pub immediate_exposure: bool,
}

fn default_max_intensity() -> i32 {
    DEFAULT_MAX_INTENSITY
}

impl FieldTypeDef {
    /// A definition with every optional parameter at its default.
    #[must_use]
    pub fn new(id: impl Into<String>, category: FieldCategory) -> Self {
        Self {
            id: id.into(),
            category,
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
}

// =============================================================================
// KnownFields
// =============================================================================

/// Ids of the types the engine refers to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownFields {
    /// `fd_fire`
    pub fire: FieldTypeId,
    /// `fd_smoke`
    pub smoke: FieldTypeId,
    /// `fd_web`
    pub web: FieldTypeId,
    /// `fd_acid`
    pub acid: FieldTypeId,
    /// `fd_electricity`
    pub electricity: FieldTypeId,
    /// `fd_hot_air1..4`, when defined.
    pub hot_air: [Option<FieldTypeId>; 4],
}

// =============================================================================
// FieldTypeRegistry
// =============================================================================

/// Read-only catalogue of field types.
#[derive(Debug, Clone)]
pub struct FieldTypeRegistry {
    types: Vec<FieldTypeParams>,
    by_name: HashMap<String, FieldTypeId>,
    known: KnownFields,
}

impl FieldTypeRegistry {
    /// Load the bundled standard catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data is inconsistent.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_json(STANDARD_CATALOGUE)
    }

    /// The bundled definitions, for hosts that extend or tune them before
    /// building a registry.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data is malformed.
    pub fn standard_defs() -> Result<Vec<FieldTypeDef>, RegistryError> {
        Ok(serde_json::from_str(STANDARD_CATALOGUE)?)
    }

    /// Parse a JSON array of [`FieldTypeDef`] records.
    ///
    /// # Errors
    ///
    /// See [`FieldTypeRegistry::from_defs`]; additionally fails on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let defs: Vec<FieldTypeDef> = serde_json::from_str(json)?;
        Self::from_defs(defs)
    }

    /// Validate and resolve a list of definitions.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids, dangling references, invalid parameters, or
    /// when one of [`MANDATORY_TYPES`] is missing.
    pub fn from_defs(defs: Vec<FieldTypeDef>) -> Result<Self, RegistryError> {
        if defs.len() > usize::from(u16::MAX) {
            return Err(RegistryError::TooMany(defs.len()));
        }

        let mut by_name = HashMap::with_capacity(defs.len());
        for (index, def) in defs.iter().enumerate() {
            // Bounded by the length check above.
            #[allow(clippy::cast_possible_truncation)]
            let id = FieldTypeId::new(index as u16);
            if by_name.insert(def.id.clone(), id).is_some() {
                return Err(RegistryError::Duplicate(def.id.clone()));
            }
        }

        let resolve = |owner: &str, target: Option<&String>| -> Result<Option<FieldTypeId>, RegistryError> {
            match target {
                None => Ok(None),
                Some(name) => by_name.get(name).copied().map(Some).ok_or_else(|| {
                    RegistryError::UnknownReference {
                        owner: owner.to_string(),
                        target: name.clone(),
                    }
                }),
            }
        };

        let mut types = Vec::with_capacity(defs.len());
        for def in defs {
            validate(&def)?;
            let companion_field = resolve(&def.id, def.companion_field.as_ref())?;
            let wandering_field = resolve(&def.id, def.wandering_field.as_ref())?;

            let diffusion_percent = if def.diffusion_percent > 100 {
                warn!(
                    field = %def.id,
                    percent = def.diffusion_percent,
                    "diffusion percent above 100, clamping"
                );
                100
            } else {
                def.diffusion_percent
            };

            types.push(FieldTypeParams {
                name: def.id,
                category: def.category,
                max_intensity: def.max_intensity,
                half_life: def.half_life,
                diffusion_percent,
                outdoor_age_speedup: def.outdoor_age_speedup,
                is_gas: def.is_gas,
                dirties_transparency: def.dirties_transparency,
                companion_field,
                wandering_field,
                npc_complaint: def.npc_complaint,
                radiation_yield: def.radiation_yield,
                monster_spawn: def.monster_spawn,
                intensity_upgrade: def.intensity_upgrade,
                scent_neutralization: def.scent_neutralization,
                exposure: def.exposure,
                immediate_exposure: def.immediate_exposure,
            });
        }

        let mandatory = |name: &'static str| {
            by_name
                .get(name)
                .copied()
                .ok_or(RegistryError::MissingMandatory(name))
        };
        let known = KnownFields {
            fire: mandatory(MANDATORY_TYPES[0])?,
            smoke: mandatory(MANDATORY_TYPES[1])?,
            web: mandatory(MANDATORY_TYPES[2])?,
            acid: mandatory(MANDATORY_TYPES[3])?,
            electricity: mandatory(MANDATORY_TYPES[4])?,
            hot_air: HOT_AIR_TYPES.map(|name| by_name.get(name).copied()),
        };

        info!(types = types.len(), "loaded field type catalogue");

        Ok(Self {
            types,
            by_name,
            known,
        })
    }

    /// Parameters of a type, or `None` for an id this registry never issued.
    #[must_use]
    pub fn get(&self, id: FieldTypeId) -> Option<&FieldTypeParams> {
        self.types.get(id.index())
    }

    /// Resolve an id string.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<FieldTypeId> {
        self.by_name.get(name).copied()
    }

    /// Types the engine refers to by name.
    #[must_use]
    pub fn known(&self) -> &KnownFields {
        &self.known
    }

    /// Hot-air decoy type for a fire of the given intensity, if defined.
    #[must_use]
    pub fn hot_air(&self, intensity: i32) -> Option<FieldTypeId> {
        let slot = usize::try_from(intensity.clamp(1, 4) - 1).ok()?;
        self.known.hot_air[slot]
    }

    /// Number of types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty (never true for a loaded registry).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all types in id order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldTypeId, &FieldTypeParams)> {
        self.types.iter().enumerate().map(|(index, params)| {
            #[allow(clippy::cast_possible_truncation)]
            (FieldTypeId::new(index as u16), params)
        })
    }
}

fn validate(def: &FieldTypeDef) -> Result<(), RegistryError> {
    let invalid = |param: &'static str, reason: String| RegistryError::InvalidParameter {
        id: def.id.clone(),
        param,
        reason,
    };

    if def.max_intensity < 1 {
        return Err(invalid(
            "max_intensity",
            format!("{} is below 1", def.max_intensity),
        ));
    }
    if def.half_life.is_negative() {
        return Err(invalid("half_life", format!("{} is negative", def.half_life)));
    }
    if let Some(rads) = def.radiation_yield {
        if rads.min > rads.max {
            return Err(invalid(
                "radiation_yield",
                format!("min {} exceeds max {}", rads.min, rads.max),
            ));
        }
    }
    if let Some(upgrade) = def.intensity_upgrade {
        if upgrade.interval.as_turns() <= 0 {
            return Err(invalid("intensity_upgrade", "interval must be positive".into()));
        }
        if upgrade.chance == 0 {
            return Err(invalid("intensity_upgrade", "chance must be positive".into()));
        }
    }
    if def.npc_complaint.as_ref().is_some_and(|c| c.chance == 0) {
        return Err(invalid("npc_complaint", "chance must be positive".into()));
    }
    if def.monster_spawn.as_ref().is_some_and(|m| m.chance == 0) {
        return Err(invalid("monster_spawn", "chance must be positive".into()));
    }
    if matches!(def.category, FieldCategory::CyclicVent { settle_one_in: 0 }) {
        return Err(invalid("category", "settle_one_in must be positive".into()));
    }
    if matches!(def.category, FieldCategory::CyclicVent { .. }) && def.companion_field.is_none() {
        return Err(invalid("companion_field", "cyclic vents need a companion".into()));
    }
    if def.companion_field.as_deref() == Some(def.id.as_str()) {
        return Err(invalid("companion_field", "a type cannot be its own companion".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_defs() -> Vec<FieldTypeDef> {
        MANDATORY_TYPES
            .iter()
            .map(|id| FieldTypeDef::new(*id, FieldCategory::Inert))
            .collect()
    }

    #[test]
    fn test_standard_catalogue_loads() {
        let registry = FieldTypeRegistry::standard().unwrap();
        let fire = registry.known().fire;
        let params = registry.get(fire).unwrap();
        assert_eq!(params.name, "fd_fire");
        assert_eq!(params.category, FieldCategory::Combustion);
        assert!(registry.hot_air(3).is_some());
    }

    #[test]
    fn test_standard_catalogue_omits_push_and_cold_air() {
        let registry = FieldTypeRegistry::standard().unwrap();
        assert_eq!(registry.len(), 33);
        assert!(registry.id("fd_push_items").is_none());
        for n in 1..=4 {
            assert!(registry.id(&format!("fd_cold_air{n}")).is_none());
        }
    }

    #[test]
    fn test_standard_vent_pair_is_linked() {
        let registry = FieldTypeRegistry::standard().unwrap();
        let vent = registry.id("fd_fire_vent").unwrap();
        let burst = registry.id("fd_flame_burst").unwrap();
        assert_eq!(registry.get(vent).unwrap().companion_field, Some(burst));
        assert_eq!(registry.get(burst).unwrap().companion_field, Some(vent));
    }

    #[test]
    fn test_missing_mandatory_is_fatal() {
        let mut defs = minimal_defs();
        defs.retain(|d| d.id != "fd_web");
        let err = FieldTypeRegistry::from_defs(defs).unwrap_err();
        assert!(matches!(err, RegistryError::MissingMandatory("fd_web")));
    }

    #[test]
    fn test_duplicate_is_fatal() {
        let mut defs = minimal_defs();
        defs.push(FieldTypeDef::new("fd_fire", FieldCategory::Combustion));
        let err = FieldTypeRegistry::from_defs(defs).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(ref id) if id == "fd_fire"));
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let mut defs = minimal_defs();
        let mut vent = FieldTypeDef::new("fd_gas_vent", FieldCategory::Inert);
        vent.wandering_field = Some("fd_nonexistent".into());
        defs.push(vent);
        let err = FieldTypeRegistry::from_defs(defs).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownReference { .. }));
    }

    #[test]
    fn test_diffusion_percent_is_clamped() {
        let mut defs = minimal_defs();
        let mut smoke = FieldTypeDef::new("fd_cigsmoke", FieldCategory::Gas);
        smoke.diffusion_percent = 250;
        defs.push(smoke);
        let registry = FieldTypeRegistry::from_defs(defs).unwrap();
        let id = registry.id("fd_cigsmoke").unwrap();
        assert_eq!(registry.get(id).unwrap().diffusion_percent, 100);
    }

    #[test]
    fn test_zero_max_intensity_is_fatal() {
        let mut defs = minimal_defs();
        defs[0].max_intensity = 0;
        assert!(FieldTypeRegistry::from_defs(defs).is_err());
    }

    #[test]
    fn test_zero_chance_is_fatal() {
        let mut spawner = FieldTypeDef::new("fd_fatigue", FieldCategory::Inert);
        spawner.monster_spawn = Some(MonsterSpawn {
            chance: 0,
            group: "GROUP_NETHER".into(),
            radius: 1,
            count: 1,
            min_intensity: 3,
        });
        let mut defs = minimal_defs();
        defs.push(spawner);
        let err = FieldTypeRegistry::from_defs(defs).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidParameter { param: "monster_spawn", .. }
        ));

        let mut rift = FieldTypeDef::new("fd_fatigue", FieldCategory::Inert);
        rift.intensity_upgrade = Some(IntensityUpgrade {
            chance: 0,
            interval: TimeDuration::hours(6),
        });
        let mut defs = minimal_defs();
        defs.push(rift);
        assert!(FieldTypeRegistry::from_defs(defs).is_err());

        let mut smoker = FieldTypeDef::new("fd_weedsmoke", FieldCategory::Gas);
        smoker.npc_complaint = Some(NpcComplaint {
            chance: 0,
            issue: "weed_smoke".into(),
            cooldown: TimeDuration::minutes(10),
            speech: "<weed_smoke>".into(),
        });
        let mut defs = minimal_defs();
        defs.push(smoker);
        assert!(FieldTypeRegistry::from_defs(defs).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = FieldTypeRegistry::from_json("[{\"id\": 3}]").unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"[
            {"id": "fd_fire", "category": "combustion"},
            {"id": "fd_smoke", "category": "gas", "diffusion_percent": 10, "half_life": 120},
            {"id": "fd_web", "category": "inert", "exposure": "web", "immediate_exposure": true},
            {"id": "fd_acid", "category": "corrosive"},
            {"id": "fd_electricity", "category": "electrical"}
        ]"#;
        let registry = FieldTypeRegistry::from_json(json).unwrap();
        let smoke = registry.get(registry.known().smoke).unwrap();
        assert_eq!(smoke.max_intensity, 3);
        assert_eq!(smoke.half_life, TimeDuration::minutes(2));
        assert!(registry.hot_air(1).is_none());
        let web = registry.get(registry.known().web).unwrap();
        assert_eq!(web.exposure, ExposureKind::Web);
        assert!(web.immediate_exposure);
    }
}
