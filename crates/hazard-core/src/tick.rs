//! One simulation step over every active region.
//!
//! The sweep visits each active region, each tile, each slot in order. An
//! entry is copied out of its slot, run through its rules with full access
//! to the map, and written back. Rules never remove slots: they kill entries
//! (intensity 0) and the map is compacted once the sweep is done. New entries
//! are appended behind the cursor, so a field created on a tile that has not
//! been visited yet is seen later in the same sweep, where newborn
//! suppression keeps it inert.
//!
//! Per entry:
//! 1. skip dead slots (reclaimed by compaction)
//! 2. clamp intensity into the type's band
//! 3. newborn suppression: `age == 0` entries run no rules this tick
//! 4. category rule and side effects
//! 5. aging and half-life decay
//! 6. death when intensity reaches zero

use std::sync::Arc;

use tracing::{debug, trace, warn};

use miasma::{
    points_in_radius, FieldCategory, FieldEntry, FieldMap, FieldTypeId, FieldTypeParams,
    FieldTypeRegistry, TimeDuration, Tripoint,
};

use crate::rng::SimRng;
use crate::wind::{LocalWind, WindCache};
use crate::world::{TerrainFlags, WorldView};
use crate::{diffusion, fire, rules};

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A change relevant to line of sight happened.
    pub visibility_changed: bool,
    /// Regions swept.
    pub regions_processed: usize,
    /// Live entries that went through the state machine.
    pub entries_processed: usize,
    /// Dead slots reclaimed at the end of the tick.
    pub entries_removed: usize,
}

// =============================================================================
// RuleContext
// =============================================================================

/// Everything a rule may touch while processing one entry.
pub(crate) struct RuleContext<'t, 'w> {
    pub map: &'t mut FieldMap,
    pub registry: &'t FieldTypeRegistry,
    pub rng: &'t mut SimRng,
    pub world: &'t mut WorldView<'w>,
    pub winds: &'t mut WindCache,
    pub tick: u64,
}

impl RuleContext<'_, '_> {
    /// Wind on a tile, memoized for this tick.
    pub fn wind(&mut self, p: Tripoint) -> LocalWind {
        self.winds
            .sample(p, &*self.world.terrain, &*self.world.weather)
    }

    pub fn flags(&self, p: Tripoint) -> TerrainFlags {
        self.world.terrain.flags(p)
    }

    /// Whether fields may move from `p` to the level below.
    pub fn can_descend(&self, p: Tripoint) -> bool {
        let config = self.map.config();
        config.zlevels && p.z > config.min_z
    }

    /// Whether fields may move from `p` to the level above.
    pub fn can_ascend(&self, p: Tripoint) -> bool {
        let config = self.map.config();
        config.zlevels && p.z < config.max_z
    }

    /// Create hot-air decoys around a heat source.
    pub fn create_hot_air(&mut self, p: Tripoint, intensity: i32) {
        let Some(hot_air) = self.registry.hot_air(intensity) else {
            return;
        };
        for _ in 0..5 {
            let dst = p + self.rng.offset(1);
            self.map.add_field(dst, hot_air, 1, TimeDuration::ZERO);
        }
    }
}

// =============================================================================
// TickProcessor
// =============================================================================

/// Runs one tick over a field map.
pub struct TickProcessor<'a, 'w> {
    map: &'a mut FieldMap,
    rng: &'a mut SimRng,
    world: &'a mut WorldView<'w>,
    tick: u64,
}

impl<'a, 'w> TickProcessor<'a, 'w> {
    /// Prepare a tick.
    ///
    /// # Arguments
    ///
    /// * `map` - The field map to advance
    /// * `rng` - The engine's random source
    /// * `world` - Collaborator handles for this tick
    /// * `tick` - Number of the tick being processed
    pub fn new(
        map: &'a mut FieldMap,
        rng: &'a mut SimRng,
        world: &'a mut WorldView<'w>,
        tick: u64,
    ) -> Self {
        Self {
            map,
            rng,
            world,
            tick,
        }
    }

    /// Sweep every active region, then compact.
    pub fn run(self) -> TickReport {
        let registry = Arc::clone(self.map.registry());
        let mut winds = WindCache::default();
        let mut report = TickReport::default();

        let active: Vec<usize> = self.map.activity().iter_active().collect();
        let area = self.map.region_area();

        let mut ctx = RuleContext {
            map: self.map,
            registry: &registry,
            rng: self.rng,
            world: self.world,
            winds: &mut winds,
            tick: self.tick,
        };

        for &region in &active {
            report.regions_processed += 1;
            if ctx.map.region_slot_count(region) == 0 {
                continue;
            }
            for local in 0..area {
                let p = ctx.map.region_tile(region, local);
                let mut slot = 0;
                while slot < ctx.map.slot_count(p) {
                    if let Some(mut entry) = ctx.map.slot(p, slot) {
                        if entry.is_alive() {
                            process_entry(&mut ctx, p, &mut entry);
                            report.entries_processed += 1;
                            if let Some(stored) = ctx.map.slot_mut(p, slot) {
                                *stored = entry;
                            }
                        }
                    }
                    slot += 1;
                }
            }
        }

        report.entries_removed = ctx.map.compact();
        report.visibility_changed = ctx.map.take_transparency_dirty();

        debug!(
            tick = self.tick,
            regions = report.regions_processed,
            entries = report.entries_processed,
            removed = report.entries_removed,
            visibility_changed = report.visibility_changed,
            "tick processed"
        );
        report
    }
}

/// Run the full state machine for one entry.
fn process_entry(ctx: &mut RuleContext<'_, '_>, p: Tripoint, entry: &mut FieldEntry) {
    let registry = ctx.registry;
    let Some(params) = registry.get(entry.type_id()) else {
        warn!(?p, type_id = ?entry.type_id(), "dropping entry of unknown field type");
        entry.kill();
        return;
    };

    if entry.intensity() > params.max_intensity {
        warn!(
            ?p,
            field = %params.name,
            intensity = entry.intensity(),
            max = params.max_intensity,
            "intensity out of band, clamping"
        );
        entry.set_intensity(params.max_intensity);
    }

    if entry.age().is_zero() {
        trace!(?p, field = %params.name, "newborn, rules suppressed");
    } else {
        apply_category_rule(ctx, p, entry, params);
        if entry.is_alive() {
            apply_side_effects(ctx, p, entry, params);
        }
        if params.dirties_transparency {
            ctx.map.mark_transparency_dirty();
        }
    }

    entry.mod_age(TimeDuration::TURN);
    if entry.is_alive() && !params.half_life.is_zero() && entry.age() > TimeDuration::ZERO {
        let roll = ctx.rng.dice(2, entry.age().as_turns());
        if roll > params.half_life.as_turns() {
            entry.set_age(TimeDuration::ZERO);
            entry.mod_intensity(-1);
        }
    }
    // Dead entries keep their slot until compaction.
}

fn apply_category_rule(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    entry: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    match params.category {
        FieldCategory::Inert => {}
        FieldCategory::Residue => {
            if ctx.flags(p).contains(TerrainFlags::SWIMMABLE) {
                entry.mod_age(TimeDuration::minutes(25));
            }
        }
        FieldCategory::Corrosive => rules::corrosive(ctx, p, entry, params),
        FieldCategory::Combustion => fire::burn(ctx, p, entry, params),
        FieldCategory::Gas => {
            if params.diffusion_percent > 0 {
                diffusion::spread_gas(ctx, p, entry, params);
            }
        }
        FieldCategory::Electrical => rules::electricity(ctx, p, entry, params),
        FieldCategory::CyclicVent { settle_one_in } => {
            rules::cyclic_vent(ctx, p, entry, params, settle_one_in);
        }
        FieldCategory::AcidVent => rules::acid_vent(ctx, p, entry, params),
        FieldCategory::ShockVent => rules::shock_vent(ctx, p, entry, params),
        FieldCategory::Fungal => rules::fungal_haze(ctx, p, entry, params),
        FieldCategory::Fungicidal => rules::fungicidal(ctx, p, entry, params),
        FieldCategory::Incendiary => rules::incendiary(ctx, p, entry, params),
        FieldCategory::Swarm => rules::swarm(ctx, p, entry, params),
    }
}

/// Type parameters that act regardless of category.
fn apply_side_effects(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    entry: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    if let Some(complaint) = &params.npc_complaint {
        if ctx.rng.one_in(to_chance(complaint.chance)) {
            ctx.world.creatures.complain(p, complaint);
        }
    }

    if let Some(rads) = params.radiation_yield {
        let amount = ctx.rng.range(rads.min, rads.max);
        if amount != 0 {
            ctx.world.terrain.adjust_radiation(p, amount);
        }
    }

    if let Some(wandering) = params.wandering_field {
        emit_wandering(ctx, p, entry, wandering);
    }

    if let Some(spawn) = &params.monster_spawn {
        if entry.intensity() >= spawn.min_intensity && ctx.rng.one_in(to_chance(spawn.chance)) {
            let spawned = ctx
                .world
                .creatures
                .spawn(&spawn.group, spawn.count, p, spawn.radius);
            debug!(?p, group = %spawn.group, spawned, "field spawned creatures");
        }
    }

    if let Some(upgrade) = params.intensity_upgrade {
        let interval = u64::try_from(upgrade.interval.as_turns()).unwrap_or(1).max(1);
        if entry.intensity() < params.max_intensity
            && ctx.tick % interval == 0
            && ctx.rng.one_in(to_chance(upgrade.chance))
        {
            entry.mod_intensity(1);
        }
    }
}

/// Raise or create the wandering field around an emitter.
fn emit_wandering(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    entry: &FieldEntry,
    wandering: FieldTypeId,
) {
    if wandering == entry.type_id() {
        return;
    }
    let intensity = entry.intensity();
    let cap = ctx
        .registry
        .get(wandering)
        .map_or(intensity, |params| params.max_intensity.min(intensity));
    for pnt in points_in_radius(p, intensity - 1) {
        match ctx.map.find_mut(pnt, wandering) {
            Some(existing) => {
                if existing.intensity() < cap {
                    existing.mod_intensity(1);
                }
            }
            None => {
                ctx.map.add_field(pnt, wandering, intensity, TimeDuration::ZERO);
            }
        }
    }
}

pub(crate) fn to_chance(chance: u32) -> i32 {
    i32::try_from(chance).unwrap_or(i32::MAX)
}
