//! Category rules other than fire and plain gas.

use tracing::trace;

use miasma::{
    points_in_radius, square_distance, ExposureKind, FieldCategory, FieldEntry, FieldTypeParams,
    TimeDuration, Tripoint, EIGHT_NEIGHBORS,
};

use crate::diffusion::spread_gas;
use crate::tick::{to_chance, RuleContext};
use crate::world::TerrainFlags;

// =============================================================================
// Acid
// =============================================================================

/// Acid seeps down through open floors and is diluted by water.
pub(crate) fn corrosive(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    if ctx.flags(p).contains(TerrainFlags::SWIMMABLE) {
        cur.mod_age(TimeDuration::minutes(2));
    }
    if !ctx.can_descend(p) {
        return;
    }
    let below = p - Tripoint::Z;
    if !ctx.world.terrain.valid_move(p, below) {
        return;
    }

    match ctx.map.find_mut(below, cur.type_id()) {
        Some(there) => {
            let sum = there.intensity() + cur.intensity();
            let merged = sum.min(params.max_intensity);
            there.set_intensity(merged);
            // Overflow becomes extra life.
            there.set_age(-TimeDuration::minutes(1) * i64::from(sum - merged));
        }
        None => {
            ctx.map
                .add_field(below, cur.type_id(), cur.intensity(), cur.age());
        }
    }
    cur.kill();
    trace!(?p, "acid seeped down");
}

// =============================================================================
// Electricity
// =============================================================================

/// Charge looks for ground: it spreads out of walls into open tiles, and
/// from open tiles into adjacent walls. Intensity is conserved while moving.
pub(crate) fn electricity(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    if ctx.rng.one_in(5) {
        return;
    }
    let cap = params.max_intensity;

    if !ctx.world.terrain.is_passable(p) {
        // Grounded: shed surplus into open neighbours.
        let mut tries = 0;
        while tries < 10 && cur.age() < TimeDuration::minutes(5) && cur.intensity() > 1 {
            let Some(offset) = ctx.rng.pick(&EIGHT_NEIGHBORS) else {
                break;
            };
            let dst = p + offset;
            if accepts_charge(ctx, dst, cur, cap) && ctx.world.terrain.is_passable(dst) {
                move_charge(ctx, cur, dst);
                tries = 0;
            } else {
                tries += 1;
            }
        }
        return;
    }

    let mut grounds: Vec<Tripoint> = EIGHT_NEIGHBORS
        .iter()
        .map(|&o| p + o)
        .filter(|&n| ctx.map.in_bounds(n) && !ctx.world.terrain.is_passable(n))
        .collect();

    if grounds.is_empty() {
        let Some(offset) = ctx.rng.pick(&EIGHT_NEIGHBORS) else {
            return;
        };
        let dst = p + offset;
        if cur.intensity() > 1
            && ctx.world.terrain.is_passable(dst)
            && accepts_charge(ctx, dst, cur, cap)
        {
            move_charge(ctx, cur, dst);
        }
        return;
    }

    while cur.intensity() > 1 && !grounds.is_empty() {
        let idx = ctx.rng.index(grounds.len());
        let dst = grounds[idx];
        if accepts_charge(ctx, dst, cur, cap) {
            move_charge(ctx, cur, dst);
        } else {
            grounds.swap_remove(idx);
        }
    }
}

fn accepts_charge(ctx: &RuleContext<'_, '_>, dst: Tripoint, cur: &FieldEntry, cap: i32) -> bool {
    ctx.map.in_bounds(dst) && ctx.map.intensity_at(dst, cur.type_id()) < cap
}

fn move_charge(ctx: &mut RuleContext<'_, '_>, cur: &mut FieldEntry, dst: Tripoint) {
    ctx.map
        .add_field(dst, cur.type_id(), 1, cur.age() + TimeDuration::TURN);
    cur.mod_intensity(-1);
}

// =============================================================================
// Vents
// =============================================================================

/// A vent that burns down, then turns into its companion field.
pub(crate) fn cyclic_vent(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
    settle_one_in: u32,
) {
    if cur.intensity() > 1 {
        if ctx.rng.one_in(to_chance(settle_one_in)) {
            cur.mod_intensity(-1);
        }
        ctx.create_hot_air(p, cur.intensity());
        return;
    }

    if let Some(companion) = params.companion_field {
        let registry = ctx.registry;
        let intensity = registry
            .get(companion)
            .map_or(miasma::DEFAULT_MAX_INTENSITY, |c| c.max_intensity);
        ctx.map.add_field(p, companion, intensity, TimeDuration::ZERO);
        trace!(?p, from = %params.name, "vent cycled");
    }
    cur.kill();
}

/// Pulses acid around itself when spent.
pub(crate) fn acid_vent(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    if cur.intensity() > 1 {
        if cur.age() >= TimeDuration::minutes(1) {
            cur.mod_intensity(-1);
            cur.set_age(TimeDuration::ZERO);
        }
        return;
    }

    cur.set_intensity(params.max_intensity);
    let acid = ctx.registry.known().acid;
    let cap = ctx
        .registry
        .get(acid)
        .map_or(miasma::DEFAULT_MAX_INTENSITY, |a| a.max_intensity);
    for t in points_in_radius(p, 5) {
        if ctx.map.find(t, acid).is_some() {
            continue;
        }
        let strength = 3 - square_distance(p, t) / 2 + i32::from(ctx.rng.one_in(3));
        let strength = strength.min(cap);
        if strength > 0 {
            ctx.map.add_field(t, acid, strength, TimeDuration::ZERO);
        }
    }
    trace!(?p, "acid vent erupted");
}

/// Throws lightning bolts when spent.
pub(crate) fn shock_vent(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    if cur.intensity() > 1 {
        if ctx.rng.one_in(5) {
            cur.mod_intensity(-1);
        }
        return;
    }

    cur.set_intensity(params.max_intensity);
    let electricity = ctx.registry.known().electricity;
    let bolts = ctx.rng.range(3, 6);
    for _ in 0..bolts {
        let Some(mut dir) = ctx.rng.pick(&EIGHT_NEIGHBORS) else {
            return;
        };
        let length = ctx.rng.range(4, 12);
        let mut bolt = p;
        for _ in 0..length {
            bolt += dir;
            let strength = ctx.rng.range(2, 3);
            ctx.map
                .add_field(bolt, electricity, strength, TimeDuration::ZERO);
            if ctx.rng.one_in(4) {
                if let Some(turn) = ctx.rng.pick(&EIGHT_NEIGHBORS) {
                    dir = turn;
                }
            }
        }
    }
    trace!(?p, bolts, "shock vent discharged");
}

// =============================================================================
// Gases with side effects
// =============================================================================

/// Spores drift and take root.
pub(crate) fn fungal_haze(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    spread_gas(ctx, p, cur, params);
    if ctx.rng.one_in(10 - 2 * cur.intensity()) {
        ctx.world.terrain.spread_fungus(p);
    }
}

/// Kills fungal growth it drifts over.
pub(crate) fn fungicidal(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    spread_gas(ctx, p, cur, params);
    if ctx.world.terrain.has_flag(p, TerrainFlags::FUNGUS)
        && ctx.rng.one_in(10 / cur.intensity().max(1))
    {
        ctx.world.terrain.kill_fungus(p);
    }
}

/// Sets flammable neighbours alight.
pub(crate) fn incendiary(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    let dst = p + ctx.rng.offset(1);
    if dst != p
        && (ctx.world.terrain.is_flammable(dst) || ctx.world.objects.has_flammable_items(dst))
    {
        let fire = ctx.registry.known().fire;
        ctx.map.add_field(dst, fire, 1, TimeDuration::ZERO);
    }
    spread_gas(ctx, p, cur, params);
    ctx.create_hot_air(p, cur.intensity());
}

/// A swarm disperses when anything hostile shares its tile.
pub(crate) fn swarm(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    let registry = ctx.registry;
    let driven_off = ctx.map.cell(p).is_some_and(|cell| {
        cell.iter().any(|other| {
            other.type_id() != cur.type_id()
                && registry.get(other.type_id()).is_some_and(|t| {
                    t.exposure != ExposureKind::None
                        && !matches!(t.category, FieldCategory::Residue | FieldCategory::Swarm)
                })
        })
    });
    if driven_off {
        cur.kill();
        trace!(?p, "swarm dispersed");
    } else {
        spread_gas(ctx, p, cur, params);
    }
}
