//! Fire.
//!
//! A fire feeds on the items and terrain of its tile, grows or starves
//! depending on fuel and neighbouring fires, spreads to flammable neighbours,
//! climbs and falls between levels, and gives off smoke and hot air.
//!
//! Fuel is tracked through age: burning fuel pushes age negative, which
//! both postpones half-life decay and lets the fire grow. A fire with
//! nothing to burn ages faster and dies out.

use tracing::trace;

use miasma::{FieldEntry, FieldTypeId, FieldTypeParams, TimeDuration, Tripoint};

use crate::tick::RuleContext;
use crate::wind::{rotated_neighbors, upwind_tiles};
use crate::world::{FireData, TerrainFlags};

/// Run one tick of a fire entry.
pub(crate) fn burn(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    let fire = cur.type_id();
    let known = *ctx.registry.known();
    let wind = ctx.wind(p);
    let flags = ctx.flags(p);

    let sealed = flags.contains(TerrainFlags::SEALED)
        && !flags.contains(TerrainFlags::ALLOW_FIELD_EFFECT);
    let contained = flags.contains(TerrainFlags::FIRE_CONTAINER);
    let can_spread = !contained;
    let in_pit = flags.contains(TerrainFlags::PIT);

    let mut smoke = 0;
    let mut time_added: i64 = 0;

    // Items.
    if !sealed {
        let mut state = FireData::new(cur.intensity(), contained);
        let max_consume = u32::try_from(cur.intensity() * 2).unwrap_or(0);
        let summary = ctx.world.objects.simulate_burn(p, &mut state, max_consume);
        smoke += ctx.rng.roll_remainder(summary.smoke);
        time_added += i64::from(ctx.rng.roll_remainder(summary.fuel));
        if summary.consumed > 0 {
            trace!(?p, consumed = summary.consumed, "fire consumed items");
        }
    }

    ctx.world.vehicles.heat_damage(p, cur.intensity() * 10);

    // Terrain.
    if can_spread {
        if flags.contains(TerrainFlags::SWIMMABLE) {
            cur.mod_age(TimeDuration::minutes(4));
        }
        let intensity = cur.intensity();
        let burns_easily = flags.intersects(TerrainFlags::FLAMMABLE | TerrainFlags::FLAMMABLE_ASH);
        let burns_hard = !burns_easily
            && flags.contains(TerrainFlags::FLAMMABLE_HARD)
            && ctx.rng.one_in(3);
        if burns_easily || burns_hard {
            let fuel = if burns_easily { 5 } else { 4 };
            time_added += i64::from(fuel - intensity);
            smoke += 2 + wind.power / 5;
            if ctx.rng.one_in(200 - intensity * 50) {
                ctx.world.terrain.burn_out(p);
                ctx.map.mark_transparency_dirty();
                trace!(?p, "terrain burnt out");
            }
        } else if flags.contains(TerrainFlags::NO_FLOOR) && ctx.can_descend(p) {
            let below = p - Tripoint::Z;
            if ctx.world.terrain.valid_move(p, below) {
                fall(ctx, cur, below, params);
                return;
            }
        }
    }

    if time_added != 0 {
        cur.mod_age(-TimeDuration::turns(time_added));
    } else if can_spread {
        cur.mod_age(TimeDuration::seconds(10) * i64::from(cur.intensity()));
    }

    let neighbors = rotated_neighbors(p, ctx.rng.index(8));
    let targets: Vec<Tripoint> = if wind.filters_upwind() {
        let blocked = upwind_tiles(wind.direction, p);
        let odds = f64::from(wind.power.max(2));
        neighbors
            .iter()
            .copied()
            .filter(|n| !blocked.contains(n) || ctx.rng.x_in_y(1.0, odds))
            .collect()
    } else {
        neighbors.to_vec()
    };

    let mut adjacent_fires = 0;
    if can_spread {
        if cur.intensity() > 1 && ctx.rng.one_in(3) {
            adjacent_fires = feed_neighbors(ctx, cur, &targets, in_pit);
        } else if cur.age().is_negative() && cur.intensity() < params.max_intensity {
            adjacent_fires = neighbors
                .iter()
                .filter(|&&n| ctx.map.find(n, fire).is_some())
                .count();
            let mut ceiling = if cur.age() < -TimeDuration::minutes(500) {
                3
            } else {
                1 + i32::from(adjacent_fires >= 3) + i32::from(adjacent_fires >= 7)
            };
            if ceiling < 2 && cur.age() < -TimeDuration::minutes(50) {
                ceiling = 2;
            }
            let ceiling = ceiling.min(params.max_intensity);
            if cur.intensity() < ceiling {
                let before = cur.intensity();
                cur.mod_intensity(1);
                cur.mod_age(TimeDuration::minutes(10) * i64::from(before));
            }
        }
    }

    // A raging fire climbs and burns through the floor.
    if cur.intensity() >= params.max_intensity {
        if ctx.can_ascend(p) {
            let above = p + Tripoint::Z;
            let over = ctx.flags(above);
            if over.contains(TerrainFlags::NO_FLOOR) || over.intersects(TerrainFlags::ANY_FLAMMABLE) {
                reinforce(ctx, above, fire);
            }
        }
        if ctx.can_descend(p) {
            let below = p - Tripoint::Z;
            if ctx
                .flags(below)
                .intersects(TerrainFlags::ANY_FLAMMABLE | TerrainFlags::NO_FLOOR)
            {
                reinforce(ctx, below, fire);
            }
        }
    }

    if can_spread {
        let spread_penalty = if wind.filters_upwind() { wind.power.min(99) } else { 0 };
        for &n in &targets {
            if ctx.rng.one_in(cur.intensity() * 2) || !ctx.map.in_bounds(n) {
                continue;
            }
            if ctx.map.find(n, fire).is_some() {
                continue;
            }
            let has_web = ctx.map.find(n, known.web).is_some();
            let mut chance = 25 * (cur.intensity() - 1);
            if has_web {
                chance = 50 + chance / 2;
            }
            let power = cur.intensity() + i32::from(ctx.rng.one_in(5));
            if ctx.rng.range(1, 100 - spread_penalty) >= chance {
                continue;
            }
            let there = ctx.flags(n);
            if there.contains(TerrainFlags::PIT) != in_pit {
                continue;
            }
            let ignites = (power >= 3 && cur.age().is_negative() && ctx.rng.one_in(20))
                || (power >= 2
                    && there.intersects(TerrainFlags::FLAMMABLE | TerrainFlags::FLAMMABLE_ASH)
                    && ctx.rng.one_in(2))
                || (power >= 3 && there.contains(TerrainFlags::FLAMMABLE_HARD) && ctx.rng.one_in(5))
                || has_web
                || (ctx.world.objects.has_flammable_items(n) && ctx.rng.one_in(5));
            if !ignites {
                continue;
            }
            ctx.map.add_field(n, fire, 1, TimeDuration::minutes(2));
            cur.mod_age(TimeDuration::minutes(1));
            if let Some(web) = ctx.map.find_mut(n, known.web) {
                web.kill();
            }
            trace!(?p, to = ?n, "fire spread");
        }
    }

    // Smoke.
    if !flags.contains(TerrainFlags::SUPPRESS_SMOKE)
        && ctx.rng.range(0, 100 - wind.power.min(100)) <= smoke
        && ctx.rng.range(3, 35) < cur.intensity() * 10
    {
        let above = p + Tripoint::Z;
        if ctx.can_ascend(p) && ctx.flags(above).contains(TerrainFlags::NO_FLOOR) {
            let amount = ctx.rng.range(1, cur.intensity());
            ctx.map.add_field(above, known.smoke, amount, TimeDuration::ZERO);
        } else {
            ctx.map.add_field(p, known.smoke, cur.intensity(), TimeDuration::ZERO);
        }
    }

    // Hot air, less of it amid other fires.
    if adjacent_fires < 5 {
        let spread = i32::try_from(adjacent_fires).unwrap_or(4);
        if ctx.rng.range(0, 4 - spread) != 0 {
            ctx.create_hot_air(p, cur.intensity());
        }
    }
}

/// Lend fuel to weaker neighbouring fires while this one has fuel to spare.
///
/// Returns the number of neighbouring fires seen.
fn feed_neighbors(
    ctx: &mut RuleContext<'_, '_>,
    cur: &mut FieldEntry,
    targets: &[Tripoint],
    in_pit: bool,
) -> usize {
    let fire = cur.type_id();
    let mut seen = 0;
    for &n in targets {
        if !cur.age().is_negative() {
            break;
        }
        let same_pit = ctx.flags(n).contains(TerrainFlags::PIT) == in_pit;
        let Some(other) = ctx.map.find_mut(n, fire) else {
            continue;
        };
        seen += 1;
        if !same_pit || (other.intensity() > cur.intensity() && other.age() <= cur.age()) {
            continue;
        }
        if other.intensity() < 2 {
            other.mod_intensity(1);
        }
        other.mod_age(-TimeDuration::minutes(5));
        cur.mod_age(TimeDuration::minutes(5));
    }
    seen
}

/// Strengthen the fire on a tile, or light one.
fn reinforce(ctx: &mut RuleContext<'_, '_>, p: Tripoint, fire: FieldTypeId) {
    match ctx.map.find_mut(p, fire) {
        Some(there) => there.mod_age(-TimeDuration::minutes(2)),
        None => {
            ctx.map.add_field(p, fire, 1, TimeDuration::ZERO);
        }
    }
}

/// Drop burning material through an open floor.
fn fall(
    ctx: &mut RuleContext<'_, '_>,
    cur: &mut FieldEntry,
    below: Tripoint,
    params: &FieldTypeParams,
) {
    let fire = cur.type_id();
    let Some(there) = ctx.map.find_mut(below, fire) else {
        ctx.map.add_field(below, fire, 1, TimeDuration::ZERO);
        cur.mod_intensity(-1);
        return;
    };
    let mut merged = cur.intensity().max(there.intensity());
    if cur.intensity() == there.intensity() && merged < params.max_intensity {
        merged += 1;
    }
    there.set_intensity(merged);
    if merged < params.max_intensity || ctx.rng.one_in(10) {
        cur.mod_intensity(-1);
    }
}
