//! Gas diffusion.
//!
//! A gas moves at most one intensity unit per tick, to exactly one
//! destination: down if it can, otherwise sideways, otherwise up. The unit
//! carries a proportional share of the source's age with it.

use tracing::trace;

use miasma::{FieldEntry, FieldTypeParams, TimeDuration, Tripoint};

use crate::tick::RuleContext;
use crate::wind::{rotated_neighbors, upwind_tiles};
use crate::world::TerrainFlags;

/// Spread chance in percent after wind damping.
///
/// Full-strength wind (100) halves the configured chance.
#[must_use]
pub fn effective_spread_percent(diffusion_percent: u32, wind_power: i32) -> i64 {
    let damping = i64::from(200 - wind_power.clamp(0, 100));
    i64::from(diffusion_percent.min(100)) * damping / 200
}

/// Run one diffusion step for a gas-like entry.
pub(crate) fn spread_gas(
    ctx: &mut RuleContext<'_, '_>,
    p: Tripoint,
    cur: &mut FieldEntry,
    params: &FieldTypeParams,
) {
    let wind = ctx.wind(p);

    if params.scent_neutralization > 0 {
        ctx.world
            .terrain
            .neutralize_scent(p, 1, params.scent_neutralization);
    }
    if ctx.world.terrain.is_outside(p) {
        cur.mod_age(params.outdoor_age_speedup);
    }

    if cur.intensity() <= 1 {
        return;
    }
    let percent = effective_spread_percent(params.diffusion_percent, wind.power);
    if i64::from(ctx.rng.range(1, 100)) > percent {
        return;
    }

    // Fall first.
    if ctx.can_descend(p) {
        let down = p - Tripoint::Z;
        if ctx.world.terrain.valid_move(p, down) && accepts(ctx, down, cur) {
            transfer(ctx, cur, down, params);
            return;
        }
    }

    let start = ctx.rng.index(8);
    let mut candidates: Vec<Tripoint> = rotated_neighbors(p, start)
        .into_iter()
        .filter(|&n| accepts(ctx, n, cur))
        .collect();
    if wind.filters_upwind() {
        let blocked = upwind_tiles(wind.direction, p);
        let odds = f64::from(wind.power.max(2));
        candidates.retain(|n| !blocked.contains(n) || ctx.rng.x_in_y(1.0, odds));
    }
    if let Some(dst) = ctx.rng.pick(&candidates) {
        transfer(ctx, cur, dst, params);
        return;
    }

    if ctx.can_ascend(p) {
        let up = p + Tripoint::Z;
        if ctx.world.terrain.valid_move(p, up) && accepts(ctx, up, cur) {
            transfer(ctx, cur, up, params);
        }
    }
}

/// Whether `dst` can take a unit of the gas in `cur`.
fn accepts(ctx: &RuleContext<'_, '_>, dst: Tripoint, cur: &FieldEntry) -> bool {
    if !ctx.map.in_bounds(dst) {
        return false;
    }
    let terrain = &*ctx.world.terrain;
    let open = terrain.is_passable(dst) || terrain.has_flag(dst, TerrainFlags::PERMEABLE);
    open && ctx
        .map
        .find(dst, cur.type_id())
        .map_or(true, |there| there.intensity() <= cur.intensity())
}

/// Move one unit and its share of age from `cur` to `dst`.
fn transfer(
    ctx: &mut RuleContext<'_, '_>,
    cur: &mut FieldEntry,
    dst: Tripoint,
    params: &FieldTypeParams,
) {
    let share: TimeDuration = cur.age() / i64::from(cur.intensity());
    match ctx.map.find_mut(dst, cur.type_id()) {
        Some(there) => {
            if there.intensity() < params.max_intensity {
                there.mod_intensity(1);
            }
            there.mod_age(share);
        }
        None => {
            ctx.map.add_field(dst, cur.type_id(), 1, share);
        }
    }
    cur.mod_intensity(-1);
    cur.mod_age(-share);
    trace!(?dst, field = %params.name, "gas spread");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calm_keeps_full_chance() {
        assert_eq!(effective_spread_percent(100, 0), 100);
        assert_eq!(effective_spread_percent(30, 0), 30);
    }

    #[test]
    fn test_wind_damps_chance() {
        assert!(effective_spread_percent(100, 50) < 100);
        assert_eq!(effective_spread_percent(100, 100), 50);
        assert_eq!(effective_spread_percent(100, 500), 50);
    }

    #[test]
    fn test_percent_above_hundred_is_capped() {
        assert_eq!(effective_spread_percent(250, 0), 100);
    }
}
