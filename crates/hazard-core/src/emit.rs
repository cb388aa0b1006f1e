//! Placing a quantity of a field around a point.
//!
//! Used by hosts for explosions, gas grenades and monster emissions. The
//! quantity fills the nearest tiles first: every tile at one distance is
//! topped up to the intensity limit before the next ring is opened.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use miasma::{
    square_distance, FieldMap, FieldTypeId, TimeDuration, Tripoint, EIGHT_NEIGHBORS,
};

use crate::rng::SimRng;
use crate::world::{Terrain, TerrainFlags};

/// A recurring emission of a field from some source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    /// Field emitted.
    pub field: FieldTypeId,
    /// Total intensity units placed per emission.
    pub quantity: i32,
    /// Highest intensity any single tile is raised to.
    pub intensity: i32,
    /// Percent chance of emitting at all.
    pub chance: u32,
}

/// Spread `amount` units of a field outward from `center`.
///
/// Gases pass permeable tiles; anything else needs passable ones.
/// Returns the number of units actually placed. Tiles already at the limit
/// absorb a unit each without receiving anything, so the result can fall
/// short of `amount` even when the fill was not cut off by walls.
///
/// # Arguments
///
/// * `map` - Field map to fill
/// * `rng` - Random source; picks the order within each ring
/// * `terrain` - Terrain used for passability
/// * `center` - Where the emission starts
/// * `type_id` - Field to place
/// * `amount` - Units to place
/// * `max_intensity` - Per-tile limit for this emission
pub fn propagate_field(
    map: &mut FieldMap,
    rng: &mut SimRng,
    terrain: &dyn Terrain,
    center: Tripoint,
    type_id: FieldTypeId,
    amount: i32,
    max_intensity: i32,
) -> i32 {
    let Some(params) = map.registry().get(type_id) else {
        return 0;
    };
    let is_gas = params.is_gas;
    let max_intensity = max_intensity.min(params.max_intensity);
    if amount <= 0 || max_intensity <= 0 || !map.in_bounds(center) {
        return 0;
    }

    let mut remaining = amount;
    let mut placed = 0;
    let mut seq: u64 = 0;
    let mut open: BinaryHeap<Reverse<(i32, u64, [i32; 3])>> = BinaryHeap::new();
    let mut closed: HashSet<Tripoint> = HashSet::new();
    open.push(Reverse((0, seq, center.to_array())));
    closed.insert(center);

    while remaining > 0 {
        let Some(Reverse((dist, _, first))) = open.pop() else {
            break;
        };
        let mut front = vec![Tripoint::from_array(first)];
        while let Some(Reverse((next_dist, _, _))) = open.peek() {
            if *next_dist != dist {
                break;
            }
            if let Some(Reverse((_, _, pt))) = open.pop() {
                front.push(Tripoint::from_array(pt));
            }
        }

        let share = i32::try_from(front.len())
            .map_or(1, |len| (remaining / len).max(1));
        while remaining > 0 && !front.is_empty() {
            let idx = rng.index(front.len());
            let pt = front.swap_remove(idx);

            let current = map.intensity_at(pt, type_id);
            if current < max_intensity {
                let bonus = (max_intensity - current).min(share).min(remaining);
                map.add_field(pt, type_id, bonus, TimeDuration::ZERO);
                remaining -= bonus;
                placed += bonus;
            } else {
                // A saturated tile still soaks up a unit.
                remaining -= 1;
            }

            for offset in EIGHT_NEIGHBORS {
                let next = pt + offset;
                if !map.in_bounds(next) || !closed.insert(next) {
                    continue;
                }
                let blocked = !terrain.is_passable(next)
                    && (!is_gas || !terrain.has_flag(next, TerrainFlags::PERMEABLE));
                if blocked {
                    continue;
                }
                seq += 1;
                open.push(Reverse((square_distance(center, next), seq, next.to_array())));
            }
        }
    }

    debug!(?center, ?type_id, amount, placed, "field propagated");
    placed
}

/// Roll an emission and place it if it fires.
///
/// `multiplier` scales the quantity; fractional results are rounded at
/// random. Returns the units placed.
pub fn emit_field(
    map: &mut FieldMap,
    rng: &mut SimRng,
    terrain: &dyn Terrain,
    pos: Tripoint,
    emission: &Emission,
    multiplier: f32,
) -> i32 {
    if emission.quantity <= 0 || emission.intensity <= 0 {
        return 0;
    }
    let chance = f64::from(emission.chance.min(100));
    if !rng.x_in_y(chance, 100.0) {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let scaled = emission.quantity as f32 * multiplier.max(0.0);
    let quantity = if emission.intensity > 1 {
        rng.roll_remainder(scaled)
    } else {
        emission.quantity
    };
    propagate_field(
        map,
        rng,
        terrain,
        pos,
        emission.field,
        quantity,
        emission.intensity,
    )
}
