//! Local wind and the tiles it shields from spreading.

use std::collections::HashMap;

use miasma::{Tripoint, EIGHT_NEIGHBORS};

use crate::world::{Terrain, Weather};

/// Wind power below which spreading ignores direction.
pub const CALM_WIND_POWER: i32 = 5;

/// Wind as felt on one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalWind {
    /// Effective power; zero on sheltered tiles.
    pub power: i32,
    /// Bearing the wind blows from, in degrees.
    pub direction: i32,
    /// Whether the tile is sheltered.
    pub sheltered: bool,
}

impl LocalWind {
    /// Whether spreading against the wind should be suppressed.
    #[must_use]
    pub fn filters_upwind(&self) -> bool {
        !self.sheltered && self.power >= CALM_WIND_POWER
    }
}

/// The three neighbours of `p` facing into the wind.
///
/// `direction` is the bearing the wind blows from, 0 = north (negative y),
/// increasing clockwise.
#[must_use]
pub fn upwind_tiles(direction: i32, p: Tripoint) -> [Tripoint; 3] {
    let radians = f64::from(direction.rem_euclid(360)).to_radians();
    let round = |v: f64| {
        if v > 0.5 {
            1
        } else if v < -0.5 {
            -1
        } else {
            0
        }
    };
    let dx = round(radians.sin());
    let dy = round(-radians.cos());
    let upwind = Tripoint::new(p.x + dx, p.y + dy, p.z);

    if dx == 0 {
        [upwind, upwind + Tripoint::X, upwind - Tripoint::X]
    } else if dy == 0 {
        [upwind, upwind + Tripoint::Y, upwind - Tripoint::Y]
    } else {
        [
            upwind,
            Tripoint::new(p.x + dx, p.y, p.z),
            Tripoint::new(p.x, p.y + dy, p.z),
        ]
    }
}

/// The eight horizontal neighbours, starting at a given rotation.
#[must_use]
pub fn rotated_neighbors(p: Tripoint, start: usize) -> [Tripoint; 8] {
    std::array::from_fn(|i| p + EIGHT_NEIGHBORS[(start + i) % EIGHT_NEIGHBORS.len()])
}

/// Per-tick memo of local wind samples.
///
/// Created empty for each tick, so weather changes between ticks are seen.
#[derive(Debug, Default)]
pub struct WindCache {
    samples: HashMap<Tripoint, LocalWind>,
}

impl WindCache {
    /// Wind on a tile, sampled once per tick.
    pub fn sample(&mut self, p: Tripoint, terrain: &dyn Terrain, weather: &dyn Weather) -> LocalWind {
        *self.samples.entry(p).or_insert_with(|| {
            let sheltered = terrain.is_sheltered(p);
            let wind = weather.wind_at(p);
            LocalWind {
                power: if sheltered { 0 } else { wind.speed.max(0) },
                direction: wind.direction,
                sheltered,
            }
        })
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of cached samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing was sampled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_north_wind_blocks_north_row() {
        let p = Tripoint::new(5, 5, 0);
        let mut tiles = upwind_tiles(0, p).to_vec();
        tiles.sort_by_key(|t| (t.x, t.y));
        assert_eq!(
            tiles,
            vec![
                Tripoint::new(4, 4, 0),
                Tripoint::new(5, 4, 0),
                Tripoint::new(6, 4, 0)
            ]
        );
    }

    #[test]
    fn test_east_wind_blocks_east_column() {
        let p = Tripoint::new(5, 5, 0);
        for t in upwind_tiles(90, p) {
            assert_eq!(t.x, 6);
        }
    }

    #[test]
    fn test_diagonal_wind() {
        let p = Tripoint::new(5, 5, 0);
        let tiles = upwind_tiles(45, p);
        assert!(tiles.contains(&Tripoint::new(6, 4, 0)));
        assert!(tiles.contains(&Tripoint::new(6, 5, 0)));
        assert!(tiles.contains(&Tripoint::new(5, 4, 0)));
    }

    #[test]
    fn test_negative_bearing_wraps() {
        let p = Tripoint::ZERO;
        assert_eq!(upwind_tiles(-90, p), upwind_tiles(270, p));
    }

    #[test]
    fn test_rotated_neighbors_cover_all() {
        let p = Tripoint::new(2, 2, 0);
        let mut a = rotated_neighbors(p, 3).to_vec();
        let mut b = rotated_neighbors(p, 0).to_vec();
        a.sort_by_key(|t| (t.x, t.y));
        b.sort_by_key(|t| (t.x, t.y));
        assert_eq!(a, b);
        assert!(!a.contains(&p));
    }

    #[test]
    fn test_calm_does_not_filter() {
        let calm = LocalWind {
            power: 4,
            direction: 0,
            sheltered: false,
        };
        let gale = LocalWind { power: 40, ..calm };
        let shelter = LocalWind {
            sheltered: true,
            ..gale
        };
        assert!(!calm.filters_upwind());
        assert!(gale.filters_upwind());
        assert!(!shelter.filters_upwind());
    }
}
