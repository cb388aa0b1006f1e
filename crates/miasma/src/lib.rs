//! # Miasma
//!
//! Sparse tile-grid field substrate for environmental hazard simulation.
//!
//! Miasma stores typed, time-evolving hazards ("fields": fire, smoke, acid,
//! webs, electricity...) on a 3D tile grid. It owns the data model only:
//!
//! - **Field type catalogue**: immutable per-type parameters, loaded from JSON
//! - **Field cells**: at most one entry per type on each tile, with merge rules
//! - **Region activity**: a bitset of regions that hold anything at all, so
//!   per-tick sweeps skip empty space
//! - **State hashing**: deterministic digests for replay checks
//!
//! The per-tick behaviour lives in `hazard-core`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use miasma::{FieldMap, FieldTypeRegistry, MapConfig, TimeDuration, Tripoint};
//!
//! let registry = Arc::new(FieldTypeRegistry::standard()?);
//! let fire = registry.known().fire;
//!
//! let mut map = FieldMap::new(MapConfig::default(), registry);
//! map.add_field(Tripoint::new(10, 10, 0), fire, 1, TimeDuration::ZERO);
//!
//! // A second add merges instead of duplicating.
//! map.add_field(Tripoint::new(10, 10, 0), fire, 1, TimeDuration::ZERO);
//! assert_eq!(map.intensity_at(Tripoint::new(10, 10, 0), fire), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod cell;
pub mod error;
pub mod field;
pub mod hash;
pub mod map;
pub mod registry;
pub mod time;

// Re-exports for convenience
pub use activity::ActivityIndex;
pub use cell::{AddOutcome, FieldCell};
pub use error::RegistryError;
pub use field::{
    ExposureKind, FieldCategory, FieldEntry, FieldTypeId, FieldTypeParams, IntensityUpgrade,
    MonsterSpawn, NpcComplaint, RadiationYield, DEFAULT_MAX_INTENSITY,
};
pub use hash::hash_field_map;
pub use map::{FieldMap, MapConfig, RegionCoord};
pub use registry::{FieldTypeDef, FieldTypeRegistry, KnownFields};
pub use time::TimeDuration;

/// A tile position: x, y and z-level.
pub type Tripoint = glam::IVec3;

/// Horizontal neighbour offsets, clockwise from north-west.
pub const EIGHT_NEIGHBORS: [glam::IVec3; 8] = [
    glam::IVec3::new(-1, -1, 0),
    glam::IVec3::new(0, -1, 0),
    glam::IVec3::new(1, -1, 0),
    glam::IVec3::new(1, 0, 0),
    glam::IVec3::new(1, 1, 0),
    glam::IVec3::new(0, 1, 0),
    glam::IVec3::new(-1, 1, 0),
    glam::IVec3::new(-1, 0, 0),
];

/// Chebyshev distance in the horizontal plane.
#[must_use]
pub fn square_distance(a: Tripoint, b: Tripoint) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Tiles within a horizontal square radius of `center`, row by row.
pub fn points_in_radius(center: Tripoint, radius: i32) -> impl Iterator<Item = Tripoint> {
    let radius = radius.max(0);
    (-radius..=radius).flat_map(move |dy| {
        (-radius..=radius).map(move |dx| Tripoint::new(center.x + dx, center.y + dy, center.z))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_distance() {
        assert_eq!(square_distance(Tripoint::ZERO, Tripoint::new(3, -5, 0)), 5);
        assert_eq!(square_distance(Tripoint::ZERO, Tripoint::new(1, 1, 0)), 1);
    }

    #[test]
    fn test_points_in_radius() {
        assert_eq!(points_in_radius(Tripoint::ZERO, 0).count(), 1);
        assert_eq!(points_in_radius(Tripoint::ZERO, 1).count(), 9);
        assert_eq!(points_in_radius(Tripoint::ZERO, 2).count(), 25);
        assert_eq!(points_in_radius(Tripoint::ZERO, -1).count(), 1);
    }

    #[test]
    fn test_neighbors_are_adjacent() {
        for offset in EIGHT_NEIGHBORS {
            assert_eq!(square_distance(Tripoint::ZERO, offset), 1);
            assert_eq!(offset.z, 0);
        }
    }
}
