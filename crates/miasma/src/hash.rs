//! State hashing for determinism verification.
//!
//! Two maps that went through identical operations from the same seed must
//! hash identically. Only live entries contribute, so a map awaiting
//! compaction hashes the same as its compacted form.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::map::FieldMap;

/// Compute a deterministic hash of all live field entries.
///
/// Entries are visited in region order, then tile order, then slot order.
#[must_use]
pub fn hash_field_map(map: &FieldMap) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_into(map, &mut hasher);
    hasher.finish()
}

/// Feed the map state into an existing hasher.
pub fn hash_into<H: Hasher>(map: &FieldMap, hasher: &mut H) {
    let config = map.config();
    config.regions_x.hash(hasher);
    config.regions_y.hash(hasher);
    config.region_size.hash(hasher);
    config.min_z.hash(hasher);
    config.max_z.hash(hasher);

    for (p, entry) in map.live_entries() {
        p.x.hash(hasher);
        p.y.hash(hasher);
        p.z.hash(hasher);
        entry.type_id().hash(hasher);
        entry.intensity().hash(hasher);
        entry.age().hash(hasher);
    }
}
