//! The region-partitioned field map.
//!
//! The grid is split into square regions per z-level. Each region owns its
//! cells (allocated on first use) and a slot counter; the
//! [`ActivityIndex`] mirrors "counter > 0" so that sweeps can skip empty
//! regions entirely.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activity::ActivityIndex;
use crate::cell::{AddOutcome, FieldCell};
use crate::field::{FieldEntry, FieldTypeId};
use crate::registry::FieldTypeRegistry;
use crate::time::TimeDuration;
use crate::Tripoint;

// =============================================================================
// Configuration
// =============================================================================

/// Shape of a [`FieldMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Regions along x.
    pub regions_x: u32,
    /// Regions along y.
    pub regions_y: u32,
    /// Edge length of a region in tiles.
    pub region_size: u32,
    /// Lowest z-level.
    pub min_z: i32,
    /// Highest z-level.
    pub max_z: i32,
    /// Whether fields move between z-levels.
    pub zlevels: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            regions_x: 11,
            regions_y: 11,
            region_size: 12,
            min_z: -10,
            max_z: 10,
            zlevels: true,
        }
    }
}

impl MapConfig {
    /// Default config with a different horizontal size.
    #[must_use]
    pub fn with_size(regions_x: u32, regions_y: u32) -> Self {
        Self {
            regions_x,
            regions_y,
            ..Default::default()
        }
    }

    /// A single z-level (z = 0) without vertical movement.
    #[must_use]
    pub fn flat(regions_x: u32, regions_y: u32) -> Self {
        Self {
            regions_x,
            regions_y,
            min_z: 0,
            max_z: 0,
            zlevels: false,
            ..Default::default()
        }
    }

    /// Width in tiles.
    #[must_use]
    pub fn width(&self) -> i32 {
        to_i32(self.regions_x.saturating_mul(self.region_size))
    }

    /// Height in tiles.
    #[must_use]
    pub fn height(&self) -> i32 {
        to_i32(self.regions_y.saturating_mul(self.region_size))
    }

    /// Number of z-levels.
    #[must_use]
    pub fn depth(&self) -> i32 {
        self.max_z.saturating_sub(self.min_z).saturating_add(1)
    }

    /// Total number of regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions_x as usize * self.regions_y as usize * usize::try_from(self.depth()).unwrap_or(0)
    }

    fn normalized(mut self) -> Self {
        self.regions_x = self.regions_x.max(1);
        self.regions_y = self.regions_y.max(1);
        self.region_size = self.region_size.max(1);
        if self.max_z < self.min_z {
            warn!(min_z = self.min_z, max_z = self.max_z, "inverted z-range, collapsing to min_z");
            self.max_z = self.min_z;
        }
        self
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Coordinates of a region: tile coordinates divided by region size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionCoord {
    /// Region column.
    pub x: i32,
    /// Region row.
    pub y: i32,
    /// Z-level.
    pub z: i32,
}

impl RegionCoord {
    /// Construct from components.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Default)]
struct Region {
    /// Empty until the first field lands here.
    cells: Vec<FieldCell>,
    /// Slots (live or awaiting compaction) across all cells.
    slots: u32,
}

// =============================================================================
// FieldMap
// =============================================================================

/// Sparse per-tile field storage for the whole grid.
#[derive(Debug, Clone)]
pub struct FieldMap {
    config: MapConfig,
    registry: Arc<FieldTypeRegistry>,
    regions: Vec<Region>,
    activity: ActivityIndex,
    transparency_dirty: bool,
}

impl FieldMap {
    /// An empty map.
    #[must_use]
    pub fn new(config: MapConfig, registry: Arc<FieldTypeRegistry>) -> Self {
        let config = config.normalized();
        let count = config.region_count();
        Self {
            config,
            registry,
            regions: vec![Region::default(); count],
            activity: ActivityIndex::new(count),
            transparency_dirty: false,
        }
    }

    /// Map shape.
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// The field type catalogue.
    #[must_use]
    pub fn registry(&self) -> &Arc<FieldTypeRegistry> {
        &self.registry
    }

    /// Region activity bits.
    #[must_use]
    pub fn activity(&self) -> &ActivityIndex {
        &self.activity
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Whether a tile lies on the grid.
    #[must_use]
    pub fn in_bounds(&self, p: Tripoint) -> bool {
        p.x >= 0
            && p.y >= 0
            && p.x < self.config.width()
            && p.y < self.config.height()
            && p.z >= self.config.min_z
            && p.z <= self.config.max_z
    }

    /// Region containing a tile.
    #[must_use]
    pub fn region_of(&self, p: Tripoint) -> Option<RegionCoord> {
        if !self.in_bounds(p) {
            return None;
        }
        let size = to_i32(self.config.region_size);
        Some(RegionCoord::new(p.x / size, p.y / size, p.z))
    }

    /// Dense index of a region.
    #[must_use]
    pub fn region_index(&self, region: RegionCoord) -> Option<usize> {
        let rx = usize::try_from(region.x).ok()?;
        let ry = usize::try_from(region.y).ok()?;
        let rz = usize::try_from(region.z - self.config.min_z).ok()?;
        let (wx, wy) = (self.config.regions_x as usize, self.config.regions_y as usize);
        if rx >= wx || ry >= wy || region.z > self.config.max_z {
            return None;
        }
        Some((rz * wy + ry) * wx + rx)
    }

    /// Region coordinates of a dense index.
    #[must_use]
    pub fn region_coord(&self, index: usize) -> RegionCoord {
        let (wx, wy) = (self.config.regions_x as usize, self.config.regions_y as usize);
        let rx = index % wx;
        let ry = (index / wx) % wy;
        let rz = index / (wx * wy);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        RegionCoord::new(rx as i32, ry as i32, rz as i32 + self.config.min_z)
    }

    /// Tiles per region.
    #[must_use]
    pub fn region_area(&self) -> usize {
        let size = self.config.region_size as usize;
        size * size
    }

    /// Tile at a local offset inside a region.
    #[must_use]
    pub fn region_tile(&self, index: usize, local: usize) -> Tripoint {
        let coord = self.region_coord(index);
        let size = self.config.region_size as usize;
        let size_i = to_i32(self.config.region_size);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        Tripoint::new(
            coord.x * size_i + (local % size) as i32,
            coord.y * size_i + (local / size) as i32,
            coord.z,
        )
    }

    fn locate(&self, p: Tripoint) -> Option<(usize, usize)> {
        let region = self.region_index(self.region_of(p)?)?;
        let size = to_i32(self.config.region_size);
        let lx = usize::try_from(p.x % size).ok()?;
        let ly = usize::try_from(p.y % size).ok()?;
        Some((region, ly * self.config.region_size as usize + lx))
    }

    // =========================================================================
    // Activity
    // =========================================================================

    /// Whether a region holds any field slots.
    #[must_use]
    pub fn region_has_activity(&self, region: RegionCoord) -> bool {
        self.region_index(region)
            .is_some_and(|idx| self.activity.is_active(idx))
    }

    /// Slot counter of a region.
    #[must_use]
    pub fn region_slot_count(&self, index: usize) -> u32 {
        self.regions.get(index).map_or(0, |r| r.slots)
    }

    fn refresh_activity(&mut self, index: usize) {
        let slots = self.region_slot_count(index);
        self.activity.set(index, slots > 0);
    }

    /// Whether a change since the last call affected line of sight.
    ///
    /// Reading clears the flag.
    pub fn take_transparency_dirty(&mut self) -> bool {
        std::mem::take(&mut self.transparency_dirty)
    }

    /// Flag a line-of-sight relevant change.
    pub fn mark_transparency_dirty(&mut self) {
        self.transparency_dirty = true;
    }

    fn dirties(&self, type_id: FieldTypeId) -> bool {
        self.registry
            .get(type_id)
            .is_some_and(|params| params.dirties_transparency)
    }

    // =========================================================================
    // Cell access
    // =========================================================================

    /// The cell of a tile, if anything was ever placed in its region.
    #[must_use]
    pub fn cell(&self, p: Tripoint) -> Option<&FieldCell> {
        let (region, local) = self.locate(p)?;
        self.regions[region].cells.get(local)
    }

    /// Live entry of a type on a tile.
    #[must_use]
    pub fn find(&self, p: Tripoint, type_id: FieldTypeId) -> Option<&FieldEntry> {
        self.cell(p)?.find(type_id)
    }

    /// Mutable live entry of a type on a tile.
    ///
    /// Setting its intensity to zero marks it dead; the slot is reclaimed by
    /// the next [`FieldMap::compact`] or [`FieldMap::compact_tile`].
    pub fn find_mut(&mut self, p: Tripoint, type_id: FieldTypeId) -> Option<&mut FieldEntry> {
        let (region, local) = self.locate(p)?;
        self.regions[region].cells.get_mut(local)?.find_mut(type_id)
    }

    /// Intensity of a type on a tile, zero when absent.
    #[must_use]
    pub fn intensity_at(&self, p: Tripoint, type_id: FieldTypeId) -> i32 {
        self.find(p, type_id).map_or(0, FieldEntry::intensity)
    }

    /// Number of slots on a tile.
    #[must_use]
    pub fn slot_count(&self, p: Tripoint) -> usize {
        self.cell(p).map_or(0, FieldCell::slot_count)
    }

    /// Copy of a slot on a tile.
    #[must_use]
    pub fn slot(&self, p: Tripoint, index: usize) -> Option<FieldEntry> {
        self.cell(p)?.slot(index).copied()
    }

    /// Mutable slot on a tile.
    pub fn slot_mut(&mut self, p: Tripoint, index: usize) -> Option<&mut FieldEntry> {
        let (region, local) = self.locate(p)?;
        self.regions[region].cells.get_mut(local)?.slot_mut(index)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Add a field, merging into an existing entry of the same type.
    ///
    /// Off-grid tiles, unknown types and non-positive intensities are
    /// rejected without side effects.
    pub fn insert(
        &mut self,
        p: Tripoint,
        type_id: FieldTypeId,
        intensity: i32,
        age: TimeDuration,
    ) -> AddOutcome {
        let Some(params) = self.registry.get(type_id) else {
            warn!(?type_id, "add for unknown field type ignored");
            return AddOutcome::Rejected;
        };
        let (max_intensity, dirties) = (params.max_intensity, params.dirties_transparency);
        let Some((region, local)) = self.locate(p) else {
            debug!(?p, ?type_id, "add outside the grid ignored");
            return AddOutcome::Rejected;
        };

        let area = self.region_area();
        let region_data = &mut self.regions[region];
        if region_data.cells.is_empty() {
            region_data.cells = vec![FieldCell::new(); area];
        }
        let outcome = region_data.cells[local].add(type_id, intensity, age, max_intensity);
        if outcome == AddOutcome::Created {
            region_data.slots += 1;
            self.activity.set(region, true);
        }
        if dirties && outcome != AddOutcome::Rejected {
            self.transparency_dirty = true;
        }
        outcome
    }

    /// Add a field; `true` if a new entry appeared.
    pub fn add_field(
        &mut self,
        p: Tripoint,
        type_id: FieldTypeId,
        intensity: i32,
        age: TimeDuration,
    ) -> bool {
        self.insert(p, type_id, intensity, age).is_new()
    }

    /// Remove a type from a tile immediately; `true` if a live entry went away.
    ///
    /// Not for use during a sweep; rules kill entries instead.
    pub fn remove_field(&mut self, p: Tripoint, type_id: FieldTypeId) -> bool {
        let Some((region, local)) = self.locate(p) else {
            return false;
        };
        let Some(removed) = self.regions[region]
            .cells
            .get_mut(local)
            .and_then(|cell| cell.remove(type_id))
        else {
            return false;
        };
        self.regions[region].slots -= 1;
        self.refresh_activity(region);
        if self.dirties(type_id) {
            self.transparency_dirty = true;
        }
        removed.is_alive()
    }

    /// Remove everything from a tile, returning the number of slots dropped.
    pub fn clear_tile(&mut self, p: Tripoint) -> usize {
        let Some((region, local)) = self.locate(p) else {
            return 0;
        };
        let Some(cell) = self.regions[region].cells.get_mut(local) else {
            return 0;
        };
        let dirty = cell.iter().any(|e| {
            self.registry
                .get(e.type_id())
                .is_some_and(|params| params.dirties_transparency)
        });
        let removed = cell.clear();
        #[allow(clippy::cast_possible_truncation)]
        {
            self.regions[region].slots -= removed as u32;
        }
        self.refresh_activity(region);
        self.transparency_dirty |= dirty;
        removed
    }

    /// Reclaim dead slots on one tile and refresh its region's activity bit.
    ///
    /// For changes made outside a sweep, such as killing an entry through
    /// [`FieldMap::find_mut`]. Returns the number of slots reclaimed.
    pub fn compact_tile(&mut self, p: Tripoint) -> usize {
        let Some((region, local)) = self.locate(p) else {
            return 0;
        };
        let registry = &self.registry;
        let region_data = &mut self.regions[region];
        let Some(cell) = region_data.cells.get_mut(local) else {
            return 0;
        };
        let mut dirty = false;
        let removed = cell.compact(|entry| {
            dirty |= registry
                .get(entry.type_id())
                .is_some_and(|params| params.dirties_transparency);
        });
        if removed == 0 {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            region_data.slots -= removed as u32;
        }
        if region_data.slots == 0 {
            region_data.cells = Vec::new();
        }
        self.transparency_dirty |= dirty;
        self.refresh_activity(region);
        removed
    }

    /// Reclaim dead slots in every active region and refresh activity bits.
    ///
    /// Returns the number of slots reclaimed.
    pub fn compact(&mut self) -> usize {
        let active: Vec<usize> = self.activity.iter_active().collect();
        let mut total = 0;
        for index in active {
            let mut dirty = false;
            let registry = &self.registry;
            let region = &mut self.regions[index];
            let mut removed = 0;
            for cell in &mut region.cells {
                removed += cell.compact(|entry| {
                    dirty |= registry
                        .get(entry.type_id())
                        .is_some_and(|params| params.dirties_transparency);
                });
            }
            #[allow(clippy::cast_possible_truncation)]
            {
                region.slots -= removed as u32;
            }
            if region.slots == 0 {
                region.cells = Vec::new();
            }
            self.transparency_dirty |= dirty;
            self.refresh_activity(index);
            total += removed;
        }
        total
    }

    // =========================================================================
    // Persistence support
    // =========================================================================

    /// Replace the cell of a tile wholesale (e.g. from a save file).
    ///
    /// Returns `false` for off-grid tiles.
    pub fn restore_cell(&mut self, p: Tripoint, cell: FieldCell) -> bool {
        let Some((region, local)) = self.locate(p) else {
            return false;
        };
        let area = self.region_area();
        let region_data = &mut self.regions[region];
        if region_data.cells.is_empty() {
            if cell.is_empty() {
                return true;
            }
            region_data.cells = vec![FieldCell::new(); area];
        }
        let old = std::mem::replace(&mut region_data.cells[local], cell);
        #[allow(clippy::cast_possible_truncation)]
        {
            region_data.slots =
                region_data.slots + region_data.cells[local].slot_count() as u32 - old.slot_count() as u32;
        }
        self.transparency_dirty = true;
        self.refresh_activity(region);
        true
    }

    /// Recompute every region counter and activity bit from the cells.
    pub fn recount(&mut self) {
        self.regions.par_iter_mut().for_each(|region| {
            #[allow(clippy::cast_possible_truncation)]
            let slots = region.cells.iter().map(FieldCell::slot_count).sum::<usize>() as u32;
            region.slots = slots;
        });
        for index in 0..self.regions.len() {
            self.refresh_activity(index);
        }
    }

    /// Live entries in region order, then tile order, then slot order.
    pub fn live_entries(&self) -> impl Iterator<Item = (Tripoint, &FieldEntry)> + '_ {
        self.activity.iter_active().flat_map(move |index| {
            self.regions[index]
                .cells
                .iter()
                .enumerate()
                .flat_map(move |(local, cell)| {
                    let p = self.region_tile(index, local);
                    cell.iter().map(move |entry| (p, entry))
                })
        })
    }

    /// Total live entries on the map.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_entries().count()
    }
}
