//! The set of field entries on one tile.

use serde::{Deserialize, Serialize};

use crate::field::{FieldEntry, FieldTypeId};
use crate::time::TimeDuration;

/// Result of adding a field to a cell or map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was created.
    Created,
    /// A dead slot of the same type was brought back.
    Revived,
    /// Intensity was merged into an existing live entry.
    Merged,
    /// Nothing happened (off-grid tile, unknown type, or zero intensity).
    Rejected,
}

impl AddOutcome {
    /// Whether a field appeared where there was none.
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Self::Created | Self::Revived)
    }
}

/// All field entries on one tile, at most one per type.
///
/// Entries are kept in insertion order. Slots of dead entries remain until
/// [`FieldCell::compact`] runs, so indices handed out during a sweep stay
/// valid while new entries are appended behind them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCell {
    entries: Vec<FieldEntry>,
}

impl FieldCell {
    /// An empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The live entry of a type.
    #[must_use]
    pub fn find(&self, type_id: FieldTypeId) -> Option<&FieldEntry> {
        self.entries
            .iter()
            .find(|e| e.type_id() == type_id && e.is_alive())
    }

    /// Mutable access to the live entry of a type.
    pub fn find_mut(&mut self, type_id: FieldTypeId) -> Option<&mut FieldEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.type_id() == type_id && e.is_alive())
    }

    /// Add `intensity` of a type, merging into an existing entry.
    ///
    /// Merging raises intensity up to `max_intensity` and leaves the existing
    /// age alone, so a fuelled fire keeps its fuel. A dead slot of the same
    /// type is revived as if new.
    pub fn add(
        &mut self,
        type_id: FieldTypeId,
        intensity: i32,
        age: TimeDuration,
        max_intensity: i32,
    ) -> AddOutcome {
        if intensity <= 0 {
            return AddOutcome::Rejected;
        }
        match self.entries.iter_mut().find(|e| e.type_id() == type_id) {
            Some(existing) if existing.is_alive() => {
                let merged = existing.intensity().saturating_add(intensity).min(max_intensity);
                existing.set_intensity(merged.max(1));
                AddOutcome::Merged
            }
            Some(dead) => {
                dead.revive(intensity.min(max_intensity), age);
                AddOutcome::Revived
            }
            None => {
                self.entries
                    .push(FieldEntry::new(type_id, intensity.min(max_intensity), age));
                AddOutcome::Created
            }
        }
    }

    /// Remove the slot of a type outright, returning it.
    pub fn remove(&mut self, type_id: FieldTypeId) -> Option<FieldEntry> {
        let index = self.entries.iter().position(|e| e.type_id() == type_id)?;
        Some(self.entries.remove(index))
    }

    /// Remove every slot, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Drop dead slots, calling `on_removed` for each one.
    pub fn compact(&mut self, mut on_removed: impl FnMut(&FieldEntry)) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            if e.is_alive() {
                true
            } else {
                on_removed(e);
                false
            }
        });
        before - self.entries.len()
    }

    /// Live entries.
    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter().filter(|e| e.is_alive())
    }

    /// Number of live entries.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of slots, dead ones included.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cell holds no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slot by index, dead or alive.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&FieldEntry> {
        self.entries.get(index)
    }

    /// Mutable slot by index.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut FieldEntry> {
        self.entries.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SMOKE: FieldTypeId = FieldTypeId::new(1);
    const FIRE: FieldTypeId = FieldTypeId::new(2);

    #[test]
    fn test_add_creates_then_merges() {
        let mut cell = FieldCell::new();
        assert_eq!(cell.add(SMOKE, 1, TimeDuration::ZERO, 3), AddOutcome::Created);
        assert_eq!(cell.add(SMOKE, 1, TimeDuration::ZERO, 3), AddOutcome::Merged);
        assert_eq!(cell.find(SMOKE).unwrap().intensity(), 2);
        assert_eq!(cell.slot_count(), 1);
    }

    #[test]
    fn test_merge_caps_intensity() {
        let mut cell = FieldCell::new();
        cell.add(FIRE, 2, TimeDuration::ZERO, 3);
        cell.add(FIRE, 5, TimeDuration::ZERO, 3);
        assert_eq!(cell.find(FIRE).unwrap().intensity(), 3);
    }

    #[test]
    fn test_merge_keeps_existing_age() {
        let mut cell = FieldCell::new();
        cell.add(SMOKE, 1, TimeDuration::turns(5), 3);
        cell.add(SMOKE, 1, TimeDuration::turns(50), 3);
        assert_eq!(cell.find(SMOKE).unwrap().age(), TimeDuration::turns(5));
    }

    #[test]
    fn test_merge_keeps_fire_fuel() {
        let mut cell = FieldCell::new();
        cell.add(FIRE, 1, -TimeDuration::minutes(10), 3);
        assert_eq!(cell.add(FIRE, 1, TimeDuration::ZERO, 3), AddOutcome::Merged);
        let fire = cell.find(FIRE).unwrap();
        assert_eq!(fire.intensity(), 2);
        assert_eq!(fire.age(), -TimeDuration::minutes(10));
    }

    #[test]
    fn test_dead_slot_is_revived() {
        let mut cell = FieldCell::new();
        cell.add(FIRE, 2, TimeDuration::turns(30), 3);
        cell.find_mut(FIRE).unwrap().kill();
        assert!(cell.find(FIRE).is_none());
        assert_eq!(cell.add(FIRE, 1, TimeDuration::ZERO, 3), AddOutcome::Revived);
        let fire = cell.find(FIRE).unwrap();
        assert_eq!(fire.intensity(), 1);
        assert_eq!(fire.age(), TimeDuration::ZERO);
    }

    #[test]
    fn test_zero_intensity_rejected() {
        let mut cell = FieldCell::new();
        assert_eq!(cell.add(FIRE, 0, TimeDuration::ZERO, 3), AddOutcome::Rejected);
        assert!(cell.is_empty());
    }

    #[test]
    fn test_compact_removes_dead_only() {
        let mut cell = FieldCell::new();
        cell.add(FIRE, 1, TimeDuration::ZERO, 3);
        cell.add(SMOKE, 1, TimeDuration::ZERO, 3);
        cell.find_mut(FIRE).unwrap().kill();

        let mut removed = Vec::new();
        assert_eq!(cell.compact(|e| removed.push(e.type_id())), 1);
        assert_eq!(removed, vec![FIRE]);
        assert_eq!(cell.slot_count(), 1);
        assert_eq!(cell.live_count(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cell = FieldCell::new();
        cell.add(FIRE, 1, TimeDuration::ZERO, 3);
        cell.add(SMOKE, 2, TimeDuration::ZERO, 3);
        assert_eq!(cell.remove(FIRE).unwrap().intensity(), 1);
        assert!(cell.remove(FIRE).is_none());
        assert_eq!(cell.clear(), 1);
        assert!(cell.is_empty());
    }

    proptest! {
        #[test]
        fn test_at_most_one_entry_per_type(
            adds in prop::collection::vec((0u16..4, 1i32..5, 0i64..100), 0..40)
        ) {
            let mut cell = FieldCell::new();
            for (raw, intensity, age) in adds {
                cell.add(FieldTypeId::new(raw), intensity, TimeDuration::turns(age), 3);
            }
            let mut seen = std::collections::HashSet::new();
            for index in 0..cell.slot_count() {
                let entry = cell.slot(index).unwrap();
                prop_assert!(seen.insert(entry.type_id()));
                prop_assert!((1..=3).contains(&entry.intensity()));
            }
        }
    }
}
