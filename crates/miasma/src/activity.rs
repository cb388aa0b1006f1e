//! Region activity tracking.
//!
//! One bit per region: set while the region holds at least one field slot.
//! The tick sweep only visits regions whose bit is set.

use serde::{Deserialize, Serialize};

/// Bitset of active regions, indexed by dense region index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityIndex {
    bits: Vec<u64>,
    len: usize,
}

impl ActivityIndex {
    /// An index for `len` regions, all inactive.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Number of regions tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index tracks no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // === Bit helpers ===

    /// Set or clear the bit for a region. Out-of-range indices are ignored.
    #[inline]
    pub fn set(&mut self, idx: usize, active: bool) {
        if idx >= self.len {
            return;
        }
        let word = idx >> 6;
        let bit = 1u64 << (idx & 63);
        if active {
            self.bits[word] |= bit;
        } else {
            self.bits[word] &= !bit;
        }
    }

    /// Whether a region is active.
    #[inline]
    #[must_use]
    pub fn is_active(&self, idx: usize) -> bool {
        let word = idx >> 6;
        idx < self.len && self.bits[word] & (1u64 << (idx & 63)) != 0
    }

    /// Number of active regions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Deactivate every region.
    pub fn clear_all(&mut self) {
        self.bits.fill(0);
    }

    /// Active region indices in ascending order.
    pub fn iter_active(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                let mut rest = word;
                std::iter::from_fn(move || {
                    if rest == 0 {
                        return None;
                    }
                    let bit = rest.trailing_zeros() as usize;
                    rest &= rest - 1;
                    Some((word_idx << 6) | bit)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut index = ActivityIndex::new(130);
        index.set(0, true);
        index.set(64, true);
        index.set(129, true);
        assert!(index.is_active(64));
        assert_eq!(index.active_count(), 3);

        index.set(64, false);
        assert!(!index.is_active(64));
        assert_eq!(index.active_count(), 2);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut index = ActivityIndex::new(10);
        index.set(10, true);
        index.set(1000, true);
        assert!(!index.is_active(10));
        assert!(!index.is_active(1000));
        assert_eq!(index.active_count(), 0);
    }

    #[test]
    fn test_iter_active_ascending() {
        let mut index = ActivityIndex::new(200);
        for idx in [199, 3, 64, 65, 127] {
            index.set(idx, true);
        }
        let active: Vec<usize> = index.iter_active().collect();
        assert_eq!(active, vec![3, 64, 65, 127, 199]);
    }

    #[test]
    fn test_clear_all() {
        let mut index = ActivityIndex::new(70);
        index.set(5, true);
        index.set(69, true);
        index.clear_all();
        assert_eq!(index.iter_active().count(), 0);
    }
}
