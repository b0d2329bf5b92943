//! Sorted list of dirty byte ranges
//!
//! Overlapping and touching ranges are merged on insert, so writing the same
//! bytes twice never produces two entries. A single `(0, 0)` entry marks a
//! buffer that was cleared to zero size.

/// A coalescing set of `[start, start + size)` byte ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeList {
    ranges: Vec<(usize, usize)>,
}

impl RangeList {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Record `[start, start + size)` as dirty
    pub fn add(&mut self, start: usize, size: usize) {
        if size == 0 {
            if self.ranges.is_empty() {
                self.ranges.push((start, 0));
            }
            return;
        }

        // A previous zero-size marker is covered by any real range
        self.ranges.retain(|&(_, s)| s != 0);

        let mut new_start = start;
        let mut new_end = start + size;

        // First range that could touch the new one
        let first = self.ranges.partition_point(|&(s, len)| s + len < new_start);
        let mut last = first;
        while last < self.ranges.len() && self.ranges[last].0 <= new_end {
            let (s, len) = self.ranges[last];
            new_start = new_start.min(s);
            new_end = new_end.max(s + len);
            last += 1;
        }

        self.ranges
            .splice(first..last, core::iter::once((new_start, new_end - new_start)));
    }

    /// Number of disjoint ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Range `index` as `(start, size)`
    pub fn get(&self, index: usize) -> Option<(usize, usize)> {
        self.ranges.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranges.iter().copied()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesce_contained() {
        let mut list = RangeList::new();
        list.add(0, 100);
        list.add(10, 5);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0), Some((0, 100)));
    }

    #[test]
    fn test_same_range_twice() {
        let mut list = RangeList::new();
        list.add(20, 8);
        list.add(20, 8);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(0), Some((20, 8)));
    }

    #[test]
    fn test_disjoint_and_bridging() {
        let mut list = RangeList::new();
        list.add(0, 4);
        list.add(10, 4);
        list.add(30, 2);
        assert_eq!(list.len(), 3);

        // Touching merges, bridging collapses the middle
        list.add(4, 6);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![(0, 14), (30, 2)]);

        list.add(12, 20);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![(0, 32)]);
    }

    #[test]
    fn test_insert_before_existing() {
        let mut list = RangeList::new();
        list.add(50, 10);
        list.add(5, 5);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![(5, 5), (50, 10)]);
    }

    #[test]
    fn test_zero_size_marker() {
        let mut list = RangeList::new();
        list.add(0, 0);
        assert_eq!(list.get(0), Some((0, 0)));
        list.add(0, 0);
        assert_eq!(list.len(), 1);

        list.add(0, 16);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![(0, 16)]);

        list.clear();
        assert!(list.is_empty());
    }
}
