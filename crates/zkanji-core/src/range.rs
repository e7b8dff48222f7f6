//! Index ranges and the range-batching move algorithm.
//!
//! Lists of words, kanji, categories and tree rows are all reordered the same
//! way: a selection of positions is collapsed into ascending, non-touching
//! [`Range`]s, the items are taken out, and they are put back as one block in
//! front of a destination position. The destination is given in coordinates
//! of the list *before* removal, which is also how change notifications
//! describe it.
//!
//! ```
//! use zkanji_core::range::{move_ranges, ranges_from_positions};
//!
//! let mut list = vec!['a', 'b', 'c', 'd', 'e', 'f'];
//! let ranges = ranges_from_positions(&[4, 1, 2]);
//! let block = move_ranges(&mut list, &ranges, 0).unwrap();
//!
//! assert_eq!(list, vec!['b', 'c', 'e', 'a', 'd', 'f']);
//! assert_eq!((block.index, block.count), (0, 3));
//! ```

use crate::error::RangeError;

/// An inclusive span of positions, `first..=last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    /// First position in the span.
    pub first: usize,
    /// Last position in the span (inclusive).
    pub last: usize,
}

impl Range {
    /// Creates a range covering `first..=last`.
    #[inline]
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// A range holding exactly one position.
    #[inline]
    pub const fn single(pos: usize) -> Self {
        Self {
            first: pos,
            last: pos,
        }
    }

    /// Number of positions covered. Inverted ranges are empty.
    #[inline]
    pub fn len(&self) -> usize {
        if self.last < self.first {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// Returns `true` for an inverted range.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// Returns `true` if `pos` lies within the range.
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        self.first <= pos && pos <= self.last
    }

    /// The same span as a start/count pair.
    #[inline]
    pub fn to_interval(self) -> Interval {
        Interval::new(self.first, self.len())
    }
}

/// A span of positions given as a start and a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    /// First position.
    pub index: usize,
    /// Number of positions.
    pub count: usize,
}

impl Interval {
    /// Creates an interval starting at `index` spanning `count` positions.
    #[inline]
    pub const fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// One past the last position.
    #[inline]
    pub fn end(&self) -> usize {
        self.index + self.count
    }

    /// Returns `true` if the interval spans nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The same span as an inclusive range, or `None` when empty.
    pub fn to_range(self) -> Option<Range> {
        if self.count == 0 {
            None
        } else {
            Some(Range::new(self.index, self.index + self.count - 1))
        }
    }
}

/// Collapses arbitrary positions into maximal contiguous ranges.
///
/// The input may be unsorted and hold duplicates. The result is sorted,
/// non-overlapping and non-adjacent.
pub fn ranges_from_positions(positions: &[usize]) -> Vec<Range> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<Range> = Vec::new();
    for pos in sorted {
        match ranges.last_mut() {
            Some(last) if last.last + 1 == pos => last.last = pos,
            _ => ranges.push(Range::single(pos)),
        }
    }
    ranges
}

/// Checks that `ranges` are sorted, non-overlapping, non-adjacent and fit in
/// a list of `len` items.
pub fn validate_ranges(ranges: &[Range], len: usize) -> Result<(), RangeError> {
    let mut prev: Option<Range> = None;
    for &range in ranges {
        if range.is_empty() {
            return Err(RangeError::Inverted(range));
        }
        if range.last >= len {
            return Err(RangeError::OutOfBounds { range, len });
        }
        if let Some(prev) = prev {
            if range.first <= prev.last {
                return Err(RangeError::Unordered);
            }
            if range.first == prev.last + 1 {
                return Err(RangeError::Adjacent);
            }
        }
        prev = Some(range);
    }
    Ok(())
}

/// Total number of positions covered by `ranges`.
pub fn ranges_len(ranges: &[Range]) -> usize {
    ranges.iter().map(Range::len).sum()
}

/// Number of positions in `ranges` that come before `dest`.
///
/// This is how far `dest` shifts left once the ranges are removed.
pub fn moved_before(ranges: &[Range], dest: usize) -> usize {
    ranges
        .iter()
        .map(|r| {
            if r.last < dest {
                r.len()
            } else if r.first < dest {
                dest - r.first
            } else {
                0
            }
        })
        .sum()
}

/// Removes every position in `ranges` from `items` and returns the removed
/// items in their original order.
///
/// `ranges` must already satisfy [`validate_ranges`].
pub fn remove_ranges<T>(items: &mut Vec<T>, ranges: &[Range]) -> Vec<T> {
    let old = std::mem::take(items);
    let mut removed = Vec::with_capacity(ranges_len(ranges));
    items.reserve(old.len().saturating_sub(removed.capacity()));

    let mut cursor = ranges.iter().peekable();
    for (pos, item) in old.into_iter().enumerate() {
        while cursor.peek().is_some_and(|r| r.last < pos) {
            cursor.next();
        }
        if cursor.peek().is_some_and(|r| r.contains(pos)) {
            removed.push(item);
        } else {
            items.push(item);
        }
    }
    removed
}

/// Moves the items at `ranges` to a single block placed before the item that
/// was at `dest` (or at the end when `dest == items.len()`).
///
/// Returns where the block ended up. `dest` may not point at a moved item.
pub fn move_ranges<T>(
    items: &mut Vec<T>,
    ranges: &[Range],
    dest: usize,
) -> Result<Interval, RangeError> {
    let len = items.len();
    validate_ranges(ranges, len)?;
    if dest > len {
        return Err(RangeError::DestinationOutOfBounds { dest, len });
    }
    if ranges.iter().any(|r| r.contains(dest)) {
        return Err(RangeError::DestinationInside(dest));
    }

    let target = dest - moved_before(ranges, dest);
    let moved = remove_ranges(items, ranges);
    let count = moved.len();
    items.splice(target..target, moved);
    Ok(Interval::new(target, count))
}

/// Final position of a single item moved from `from` to `dest`, where `dest`
/// is given before removal.
///
/// Moving forward lands one slot earlier than requested, since the item's own
/// slot closes up first.
#[inline]
pub fn adjusted_destination(from: usize, dest: usize) -> usize {
    if dest > from {
        dest - 1
    } else {
        dest
    }
}
