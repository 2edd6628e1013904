use std::num::NonZero;
use std::ops::Range;

use new_zealand::nz;
use tracing::debug;

use crate::{Error, Result, SlotBlock};

/// Number of slots allocated when a container is created, unless configured otherwise.
pub const DEFAULT_INITIAL_CAPACITY: NonZero<usize> = nz!(4);

/// The growable storage engine shared by [`OpaqueList`][crate::OpaqueList] and
/// [`OpaqueStack`][crate::OpaqueStack].
///
/// Holds a capacity-managed [`SlotBlock`] of which the first `len` slots contain live elements.
/// Slots in `len..capacity` are always zeroed. The block is replaced by a larger one when an
/// append finds no free slot, doubling the capacity to keep appends amortized O(1).
///
/// Every operation either succeeds completely or returns an error without modifying the array.
#[derive(Debug)]
pub(crate) struct SlotArray {
    slots: SlotBlock,

    /// Number of live elements at the front of `slots`.
    len: usize,
}

impl SlotArray {
    /// Creates an empty array with room for `initial_capacity` elements of `element_size` bytes.
    pub(crate) fn new(element_size: usize, initial_capacity: NonZero<usize>) -> Result<Self> {
        let element_size = NonZero::new(element_size).ok_or(Error::ZeroElementSize)?;

        let slots = SlotBlock::allocate(element_size, initial_capacity)?;

        debug!(
            element_size = element_size.get(),
            capacity = initial_capacity.get(),
            "allocated slot array"
        );

        Ok(Self { slots, len: 0 })
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.slot_count().get()
    }

    #[must_use]
    pub(crate) fn element_size(&self) -> usize {
        self.slots.slot_size().get()
    }

    fn check_element_size(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() == self.element_size() {
            Ok(())
        } else {
            Err(Error::ElementSizeMismatch {
                expected: self.element_size(),
                actual: bytes.len(),
            })
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            })
        }
    }

    /// Index of the last live element, if any.
    fn last_index(&self) -> Option<usize> {
        self.len.checked_sub(1)
    }

    /// Copies `bytes` into a new element after the last live one, growing the storage first if
    /// every slot is in use.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_element_size(bytes)?;

        if self.len == self.capacity() {
            self.expand(self.capacity())?;
        }

        let index = self.len;
        self.slots.slot_mut(index).copy_from_slice(bytes);

        // Cannot overflow because len is bounded by capacity, which is bounded by virtual memory.
        self.len = self.len.wrapping_add(1);

        Ok(())
    }

    #[must_use]
    pub(crate) fn get(&self, index: usize) -> Option<&[u8]> {
        if index < self.len {
            Some(self.slots.slot(index))
        } else {
            None
        }
    }

    #[must_use]
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index < self.len {
            Some(self.slots.slot_mut(index))
        } else {
            None
        }
    }

    #[must_use]
    pub(crate) fn last(&self) -> Option<&[u8]> {
        self.last_index().map(|index| self.slots.slot(index))
    }

    /// The bytes of all live elements, back to back in index order.
    #[must_use]
    pub(crate) fn live_bytes(&self) -> &[u8] {
        self.slots.slots(0..self.len)
    }

    /// Grows the capacity by `extra_slots`.
    ///
    /// The live elements are copied into a newly allocated block, after which the old block is
    /// released. If the new block cannot be allocated, the array is left as it was.
    pub(crate) fn expand(&mut self, extra_slots: usize) -> Result<()> {
        if extra_slots == 0 {
            return Ok(());
        }

        let old_capacity = self.slots.slot_count();

        let Some(new_capacity) = old_capacity.checked_add(extra_slots) else {
            debug!(
                element_size = self.element_size(),
                old_capacity = old_capacity.get(),
                extra_slots,
                "slot array capacity overflow"
            );
            return Err(Error::AllocationFailure {
                slot_count: usize::MAX,
                element_size: self.element_size(),
            });
        };

        let mut new_slots = SlotBlock::allocate(self.slots.slot_size(), new_capacity)?;
        new_slots.copy_prefix_from(&self.slots, self.len);

        // The old block is released here, now that its live elements have been moved over.
        self.slots = new_slots;

        debug!(
            element_size = self.element_size(),
            old_capacity = old_capacity.get(),
            new_capacity = new_capacity.get(),
            "expanded slot array"
        );

        Ok(())
    }

    /// Overwrites the live element at `index` with `bytes`. Never extends the array.
    pub(crate) fn replace(&mut self, bytes: &[u8], index: usize) -> Result<()> {
        self.check_element_size(bytes)?;
        self.check_index(index)?;

        self.slots.slot_mut(index).copy_from_slice(bytes);

        Ok(())
    }

    /// Removes the live element at `index`, shifting every later element one slot towards
    /// the front.
    pub(crate) fn remove(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;

        // Cannot overflow because index < len, so len >= 1 and index + 1 <= len.
        let new_len = self.len.wrapping_sub(1);
        self.slots.copy_within(index.wrapping_add(1)..self.len, index);
        self.slots.zero(new_len..self.len);
        self.len = new_len;

        Ok(())
    }

    /// Removes the live elements in `range`, shifting every element at or after `range.end`
    /// towards the front to close the gap.
    ///
    /// The range must be non-empty and lie within the live elements.
    pub(crate) fn remove_range(&mut self, range: Range<usize>) -> Result<()> {
        if range.start >= self.len || range.end > self.len || range.start >= range.end {
            return Err(Error::InvalidRange {
                start: range.start,
                stop: range.end,
                len: self.len,
            });
        }

        // Cannot overflow because start < end <= len as validated above.
        let removed = range.end.wrapping_sub(range.start);
        let new_len = self.len.wrapping_sub(removed);

        self.slots.copy_within(range.end..self.len, range.start);
        self.slots.zero(new_len..self.len);
        self.len = new_len;

        Ok(())
    }

    /// Removes all live elements. The capacity is retained.
    pub(crate) fn clear(&mut self) {
        // Same outcome as remove_range(0..len) but without the range validation, which would
        // reject an already empty array.
        self.slots.zero(0..self.len);
        self.len = 0;
    }

    /// Removes the last live element. Returns `false` if the array was empty.
    pub(crate) fn remove_last(&mut self) -> bool {
        let Some(index) = self.last_index() else {
            return false;
        };

        self.slots.zero(index..self.len);
        self.len = index;

        true
    }

    /// Moves the last live element into a newly allocated buffer owned by the caller.
    ///
    /// Returns `Ok(None)` if the array is empty. If the buffer cannot be allocated, the array
    /// is left as it was.
    pub(crate) fn pop(&mut self) -> Result<Option<Box<[u8]>>> {
        let Some(top) = self.last() else {
            return Ok(None);
        };

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(top.len())
            .map_err(|_reserve_error| Error::AllocationFailure {
                slot_count: 1,
                element_size: top.len(),
            })?;
        buffer.extend_from_slice(top);

        self.remove_last();

        Ok(Some(buffer.into_boxed_slice()))
    }

    /// Copies the last live element into `buffer` and removes it from the array.
    ///
    /// Returns `Ok(false)` if the array is empty.
    pub(crate) fn pop_into(&mut self, buffer: &mut [u8]) -> Result<bool> {
        self.check_element_size(buffer)?;

        let Some(top) = self.last() else {
            return Ok(false);
        };

        buffer.copy_from_slice(top);
        self.remove_last();

        Ok(true)
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(test)]
    /// Verifies that the length is within capacity and that every vacant slot is zeroed.
    pub(crate) fn integrity_check(&self) {
        assert!(
            self.len <= self.capacity(),
            "len {} exceeds capacity {}",
            self.len,
            self.capacity()
        );

        assert!(
            self.slots
                .slots(self.len..self.capacity())
                .iter()
                .all(|&b| b == 0),
            "vacant slots {}..{} are not zeroed",
            self.len,
            self.capacity()
        );
    }
}

#[cfg(test)]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SlotArray: Send, std::fmt::Debug);
    assert_not_impl_any!(SlotArray: Sync);

    fn array_of_u32(values: &[u32]) -> SlotArray {
        let mut array = SlotArray::new(4, DEFAULT_INITIAL_CAPACITY).unwrap();

        for value in values {
            array.append(&value.to_ne_bytes()).unwrap();
        }

        array
    }

    fn contents_u32(array: &SlotArray) -> Vec<u32> {
        (0..array.len())
            .map(|index| u32::from_ne_bytes(array.get(index).unwrap().try_into().unwrap()))
            .collect()
    }

    #[test]
    fn new_array_is_empty_with_default_capacity() {
        let array = SlotArray::new(4, DEFAULT_INITIAL_CAPACITY).unwrap();

        assert_eq!(array.len(), 0);
        assert!(array.is_empty());
        assert_eq!(array.capacity(), DEFAULT_INITIAL_CAPACITY.get());
        assert_eq!(array.element_size(), 4);
        array.integrity_check();
    }

    #[test]
    fn zero_element_size_is_rejected() {
        let result = SlotArray::new(0, DEFAULT_INITIAL_CAPACITY);

        assert_eq!(result.unwrap_err(), Error::ZeroElementSize);
    }

    #[test]
    fn unrepresentable_initial_capacity_is_allocation_failure() {
        let result = SlotArray::new(8, NonZero::new(usize::MAX).unwrap());

        assert!(matches!(result, Err(Error::AllocationFailure { .. })));
    }

    #[test]
    fn append_then_get_round_trips() {
        let array = array_of_u32(&[10, 20, 30]);

        assert_eq!(contents_u32(&array), vec![10, 20, 30]);
        assert_eq!(array.get(3), None);
        array.integrity_check();
    }

    #[test]
    fn append_grows_by_doubling_only_when_full() {
        let mut array = array_of_u32(&[1, 2, 3, 4]);
        assert_eq!(array.capacity(), 4);

        array.append(&5_u32.to_ne_bytes()).unwrap();
        assert_eq!(array.capacity(), 8);

        for value in 6..=8_u32 {
            array.append(&value.to_ne_bytes()).unwrap();
        }
        assert_eq!(array.capacity(), 8);

        array.append(&9_u32.to_ne_bytes()).unwrap();
        assert_eq!(array.capacity(), 16);

        assert_eq!(contents_u32(&array), (1..=9).collect::<Vec<_>>());
        array.integrity_check();
    }

    #[test]
    fn append_with_wrong_size_is_rejected_without_growth() {
        let mut array = array_of_u32(&[1, 2, 3, 4]);

        let result = array.append(&[1, 2, 3]);

        assert_eq!(
            result,
            Err(Error::ElementSizeMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(array.len(), 4);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn expand_adds_exactly_requested_slots() {
        let mut array = array_of_u32(&[1, 2]);

        array.expand(3).unwrap();

        assert_eq!(array.capacity(), 7);
        assert_eq!(contents_u32(&array), vec![1, 2]);
        array.integrity_check();
    }

    #[test]
    fn expand_by_zero_does_nothing() {
        let mut array = array_of_u32(&[1]);

        array.expand(0).unwrap();

        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn failed_expand_leaves_array_untouched() {
        let mut array = array_of_u32(&[7, 8, 9]);

        let result = array.expand(usize::MAX / 2);

        assert!(matches!(result, Err(Error::AllocationFailure { .. })));
        assert_eq!(array.capacity(), 4);
        assert_eq!(contents_u32(&array), vec![7, 8, 9]);
        array.integrity_check();
    }

    #[test]
    fn allocator_refusal_leaves_array_usable() {
        // Small enough to form a valid layout, far too large for the allocator to satisfy.
        let mut array = SlotArray::new(1, DEFAULT_INITIAL_CAPACITY).unwrap();
        array.append(&[7]).unwrap();

        let huge = usize::try_from(isize::MAX).unwrap() / 2;
        let result = array.expand(huge);

        assert!(matches!(
            result,
            Err(Error::AllocationFailure {
                element_size: 1,
                ..
            })
        ));
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.live_bytes(), &[7]);
        array.integrity_check();

        array.append(&[8]).unwrap();
        assert_eq!(array.live_bytes(), &[7, 8]);
    }

    #[test]
    fn overflowing_expand_is_allocation_failure() {
        let mut array = array_of_u32(&[1]);

        let result = array.expand(usize::MAX);

        assert!(matches!(result, Err(Error::AllocationFailure { .. })));
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn replace_changes_only_target() {
        let mut array = array_of_u32(&[1, 2, 3]);

        array.replace(&99_u32.to_ne_bytes(), 1).unwrap();

        assert_eq!(contents_u32(&array), vec![1, 99, 3]);
    }

    #[test]
    fn replace_past_len_is_rejected() {
        let mut array = array_of_u32(&[1, 2, 3]);

        let result = array.replace(&99_u32.to_ne_bytes(), 3);

        assert_eq!(result, Err(Error::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn remove_shifts_later_elements() {
        let mut array = array_of_u32(&[5, 6, 7, 8]);

        array.remove(2).unwrap();

        assert_eq!(contents_u32(&array), vec![5, 6, 8]);
        array.integrity_check();
    }

    #[test]
    fn remove_first_and_last() {
        let mut array = array_of_u32(&[1, 2, 3, 4, 5]);

        array.remove(0).unwrap();
        assert_eq!(contents_u32(&array), vec![2, 3, 4, 5]);

        array.remove(3).unwrap();
        assert_eq!(contents_u32(&array), vec![2, 3, 4]);
        array.integrity_check();
    }

    #[test]
    fn remove_past_len_is_rejected() {
        let mut array = array_of_u32(&[1]);

        assert_eq!(
            array.remove(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn remove_range_in_middle() {
        let mut array = array_of_u32(&[0, 1, 2, 3, 4, 5, 6]);

        array.remove_range(2..5).unwrap();

        assert_eq!(contents_u32(&array), vec![0, 1, 5, 6]);
        array.integrity_check();
    }

    #[test]
    fn remove_range_ending_at_len_keeps_prefix() {
        let mut array = array_of_u32(&[0, 1, 2, 3, 4]);

        array.remove_range(3..5).unwrap();

        assert_eq!(contents_u32(&array), vec![0, 1, 2]);
        array.integrity_check();
    }

    #[test]
    fn remove_range_of_one_before_last_moves_last() {
        let mut array = array_of_u32(&[0, 1, 2, 3]);

        array.remove_range(2..3).unwrap();

        assert_eq!(contents_u32(&array), vec![0, 1, 3]);
        array.integrity_check();
    }

    #[test]
    fn remove_range_larger_than_tail() {
        let mut array = array_of_u32(&[0, 1, 2, 3, 4, 5]);

        array.remove_range(0..4).unwrap();

        assert_eq!(contents_u32(&array), vec![4, 5]);
        array.integrity_check();
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let mut array = array_of_u32(&[0, 1, 2]);

        for (start, stop) in [(3, 3), (1, 1), (2, 1), (0, 4), (3, 4)] {
            assert_eq!(
                array.remove_range(start..stop),
                Err(Error::InvalidRange { start, stop, len: 3 })
            );
        }

        assert_eq!(contents_u32(&array), vec![0, 1, 2]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut array = array_of_u32(&[1, 2, 3, 4, 5]);
        let capacity = array.capacity();

        array.clear();

        assert!(array.is_empty());
        assert_eq!(array.capacity(), capacity);
        array.integrity_check();
    }

    #[test]
    fn clear_empty_is_noop() {
        let mut array = array_of_u32(&[]);

        array.clear();

        assert!(array.is_empty());
    }

    #[test]
    fn remove_last_on_empty_returns_false() {
        let mut array = array_of_u32(&[]);

        assert!(!array.remove_last());
    }

    #[test]
    fn pop_returns_elements_in_reverse() {
        let mut array = array_of_u32(&[1, 2, 3]);

        for expected in [3_u32, 2, 1] {
            let popped = array.pop().unwrap().unwrap();
            assert_eq!(&*popped, &expected.to_ne_bytes());
        }

        assert_eq!(array.pop(), Ok(None));
        array.integrity_check();
    }

    #[test]
    fn pop_into_copies_and_removes() {
        let mut array = array_of_u32(&[1, 2]);
        let mut buffer = [0_u8; 4];

        assert_eq!(array.pop_into(&mut buffer), Ok(true));
        assert_eq!(u32::from_ne_bytes(buffer), 2);
        assert_eq!(array.len(), 1);

        assert_eq!(array.pop_into(&mut buffer), Ok(true));
        assert_eq!(array.pop_into(&mut buffer), Ok(false));
    }

    #[test]
    fn pop_into_wrong_size_is_rejected() {
        let mut array = array_of_u32(&[1]);
        let mut buffer = [0_u8; 2];

        assert_eq!(
            array.pop_into(&mut buffer),
            Err(Error::ElementSizeMismatch {
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(array.len(), 1);
    }

    #[test]
    fn live_bytes_covers_only_live_elements() {
        let mut array = SlotArray::new(2, DEFAULT_INITIAL_CAPACITY).unwrap();
        array.append(&[1, 2]).unwrap();
        array.append(&[3, 4]).unwrap();

        assert_eq!(array.live_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut array = array_of_u32(&[1, 2]);

        array.get_mut(0).unwrap().copy_from_slice(&42_u32.to_ne_bytes());

        assert_eq!(contents_u32(&array), vec![42, 2]);
        assert!(array.get_mut(2).is_none());
    }

    #[test]
    fn many_appends_survive_repeated_growth() {
        let values = (0..1000_u32).collect::<Vec<_>>();

        let array = array_of_u32(&values);

        assert_eq!(array.len(), 1000);
        assert_eq!(array.capacity(), 1024);
        assert_eq!(contents_u32(&array), values);
        array.integrity_check();
    }
}
