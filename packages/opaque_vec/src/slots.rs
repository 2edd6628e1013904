use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::num::NonZero;
use std::ops::Range;
use std::ptr::{self, NonNull};
use std::slice;

use tracing::debug;

use crate::{Error, Result};

/// A fixed number of equally sized memory slots in one contiguous, zero-initialized allocation.
///
/// Slot `n` occupies the bytes `n * slot_size .. (n + 1) * slot_size` of the allocation. The block
/// does not track which slots are in use - that is up to the owner - it only hands out byte views
/// of slot ranges and moves or resets slot contents.
///
/// Every byte of the block is initialized at all times (the allocation is zeroed up front), so any
/// slot range may be viewed as a byte slice.
#[derive(Debug)]
pub(crate) struct SlotBlock {
    /// Start of the allocation.
    ptr: NonNull<u8>,

    /// Number of bytes in each slot.
    slot_size: NonZero<usize>,

    /// Number of slots in the block.
    slot_count: NonZero<usize>,

    /// The layout the allocation was made with, required again to deallocate it.
    layout: Layout,
}

impl SlotBlock {
    /// Allocates a block of `slot_count` zeroed slots of `slot_size` bytes each.
    ///
    /// Returns [`Error::AllocationFailure`] if the total size cannot be represented as a
    /// [`Layout`] or if the allocator cannot satisfy the request. Nothing is leaked on failure.
    pub(crate) fn allocate(slot_size: NonZero<usize>, slot_count: NonZero<usize>) -> Result<Self> {
        let allocation_failure = |reason: &str| {
            debug!(
                slot_size = slot_size.get(),
                slot_count = slot_count.get(),
                reason,
                "slot block allocation failed"
            );

            Error::AllocationFailure {
                slot_count: slot_count.get(),
                element_size: slot_size.get(),
            }
        };

        let layout = slot_size
            .get()
            .checked_mul(slot_count.get())
            .and_then(|total_size| Layout::from_size_align(total_size, 1).ok())
            .ok_or_else(|| allocation_failure("size exceeds address space"))?;

        // SAFETY: The layout has a non-zero size because it is the product of two non-zero values.
        let ptr = unsafe { alloc_zeroed(layout) };

        let ptr = NonNull::new(ptr).ok_or_else(|| allocation_failure("allocator returned null"))?;

        Ok(Self {
            ptr,
            slot_size,
            slot_count,
            layout,
        })
    }

    /// Number of slots in the block.
    #[must_use]
    pub(crate) fn slot_count(&self) -> NonZero<usize> {
        self.slot_count
    }

    /// Number of bytes in each slot.
    #[must_use]
    pub(crate) fn slot_size(&self) -> NonZero<usize> {
        self.slot_size
    }

    /// Translates a range of slots into the range of bytes they occupy.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or extends past the end of the block.
    fn byte_range(&self, slots: &Range<usize>) -> Range<usize> {
        assert!(
            slots.start <= slots.end && slots.end <= self.slot_count.get(),
            "slot range {slots:?} out of bounds in block of {} slots",
            self.slot_count.get()
        );

        // Cannot overflow because the bounds check above ensures the result does not exceed the
        // size of the allocation, which was itself computed with a checked multiplication.
        let start = slots.start.wrapping_mul(self.slot_size.get());
        let end = slots.end.wrapping_mul(self.slot_size.get());

        start..end
    }

    /// Returns the bytes of a range of slots.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or extends past the end of the block.
    #[must_use]
    pub(crate) fn slots(&self, slots: Range<usize>) -> &[u8] {
        let bytes = self.byte_range(&slots);

        // SAFETY: The byte range was bounds-checked against the allocation by byte_range().
        let start = unsafe { self.ptr.add(bytes.start) };

        // SAFETY: The memory is a single live allocation owned by us, every byte is initialized
        // (zeroed at allocation time) and the shared borrow of self prevents concurrent mutation.
        unsafe { slice::from_raw_parts(start.as_ptr(), bytes.len()) }
    }

    /// Returns the bytes of a range of slots for mutation.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or extends past the end of the block.
    #[must_use]
    pub(crate) fn slots_mut(&mut self, slots: Range<usize>) -> &mut [u8] {
        let bytes = self.byte_range(&slots);

        // SAFETY: The byte range was bounds-checked against the allocation by byte_range().
        let start = unsafe { self.ptr.add(bytes.start) };

        // SAFETY: The memory is a single live allocation owned by us, every byte is initialized
        // and the exclusive borrow of self guarantees no other reference to it exists.
        unsafe { slice::from_raw_parts_mut(start.as_ptr(), bytes.len()) }
    }

    /// Returns the bytes of a single slot.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) fn slot(&self, index: usize) -> &[u8] {
        // Cannot overflow because the slot index would have to exceed virtual memory.
        self.slots(index..index.wrapping_add(1))
    }

    /// Returns the bytes of a single slot for mutation.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut [u8] {
        // Cannot overflow because the slot index would have to exceed virtual memory.
        self.slots_mut(index..index.wrapping_add(1))
    }

    /// Copies the contents of the slots in `source` to the slots starting at `destination`.
    ///
    /// The ranges may overlap.
    ///
    /// # Panics
    ///
    /// Panics if either range extends past the end of the block.
    pub(crate) fn copy_within(&mut self, source: Range<usize>, destination: usize) {
        let source_bytes = self.byte_range(&source);

        // Cannot overflow because we checked the source range fits in the block and the
        // destination range is checked against the block just below.
        let destination_end = destination.wrapping_add(source.len());
        let destination_bytes = self.byte_range(&(destination..destination_end));

        // SAFETY: Both source and destination were bounds-checked by byte_range().
        let source_ptr = unsafe { self.ptr.add(source_bytes.start) };

        // SAFETY: Both source and destination were bounds-checked by byte_range().
        let destination_ptr = unsafe { self.ptr.add(destination_bytes.start) };

        // SAFETY: Both pointers are within our allocation with room for source_bytes.len() bytes
        // and ptr::copy is valid for overlapping regions.
        unsafe {
            ptr::copy(
                source_ptr.as_ptr(),
                destination_ptr.as_ptr(),
                source_bytes.len(),
            );
        }
    }

    /// Copies the contents of the first `count` slots of `other` into the first `count` slots
    /// of this block.
    ///
    /// # Panics
    ///
    /// Panics if the slot sizes differ or if either block has fewer than `count` slots.
    pub(crate) fn copy_prefix_from(&mut self, other: &Self, count: usize) {
        assert_eq!(
            self.slot_size, other.slot_size,
            "cannot copy slots between blocks with different slot sizes"
        );

        self.slots_mut(0..count).copy_from_slice(other.slots(0..count));
    }

    /// Resets every byte of the slots in the range to zero.
    ///
    /// # Panics
    ///
    /// Panics if the range is reversed or extends past the end of the block.
    pub(crate) fn zero(&mut self, slots: Range<usize>) {
        self.slots_mut(slots).fill(0);
    }
}

impl Drop for SlotBlock {
    fn drop(&mut self) {
        // SAFETY: We allocated this memory in allocate() with exactly this layout and it has not
        // been deallocated yet because dropping happens once.
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

// SAFETY: SlotBlock exclusively owns its allocation and hands out references to it only through
// &self/&mut self borrows, so moving it to another thread moves the ownership with it.
unsafe impl Send for SlotBlock {}

#[cfg(test)]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::integer_division,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(SlotBlock: Send, std::fmt::Debug);
    assert_not_impl_any!(SlotBlock: Sync);

    fn block_with_numbered_slots(slot_size: NonZero<usize>, slot_count: NonZero<usize>) -> SlotBlock {
        let mut block = SlotBlock::allocate(slot_size, slot_count).unwrap();

        for index in 0..slot_count.get() {
            block.slot_mut(index).fill(index as u8 + 1);
        }

        block
    }

    #[test]
    fn new_block_is_zeroed() {
        let block = SlotBlock::allocate(nz!(8), nz!(4)).unwrap();

        assert_eq!(block.slot_count().get(), 4);
        assert_eq!(block.slot_size().get(), 8);
        assert!(block.slots(0..4).iter().all(|&b| b == 0));
        assert_eq!(block.slots(0..4).len(), 32);
    }

    #[test]
    fn slots_are_independent() {
        let mut block = SlotBlock::allocate(nz!(3), nz!(3)).unwrap();

        block.slot_mut(1).copy_from_slice(&[1, 2, 3]);

        assert_eq!(block.slot(0), &[0, 0, 0]);
        assert_eq!(block.slot(1), &[1, 2, 3]);
        assert_eq!(block.slot(2), &[0, 0, 0]);
    }

    #[test]
    fn empty_range_is_empty_slice() {
        let block = SlotBlock::allocate(nz!(4), nz!(2)).unwrap();

        assert!(block.slots(2..2).is_empty());
    }

    #[test]
    #[should_panic]
    fn slot_out_of_bounds_panics() {
        let block = SlotBlock::allocate(nz!(4), nz!(2)).unwrap();

        _ = block.slot(2);
    }

    #[test]
    #[should_panic]
    #[allow(clippy::reversed_empty_ranges, reason = "testing reversed range rejection")]
    fn reversed_range_panics() {
        let block = SlotBlock::allocate(nz!(4), nz!(4)).unwrap();

        _ = block.slots(3..1);
    }

    #[test]
    fn copy_within_shifts_left() {
        let mut block = block_with_numbered_slots(nz!(2), nz!(5));

        block.copy_within(2..5, 1);

        assert_eq!(block.slots(0..5), &[1, 1, 3, 3, 4, 4, 5, 5, 5, 5]);
    }

    #[test]
    fn copy_within_shifts_right() {
        let mut block = block_with_numbered_slots(nz!(1), nz!(4));

        block.copy_within(0..3, 1);

        assert_eq!(block.slots(0..4), &[1, 1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn copy_within_past_end_panics() {
        let mut block = block_with_numbered_slots(nz!(1), nz!(4));

        block.copy_within(1..4, 2);
    }

    #[test]
    fn copy_prefix_from_copies_only_prefix() {
        let source = block_with_numbered_slots(nz!(2), nz!(3));
        let mut destination = SlotBlock::allocate(nz!(2), nz!(6)).unwrap();

        destination.copy_prefix_from(&source, 2);

        assert_eq!(
            destination.slots(0..6),
            &[1, 1, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    #[should_panic]
    fn copy_prefix_from_different_slot_size_panics() {
        let source = block_with_numbered_slots(nz!(2), nz!(3));
        let mut destination = SlotBlock::allocate(nz!(4), nz!(3)).unwrap();

        destination.copy_prefix_from(&source, 1);
    }

    #[test]
    fn zero_resets_only_range() {
        let mut block = block_with_numbered_slots(nz!(1), nz!(4));

        block.zero(1..3);

        assert_eq!(block.slots(0..4), &[1, 0, 0, 4]);
    }

    #[test]
    fn unrepresentable_size_is_allocation_failure() {
        let result = SlotBlock::allocate(nz!(16), NonZero::new(usize::MAX / 8).unwrap());

        assert_eq!(
            result.unwrap_err(),
            Error::AllocationFailure {
                slot_count: usize::MAX / 8,
                element_size: 16,
            }
        );
    }

    #[test]
    fn size_above_isize_max_is_allocation_failure() {
        let slot_count = NonZero::new(isize::MAX as usize / 2 + 1).unwrap();

        let result = SlotBlock::allocate(nz!(2), slot_count);

        assert!(matches!(result, Err(Error::AllocationFailure { .. })));
    }

    #[test]
    fn allocator_refusal_is_allocation_failure() {
        let slot_count = NonZero::new(usize::try_from(isize::MAX).unwrap() / 2).unwrap();

        let result = SlotBlock::allocate(nz!(1), slot_count);

        assert_eq!(
            result.unwrap_err(),
            Error::AllocationFailure {
                slot_count: slot_count.get(),
                element_size: 1,
            }
        );
    }

    #[test]
    fn move_to_other_thread() {
        let block = block_with_numbered_slots(nz!(4), nz!(2));

        let block = std::thread::spawn(move || block).join().unwrap();

        assert_eq!(block.slot(1), &[2, 2, 2, 2]);
    }
}
