use std::iter::FusedIterator;
use std::ops::Range;
use std::slice::ChunksExact;

use crate::{DEFAULT_INITIAL_CAPACITY, OpaqueListBuilder, Result, SlotArray};

/// A growable sequence of elements that all have the same byte size but no known type.
///
/// The element size is chosen when the list is created and every element is transferred in and
/// out of the list as a byte slice of exactly that size. The list copies bytes into its own
/// storage, so callers keep ownership of the buffers they pass in.
///
/// Elements are stored back to back in one contiguous allocation. When the list is full, the
/// next [`push()`](Self::push) doubles the capacity. Removing elements never releases capacity.
///
/// # Examples
///
/// ```
/// use opaque_vec::OpaqueList;
///
/// let mut list = OpaqueList::builder().element_size_of::<i32>().build()?;
///
/// for value in 5..9_i32 {
///     list.push(&value.to_ne_bytes())?;
/// }
///
/// // Removing an element shifts the later ones towards the front.
/// list.remove(2)?;
///
/// let first = i32::from_ne_bytes(list.get(0).unwrap().try_into().unwrap());
/// let third = i32::from_ne_bytes(list.get(2).unwrap().try_into().unwrap());
///
/// assert_eq!(first, 5);
/// assert_eq!(third, 8);
/// assert_eq!(list.len(), 3);
/// # Ok::<(), opaque_vec::Error>(())
/// ```
///
/// # Alignment
///
/// The list only guarantees byte alignment for its elements. To interpret element bytes as a
/// typed value, copy them out (e.g. with `from_ne_bytes()`) or use an unaligned read.
///
/// # Thread safety
///
/// The list is thread-mobile ([`Send`]) and can be moved between threads, but it is not
/// thread-safe ([`Sync`]) and cannot be shared between threads without additional synchronization.
#[derive(Debug)]
pub struct OpaqueList {
    storage: SlotArray,
}

impl OpaqueList {
    /// Creates a builder for configuring and constructing an [`OpaqueList`].
    ///
    /// You must specify an element size using either `.element_size()` or
    /// `.element_size_of::<T>()` before calling `.build()`.
    #[inline]
    pub fn builder() -> OpaqueListBuilder {
        OpaqueListBuilder::new()
    }

    /// Creates an empty list of `element_size`-byte elements with the
    /// [default initial capacity][DEFAULT_INITIAL_CAPACITY].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroElementSize`][crate::Error::ZeroElementSize] if `element_size` is
    /// zero and [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the initial
    /// capacity cannot be allocated.
    pub fn new(element_size: usize) -> Result<Self> {
        SlotArray::new(element_size, DEFAULT_INITIAL_CAPACITY).map(Self::from_storage)
    }

    pub(crate) fn from_storage(storage: SlotArray) -> Self {
        Self { storage }
    }

    /// The number of elements in the list.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the list has no elements.
    ///
    /// An empty list may still be holding unused capacity.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The number of elements the list can hold without allocating more memory.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The size in bytes of every element in the list.
    #[must_use]
    #[inline]
    pub fn element_size(&self) -> usize {
        self.storage.element_size()
    }

    /// Appends a copy of `element` to the end of the list.
    ///
    /// If the list is at capacity, the capacity is doubled first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementSizeMismatch`][crate::Error::ElementSizeMismatch] if `element` is
    /// not exactly [`element_size()`](Self::element_size) bytes long and
    /// [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the list needed to grow
    /// but could not. The list is unchanged in both cases.
    pub fn push(&mut self, element: &[u8]) -> Result<()> {
        self.storage.append(element)
    }

    /// Returns the bytes of the element at `index`, or `None` if `index` is not less than
    /// [`len()`](Self::len).
    #[must_use]
    #[inline]
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.storage.get(index)
    }

    /// Returns the bytes of the element at `index` for in-place modification, or `None` if
    /// `index` is not less than [`len()`](Self::len).
    #[must_use]
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.storage.get_mut(index)
    }

    /// Grows the capacity by exactly `extra_slots` elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the new storage
    /// cannot be allocated, in which case the list is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use opaque_vec::OpaqueList;
    ///
    /// let mut list = OpaqueList::new(8)?;
    /// let capacity = list.capacity();
    ///
    /// list.expand(100)?;
    /// assert_eq!(list.capacity(), capacity + 100);
    /// # Ok::<(), opaque_vec::Error>(())
    /// ```
    pub fn expand(&mut self, extra_slots: usize) -> Result<()> {
        self.storage.expand(extra_slots)
    }

    /// Overwrites the element at `index` with a copy of `element`.
    ///
    /// Replacing never extends the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`][crate::Error::IndexOutOfRange] if `index` is not less
    /// than [`len()`](Self::len) and
    /// [`Error::ElementSizeMismatch`][crate::Error::ElementSizeMismatch] if `element` has the
    /// wrong length.
    pub fn replace(&mut self, element: &[u8], index: usize) -> Result<()> {
        self.storage.replace(element, index)
    }

    /// Removes the element at `index`, shifting every later element one position towards the
    /// front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`][crate::Error::IndexOutOfRange] if `index` is not less
    /// than [`len()`](Self::len).
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.storage.remove(index)
    }

    /// Removes the elements in `range`, shifting every later element towards the front to close
    /// the gap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRange`][crate::Error::InvalidRange] unless the range is
    /// non-empty and lies within the list.
    ///
    /// # Examples
    ///
    /// ```
    /// use opaque_vec::OpaqueList;
    ///
    /// let mut list = OpaqueList::new(1)?;
    /// for value in 0..6_u8 {
    ///     list.push(&[value])?;
    /// }
    ///
    /// list.remove_range(1..4)?;
    /// assert_eq!(list.as_bytes(), &[0, 4, 5]);
    /// # Ok::<(), opaque_vec::Error>(())
    /// ```
    pub fn remove_range(&mut self, range: Range<usize>) -> Result<()> {
        self.storage.remove_range(range)
    }

    /// Removes all elements from the list. The capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// The bytes of all elements back to back in index order.
    #[must_use]
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.live_bytes()
    }

    /// Returns an iterator over the bytes of each element in index order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.as_bytes().chunks_exact(self.element_size()),
        }
    }
}

impl<'a> IntoIterator for &'a OpaqueList {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of an [`OpaqueList`], created by [`OpaqueList::iter()`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    inner: ChunksExact<'a, u8>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::Error;

    assert_impl_all!(OpaqueList: Send, std::fmt::Debug);
    assert_not_impl_any!(OpaqueList: Sync);
    assert_impl_all!(Iter<'static>: Send, Sync, Clone, ExactSizeIterator);

    fn list_of_i32(values: &[i32]) -> OpaqueList {
        let mut list = OpaqueList::builder().element_size_of::<i32>().build().unwrap();

        for value in values {
            list.push(&value.to_ne_bytes()).unwrap();
        }

        list
    }

    fn contents_i32(list: &OpaqueList) -> Vec<i32> {
        list.iter()
            .map(|bytes| i32::from_ne_bytes(bytes.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn smoke_test() {
        let mut list = list_of_i32(&[5, 6, 7, 8]);
        assert_eq!(list.len(), 4);

        list.remove(2).unwrap();

        assert_eq!(contents_i32(&list), vec![5, 6, 8]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0), Some(&5_i32.to_ne_bytes()[..]));
    }

    #[test]
    fn new_uses_default_capacity() {
        let list = OpaqueList::new(3).unwrap();

        assert!(list.is_empty());
        assert_eq!(list.capacity(), DEFAULT_INITIAL_CAPACITY.get());
        assert_eq!(list.element_size(), 3);
    }

    #[test]
    fn new_with_zero_size_is_error() {
        assert_eq!(OpaqueList::new(0).unwrap_err(), Error::ZeroElementSize);
    }

    #[test]
    fn clear_then_reuse() {
        let mut list = list_of_i32(&[1, 2, 3, 4, 5]);
        let capacity = list.capacity();

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), capacity);

        for value in 9..15_i32 {
            list.push(&value.to_ne_bytes()).unwrap();
        }
        list.replace(&2048_i32.to_ne_bytes(), 0).unwrap();

        assert_eq!(contents_i32(&list), vec![2048, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn get_past_len_is_none_even_within_capacity() {
        let mut list = list_of_i32(&[1, 2, 3]);
        list.remove(2).unwrap();

        assert!(list.capacity() > 2);
        assert_eq!(list.get(2), None);
    }

    #[test]
    fn get_mut_modifies_element() {
        let mut list = list_of_i32(&[1, 2, 3]);

        list.get_mut(1).unwrap()[0] = 0xFF;

        assert_eq!(list.get(1).unwrap()[0], 0xFF);
        assert_eq!(contents_i32(&list)[0], 1);
    }

    #[test]
    fn iter_is_double_ended_and_exact() {
        let list = list_of_i32(&[1, 2, 3]);

        let mut iter = list.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back(), Some(&3_i32.to_ne_bytes()[..]));
        assert_eq!(iter.next(), Some(&1_i32.to_ne_bytes()[..]));
        assert_eq!(iter.len(), 1);
    }

    #[test]
    fn into_iter_for_reference() {
        let list = list_of_i32(&[4, 5]);
        let mut count = 0;

        for element in &list {
            assert_eq!(element.len(), 4);
            count += 1;
        }

        assert_eq!(count, 2);
    }

    #[test]
    fn remove_range_and_expand_pass_through() {
        let mut list = list_of_i32(&[0, 1, 2, 3, 4]);

        list.remove_range(1..5).unwrap();
        assert_eq!(contents_i32(&list), vec![0]);

        list.expand(10).unwrap();
        assert_eq!(list.capacity(), 18);
        assert_eq!(contents_i32(&list), vec![0]);
    }

    #[test]
    fn as_bytes_of_empty_list_is_empty() {
        let list = OpaqueList::new(16).unwrap();

        assert!(list.as_bytes().is_empty());
        assert_eq!(list.iter().count(), 0);
    }
}
