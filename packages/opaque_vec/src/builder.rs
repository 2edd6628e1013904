use std::cell::Cell;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::{DEFAULT_INITIAL_CAPACITY, OpaqueList, OpaqueStack, Result, SlotArray};

/// Settings shared by the list and stack builders.
#[derive(Debug)]
struct StorageOptions {
    element_size: Option<usize>,
    initial_capacity: NonZero<usize>,
}

impl StorageOptions {
    fn new() -> Self {
        Self {
            element_size: None,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }

    fn build(&self, container_name: &str) -> Result<SlotArray> {
        let element_size = self.element_size.unwrap_or_else(|| {
            panic!(
                "element size must be set using .element_size() or .element_size_of::<T>() before building {container_name}"
            )
        });

        SlotArray::new(element_size, self.initial_capacity)
    }
}

/// Builder for creating an instance of [`OpaqueList`].
///
/// The element size is mandatory, whereas other settings are optional.
///
/// # Examples
///
/// ```
/// use opaque_vec::OpaqueList;
///
/// let list = OpaqueList::builder().element_size(12).build()?;
/// assert_eq!(list.element_size(), 12);
///
/// let list = OpaqueList::builder().element_size_of::<u64>().build()?;
/// assert_eq!(list.element_size(), 8);
/// # Ok::<(), opaque_vec::Error>(())
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) but not thread-safe ([`Sync`]).
#[derive(Debug)]
#[must_use]
pub struct OpaqueListBuilder {
    options: StorageOptions,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl OpaqueListBuilder {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            options: StorageOptions::new(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the size in bytes of every element stored in the list.
    ///
    /// A size of zero is rejected by [`build()`](Self::build).
    #[inline]
    pub fn element_size(mut self, element_size: usize) -> Self {
        self.options.element_size = Some(element_size);
        self
    }

    /// Sets the element size to the size of `T`.
    ///
    /// Only the size is taken from `T`. The list stores bytes and does not align its slots.
    #[inline]
    pub fn element_size_of<T>(self) -> Self {
        self.element_size(size_of::<T>())
    }

    /// Sets the number of slots allocated up front. Defaults to [`DEFAULT_INITIAL_CAPACITY`].
    #[inline]
    pub fn initial_capacity(mut self, initial_capacity: NonZero<usize>) -> Self {
        self.options.initial_capacity = initial_capacity;
        self
    }

    /// Builds the list, allocating its initial capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroElementSize`][crate::Error::ZeroElementSize] if the element size is
    /// zero and [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the initial
    /// capacity cannot be allocated.
    ///
    /// # Panics
    ///
    /// Panics if no element size has been set.
    pub fn build(self) -> Result<OpaqueList> {
        self.options
            .build("OpaqueList")
            .map(OpaqueList::from_storage)
    }
}

/// Builder for creating an instance of [`OpaqueStack`].
///
/// The element size is mandatory, whereas other settings are optional.
///
/// # Examples
///
/// ```
/// use new_zealand::nz;
/// use opaque_vec::OpaqueStack;
///
/// let stack = OpaqueStack::builder()
///     .element_size_of::<u32>()
///     .initial_capacity(nz!(64))
///     .build()?;
///
/// assert_eq!(stack.capacity(), 64);
/// # Ok::<(), opaque_vec::Error>(())
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) but not thread-safe ([`Sync`]).
#[derive(Debug)]
#[must_use]
pub struct OpaqueStackBuilder {
    options: StorageOptions,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl OpaqueStackBuilder {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            options: StorageOptions::new(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the size in bytes of every element stored in the stack.
    ///
    /// A size of zero is rejected by [`build()`](Self::build).
    #[inline]
    pub fn element_size(mut self, element_size: usize) -> Self {
        self.options.element_size = Some(element_size);
        self
    }

    /// Sets the element size to the size of `T`.
    #[inline]
    pub fn element_size_of<T>(self) -> Self {
        self.element_size(size_of::<T>())
    }

    /// Sets the number of slots allocated up front. Defaults to [`DEFAULT_INITIAL_CAPACITY`].
    #[inline]
    pub fn initial_capacity(mut self, initial_capacity: NonZero<usize>) -> Self {
        self.options.initial_capacity = initial_capacity;
        self
    }

    /// Builds the stack, allocating its initial capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroElementSize`][crate::Error::ZeroElementSize] if the element size is
    /// zero and [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the initial
    /// capacity cannot be allocated.
    ///
    /// # Panics
    ///
    /// Panics if no element size has been set.
    pub fn build(self) -> Result<OpaqueStack> {
        self.options
            .build("OpaqueStack")
            .map(OpaqueStack::from_storage)
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::Error;

    assert_impl_all!(OpaqueListBuilder: Send, std::fmt::Debug);
    assert_not_impl_any!(OpaqueListBuilder: Sync);
    assert_impl_all!(OpaqueStackBuilder: Send, std::fmt::Debug);
    assert_not_impl_any!(OpaqueStackBuilder: Sync);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = OpaqueListBuilder::new();
        assert!(builder.options.element_size.is_none());
        assert_eq!(builder.options.initial_capacity, DEFAULT_INITIAL_CAPACITY);

        let builder = OpaqueStackBuilder::new();
        assert!(builder.options.element_size.is_none());
        assert_eq!(builder.options.initial_capacity, DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    fn element_size_of_uses_type_size() {
        let builder = OpaqueListBuilder::new().element_size_of::<[u16; 5]>();
        assert_eq!(builder.options.element_size, Some(10));

        let builder = OpaqueStackBuilder::new().element_size_of::<u128>();
        assert_eq!(builder.options.element_size, Some(16));
    }

    #[test]
    fn element_size_can_be_overridden() {
        let builder = OpaqueListBuilder::new()
            .element_size_of::<u32>()
            .element_size(3);
        assert_eq!(builder.options.element_size, Some(3));
    }

    #[test]
    fn initial_capacity_is_applied() {
        let list = OpaqueListBuilder::new()
            .element_size(1)
            .initial_capacity(nz!(17))
            .build()
            .unwrap();
        assert_eq!(list.capacity(), 17);

        let stack = OpaqueStackBuilder::new()
            .initial_capacity(nz!(1))
            .element_size(1)
            .build()
            .unwrap();
        assert_eq!(stack.capacity(), 1);
    }

    #[test]
    fn zero_element_size_is_error() {
        let result = OpaqueListBuilder::new().element_size(0).build();
        assert_eq!(result.unwrap_err(), Error::ZeroElementSize);

        let result = OpaqueStackBuilder::new().element_size_of::<()>().build();
        assert_eq!(result.unwrap_err(), Error::ZeroElementSize);
    }

    #[test]
    #[should_panic]
    fn list_build_without_element_size_panics() {
        _ = OpaqueListBuilder::new().build();
    }

    #[test]
    #[should_panic]
    fn stack_build_without_element_size_panics() {
        _ = OpaqueStackBuilder::new().initial_capacity(nz!(2)).build();
    }

    #[test]
    fn builder_send_trait() {
        let builder = OpaqueListBuilder::new().element_size_of::<u64>();
        let handle = std::thread::spawn(move || builder.build());
        let list = handle
            .join()
            .expect("thread completed successfully")
            .unwrap();
        assert_eq!(list.element_size(), 8);
    }
}
