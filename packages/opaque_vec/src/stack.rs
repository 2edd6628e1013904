use crate::{DEFAULT_INITIAL_CAPACITY, OpaqueStackBuilder, Result, SlotArray};

/// A last-in-first-out stack of elements that all have the same byte size but no known type.
///
/// Every operation works on the top of the stack, which is the most recently pushed element
/// that has not been removed yet. Elements are copied in on [`push()`](Self::push) and copied
/// out on [`pop()`](Self::pop), so the stack never shares ownership of its storage.
///
/// There are two ways to take an element off the stack:
///
/// * [`pop()`](Self::pop) returns the element in a newly allocated buffer that the caller owns.
/// * [`remove_top()`](Self::remove_top) discards the element without allocating anything.
///
/// # Examples
///
/// ```
/// use opaque_vec::OpaqueStack;
///
/// let mut stack = OpaqueStack::builder().element_size_of::<i32>().build()?;
///
/// for value in 5..9_i32 {
///     stack.push(&value.to_ne_bytes())?;
/// }
///
/// // Discards 8.
/// stack.remove_top();
///
/// let popped = stack.pop()?.expect("stack is not empty");
/// assert_eq!(i32::from_ne_bytes((*popped).try_into().unwrap()), 7);
///
/// let top = stack.peek().expect("stack is not empty");
/// assert_eq!(i32::from_ne_bytes(top.try_into().unwrap()), 6);
/// assert_eq!(stack.len(), 2);
/// # Ok::<(), opaque_vec::Error>(())
/// ```
///
/// # Thread safety
///
/// The stack is thread-mobile ([`Send`]) and can be moved between threads, but it is not
/// thread-safe ([`Sync`]) and cannot be shared between threads without additional synchronization.
#[derive(Debug)]
pub struct OpaqueStack {
    storage: SlotArray,
}

impl OpaqueStack {
    /// Creates a builder for configuring and constructing an [`OpaqueStack`].
    ///
    /// You must specify an element size using either `.element_size()` or
    /// `.element_size_of::<T>()` before calling `.build()`.
    #[inline]
    pub fn builder() -> OpaqueStackBuilder {
        OpaqueStackBuilder::new()
    }

    /// Creates an empty stack of `element_size`-byte elements with the
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

    /// The number of elements on the stack.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the stack has no elements.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The number of elements the stack can hold without allocating more memory.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The size in bytes of every element on the stack.
    #[must_use]
    #[inline]
    pub fn element_size(&self) -> usize {
        self.storage.element_size()
    }

    /// Pushes a copy of `element` onto the top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementSizeMismatch`][crate::Error::ElementSizeMismatch] if `element` is
    /// not exactly [`element_size()`](Self::element_size) bytes long and
    /// [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the stack needed to grow
    /// but could not. The stack is unchanged in both cases.
    pub fn push(&mut self, element: &[u8]) -> Result<()> {
        self.storage.append(element)
    }

    /// Returns the bytes of the top element without removing it, or `None` if the stack is empty.
    #[must_use]
    #[inline]
    pub fn peek(&self) -> Option<&[u8]> {
        self.storage.last()
    }

    /// Removes the top element and returns it in a newly allocated buffer owned by the caller.
    ///
    /// Returns `Ok(None)` if the stack is empty. Use [`remove_top()`](Self::remove_top) to
    /// discard the top element without allocating, or [`pop_into()`](Self::pop_into) to copy it
    /// into an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the buffer cannot
    /// be allocated, in which case the stack is unchanged.
    pub fn pop(&mut self) -> Result<Option<Box<[u8]>>> {
        self.storage.pop()
    }

    /// Removes the top element, copying it into `buffer`.
    ///
    /// Returns `Ok(false)` without touching `buffer` if the stack is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementSizeMismatch`][crate::Error::ElementSizeMismatch] if `buffer` is
    /// not exactly [`element_size()`](Self::element_size) bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// use opaque_vec::OpaqueStack;
    ///
    /// let mut stack = OpaqueStack::new(2)?;
    /// stack.push(&[1, 2])?;
    ///
    /// let mut buffer = [0_u8; 2];
    /// assert!(stack.pop_into(&mut buffer)?);
    /// assert_eq!(buffer, [1, 2]);
    ///
    /// assert!(!stack.pop_into(&mut buffer)?);
    /// # Ok::<(), opaque_vec::Error>(())
    /// ```
    pub fn pop_into(&mut self, buffer: &mut [u8]) -> Result<bool> {
        self.storage.pop_into(buffer)
    }

    /// Discards the top element. Returns `false` if the stack was already empty.
    #[inline]
    pub fn remove_top(&mut self) -> bool {
        self.storage.remove_last()
    }

    /// Grows the capacity by exactly `extra_slots` elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`][crate::Error::AllocationFailure] if the new storage
    /// cannot be allocated, in which case the stack is unchanged.
    pub fn expand(&mut self, extra_slots: usize) -> Result<()> {
        self.storage.expand(extra_slots)
    }

    /// Removes all elements from the stack. The capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}
