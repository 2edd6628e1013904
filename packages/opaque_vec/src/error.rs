use thiserror::Error;

/// Errors returned by the operations of [`OpaqueList`][crate::OpaqueList] and
/// [`OpaqueStack`][crate::OpaqueStack].
///
/// A failed operation never leaves the container in a partially modified state. If an
/// operation returns an error, the container holds exactly the same elements and capacity
/// as it did before the call.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Memory for the requested number of slots could not be allocated, either because the
    /// allocator reported failure or because the total byte size cannot be represented.
    #[error(
        "failed to allocate storage for {slot_count} slots of {element_size} bytes each"
    )]
    AllocationFailure {
        /// Number of slots the failed allocation was meant to hold.
        slot_count: usize,

        /// Byte size of each slot.
        element_size: usize,
    },

    /// The index does not refer to a live element.
    #[error("index {index} is out of range for a container of length {len}")]
    IndexOutOfRange {
        /// The index provided by the caller.
        index: usize,

        /// The number of live elements at the time of the call.
        len: usize,
    },

    /// The range is empty, reversed or extends past the live elements.
    #[error("range {start}..{stop} is invalid for a container of length {len}")]
    InvalidRange {
        /// Inclusive start of the range provided by the caller.
        start: usize,

        /// Exclusive end of the range provided by the caller.
        stop: usize,

        /// The number of live elements at the time of the call.
        len: usize,
    },

    /// The caller-provided buffer does not have the element size of the container.
    #[error("expected a buffer of {expected} bytes but got {actual} bytes")]
    ElementSizeMismatch {
        /// The element size of the container.
        expected: usize,

        /// The length of the buffer provided by the caller.
        actual: usize,
    },

    /// A container was configured with a zero element size.
    #[error("element size must be greater than zero")]
    ZeroElementSize,
}

/// A specialized `Result` type for container operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, Clone, std::error::Error);

    #[test]
    fn display_mentions_relevant_values() {
        let message = Error::IndexOutOfRange { index: 7, len: 3 }.to_string();
        assert!(message.contains('7'));
        assert!(message.contains('3'));

        let message = Error::InvalidRange {
            start: 2,
            stop: 1,
            len: 5,
        }
        .to_string();
        assert!(message.contains("2..1"));

        let message = Error::ElementSizeMismatch {
            expected: 4,
            actual: 8,
        }
        .to_string();
        assert!(message.contains("4 bytes"));
        assert!(message.contains("8 bytes"));
    }

    #[test]
    fn allocation_failure_is_error() {
        let error = Error::AllocationFailure {
            slot_count: usize::MAX,
            element_size: 16,
        };

        let result: Result<()> = Err(error.clone());
        assert_eq!(result, Err(error));
    }
}
