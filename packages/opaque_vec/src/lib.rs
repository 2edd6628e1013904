#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Growable containers for elements of a fixed byte size whose type is not known to the container.
//!
//! This crate provides two containers that store elements as raw bytes, with the element size
//! chosen when the container is created:
//!
//! - [`OpaqueList`]: a resizable sequence with indexed access, in-place replacement and removal
//!   of single elements or ranges of elements.
//! - [`OpaqueStack`]: a last-in-first-out stack that hands popped elements to the caller as
//!   owned buffers.
//!
//! # Key Features
//!
//! - **Type-erased storage**: Any element that can be expressed as a fixed number of bytes
//! - **Contiguous memory**: All elements live back to back in one allocation
//! - **Amortized growth**: Capacity doubles when the container is full
//! - **Fallible allocation**: Out of memory is reported as [`Error::AllocationFailure`]
//!   instead of aborting, and leaves the container unchanged
//! - **Borrowed and owned access**: Lookups return slices borrowed from the container,
//!   [`OpaqueStack::pop()`] returns a buffer owned by the caller
//! - **Thread mobility**: Containers can be moved between threads (but not shared without
//!   synchronization)
//!
//! # Examples
//!
//! ## List
//!
//! ```rust
//! use opaque_vec::OpaqueList;
//!
//! let mut list = OpaqueList::builder().element_size_of::<u64>().build()?;
//!
//! list.push(&1_u64.to_ne_bytes())?;
//! list.push(&2_u64.to_ne_bytes())?;
//! list.replace(&20_u64.to_ne_bytes(), 1)?;
//!
//! let values = list
//!     .iter()
//!     .map(|bytes| u64::from_ne_bytes(bytes.try_into().unwrap()))
//!     .collect::<Vec<_>>();
//!
//! assert_eq!(values, [1, 20]);
//! # Ok::<(), opaque_vec::Error>(())
//! ```
//!
//! ## Stack
//!
//! ```rust
//! use opaque_vec::OpaqueStack;
//!
//! let mut stack = OpaqueStack::new(3)?;
//!
//! stack.push(b"abc")?;
//! stack.push(b"xyz")?;
//!
//! assert_eq!(stack.peek(), Some(&b"xyz"[..]));
//!
//! // The popped buffer belongs to the caller and stays valid after the stack changes.
//! let popped = stack.pop()?.expect("stack is not empty");
//! stack.clear();
//!
//! assert_eq!(&*popped, b"xyz");
//! # Ok::<(), opaque_vec::Error>(())
//! ```

mod builder;
mod error;
mod list;
mod slot_array;
mod slots;
mod stack;

pub use builder::*;
pub use error::Error;
pub(crate) use error::Result;
pub use list::{Iter, OpaqueList};
pub use slot_array::DEFAULT_INITIAL_CAPACITY;
pub(crate) use slot_array::SlotArray;
pub(crate) use slots::*;
pub use stack::OpaqueStack;
