//! Integration tests for the `opaque_vec` package.
//!
//! These exercise `OpaqueList` and `OpaqueStack` through the public API only, covering the
//! documented usage scenarios and the boundaries of growth and removal.

use std::num::NonZero;

use new_zealand::nz;
use opaque_vec::{DEFAULT_INITIAL_CAPACITY, Error, OpaqueList, OpaqueStack};

fn to_i32(bytes: &[u8]) -> i32 {
    i32::from_ne_bytes(bytes.try_into().expect("element is 4 bytes"))
}

fn list_contents(list: &OpaqueList) -> Vec<i32> {
    list.iter().map(to_i32).collect()
}

#[test]
fn list_walkthrough() {
    let mut list = OpaqueList::new(size_of::<i32>()).unwrap();

    for value in 5..9_i32 {
        list.push(&value.to_ne_bytes()).unwrap();
    }
    assert_eq!(list.len(), 4);

    list.remove(2).unwrap();
    assert_eq!(list_contents(&list), vec![5, 6, 8]);
    assert_eq!(list.len(), 3);
    assert_eq!(to_i32(list.get(0).unwrap()), 5);

    list.clear();
    assert!(list.is_empty());

    for value in 9..15_i32 {
        list.push(&value.to_ne_bytes()).unwrap();
    }

    list.replace(&2048_i32.to_ne_bytes(), 0).unwrap();
    assert_eq!(list_contents(&list), vec![2048, 10, 11, 12, 13, 14]);
}

#[test]
fn stack_walkthrough() {
    let mut stack = OpaqueStack::new(size_of::<i32>()).unwrap();

    for value in 5..9_i32 {
        stack.push(&value.to_ne_bytes()).unwrap();
    }

    assert!(stack.remove_top());
    assert_eq!(stack.len(), 3);

    let popped = stack.pop().unwrap().unwrap();
    assert_eq!(to_i32(&popped), 7);
    assert_eq!(stack.len(), 2);

    assert_eq!(to_i32(stack.peek().unwrap()), 6);

    stack.clear();
    assert!(stack.is_empty());

    for value in 9..15_i32 {
        stack.push(&value.to_ne_bytes()).unwrap();
    }

    let mut popped = Vec::new();
    while let Some(bytes) = stack.pop().unwrap() {
        popped.push(to_i32(&bytes));
    }

    assert_eq!(popped, vec![14, 13, 12, 11, 10, 9]);
}

#[test]
fn capacity_only_grows_when_full() {
    let mut list = OpaqueList::new(1).unwrap();
    let mut previous_capacity = list.capacity();

    for value in 0..=200_u8 {
        let was_full = list.len() == list.capacity();

        list.push(&[value]).unwrap();

        if was_full {
            assert_eq!(list.capacity(), previous_capacity * 2);
        } else {
            assert_eq!(list.capacity(), previous_capacity);
        }

        assert!(list.capacity() >= list.len());
        previous_capacity = list.capacity();
    }
}

#[test]
fn first_growth_doubles_default_capacity() {
    let mut stack = OpaqueStack::new(2).unwrap();

    for _ in 0..DEFAULT_INITIAL_CAPACITY.get() {
        stack.push(&[0, 0]).unwrap();
    }
    assert_eq!(stack.capacity(), DEFAULT_INITIAL_CAPACITY.get());

    stack.push(&[1, 1]).unwrap();
    assert_eq!(stack.capacity(), DEFAULT_INITIAL_CAPACITY.get() * 2);
}

#[test]
fn remove_range_up_to_end_keeps_all_survivors() {
    for start in 0..6 {
        let mut list = OpaqueList::new(4).unwrap();
        for value in 0..6_i32 {
            list.push(&value.to_ne_bytes()).unwrap();
        }

        list.remove_range(start..6).unwrap();

        assert_eq!(list_contents(&list), (0..i32::try_from(start).unwrap()).collect::<Vec<_>>());
    }
}

#[test]
fn remove_range_matches_repeated_single_removal() {
    for start in 0..8 {
        for stop in (start + 1)..=8 {
            let mut ranged = OpaqueList::new(4).unwrap();
            let mut single = OpaqueList::new(4).unwrap();

            for value in 0..8_i32 {
                ranged.push(&value.to_ne_bytes()).unwrap();
                single.push(&value.to_ne_bytes()).unwrap();
            }

            ranged.remove_range(start..stop).unwrap();
            for _ in start..stop {
                single.remove(start).unwrap();
            }

            assert_eq!(
                list_contents(&ranged),
                list_contents(&single),
                "range {start}..{stop}"
            );
            assert_eq!(ranged.len(), 8 - (stop - start));
        }
    }
}

#[test]
fn errors_leave_containers_unchanged() {
    let mut list = OpaqueList::builder()
        .element_size(4)
        .initial_capacity(nz!(2))
        .build()
        .unwrap();
    list.push(&1_i32.to_ne_bytes()).unwrap();
    list.push(&2_i32.to_ne_bytes()).unwrap();

    assert_eq!(
        list.replace(&3_i32.to_ne_bytes(), 2),
        Err(Error::IndexOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(
        list.remove(5),
        Err(Error::IndexOutOfRange { index: 5, len: 2 })
    );
    assert_eq!(
        list.remove_range(1..3),
        Err(Error::InvalidRange {
            start: 1,
            stop: 3,
            len: 2
        })
    );
    assert!(matches!(
        list.expand(usize::MAX / 2),
        Err(Error::AllocationFailure { .. })
    ));
    assert_eq!(
        list.push(&[0; 5]),
        Err(Error::ElementSizeMismatch {
            expected: 4,
            actual: 5
        })
    );

    assert_eq!(list_contents(&list), vec![1, 2]);
    assert_eq!(list.capacity(), 2);
}

#[test]
fn refused_expansion_keeps_list_usable() {
    let mut list = OpaqueList::new(1).unwrap();
    list.push(&[7]).unwrap();

    let result = list.expand(usize::try_from(isize::MAX).unwrap() / 2);

    assert!(matches!(result, Err(Error::AllocationFailure { .. })));
    assert_eq!(list.capacity(), DEFAULT_INITIAL_CAPACITY.get());
    assert_eq!(list.as_bytes(), &[7]);

    list.push(&[8]).unwrap();
    assert_eq!(list.as_bytes(), &[7, 8]);
}

#[test]
fn oversized_initial_capacity_is_allocation_failure() {
    let result = OpaqueStack::builder()
        .element_size(1024)
        .initial_capacity(NonZero::new(usize::MAX / 512).unwrap())
        .build();

    assert!(matches!(result, Err(Error::AllocationFailure { .. })));
}

#[test]
fn large_elements_round_trip() {
    let mut list = OpaqueList::builder().element_size_of::<[u8; 300]>().build().unwrap();

    for fill in 0..20_u8 {
        list.push(&[fill; 300]).unwrap();
    }

    for (index, element) in list.iter().enumerate() {
        assert!(element.iter().all(|&b| usize::from(b) == index));
    }
}

#[test]
fn containers_move_between_threads() {
    let mut list = OpaqueList::new(8).unwrap();
    list.push(&42_u64.to_ne_bytes()).unwrap();

    let list = std::thread::spawn(move || {
        list.push(&43_u64.to_ne_bytes()).unwrap();
        list
    })
    .join()
    .unwrap();

    assert_eq!(list.len(), 2);
}
