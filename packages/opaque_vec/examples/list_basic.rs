//! Basic usage example for `OpaqueList`.
//!
//! This example stores `i32` values in a list that only knows their byte size, removes and
//! replaces elements and prints the result.

use opaque_vec::{Error, OpaqueList};

fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_ne_bytes(bytes.try_into().expect("list was created for i32 elements"))
}

fn main() -> Result<(), Error> {
    let mut list = OpaqueList::builder().element_size_of::<i32>().build()?;

    for value in 5..9_i32 {
        list.push(&value.to_ne_bytes())?;
    }

    // Removes 7, shifting 8 into its place.
    list.remove(2)?;

    let first = list.get(0).map(read_i32);
    println!("First item: {first:?}");

    // Clearing keeps the capacity for reuse.
    list.clear();
    println!(
        "Cleared list has {} items with capacity {}",
        list.len(),
        list.capacity()
    );

    for value in 9..15_i32 {
        list.push(&value.to_ne_bytes())?;
    }

    list.replace(&2048_i32.to_ne_bytes(), 0)?;

    let first = list.get(0).map(read_i32);
    println!("First item: {first:?}");

    for element in &list {
        println!("{}", read_i32(element));
    }

    drop(list);
    println!("List deleted");

    Ok(())
}
