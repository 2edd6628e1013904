//! Basic usage example for `OpaqueStack`.
//!
//! This example pushes `i32` values onto a stack that only knows their byte size and takes them
//! off again in reverse order.

use opaque_vec::{Error, OpaqueStack};

fn read_i32(bytes: &[u8]) -> i32 {
    i32::from_ne_bytes(bytes.try_into().expect("stack was created for i32 elements"))
}

fn main() -> Result<(), Error> {
    let mut stack = OpaqueStack::builder().element_size_of::<i32>().build()?;

    for value in 5..9_i32 {
        stack.push(&value.to_ne_bytes())?;
    }

    // Discards 8 without handing it out.
    stack.remove_top();

    // The popped buffer is owned by us and outlives any later change to the stack.
    if let Some(popped) = stack.pop()? {
        println!("Popped item: {}", read_i32(&popped));
    }

    if let Some(top) = stack.peek() {
        println!("Top item: {}", read_i32(top));
    }

    stack.clear();

    for value in 9..15_i32 {
        stack.push(&value.to_ne_bytes())?;
    }

    while let Some(popped) = stack.pop()? {
        println!("Popped item after clear: {}", read_i32(&popped));
    }

    drop(stack);
    println!("Stack deleted");

    Ok(())
}
