//! Basic benchmarks for the `opaque_vec` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use opaque_vec::{OpaqueList, OpaqueStack};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;

/// Enough elements to force several rounds of capacity doubling.
const FILL_COUNT: usize = 1000;

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("opaque_vec_basic");

    let allocs_op = allocs.operation("build_empty");
    group.bench_function("build_empty", |b| {
        b.iter_custom(|iters| {
            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                drop(black_box(
                    OpaqueList::builder()
                        .element_size_of::<TestItem>()
                        .build()
                        .unwrap(),
                ));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_one");
    group.bench_function("push_one", |b| {
        b.iter_custom(|iters| {
            let mut lists = iter::repeat_with(|| OpaqueList::new(size_of::<TestItem>()).unwrap())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for list in &mut lists {
                list.push(black_box(&TEST_VALUE.to_ne_bytes())).unwrap();
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("push_many");
    group.bench_function("push_many", |b| {
        b.iter_custom(|iters| {
            let mut lists = iter::repeat_with(|| OpaqueList::new(size_of::<TestItem>()).unwrap())
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for list in &mut lists {
                for _ in 0..FILL_COUNT {
                    list.push(black_box(&TEST_VALUE.to_ne_bytes())).unwrap();
                }
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("get_one");
    group.bench_function("get_one", |b| {
        b.iter_custom(|iters| {
            let mut list = OpaqueList::new(size_of::<TestItem>()).unwrap();
            list.push(&TEST_VALUE.to_ne_bytes()).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                _ = black_box(list.get(black_box(0)));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("remove_front");
    group.bench_function("remove_front", |b| {
        b.iter_custom(|iters| {
            let mut lists = iter::repeat_with(|| {
                let mut list = OpaqueList::new(size_of::<TestItem>()).unwrap();
                for _ in 0..FILL_COUNT {
                    list.push(&TEST_VALUE.to_ne_bytes()).unwrap();
                }
                list
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for list in &mut lists {
                list.remove(black_box(0)).unwrap();
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("stack_pop");
    group.bench_function("stack_pop", |b| {
        b.iter_custom(|iters| {
            let mut stacks = iter::repeat_with(|| {
                let mut stack = OpaqueStack::new(size_of::<TestItem>()).unwrap();
                stack.push(&TEST_VALUE.to_ne_bytes()).unwrap();
                stack
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for stack in &mut stacks {
                _ = black_box(stack.pop().unwrap());
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("stack_pop_into");
    group.bench_function("stack_pop_into", |b| {
        b.iter_custom(|iters| {
            let mut stacks = iter::repeat_with(|| {
                let mut stack = OpaqueStack::new(size_of::<TestItem>()).unwrap();
                stack.push(&TEST_VALUE.to_ne_bytes()).unwrap();
                stack
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let mut buffer = [0_u8; size_of::<TestItem>()];

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for stack in &mut stacks {
                _ = black_box(stack.pop_into(&mut buffer).unwrap());
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
