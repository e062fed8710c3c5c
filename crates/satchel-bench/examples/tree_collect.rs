//! Collect the values of a random tree into one bag and report arena usage.
//!
//! Run with `RUST_LOG=satchel_arena=trace` to see every promotion and merge.

use satchel_arena::{Bag, SharedStorage};
use satchel_bench::{collect_with_bags, tree_profile};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Satchel Tree Collection Example ===\n");

    let tree = tree_profile(2_000, 4, 42);
    println!(
        "tree: {} nodes, depth {}, {} values",
        tree.nodes.len(),
        tree.depth(),
        tree.value_count()
    );

    let storage = SharedStorage::for_current_thread();
    let bag: Bag<u32> = collect_with_bags(&tree, &storage);
    let stats = storage.stats();
    println!(
        "result: {} values | arena: len={} capacity={} slots={} garbage={}",
        bag.len(),
        stats.value_len,
        stats.value_capacity,
        stats.interval_slots,
        stats.garbage_values,
    );

    drop(bag);
    println!("after drop: arena len={}", storage.stats().value_len);
}
