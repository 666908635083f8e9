use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bstmap::Tree;

/// Inserts the keys of `lo..hi` midpoint-first so the fixture tree starts
/// out at minimal height. The tree never rebalances on its own, so inserting
/// in ascending order would degenerate into a list.
fn fill_balanced(tree: &mut Tree<i32, i32>, lo: i32, hi: i32) {
    if lo < hi {
        let mid = lo + (hi - lo) / 2;
        tree.insert(mid, mid);
        fill_balanced(tree, lo, mid);
        fill_balanced(tree, mid + 1, hi);
    }
}

/// Helper to bench a function on a BST.
/// It creates a group for the given name and closure and runs tests for
/// various tree sizes before finishing the group.
fn bench_helper(c: &mut Criterion, name: &str, f: impl Fn(&mut Tree<i32, i32>, i32)) {
    let mut group = c.benchmark_group(name);

    for num_levels in [3, 7, 11, 15] {
        let num_nodes = 2i32.pow(num_levels as u32) - 1;
        let largest_element_in_tree = num_nodes - 1;

        let mut tree = Tree::new();
        fill_balanced(&mut tree, 0, num_nodes);

        let id = BenchmarkId::from_parameter(largest_element_in_tree);
        group.bench_function(id, |b| {
            b.iter_custom(|iters| {
                let mut time = std::time::Duration::ZERO;
                for _ in 0..iters {
                    let mut tree = black_box(tree.clone());
                    let instant = std::time::Instant::now();
                    f(&mut tree, black_box(largest_element_in_tree));
                    time += instant.elapsed();
                }
                time
            })
        });
    }

    group.finish();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_helper(c, "find", |tree, i| {
        let _value = black_box(tree.find(&i));
    });
    bench_helper(c, "delete", |tree, i| {
        tree.delete(&i);
    });

    bench_helper(c, "insert", |tree, i| {
        tree.insert(i + 1, i + 1);
    });

    bench_helper(c, "find-miss", |tree, i| {
        let _value = black_box(tree.find(&(i + 1)));
    });
    bench_helper(c, "delete-miss", |tree, i| {
        tree.delete(&(i + 1));
    });

    bench_helper(c, "balance", |tree, _| {
        tree.balance();
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
