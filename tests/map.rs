use std::collections::BTreeMap;

use bstmap::Tree;
use quickcheck::{Arbitrary, Gen};

/// ⌈log2(n + 1)⌉, the minimal height of a tree holding `n` keys.
fn minimal_height(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}

#[test]
fn insert_find_dump_delete_balance() {
    let mut tree = Tree::new();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        let (_, newly_inserted) = tree.insert(key, key * 10);
        assert!(newly_inserted);
    }

    assert_eq!(tree.find(&4), Some(&40));
    assert_eq!(tree.to_string(), "1 3 4 5 7 8 9");

    // 5 has two children; erasing it promotes its in-order successor 7.
    assert_eq!(tree.delete(&5), Some(50));
    assert_eq!(tree.to_string(), "1 3 4 7 8 9");
    assert_eq!(tree.first_key_value(), Some((&1, &10)));

    tree.balance();
    assert_eq!(tree.to_string(), "1 3 4 7 8 9");
    assert_eq!(tree.height(), minimal_height(tree.len()));
}

#[test]
fn deep_copy_is_independent() {
    let mut tree = Tree::new();
    for key in [5, 3, 8, 1, 4, 7, 9] {
        tree.insert(key, key.to_string());
    }

    let mut copy = tree.clone();
    copy.delete(&8);
    copy.delete(&1);
    *copy.find_mut(&3).unwrap() = "three".to_string();

    assert_eq!(tree.to_string(), "1 3 4 5 7 8 9");
    assert_eq!(tree.find(&3), Some(&3.to_string()));
    assert_eq!(copy.to_string(), "3 4 5 7 9");
    assert_eq!(copy.find(&3), Some(&"three".to_string()));
}

#[test]
fn into_iter_yields_owned_entries_in_order() {
    let mut tree = Tree::new();
    for key in [2, 1, 3] {
        tree.insert(key, key.to_string());
    }

    let entries: Vec<_> = tree.into_iter().collect();
    assert_eq!(
        entries,
        [
            (1, 1.to_string()),
            (2, 2.to_string()),
            (3, 3.to_string())
        ]
    );
}

#[test]
fn partially_consumed_into_iter_releases_the_rest() {
    let mut tree = Tree::new();
    for key in [5, 3, 8, 1, 4] {
        tree.insert(key, key.to_string());
    }

    let mut entries = tree.into_iter();
    assert_eq!(entries.next(), Some((1, 1.to_string())));
    assert_eq!(entries.len(), 4);
    // The remaining four entries are freed when `entries` goes out of scope.
}

#[test]
fn iter_mut_updates_are_visible() {
    let mut tree = Tree::new();
    for key in [2, 1, 3] {
        tree.insert(key, key);
    }

    for (key, value) in &mut tree {
        *value = key * 100;
    }

    let entries: Vec<_> = (&tree).into_iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(entries, [(1, 100), (2, 200), (3, 300)]);
}

#[derive(Copy, Clone, Debug)]
enum Op<K, V> {
    Insert(K, V),
    Remove(K),
    Balance,
}

impl<K, V> Arbitrary for Op<K, V>
where
    K: Arbitrary,
    V: Arbitrary,
{
    fn arbitrary(g: &mut Gen) -> Self {
        match g.choose(&[0, 1, 2]).unwrap() {
            0 => Op::Insert(K::arbitrary(g), V::arbitrary(g)),
            1 => Op::Remove(K::arbitrary(g)),
            2 => Op::Balance,
            _ => unreachable!(),
        }
    }
}

/// Applies a set of operations to a tree and a `BTreeMap` so the two can be
/// compared afterward.
fn do_ops<K, V>(ops: &[Op<K, V>], bst: &mut Tree<K, V>, map: &mut BTreeMap<K, V>)
where
    K: Ord + Clone,
    V: std::fmt::Debug + PartialEq + Clone,
{
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                bst.insert(k.clone(), v.clone());
                map.entry(k.clone()).or_insert_with(|| v.clone());
            }
            Op::Remove(k) => {
                assert_eq!(bst.delete(k), map.remove(k));
            }
            Op::Balance => bst.balance(),
        }
    }
}

quickcheck::quickcheck! {
    fn fuzz_matches_a_btreemap(ops: Vec<Op<i8, i8>>) -> bool {
        let mut tree = Tree::new();
        let mut map = BTreeMap::new();

        do_ops(&ops, &mut tree, &mut map);

        let in_order: Vec<_> = tree.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
        tree.len() == map.len()
            && in_order == expected
            && map.keys().all(|key| tree.find(key) == map.get(key))
    }
}

quickcheck::quickcheck! {
    fn iteration_is_strictly_ascending(xs: Vec<i8>, deletes: Vec<i8>) -> bool {
        let mut tree = Tree::new();
        for x in &xs {
            tree.insert(*x, ());
        }
        for delete in &deletes {
            tree.delete(delete);
        }

        let keys: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
        keys.windows(2).all(|pair| pair[0] < pair[1])
    }
}

quickcheck::quickcheck! {
    fn balance_keeps_contents_and_bounds_height(xs: Vec<i16>) -> bool {
        let mut tree = Tree::new();
        for x in &xs {
            tree.insert(*x, *x);
        }
        let before: Vec<_> = tree.iter().map(|(k, _)| *k).collect();

        tree.balance();

        let after: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
        before == after && tree.height() <= minimal_height(tree.len())
    }
}
