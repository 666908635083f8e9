//! An ordered map backed by a plain Binary Search Tree (BST) with parent
//! back-pointers.
//!
//! Every node exclusively owns its two children and keeps a non-owning
//! pointer to its parent, so the tree can be walked in key order without an
//! auxiliary stack. The most important invariants are:
//!
//! 1. For every node, all keys in its left subtree are strictly smaller than
//!    its own key and all keys in its right subtree are strictly greater,
//!    under the tree's comparator.
//! 2. A node's parent pointer always names the node that currently owns it
//!    as a left or right child.
//!
//! The tree never rebalances on its own: insertion order decides its shape,
//! and [`Tree::balance`](map::Tree::balance) rebuilds it into the
//! minimal-height form on demand. Keys are unique, and inserting an existing
//! key never overwrites its value.
//!
//! Key order defaults to `Ord` but any total order can be supplied through
//! the [`compare`] crate; see [`Tree::with_cmp`](map::Tree::with_cmp).

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod iter;
pub mod map;
mod node;

#[cfg(test)]
mod test;

pub use map::Tree;
