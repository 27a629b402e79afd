//! Shared type aliases for the serpack crate
//!
//! Ordered maps and sets with the fast FxHasher, so every walk over module
//! metadata iterates in insertion order and bundle output stays
//! deterministic.

use std::hash::BuildHasherDefault;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;
