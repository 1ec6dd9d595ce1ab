//! Exact-match lookup by content type.
//!
//! [`Lookup`] is the seam between storage and resolution: anything that can
//! answer "what is registered under exactly this key" can be walked
//! hierarchically. The registry implements it, and so do plain maps, which
//! makes static tables and tests cheap.

use crate::content_type::ContentType;
use std::collections::{BTreeMap, HashMap};

/// Exact lookup by content type. No fallback.
pub trait Lookup {
    /// The value stored per key.
    type Value;

    /// Look up a value by exact key.
    fn lookup(&self, key: &ContentType) -> Option<Self::Value>;

    /// Check if a key exists.
    fn contains(&self, key: &ContentType) -> bool {
        self.lookup(key).is_some()
    }
}

impl<V: Clone> Lookup for HashMap<ContentType, V> {
    type Value = V;

    fn lookup(&self, key: &ContentType) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<V: Clone> Lookup for BTreeMap<ContentType, V> {
    type Value = V;

    fn lookup(&self, key: &ContentType) -> Option<V> {
        self.get(key).cloned()
    }
}

impl<V: Clone> Lookup for HashMap<String, V> {
    type Value = V;

    fn lookup(&self, key: &ContentType) -> Option<V> {
        self.get(&key.to_string()).cloned()
    }
}

impl<L: Lookup + ?Sized> Lookup for &L {
    type Value = L::Value;

    fn lookup(&self, key: &ContentType) -> Option<Self::Value> {
        (**self).lookup(key)
    }
}
