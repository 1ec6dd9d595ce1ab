//! Activation scopes for [`Lifetime::Scoped`] entries.
//!
//! [`Lifetime::Scoped`]: kindred_core::Lifetime::Scoped

use dashmap::DashMap;
use kindred_core::{Activated, ContentType};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A logical operation scope, typically one per incoming request.
///
/// The caller owns the scope; the registry only looks up and stores scoped
/// instances inside it. Dropping the scope drops its instances.
#[derive(Debug)]
pub struct Scope {
    id: u64,
    instances: DashMap<ContentType, Activated>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            instances: DashMap::new(),
        }
    }

    /// Process-unique id, handy for log correlation.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of instances created in this scope.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance has been created yet.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether an instance for `key` lives in this scope.
    pub fn contains(&self, key: &ContentType) -> bool {
        self.instances.contains_key(key)
    }

    pub(crate) fn get(&self, key: &ContentType) -> Option<Activated> {
        self.instances.get(key).map(|entry| entry.value().clone())
    }

    /// Store `activated` unless another caller got there first; returns the
    /// instance that ended up in the scope.
    pub(crate) fn get_or_insert(&self, key: &ContentType, activated: Activated) -> Activated {
        self.instances
            .entry(key.clone())
            .or_insert(activated)
            .value()
            .clone()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn activated(value: u32) -> Activated {
        Activated {
            instance: Arc::new(value),
            type_name: "u32",
        }
    }

    #[test]
    fn test_scope_ids_are_unique() {
        assert_ne!(Scope::new().id(), Scope::new().id());
    }

    #[test]
    fn test_first_insert_wins() {
        let scope = Scope::new();
        let key: ContentType = "db.session".parse().unwrap();
        assert!(scope.is_empty());

        let first = scope.get_or_insert(&key, activated(1));
        let second = scope.get_or_insert(&key, activated(2));

        assert!(Arc::ptr_eq(&first.instance, &second.instance));
        assert_eq!(*second.instance.downcast_ref::<u32>().unwrap(), 1);
        assert!(scope.contains(&key));
        assert_eq!(scope.len(), 1);
        assert!(scope.get(&key).is_some());
    }
}
