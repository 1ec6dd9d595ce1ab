//! Hierarchical resolution over any [`Lookup`].
//!
//! On a miss the resolver drops the last segment of the content type and
//! tries again, keeping the suffix, until it reaches the none sentinel:
//!
//! ```text
//! a.b.c.d+render -> a.b.c+render -> a.b+render -> a+render -> (none)
//! ```

use kindred_core::{ContentType, Lookup};

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved<V> {
    /// The key that matched.
    pub key: ContentType,
    /// How many parents were taken before the match. Zero is exact.
    pub fallback_steps: usize,
    /// The stored value.
    pub value: V,
}

impl<V> Resolved<V> {
    /// Whether the requested key itself matched.
    pub fn is_exact(&self) -> bool {
        self.fallback_steps == 0
    }
}

/// Walks a content type's ancestors until a lookup hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalResolver {
    max_fallback: Option<usize>,
}

impl HierarchicalResolver {
    /// A resolver with unlimited fallback.
    pub const fn new() -> Self {
        Self { max_fallback: None }
    }

    /// A resolver that only accepts exact matches.
    pub const fn exact() -> Self {
        Self::new().with_max_fallback(Some(0))
    }

    /// Cap the number of parent steps; `None` is unlimited.
    pub const fn with_max_fallback(mut self, max_fallback: Option<usize>) -> Self {
        self.max_fallback = max_fallback;
        self
    }

    /// The fallback cap.
    pub fn max_fallback(&self) -> Option<usize> {
        self.max_fallback
    }

    /// Resolve `key`, most specific first.
    pub fn resolve<L>(&self, key: &ContentType, lookup: &L) -> Option<Resolved<L::Value>>
    where
        L: Lookup + ?Sized,
    {
        let limit = self.max_fallback.map_or(usize::MAX, |max| max.saturating_add(1));
        for (fallback_steps, candidate) in key.ancestors().enumerate().take(limit) {
            #[cfg(feature = "tracing")]
            tracing::trace!(requested = %key, candidate = %candidate, "probing");

            if let Some(value) = lookup.lookup(&candidate) {
                #[cfg(feature = "tracing")]
                log_fallback(key, &candidate, fallback_steps);
                return Some(Resolved {
                    key: candidate,
                    fallback_steps,
                    value,
                });
            }
        }
        None
    }
}

#[cfg(feature = "tracing")]
fn log_fallback(requested: &ContentType, resolved: &ContentType, fallback_steps: usize) {
    if fallback_steps > 0 {
        tracing::debug!(
            requested = %requested,
            resolved = %resolved,
            fallback_steps,
            "resolved through fallback"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ct(s: &str) -> ContentType {
        s.parse().unwrap()
    }

    fn table(keys: &[&'static str]) -> HashMap<ContentType, &'static str> {
        keys.iter().map(|k| (ct(k), *k)).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let table = table(&["a.b.c+x", "a.b+x"]);
        let resolved = HierarchicalResolver::new()
            .resolve(&ct("a.b.c+x"), &table)
            .unwrap();
        assert_eq!(resolved.value, "a.b.c+x");
        assert!(resolved.is_exact());
    }

    #[test]
    fn test_fallback_keeps_suffix() {
        let table = table(&["a.b+x", "a.b.c"]);
        let resolved = HierarchicalResolver::new()
            .resolve(&ct("a.b.c.d+x"), &table)
            .unwrap();
        assert_eq!(resolved.value, "a.b+x");
        assert_eq!(resolved.key, ct("a.b+x"));
        assert_eq!(resolved.fallback_steps, 2);
    }

    #[test]
    fn test_exhaustion() {
        let table = table(&["a.b+y", "z+x"]);
        assert!(HierarchicalResolver::new().resolve(&ct("a.b.c+x"), &table).is_none());
    }

    #[test]
    fn test_suffix_only_fails_immediately() {
        let table = table(&["a+x"]);
        assert!(HierarchicalResolver::new().resolve(&ct("+x"), &table).is_none());
        assert!(HierarchicalResolver::new().resolve(&ContentType::none(), &table).is_none());
    }

    #[test]
    fn test_max_fallback() {
        let table = table(&["a+x"]);
        let key = ct("a.b.c+x");

        assert!(HierarchicalResolver::exact().resolve(&key, &table).is_none());
        assert!(
            HierarchicalResolver::new()
                .with_max_fallback(Some(1))
                .resolve(&key, &table)
                .is_none()
        );
        let resolved = HierarchicalResolver::new()
            .with_max_fallback(Some(2))
            .resolve(&key, &table)
            .unwrap();
        assert_eq!(resolved.fallback_steps, 2);
    }
}
