//! Content-type keyed registry.
//!
//! The registry maps a [`ContentType`] to one [`RegistryEntry`]: an
//! implementation plus the [`Lifetime`] governing how instances are shared.
//! Keys are unique: registering an existing key fails and leaves the
//! original entry in place.
//!
//! Storage is a sharded concurrent map. Registration takes the shard's
//! write lock through the entry API, so insert-if-absent is atomic;
//! lookups clone an `Arc` out and release the shard before any factory
//! runs.

use crate::{resolver::HierarchicalResolver, resolver::Resolved, scope::Scope};
use dashmap::{DashMap, mapref::entry::Entry};
use kindred_core::{
    Activated, Activator, BoxError, ContentType, ContentTypeError, Container, Implementation,
    IntoContentType, Lifetime, Lookup, RegistryError,
};
use parking_lot::Mutex;
use std::{
    any::Any,
    fmt,
    sync::{Arc, OnceLock},
};

// ============================================================================
// RegistryEntry - one immutable registration
// ============================================================================

/// A single registration: key, implementation and lifetime.
pub struct RegistryEntry {
    key: ContentType,
    implementation: Implementation,
    lifetime: Lifetime,
    singleton: OnceLock<Activated>,
    init: Mutex<()>,
}

impl RegistryEntry {
    fn new(key: ContentType, implementation: Implementation, lifetime: Lifetime) -> Self {
        Self {
            key,
            implementation,
            lifetime,
            singleton: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The registered key.
    pub fn key(&self) -> &ContentType {
        &self.key
    }

    /// The lifetime policy.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// The implementation identity.
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Rust type name of what this entry produces.
    pub fn type_name(&self) -> &'static str {
        self.implementation.type_name()
    }

    /// Whether the singleton instance has been created.
    pub fn is_activated(&self) -> bool {
        self.singleton.get().is_some()
    }

    fn construct(&self, activator: &dyn Activator) -> Result<Activated, RegistryError> {
        self.implementation
            .construct(activator)
            .map(|instance| Activated {
                instance,
                type_name: self.implementation.type_name(),
            })
            .map_err(|source| RegistryError::Activation {
                key: self.key.to_string(),
                source,
            })
    }

    // Double-checked: the cell answers the fast path, the mutex makes the
    // fallible factory run at most once.
    fn singleton(&self, activator: &dyn Activator) -> Result<Activated, RegistryError> {
        if let Some(activated) = self.singleton.get() {
            return Ok(activated.clone());
        }
        let _guard = self.init.lock();
        if let Some(activated) = self.singleton.get() {
            return Ok(activated.clone());
        }
        let activated = self.construct(activator)?;
        let _ = self.singleton.set(activated.clone());
        Ok(activated)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("key", &self.key.to_string())
            .field("lifetime", &self.lifetime)
            .field("type_name", &self.type_name())
            .field("activated", &self.is_activated())
            .finish()
    }
}

// ============================================================================
// Registry - concurrent, insert-once storage
// ============================================================================

/// A thread-safe registry of content-type keyed implementations.
///
/// Construct one at startup, register everything, then share it (usually
/// behind an `Arc`) with the dispatch sites. There is no global instance.
///
/// # Example
/// ```
/// use kindred_std::Registry;
///
/// let registry = Registry::new();
/// registry.register_instance("app.greeting", String::from("hello")).unwrap();
///
/// let greeting = registry.resolve_instance::<String>("app.greeting", None).unwrap();
/// assert_eq!(greeting.as_str(), "hello");
///
/// // Keys are unique.
/// assert!(registry.register_instance("app.greeting", String::from("hi")).is_err());
/// ```
#[derive(Default)]
pub struct Registry {
    entries: DashMap<ContentType, Arc<RegistryEntry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fluent builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Register an implementation under `key`.
    ///
    /// Returns the parsed key. Fails with [`RegistryError::AlreadyRegistered`]
    /// if the key is taken; the existing entry is not touched.
    pub fn register(
        &self,
        key: impl IntoContentType,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> Result<ContentType, RegistryError> {
        let key = key.into_content_type()?;
        if key.is_none() {
            return Err(ContentTypeError::Empty(key.to_string()).into());
        }

        match self.entries.entry(key.clone()) {
            Entry::Occupied(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = %key, "rejected duplicate registration");
                Err(RegistryError::AlreadyRegistered {
                    key: key.to_string(),
                })
            }
            Entry::Vacant(vacant) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    key = %key,
                    lifetime = %lifetime,
                    type_name = implementation.type_name(),
                    "registered"
                );
                vacant.insert(Arc::new(RegistryEntry::new(
                    key.clone(),
                    implementation,
                    lifetime,
                )));
                Ok(key)
            }
        }
    }

    /// Register a factory whose instance is shared for the registry's lifetime.
    pub fn register_singleton<T, F>(
        &self,
        key: impl IntoContentType,
        factory: F,
    ) -> Result<ContentType, RegistryError>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(key, Implementation::factory(factory), Lifetime::Singleton)
    }

    /// Register a factory whose instance is shared within one [`Scope`].
    pub fn register_scoped<T, F>(
        &self,
        key: impl IntoContentType,
        factory: F,
    ) -> Result<ContentType, RegistryError>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(key, Implementation::factory(factory), Lifetime::Scoped)
    }

    /// Register a factory that runs on every activation.
    pub fn register_transient<T, F>(
        &self,
        key: impl IntoContentType,
        factory: F,
    ) -> Result<ContentType, RegistryError>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.register(key, Implementation::factory(factory), Lifetime::Transient)
    }

    /// Register a fixed instance.
    pub fn register_instance<T: Any + Send + Sync>(
        &self,
        key: impl IntoContentType,
        value: T,
    ) -> Result<ContentType, RegistryError> {
        self.register(key, Implementation::instance(value), Lifetime::Singleton)
    }

    /// Register a concrete type built with `Default`.
    pub fn register_default<T: Default + Any + Send + Sync>(
        &self,
        key: impl IntoContentType,
        lifetime: Lifetime,
    ) -> Result<ContentType, RegistryError> {
        self.register(key, Implementation::of_default::<T>(), lifetime)
    }

    /// Exact lookup. Does not walk the hierarchy.
    pub fn resolve(&self, key: &ContentType) -> Option<Arc<RegistryEntry>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Lookup walking up the content-type hierarchy on a miss.
    pub fn resolve_recursive(&self, key: &ContentType) -> Option<Resolved<Arc<RegistryEntry>>> {
        HierarchicalResolver::new().resolve(key, self)
    }

    /// Whether `key` has an entry. Invalid keys are never registered.
    pub fn contains(&self, key: impl IntoContentType) -> bool {
        key.into_content_type()
            .is_ok_and(|key| self.entries.contains_key(&key))
    }

    /// Activate the entry at `key`, honoring its lifetime.
    ///
    /// Scoped entries need a `scope`; the others ignore it.
    pub fn activate(
        &self,
        key: impl IntoContentType,
        scope: Option<&Scope>,
    ) -> Result<Activated, RegistryError> {
        let key = key.into_content_type()?;
        let entry = self.resolve(&key).ok_or_else(|| RegistryError::NotFound {
            key: key.to_string(),
        })?;
        self.activate_entry(&entry, scope)
    }

    /// Activate an entry obtained from [`Registry::resolve`].
    pub fn activate_entry(
        &self,
        entry: &RegistryEntry,
        scope: Option<&Scope>,
    ) -> Result<Activated, RegistryError> {
        match entry.lifetime {
            // Singletons never see the caller's scope, so they cannot capture
            // a scoped dependency.
            Lifetime::Singleton => entry.singleton(&ActivationContext::new(self, None)),
            Lifetime::Scoped => {
                let scope = scope.ok_or_else(|| RegistryError::ScopeRequired {
                    key: entry.key.to_string(),
                })?;
                if let Some(activated) = scope.get(&entry.key) {
                    return Ok(activated);
                }
                let activated = entry.construct(&ActivationContext::new(self, Some(scope)))?;
                Ok(scope.get_or_insert(&entry.key, activated))
            }
            Lifetime::Transient => entry.construct(&ActivationContext::new(self, scope)),
        }
    }

    /// Activate `key` and downcast it to `T`.
    pub fn resolve_instance<T: Any + Send + Sync>(
        &self,
        key: impl IntoContentType,
        scope: Option<&Scope>,
    ) -> Result<Arc<T>, RegistryError> {
        let key = key.into_content_type()?;
        self.activate(&key, scope)?.downcast(&key.to_string())
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<ContentType> {
        let mut keys: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Registered keys whose suffix equals `suffix`, ignoring case. Sorted.
    pub fn keys_with_suffix(&self, suffix: &str) -> Vec<ContentType> {
        let suffix = suffix.to_lowercase();
        let mut keys: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.key().suffix().to_lowercase() == suffix)
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Activate every entry with `suffix` that produces a `T`.
    ///
    /// Entries of other types are skipped; activation errors are returned.
    pub fn activate_all_with_suffix<T: Any + Send + Sync>(
        &self,
        suffix: &str,
        scope: Option<&Scope>,
    ) -> Result<Vec<(ContentType, Arc<T>)>, RegistryError> {
        let wanted = std::any::type_name::<T>();
        let mut out = Vec::new();
        for key in self.keys_with_suffix(suffix) {
            let Some(entry) = self.resolve(&key) else {
                continue;
            };
            if entry.type_name() != wanted {
                continue;
            }
            // Type names are not unique; the downcast decides.
            let Ok(instance) = self.activate_entry(&entry, scope)?.instance.downcast::<T>() else {
                continue;
            };
            out.push((key, instance));
        }
        Ok(out)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Lookup for Registry {
    type Value = Arc<RegistryEntry>;

    fn lookup(&self, key: &ContentType) -> Option<Self::Value> {
        self.resolve(key)
    }
}

impl Container for Registry {
    type Scope = Scope;

    fn register(
        &self,
        key: ContentType,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> Result<(), RegistryError> {
        Registry::register(self, key, implementation, lifetime).map(drop)
    }

    fn activate_in(
        &self,
        key: &ContentType,
        scope: Option<&Scope>,
    ) -> Result<Activated, RegistryError> {
        self.activate(key, scope)
    }

    fn registered_keys(&self) -> Vec<ContentType> {
        self.keys()
    }
}

/// The [`Activator`] handed to factories: same registry, same scope.
struct ActivationContext<'a> {
    registry: &'a Registry,
    scope: Option<&'a Scope>,
}

impl<'a> ActivationContext<'a> {
    fn new(registry: &'a Registry, scope: Option<&'a Scope>) -> Self {
        Self { registry, scope }
    }
}

impl Activator for ActivationContext<'_> {
    fn activate(&self, key: &str) -> Result<Activated, RegistryError> {
        self.registry.activate(key, self.scope)
    }
}

// ============================================================================
// RegistryBuilder - fluent startup configuration
// ============================================================================

/// Builder for constructing a [`Registry`].
///
/// Registrations are applied in order; the first failure is kept and
/// returned by [`RegistryBuilder::build`].
///
/// # Example
/// ```
/// use kindred_std::RegistryBuilder;
///
/// let registry = RegistryBuilder::new()
///     .instance("app.name", String::from("kindred"))
///     .transient("app.buffer", |_| Ok(Vec::<u8>::with_capacity(64)))
///     .build()
///     .unwrap();
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
    error: Option<RegistryError>,
}

impl RegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a registration step unless an earlier one failed.
    pub fn configure<F, T>(mut self, step: F) -> Self
    where
        F: FnOnce(&Registry) -> Result<T, RegistryError>,
    {
        if self.error.is_none() {
            if let Err(err) = step(&self.registry) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Register an implementation with an explicit lifetime.
    pub fn register(
        self,
        key: impl IntoContentType,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> Self {
        self.configure(|registry| registry.register(key, implementation, lifetime))
    }

    /// Register a fixed instance.
    pub fn instance<T: Any + Send + Sync>(self, key: impl IntoContentType, value: T) -> Self {
        self.configure(|registry| registry.register_instance(key, value))
    }

    /// Register a singleton factory.
    pub fn singleton<T, F>(self, key: impl IntoContentType, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.configure(|registry| registry.register_singleton(key, factory))
    }

    /// Register a scoped factory.
    pub fn scoped<T, F>(self, key: impl IntoContentType, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.configure(|registry| registry.register_scoped(key, factory))
    }

    /// Register a transient factory.
    pub fn transient<T, F>(self, key: impl IntoContentType, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.configure(|registry| registry.register_transient(key, factory))
    }

    /// Build the registry, or return the first registration error.
    pub fn build(self) -> Result<Registry, RegistryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.registry),
        }
    }
}
