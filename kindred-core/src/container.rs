//! The container contract the registry fulfils.
//!
//! An entry pairs an [`Implementation`] (what to hand out) with a
//! [`Lifetime`] (how often to build it). Factories receive an
//! [`Activator`] so they can pull their own dependencies out of the same
//! container and scope.

use crate::{
    content_type::ContentType,
    error::{BoxError, ContentTypeError, RegistryError},
};
use std::{any::Any, fmt, sync::Arc};

/// A type-erased, shared instance handed out by a container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A type-erased factory.
pub type Factory = Arc<dyn Fn(&dyn Activator) -> Result<Instance, BoxError> + Send + Sync>;

/// How many instances an entry produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// One instance for the container's whole lifetime.
    #[default]
    Singleton,
    /// One instance per scope.
    Scoped,
    /// A fresh instance on every activation.
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        })
    }
}

#[derive(Clone)]
enum Source {
    Instance(Instance),
    Factory(Factory),
}

/// The implementation identity of an entry: a fixed instance or a factory.
///
/// A fixed instance is shared whatever the entry's lifetime.
#[derive(Clone)]
pub struct Implementation {
    source: Source,
    type_name: &'static str,
    handler: bool,
}

impl Implementation {
    /// A fixed instance.
    pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// A fixed instance that is already shared.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            source: Source::Instance(value),
            type_name: std::any::type_name::<T>(),
            handler: false,
        }
    }

    /// A fallible factory.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            source: Source::Factory(Arc::new(move |activator: &dyn Activator| {
                factory(activator).map(|value| Arc::new(value) as Instance)
            })),
            type_name: std::any::type_name::<T>(),
            handler: false,
        }
    }

    /// A concrete type built with `Default`.
    pub fn of_default<T: Default + Any + Send + Sync>() -> Self {
        Self::factory(|_| Ok(T::default()))
    }

    /// Rust type name of what this implementation produces.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Mark this implementation as a dispatch handler.
    pub fn into_handler(mut self) -> Self {
        self.handler = true;
        self
    }

    /// Whether this implementation was registered as a dispatch handler.
    pub fn is_handler(&self) -> bool {
        self.handler
    }

    /// Whether this is a fixed instance.
    pub fn is_instance(&self) -> bool {
        matches!(self.source, Source::Instance(_))
    }

    /// Produce an instance: clone the fixed one or run the factory.
    pub fn construct(&self, activator: &dyn Activator) -> Result<Instance, BoxError> {
        match &self.source {
            Source::Instance(instance) => Ok(instance.clone()),
            Source::Factory(factory) => factory(activator),
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("type_name", &self.type_name)
            .field("instance", &self.is_instance())
            .field("handler", &self.handler)
            .finish()
    }
}

/// An activated instance together with the type it was registered as.
#[derive(Clone)]
pub struct Activated {
    /// The instance.
    pub instance: Instance,
    /// Rust type name of the instance.
    pub type_name: &'static str,
}

impl Activated {
    /// Downcast to `T`, reporting a [`RegistryError::TypeMismatch`] on failure.
    pub fn downcast<T: Any + Send + Sync>(self, key: &str) -> Result<Arc<T>, RegistryError> {
        let actual = self.type_name;
        self.instance
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for Activated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activated")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Resolves dependencies from inside a factory.
pub trait Activator {
    /// Activate the entry registered under `key`.
    fn activate(&self, key: &str) -> Result<Activated, RegistryError>;
}

impl dyn Activator + '_ {
    /// Activate `key` and downcast it to `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>, RegistryError> {
        self.activate(key)?.downcast(key)
    }
}

/// The container operations the registry is built on.
pub trait Container: Send + Sync {
    /// The scope type used for [`Lifetime::Scoped`] entries.
    type Scope;

    /// Add an entry. Fails if `key` is already present.
    fn register(
        &self,
        key: ContentType,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> Result<(), RegistryError>;

    /// Activate the entry at `key`, honoring its lifetime.
    fn activate_in(
        &self,
        key: &ContentType,
        scope: Option<&Self::Scope>,
    ) -> Result<Activated, RegistryError>;

    /// Every registered key.
    fn registered_keys(&self) -> Vec<ContentType>;
}

/// Conversion into a registration key.
///
/// Lets registry methods take either a parsed [`ContentType`] or text.
pub trait IntoContentType {
    /// Convert, validating text.
    fn into_content_type(self) -> Result<ContentType, ContentTypeError>;
}

impl IntoContentType for ContentType {
    fn into_content_type(self) -> Result<ContentType, ContentTypeError> {
        Ok(self)
    }
}

impl IntoContentType for &ContentType {
    fn into_content_type(self) -> Result<ContentType, ContentTypeError> {
        Ok(self.clone())
    }
}

impl IntoContentType for &str {
    fn into_content_type(self) -> Result<ContentType, ContentTypeError> {
        ContentType::parse(self)
    }
}

impl IntoContentType for String {
    fn into_content_type(self) -> Result<ContentType, ContentTypeError> {
        ContentType::parse(&self)
    }
}

impl IntoContentType for &String {
    fn into_content_type(self) -> Result<ContentType, ContentTypeError> {
        ContentType::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDependencies;

    impl Activator for NoDependencies {
        fn activate(&self, key: &str) -> Result<Activated, RegistryError> {
            Err(RegistryError::NotFound {
                key: key.to_string(),
            })
        }
    }

    #[test]
    fn test_instance_is_shared() {
        let implementation = Implementation::instance(5u32);
        assert!(implementation.is_instance());
        let a = implementation.construct(&NoDependencies).unwrap();
        let b = implementation.construct(&NoDependencies).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_builds_fresh_values() {
        let implementation = Implementation::factory(|_| Ok(String::from("fresh")));
        assert!(!implementation.is_instance());
        assert_eq!(implementation.type_name(), std::any::type_name::<String>());

        let a = implementation.construct(&NoDependencies).unwrap();
        let b = implementation.construct(&NoDependencies).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.downcast_ref::<String>().unwrap(), "fresh");
    }

    #[test]
    fn test_handler_marker() {
        assert!(!Implementation::instance(1u8).is_handler());
        let marked = Implementation::factory(|_| Ok(1u8)).into_handler();
        assert!(marked.is_handler());
        assert!(marked.clone().is_handler());
    }

    #[test]
    fn test_factory_error_passes_through() {
        let implementation =
            Implementation::factory::<u8, _>(|deps| Ok(*deps.resolve::<u8>("missing")?));
        let err = implementation.construct(&NoDependencies).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_activated_downcast_mismatch() {
        let activated = Activated {
            instance: Arc::new(1u8),
            type_name: "u8",
        };
        match activated.downcast::<String>("k").unwrap_err() {
            RegistryError::TypeMismatch { key, actual, .. } => {
                assert_eq!(key, "k");
                assert_eq!(actual, "u8");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_content_type() {
        assert_eq!("a.b".into_content_type().unwrap().to_string(), "a.b");
        assert!("a..b".into_content_type().is_err());
        assert_eq!(Lifetime::default(), Lifetime::Singleton);
        assert_eq!(Lifetime::Scoped.to_string(), "scoped");
    }
}
