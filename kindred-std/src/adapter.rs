//! Type-erased handler adapters.
//!
//! A handler is written against the payload shape it cares about
//! (`&Textbox`, `Arc<Textbox>`, `&dyn Payload`, ...). The dispatcher only
//! ever holds a `dyn Payload`, so every registered handler is wrapped in an
//! adapter that narrows the payload back to that shape before calling it.
//! The narrowing is checked: a payload of the wrong type is reported as
//! [`DispatchError::PayloadTypeMismatch`].
//!
//! Adapters are stored in the registry as a [`HandlerSlot`] under the
//! handler key `<payload content type>+<lower-cased class>`.

use crate::registry::Registry;
use futures::future::BoxFuture;
use kindred_core::{
    Activator, AnyPayload, BoxError, ContentType, ContentTypeError, ContentTyped, DispatchError,
    Handler, Implementation, IntoContentType, Lifetime, Narrow, PayloadAny, RegistryError,
    SyncHandler,
};
use std::{fmt, marker::PhantomData, sync::Arc};

/// Build the registry key for `class` handlers of `payload_type`.
///
/// The class is lower-cased. The payload type must be a plain hierarchy:
/// none and suffixed content types are rejected.
///
/// ```
/// use kindred_core::ContentType;
/// use kindred_std::handler_key;
///
/// let ct = ContentType::parse("ui.textbox").unwrap();
/// assert_eq!(handler_key(&ct, "Render").unwrap().to_string(), "ui.textbox+render");
/// ```
pub fn handler_key(payload_type: &ContentType, class: &str) -> Result<ContentType, ContentTypeError> {
    if payload_type.has_suffix() {
        return Err(ContentTypeError::UnexpectedSuffix(payload_type.to_string()));
    }
    if payload_type.is_none() {
        return Err(ContentTypeError::Empty(format!(
            "{}{class}",
            ContentType::SUFFIX_SEPARATOR
        )));
    }
    payload_type.with_suffix(&class.to_lowercase())
}

// ============================================================================
// Erased capability
// ============================================================================

/// Object-safe synchronous handler over `dyn Payload`.
pub trait ErasedSyncHandler<A, R>: Send + Sync {
    /// Narrow `payload` and invoke the handler.
    fn call_erased(&self, key: &ContentType, payload: &AnyPayload, args: A)
    -> Result<R, DispatchError>;
}

/// Object-safe asynchronous handler over `dyn Payload`.
pub trait ErasedAsyncHandler<A, R>: Send + Sync {
    /// Narrow `payload` and start the handler.
    ///
    /// Narrowing happens before the future is created, so a mismatch is
    /// reported without polling.
    fn call_erased(
        &self,
        key: &ContentType,
        payload: Arc<AnyPayload>,
        args: A,
    ) -> Result<BoxFuture<'static, R>, DispatchError>;
}

fn mismatch<P: Narrow + ?Sized>(key: &ContentType, actual: &'static str) -> DispatchError {
    DispatchError::PayloadTypeMismatch {
        key: key.to_string(),
        expected: P::expected_name(),
        actual,
    }
}

/// Adapts a [`SyncHandler`] for payload shape `P`.
pub struct SyncAdapter<P: ?Sized, H> {
    handler: H,
    _payload: PhantomData<fn(&P)>,
}

impl<P: ?Sized, H> SyncAdapter<P, H> {
    /// Wrap a handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _payload: PhantomData,
        }
    }
}

impl<P, A, H> ErasedSyncHandler<A, H::Output> for SyncAdapter<P, H>
where
    P: Narrow + ?Sized,
    H: SyncHandler<P, A>,
{
    fn call_erased(
        &self,
        key: &ContentType,
        payload: &AnyPayload,
        args: A,
    ) -> Result<H::Output, DispatchError> {
        let narrowed = P::narrow_ref(payload)
            .ok_or_else(|| mismatch::<P>(key, PayloadAny::type_name(payload)))?;
        Ok(self.handler.call(narrowed, args))
    }
}

/// Adapts a [`Handler`] for payload shape `P`.
pub struct AsyncAdapter<P: ?Sized, H> {
    handler: Arc<H>,
    _payload: PhantomData<fn(Arc<P>)>,
}

impl<P: ?Sized, H> AsyncAdapter<P, H> {
    /// Wrap a handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            _payload: PhantomData,
        }
    }
}

impl<P, A, H> ErasedAsyncHandler<A, H::Output> for AsyncAdapter<P, H>
where
    P: Narrow + ?Sized,
    A: Send + 'static,
    H: Handler<P, A>,
{
    fn call_erased(
        &self,
        key: &ContentType,
        payload: Arc<AnyPayload>,
        args: A,
    ) -> Result<BoxFuture<'static, H::Output>, DispatchError> {
        let actual = PayloadAny::type_name(&*payload);
        let narrowed = P::narrow_arc(payload).ok_or_else(|| mismatch::<P>(key, actual))?;
        let handler = self.handler.clone();
        Ok(Box::pin(async move { handler.call(narrowed, args).await }))
    }
}

// ============================================================================
// HandlerSlot - what the registry stores
// ============================================================================

/// A registered handler with argument tuple `A` and output `R`.
pub enum HandlerSlot<A, R> {
    /// Invoked inline.
    Sync(Arc<dyn ErasedSyncHandler<A, R>>),
    /// Returns a future.
    Async(Arc<dyn ErasedAsyncHandler<A, R>>),
}

impl<A: 'static, R: 'static> HandlerSlot<A, R> {
    /// Wrap a synchronous handler for payload shape `P`.
    pub fn sync<P, H>(handler: H) -> Self
    where
        P: Narrow + ?Sized,
        H: SyncHandler<P, A, Output = R>,
    {
        HandlerSlot::Sync(Arc::new(SyncAdapter::<P, H>::new(handler)))
    }

    /// Wrap an asynchronous handler for payload shape `P`.
    pub fn from_async<P, H>(handler: H) -> Self
    where
        P: Narrow + ?Sized,
        A: Send,
        H: Handler<P, A, Output = R>,
    {
        HandlerSlot::Async(Arc::new(AsyncAdapter::<P, H>::new(handler)))
    }

    /// Whether the handler is asynchronous.
    pub fn is_async(&self) -> bool {
        matches!(self, HandlerSlot::Async(_))
    }
}

impl<A, R> Clone for HandlerSlot<A, R> {
    fn clone(&self) -> Self {
        match self {
            HandlerSlot::Sync(h) => HandlerSlot::Sync(h.clone()),
            HandlerSlot::Async(h) => HandlerSlot::Async(h.clone()),
        }
    }
}

impl<A, R> fmt::Debug for HandlerSlot<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if matches!(self, HandlerSlot::Async(_)) {
            "async"
        } else {
            "sync"
        };
        f.debug_tuple("HandlerSlot").field(&kind).finish()
    }
}

/// Human-readable signature used in [`DispatchError::SignatureMismatch`].
pub(crate) fn signature<A, R>() -> &'static str {
    std::any::type_name::<fn(A) -> R>()
}

// ============================================================================
// Registration
// ============================================================================

impl Registry {
    /// Register a synchronous `class` handler for payload type `P`.
    ///
    /// The key is `P::CONTENT_TYPE + "+" + class`, lower-cased.
    pub fn register_handler<P, A, H>(
        &self,
        class: &str,
        handler: H,
    ) -> Result<ContentType, RegistryError>
    where
        P: ContentTyped + Narrow,
        A: 'static,
        H: SyncHandler<P, A>,
    {
        self.register_handler_for::<P, A, H>(P::declared()?, class, handler)
    }

    /// Register a synchronous `class` handler under an explicit payload
    /// content type.
    ///
    /// Use `P = AnyPayload` for a handler that serves a whole family.
    pub fn register_handler_for<P, A, H>(
        &self,
        content_type: impl IntoContentType,
        class: &str,
        handler: H,
    ) -> Result<ContentType, RegistryError>
    where
        P: Narrow + ?Sized,
        A: 'static,
        H: SyncHandler<P, A>,
    {
        let key = handler_key(&content_type.into_content_type()?, class)?;
        let slot = HandlerSlot::<A, H::Output>::sync::<P, H>(handler);
        self.register(key, Implementation::instance(slot).into_handler(), Lifetime::Singleton)
    }

    /// Register an asynchronous `class` handler for payload type `P`.
    pub fn register_async_handler<P, A, H>(
        &self,
        class: &str,
        handler: H,
    ) -> Result<ContentType, RegistryError>
    where
        P: ContentTyped + Narrow,
        A: Send + 'static,
        H: Handler<P, A>,
    {
        self.register_async_handler_for::<P, A, H>(P::declared()?, class, handler)
    }

    /// Register an asynchronous `class` handler under an explicit payload
    /// content type.
    pub fn register_async_handler_for<P, A, H>(
        &self,
        content_type: impl IntoContentType,
        class: &str,
        handler: H,
    ) -> Result<ContentType, RegistryError>
    where
        P: Narrow + ?Sized,
        A: Send + 'static,
        H: Handler<P, A>,
    {
        let key = handler_key(&content_type.into_content_type()?, class)?;
        let slot = HandlerSlot::<A, H::Output>::from_async::<P, H>(handler);
        self.register(key, Implementation::instance(slot).into_handler(), Lifetime::Singleton)
    }

    /// Register a synchronous handler built by a factory.
    ///
    /// The factory runs according to `lifetime`, so a scoped handler can
    /// pull scoped dependencies from the activator.
    pub fn register_handler_factory<P, A, H, F>(
        &self,
        content_type: impl IntoContentType,
        class: &str,
        lifetime: Lifetime,
        factory: F,
    ) -> Result<ContentType, RegistryError>
    where
        P: Narrow + ?Sized,
        A: 'static,
        H: SyncHandler<P, A>,
        F: Fn(&dyn Activator) -> Result<H, BoxError> + Send + Sync + 'static,
    {
        let key = handler_key(&content_type.into_content_type()?, class)?;
        let implementation = Implementation::factory(move |deps: &dyn Activator| {
            factory(deps).map(HandlerSlot::<A, H::Output>::sync::<P, H>)
        })
        .into_handler();
        self.register(key, implementation, lifetime)
    }

    /// Register an asynchronous handler built by a factory.
    pub fn register_async_handler_factory<P, A, H, F>(
        &self,
        content_type: impl IntoContentType,
        class: &str,
        lifetime: Lifetime,
        factory: F,
    ) -> Result<ContentType, RegistryError>
    where
        P: Narrow + ?Sized,
        A: Send + 'static,
        H: Handler<P, A>,
        F: Fn(&dyn Activator) -> Result<H, BoxError> + Send + Sync + 'static,
    {
        let key = handler_key(&content_type.into_content_type()?, class)?;
        let implementation = Implementation::factory(move |deps: &dyn Activator| {
            factory(deps).map(HandlerSlot::<A, H::Output>::from_async::<P, H>)
        })
        .into_handler();
        self.register(key, implementation, lifetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestPayload;
    use kindred_core::Payload;

    struct Textbox {
        text: &'static str,
    }

    impl ContentTyped for Textbox {
        const CONTENT_TYPE: &'static str = "ui.textbox";
    }

    impl Payload for Textbox {
        fn declared_content_type(&self) -> Option<&'static str> {
            Some(Self::CONTENT_TYPE)
        }
    }

    fn ct(s: &str) -> ContentType {
        s.parse().unwrap()
    }

    #[test]
    fn test_handler_key() {
        assert_eq!(
            handler_key(&ct("a.b"), "LOGGER").unwrap().to_string(),
            "a.b+logger"
        );
        assert!(matches!(
            handler_key(&ct("a.b+x"), "y"),
            Err(ContentTypeError::UnexpectedSuffix(_))
        ));
        assert!(matches!(
            handler_key(&ContentType::none(), "y"),
            Err(ContentTypeError::Empty(_))
        ));
        assert!(matches!(
            handler_key(&ct("a"), ""),
            Err(ContentTypeError::EmptySuffix(_))
        ));
        assert!(matches!(
            handler_key(&ct("a"), "x+y"),
            Err(ContentTypeError::MultipleSuffixes(_))
        ));
    }

    #[test]
    fn test_sync_adapter_narrows() {
        let adapter = SyncAdapter::<Textbox, _>::new(|t: &Textbox| t.text.len());
        let key = ct("ui.textbox+len");

        let out = adapter.call_erased(&key, &Textbox { text: "abc" }, ()).unwrap();
        assert_eq!(out, 3);

        let other = TestPayload::new("ui.textbox").unwrap();
        match adapter.call_erased(&key, &other, ()).unwrap_err() {
            DispatchError::PayloadTypeMismatch { key, expected, actual } => {
                assert_eq!(key, "ui.textbox+len");
                assert!(expected.ends_with("Textbox"));
                assert!(actual.ends_with("TestPayload"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_base_adapter_accepts_any_payload() {
        let adapter = SyncAdapter::<AnyPayload, _>::new(|p: &AnyPayload, prefix: &'static str| {
            format!("{prefix}{}", PayloadAny::type_name(p).rsplit("::").next().unwrap_or(""))
        });
        let out = adapter
            .call_erased(&ct("ui+name"), &Textbox { text: "" }, ("> ",))
            .unwrap();
        assert_eq!(out, "> Textbox");
    }

    #[tokio::test]
    async fn test_async_adapter() {
        let adapter = AsyncAdapter::<Textbox, _>::new(|t: Arc<Textbox>, n: usize| async move {
            t.text.repeat(n)
        });
        let key = ct("ui.textbox+repeat");

        let fut = adapter
            .call_erased(&key, Arc::new(Textbox { text: "ab" }), (2,))
            .unwrap();
        assert_eq!(fut.await, "abab");

        let other: Arc<AnyPayload> = Arc::new(TestPayload::new("ui.textbox").unwrap());
        assert!(matches!(
            adapter.call_erased(&key, other, (1,)),
            Err(DispatchError::PayloadTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_register_handler_keys() {
        let registry = Registry::new();
        let key = registry
            .register_handler::<Textbox, _, _>("Render", |t: &Textbox| t.text.to_string())
            .unwrap();
        assert_eq!(key.to_string(), "ui.textbox+render");

        let err = registry
            .register_handler::<Textbox, _, _>("RENDER", |_: &Textbox| String::new())
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));

        let err = registry
            .register_handler_for::<AnyPayload, _, _>("ui+x", "render", |_: &AnyPayload| ())
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidKey(ContentTypeError::UnexpectedSuffix(_))
        ));

        let slot = registry
            .resolve_instance::<HandlerSlot<(), String>>(&key, None)
            .unwrap();
        assert!(!slot.is_async());
    }

    #[test]
    fn test_handler_factory_lifetime() {
        let registry = Registry::new();
        registry.register_instance("app.prefix", String::from("#")).unwrap();
        registry
            .register_handler_factory::<Textbox, _, _, _>(
                "ui.textbox",
                "render",
                Lifetime::Transient,
                |deps| {
                    let prefix = deps.resolve::<String>("app.prefix")?;
                    Ok(move |t: &Textbox| format!("{prefix}{}", t.text))
                },
            )
            .unwrap();

        let slot = registry
            .resolve_instance::<HandlerSlot<(), String>>("ui.textbox+render", None)
            .unwrap();
        let HandlerSlot::Sync(handler) = &*slot else {
            panic!("expected a sync handler");
        };
        let out = handler
            .call_erased(&ct("ui.textbox+render"), &Textbox { text: "hi" }, ())
            .unwrap();
        assert_eq!(out, "#hi");
    }
}
