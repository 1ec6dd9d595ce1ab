//! Content-type dispatch.
//!
//! [`Dispatcher`] routes a payload and a handler class to the handler
//! registered for the payload's content type, or for its nearest ancestor.
//!
//! # Dispatch Flow
//!
//! ```text
//! payload ──► content type ──► + lower(class) ──► resolve (walk parents)
//!                                                        │
//!                         handler's own output ◄── narrow + invoke
//! ```
//!
//! Every failure before the handler runs is a [`DispatchError`]. Whatever
//! the handler returns, `Err` values included, comes back inside `Ok`.

use crate::{
    adapter::{HandlerSlot, handler_key, signature},
    registry::Registry,
    resolver::HierarchicalResolver,
    scope::Scope,
};
use kindred_core::{AnyPayload, ContentType, DispatchError, content_type_of};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::Instrument;

/// How far resolution may walk up the content-type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Try ancestors until one matches.
    #[default]
    Hierarchical,
    /// Only the payload's own content type.
    ExactOnly,
}

/// Routes payloads to handlers registered in a [`Registry`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kindred_core::{ContentTyped, Payload};
/// use kindred_std::{Dispatcher, Registry};
///
/// struct Textbox;
///
/// impl ContentTyped for Textbox {
///     const CONTENT_TYPE: &'static str = "ui.textbox";
/// }
///
/// impl Payload for Textbox {
///     fn declared_content_type(&self) -> Option<&'static str> {
///         Some(Self::CONTENT_TYPE)
///     }
/// }
///
/// let registry = Arc::new(Registry::new());
/// registry
///     .register_handler_for::<kindred_core::AnyPayload, _, _>("ui", "render", |_: &kindred_core::AnyPayload| "widget")
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(registry);
/// let out: &str = dispatcher.dispatch(&Textbox, "render", ()).unwrap();
/// assert_eq!(out, "widget");
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    resolver: HierarchicalResolver,
}

impl Dispatcher {
    /// Dispatch through `registry` with hierarchical fallback.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            resolver: HierarchicalResolver::new(),
        }
    }

    /// Configure a dispatcher.
    pub fn builder(registry: Arc<Registry>) -> DispatcherBuilder {
        DispatcherBuilder::new(registry)
    }

    /// The registry handlers are resolved from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Start a dispatch request for `class` with extra options.
    pub fn handler<'d>(&'d self, class: &'d str) -> DispatchRequest<'d> {
        DispatchRequest {
            dispatcher: self,
            class,
            content_type: None,
            scope: None,
        }
    }

    /// Dispatch `payload` to its synchronous `class` handler.
    pub fn dispatch<A, R>(
        &self,
        payload: &AnyPayload,
        class: &str,
        args: A,
    ) -> Result<R, DispatchError>
    where
        A: 'static,
        R: 'static,
    {
        self.handler(class).call(payload, args)
    }

    /// Dispatch `payload` to its `class` handler and await the result.
    ///
    /// Synchronous handlers run inline.
    pub async fn dispatch_async<A, R>(
        &self,
        payload: Arc<AnyPayload>,
        class: &str,
        args: A,
    ) -> Result<R, DispatchError>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        self.handler(class).call_async(payload, args).await
    }

    /// Fire-and-forget dispatch to a handler returning `()`.
    pub fn send<A: 'static>(
        &self,
        payload: &AnyPayload,
        class: &str,
        args: A,
    ) -> Result<(), DispatchError> {
        self.dispatch::<A, ()>(payload, class, args)
    }

    /// Whether a `class` handler would be found for `content_type`.
    pub fn can_dispatch(&self, content_type: &ContentType, class: &str) -> bool {
        handler_key(content_type, class)
            .ok()
            .and_then(|key| self.resolver.resolve(&key, &*self.registry))
            .is_some()
    }

    /// Payload content types with a `class` handler registered directly.
    ///
    /// Plain entries that happen to share the suffix are not handlers and
    /// are left out.
    pub fn handled_content_types(&self, class: &str) -> Vec<ContentType> {
        self.registry
            .keys_with_suffix(class)
            .into_iter()
            .filter(|key| {
                self.registry
                    .resolve(key)
                    .is_some_and(|entry| entry.implementation().is_handler())
            })
            .map(|key| key.without_suffix())
            .collect()
    }
}

/// A dispatch in preparation: class plus optional content type and scope.
#[derive(Debug, Clone, Copy)]
#[must_use = "a request does nothing until `call` or `call_async`"]
pub struct DispatchRequest<'d> {
    dispatcher: &'d Dispatcher,
    class: &'d str,
    content_type: Option<&'d ContentType>,
    scope: Option<&'d Scope>,
}

impl<'d> DispatchRequest<'d> {
    /// Use `content_type` instead of the payload's own.
    pub fn content_type(mut self, content_type: &'d ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Activate scoped handlers inside `scope`.
    pub fn scope(mut self, scope: &'d Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Invoke a synchronous handler.
    pub fn call<A, R>(self, payload: &AnyPayload, args: A) -> Result<R, DispatchError>
    where
        A: 'static,
        R: 'static,
    {
        let (key, slot) = self.resolve_slot::<A, R>(payload)?;
        match &*slot {
            HandlerSlot::Sync(handler) => handler.call_erased(&key, payload, args),
            HandlerSlot::Async(_) => Err(DispatchError::AsyncHandler {
                key: key.to_string(),
            }),
        }
    }

    /// Invoke a handler of either kind and await it.
    pub async fn call_async<A, R>(
        self,
        payload: Arc<AnyPayload>,
        args: A,
    ) -> Result<R, DispatchError>
    where
        A: Send + 'static,
        R: Send + 'static,
    {
        let (key, slot) = self.resolve_slot::<A, R>(&*payload)?;
        match &*slot {
            HandlerSlot::Sync(handler) => handler.call_erased(&key, &*payload, args),
            HandlerSlot::Async(handler) => {
                let future = handler.call_erased(&key, payload, args)?;
                #[cfg(feature = "tracing")]
                let future = future.instrument(tracing::debug_span!("dispatch", key = %key));
                Ok(future.await)
            }
        }
    }

    fn resolve_slot<A: 'static, R: 'static>(
        &self,
        payload: &AnyPayload,
    ) -> Result<(ContentType, Arc<HandlerSlot<A, R>>), DispatchError> {
        let payload_type = match self.content_type {
            Some(ct) => ct.clone(),
            None => content_type_of(payload)?,
        };
        let requested = handler_key(&payload_type, self.class)?;
        let registry = &*self.dispatcher.registry;

        let Some(resolved) = self.dispatcher.resolver.resolve(&requested, registry) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %requested, "no handler found");
            return Err(DispatchError::HandlerNotFound {
                key: requested.to_string(),
            });
        };

        let activated = registry.activate_entry(&resolved.value, self.scope)?;
        let slot = activated
            .instance
            .downcast::<HandlerSlot<A, R>>()
            .map_err(|_| DispatchError::SignatureMismatch {
                key: resolved.key.to_string(),
                expected: signature::<A, R>(),
            })?;
        Ok((resolved.key, slot))
    }
}

/// Builder for [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherBuilder {
    registry: Arc<Registry>,
    fallback: FallbackPolicy,
    max_fallback_depth: Option<usize>,
}

impl DispatcherBuilder {
    /// Start from `registry` with hierarchical, unlimited fallback.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            fallback: FallbackPolicy::default(),
            max_fallback_depth: None,
        }
    }

    /// Set the fallback policy.
    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Cap how many ancestors hierarchical fallback may try.
    pub fn max_fallback_depth(mut self, depth: usize) -> Self {
        self.max_fallback_depth = Some(depth);
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Dispatcher {
        let resolver = match self.fallback {
            FallbackPolicy::Hierarchical => {
                HierarchicalResolver::new().with_max_fallback(self.max_fallback_depth)
            }
            FallbackPolicy::ExactOnly => HierarchicalResolver::exact(),
        };
        Dispatcher {
            registry: self.registry,
            resolver,
        }
    }
}
