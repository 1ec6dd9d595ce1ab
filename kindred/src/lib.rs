//! # kindred - Content-Type Keyed Registry and Dispatch
//!
//! `kindred` maps hierarchical content types such as `ui.input.textbox` to
//! implementations and handlers. A payload is dispatched by its content
//! type plus a handler class (`render`, `log`, ...); when nothing is
//! registered for the exact type, the nearest registered ancestor
//! (`ui.input`, then `ui`) handles it.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use kindred::prelude::*;
//!
//! struct Textbox { text: String }
//!
//! impl ContentTyped for Textbox {
//!     const CONTENT_TYPE: &'static str = "ui.input.textbox";
//! }
//!
//! impl Payload for Textbox {
//!     fn declared_content_type(&self) -> Option<&'static str> {
//!         Some(Self::CONTENT_TYPE)
//!     }
//! }
//!
//! let registry = Arc::new(Registry::new());
//! // Specific handler...
//! registry
//!     .register_handler::<Textbox, _, _>("render", |t: &Textbox| format!("<input value={:?}>", t.text))
//!     .unwrap();
//! // ...and a fallback for the whole `ui` family.
//! registry
//!     .register_handler_for::<AnyPayload, _, _>("ui", "render", |_: &AnyPayload| String::from("<div/>"))
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(registry);
//! let html: String = dispatcher
//!     .dispatch(&Textbox { text: "hi".into() }, "render", ())
//!     .unwrap();
//! assert_eq!(html, "<input value=\"hi\">");
//! ```
//!
//! ## Features
//!
//! - `tracing` (default): registration, resolution and dispatch logging
//! - `macros`: `#[derive(Payload)]`
//! - `inventory`: distributed registration with [`collect::Registration`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use kindred_core::{
    // Container
    Activated,
    Activator,
    // Payload
    AnyPayload,
    // Identifier
    Ancestors,
    // Error types
    BoxError,
    Container,
    ContentType,
    ContentTypeError,
    ContentTyped,
    DispatchError,
    Factory,
    // Handler
    Handler,
    Implementation,
    Instance,
    IntoContentType,
    KindredError,
    Lifetime,
    Lookup,
    Narrow,
    Payload,
    PayloadAny,
    RegistryError,
    SyncHandler,
    content_type_of,
    payload_content_type,
};

pub use kindred_std::{
    // Adapters
    AsyncAdapter,
    // Dispatch
    DispatchRequest,
    Dispatcher,
    DispatcherBuilder,
    ErasedAsyncHandler,
    ErasedSyncHandler,
    FallbackPolicy,
    HandlerSlot,
    // Resolution
    HierarchicalResolver,
    // Storage
    Registry,
    RegistryBuilder,
    RegistryEntry,
    Resolved,
    Scope,
    SyncAdapter,
    handler_key,
};

/// Testing utilities.
pub mod testing {
    pub use kindred_std::testing::{CountingFactory, RecordingHandler, TestPayload};
}

/// Distributed registration.
#[cfg(feature = "inventory")]
pub mod collect {
    pub use kindred_std::collect::Registration;
}

/// Prelude module - common imports for Kindred.
///
/// # Usage
///
/// ```rust
/// use kindred::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AnyPayload, BoxError, ContentType, ContentTyped, DispatchError, Dispatcher, Handler,
        Lifetime, Payload, Registry, RegistryError, Scope, SyncHandler,
    };
}

#[cfg(feature = "macros")]
pub use kindred_macros::Payload;

#[cfg(feature = "inventory")]
pub use inventory;
