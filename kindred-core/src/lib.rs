//! # kindred-core
//!
//! Core types and traits for the Kindred content-type dispatch framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! payload and handler crates that don't need the full `kindred-std`
//! implementation.
//!
//! # Building Blocks
//!
//! ## Identifier ([`ContentType`])
//!
//! A hierarchical, media-type-like identifier such as `ui.input.textbox`,
//! optionally carrying a class suffix (`ui.input.textbox+render`).
//! [`ContentType::parent`] drops the last segment; that walk is what makes
//! a broad registration (`ui`) serve every more specific type below it.
//!
//! ## Declaration ([`Payload`])
//!
//! Payloads report their content type at type level ([`ContentTyped`]) or
//! per instance. [`content_type_of`] picks the instance value first.
//!
//! ## Capability ([`SyncHandler`], [`Handler`])
//!
//! One handler abstraction per execution model, parameterized by payload
//! shape, argument tuple and output. Closures and structs both qualify.
//!
//! ## Storage ([`Container`], [`Lookup`])
//!
//! The contract the registry fulfils: registration with a [`Lifetime`],
//! activation, enumeration and exact lookup.
//!
//! # Error Types
//!
//! - [`KindredError`] - Top-level error type
//! - [`ContentTypeError`] - Malformed content types
//! - [`RegistryError`] - Registration and activation errors
//! - [`DispatchError`] - Routing errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod container;
mod content_type;
mod error;
mod handler;
mod lookup;
mod payload;

// Re-exports
pub use container::{
    Activated, Activator, Container, Factory, Implementation, Instance, IntoContentType, Lifetime,
};
pub use content_type::{Ancestors, ContentType};
pub use error::{BoxError, ContentTypeError, DispatchError, KindredError, RegistryError};
pub use handler::{Handler, SyncHandler};
pub use lookup::Lookup;
pub use payload::{
    AnyPayload, ContentTyped, Narrow, Payload, PayloadAny, content_type_of, payload_content_type,
};
