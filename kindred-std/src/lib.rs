//! # kindred-std
//!
//! Standard implementations for the Kindred content-type dispatch framework.
//!
//! This crate provides:
//! - **Storage**: [`Registry`], [`RegistryBuilder`], [`Scope`]
//! - **Resolution**: [`HierarchicalResolver`] walking parent content types
//! - **Adapters**: [`SyncAdapter`], [`AsyncAdapter`], [`HandlerSlot`]
//! - **Dispatch**: [`Dispatcher`], [`DispatcherBuilder`], [`FallbackPolicy`]
//! - **Collection**: [`collect::Registration`] (feature `inventory`)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use kindred_core;

// Modules
pub mod adapter;
#[cfg(feature = "inventory")]
pub mod collect;
pub mod dispatch;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod testing;

pub use adapter::{
    AsyncAdapter, ErasedAsyncHandler, ErasedSyncHandler, HandlerSlot, SyncAdapter, handler_key,
};
pub use dispatch::{DispatchRequest, Dispatcher, DispatcherBuilder, FallbackPolicy};
pub use registry::{Registry, RegistryBuilder, RegistryEntry};
pub use resolver::{HierarchicalResolver, Resolved};
pub use scope::Scope;

#[cfg(feature = "inventory")]
pub use inventory;
