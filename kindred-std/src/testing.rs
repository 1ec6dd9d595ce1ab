//! Testing utilities for Kindred.
//!
//! This module provides utilities to make testing registrations and
//! dispatch easier.
//!
//! # Features
//!
//! - [`TestPayload`]: A payload whose content type is chosen at runtime
//! - [`RecordingHandler`]: A family handler that records what it receives
//! - [`CountingFactory`]: Wraps a constructor and counts activations

use kindred_core::{
    Activator, AnyPayload, BoxError, ContentType, ContentTypeError, Handler, Payload,
    SyncHandler, content_type_of, payload_content_type,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Test Payload
// ============================================================================

/// A payload that reports an instance-level content type.
///
/// # Example
///
/// ```rust
/// use kindred_core::content_type_of;
/// use kindred_std::testing::TestPayload;
///
/// let payload = TestPayload::new("ui.textbox").unwrap();
/// assert_eq!(content_type_of(&payload).unwrap().to_string(), "ui.textbox");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPayload {
    content_type: ContentType,
}

impl TestPayload {
    /// Create a payload of content type `ct`, which may not carry a suffix.
    pub fn new(ct: &str) -> Result<Self, ContentTypeError> {
        Ok(Self {
            content_type: payload_content_type(ct)?,
        })
    }
}

impl Payload for TestPayload {
    fn content_type(&self) -> Option<ContentType> {
        Some(self.content_type.clone())
    }
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler for any payload that records each payload's content type.
///
/// Clones share the same record, so keep one and register another.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kindred_core::AnyPayload;
/// use kindred_std::{Dispatcher, Registry, testing::{RecordingHandler, TestPayload}};
///
/// let recorder = RecordingHandler::new();
/// let registry = Arc::new(Registry::new());
/// registry
///     .register_handler_for::<AnyPayload, _, _>("ui", "log", recorder.clone())
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(registry);
/// dispatcher.send(&TestPayload::new("ui.button").unwrap(), "log", ()).unwrap();
/// assert_eq!(recorder.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    seen: Arc<Mutex<Vec<ContentType>>>,
}

impl RecordingHandler {
    /// Create a new recording handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content types received so far, in order.
    pub fn seen(&self) -> Vec<ContentType> {
        self.seen.lock().clone()
    }

    /// Get the number of recorded payloads.
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Clear all recorded payloads.
    pub fn clear(&self) {
        self.seen.lock().clear();
    }

    fn record(&self, payload: &AnyPayload) {
        // Explicit-content-type dispatch can deliver undeclared payloads.
        if let Ok(ct) = content_type_of(payload) {
            self.seen.lock().push(ct);
        }
    }
}

impl SyncHandler<AnyPayload> for RecordingHandler {
    type Output = ();

    fn call(&self, payload: &AnyPayload, _args: ()) {
        self.record(payload);
    }
}

impl Handler<AnyPayload> for RecordingHandler {
    type Output = ();

    async fn call(&self, payload: Arc<AnyPayload>, _args: ()) {
        self.record(&*payload);
    }
}

// ============================================================================
// Counting Factory
// ============================================================================

/// Counts how many times a registered factory ran.
///
/// # Example
///
/// ```rust
/// use kindred_std::{Registry, testing::CountingFactory};
///
/// let counter = CountingFactory::new();
/// let registry = Registry::new();
/// registry.register_singleton("app.buffer", counter.factory(Vec::<u8>::new)).unwrap();
///
/// registry.activate("app.buffer", None).unwrap();
/// registry.activate("app.buffer", None).unwrap();
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingFactory {
    count: Arc<AtomicUsize>,
}

impl CountingFactory {
    /// Create a new counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `make` into a registry factory that bumps the counter.
    pub fn factory<T, F>(
        &self,
        make: F,
    ) -> impl Fn(&dyn Activator) -> Result<T, BoxError> + Send + Sync + 'static
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let count = self.count.clone();
        move |_: &dyn Activator| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(make())
        }
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}
