//! Error types for Kindred.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`KindredError`] - Top-level error type
//! - [`ContentTypeError`] - Malformed content-type text
//! - [`RegistryError`] - Registration and activation errors
//! - [`DispatchError`] - Errors while routing a payload to its handler
//!
//! A handler's own failure is never one of these: whatever the handler
//! returns comes back to the caller untouched.

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Kindred operations.
#[derive(Error, Debug)]
pub enum KindredError {
    /// A content type could not be parsed.
    #[error("content type error: {0}")]
    ContentType(#[from] ContentTypeError),

    /// A registration or activation failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A dispatch failed before or while reaching a handler.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Structural violations in content-type text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeError {
    /// No type hierarchy where one is required.
    #[error("content type `{0}` has no type hierarchy")]
    Empty(String),

    /// More than one `+` separator.
    #[error("content type `{0}` has more than one `+` suffix separator")]
    MultipleSuffixes(String),

    /// A `.`-separated segment is empty.
    #[error("content type `{0}` contains an empty segment")]
    EmptySegment(String),

    /// A `+` with nothing after it.
    #[error("content type `{0}` has an empty suffix")]
    EmptySuffix(String),

    /// A payload content type that already carries a suffix.
    #[error("payload content type `{0}` may not carry a `+` suffix")]
    UnexpectedSuffix(String),

    /// A character that may not appear in a content type.
    #[error("content type `{input}` contains invalid character {ch:?}")]
    InvalidCharacter {
        /// The offending input.
        input: String,
        /// The rejected character.
        ch: char,
    },
}

/// Errors raised by the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The key already has an entry; the existing entry is left untouched.
    #[error("content type already registered: {key}")]
    AlreadyRegistered {
        /// The colliding key.
        key: String,
    },

    /// No entry exists for the key.
    #[error("no registration found for content type: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The key or handler class is not a valid registration key.
    #[error("invalid registration key: {0}")]
    InvalidKey(#[from] ContentTypeError),

    /// A scoped entry was activated outside any scope.
    #[error("`{key}` has scoped lifetime and needs a scope to activate")]
    ScopeRequired {
        /// The scoped key.
        key: String,
    },

    /// The entry's factory failed.
    #[error("failed to activate `{key}`")]
    Activation {
        /// The key being activated.
        key: String,
        /// The factory's error.
        #[source]
        source: BoxError,
    },

    /// The entry produces a different Rust type than the one requested.
    #[error("`{key}` produces `{actual}`, not `{expected}`")]
    TypeMismatch {
        /// The key being activated.
        key: String,
        /// The requested type.
        expected: &'static str,
        /// The registered type.
        actual: &'static str,
    },
}

/// Errors raised while dispatching a payload to a handler.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The payload declares no content type.
    #[error("payload of type `{type_name}` does not declare a content type")]
    ContentTypeNotDeclared {
        /// Rust type name of the payload.
        type_name: &'static str,
    },

    /// Resolution exhausted the payload hierarchy without a match.
    #[error("no handler registered for `{key}` or any of its ancestors")]
    HandlerNotFound {
        /// The most specific handler key that was tried.
        key: String,
    },

    /// The payload content type or handler class is malformed.
    #[error("malformed content type: {0}")]
    MalformedContentType(#[from] ContentTypeError),

    /// The resolved handler expects a different payload type.
    #[error("handler `{key}` expects payload `{expected}`, got `{actual}`")]
    PayloadTypeMismatch {
        /// The handler key that was resolved.
        key: String,
        /// Payload type the handler accepts.
        expected: &'static str,
        /// Payload type that was dispatched.
        actual: &'static str,
    },

    /// The resolved handler takes different arguments or returns a different type.
    #[error("handler `{key}` does not have signature `{expected}`")]
    SignatureMismatch {
        /// The handler key that was resolved.
        key: String,
        /// Signature the dispatch call asked for.
        expected: &'static str,
    },

    /// A synchronous dispatch resolved an asynchronous handler.
    #[error("handler `{key}` is asynchronous; use `dispatch_async`")]
    AsyncHandler {
        /// The handler key that was resolved.
        key: String,
    },

    /// The handler could not be activated.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DispatchError {
    /// Whether this error means no handler exists for the payload.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::HandlerNotFound { .. })
    }
}

// Convenience conversions
impl From<BoxError> for KindredError {
    fn from(err: BoxError) -> Self {
        KindredError::Custom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::AlreadyRegistered {
            key: "x+y".to_string(),
        };
        assert_eq!(err.to_string(), "content type already registered: x+y");

        let err = DispatchError::HandlerNotFound {
            key: "a.b+render".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no handler registered for `a.b+render` or any of its ancestors"
        );
    }

    #[test]
    fn test_top_level_conversions() {
        let err: KindredError = ContentTypeError::EmptySegment("a..b".into()).into();
        assert!(matches!(err, KindredError::ContentType(_)));

        let err: KindredError = DispatchError::ContentTypeNotDeclared { type_name: "T" }.into();
        assert!(matches!(err, KindredError::Dispatch(_)));
    }

    #[test]
    fn test_activation_error_keeps_source() {
        use std::error::Error;

        let source: BoxError = "connection refused".into();
        let err = RegistryError::Activation {
            key: "db.pool".into(),
            source,
        };
        assert_eq!(err.source().unwrap().to_string(), "connection refused");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DispatchError::HandlerNotFound { key: "a+b".into() }.is_not_found());
        assert!(!DispatchError::AsyncHandler { key: "a+b".into() }.is_not_found());
    }
}
