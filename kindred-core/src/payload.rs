//! Payload traits: the content-type declaration contract.
//!
//! A payload reports its content type in one of two ways:
//!
//! 1. **Type-level**: every value of the type shares one content type,
//!    declared through [`ContentTyped`] and surfaced on trait objects by
//!    [`Payload::declared_content_type`].
//! 2. **Instance-level**: [`Payload::content_type`] returns a value computed
//!    from the instance. When present it overrides the type-level one.
//!
//! [`content_type_of`] applies that precedence.

use crate::{
    content_type::ContentType,
    error::{ContentTypeError, DispatchError},
};
use std::{any::Any, sync::Arc};

/// Object-safe access to `Any` for payload trait objects.
///
/// Implemented for every `Send + Sync + 'static` type; never implement it
/// by hand.
pub trait PayloadAny: Any + Send + Sync {
    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    /// Convert a shared payload into a shared `Any`.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Rust type name of the concrete payload.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> PayloadAny for T {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value that can be dispatched by content type.
///
/// # Example
///
/// ```rust
/// use kindred_core::{ContentType, ContentTyped, Payload, content_type_of};
///
/// struct Button;
///
/// impl ContentTyped for Button {
///     const CONTENT_TYPE: &'static str = "ui.button";
/// }
///
/// impl Payload for Button {
///     fn declared_content_type(&self) -> Option<&'static str> {
///         Some(Self::CONTENT_TYPE)
///     }
/// }
///
/// let ct = content_type_of(&Button).unwrap();
/// assert_eq!(ct, ContentType::parse("ui.button").unwrap());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a Kindred payload",
    label = "missing `Payload` implementation",
    note = "Implement `Payload` (or `#[derive(Payload)]`) and declare a content type."
)]
pub trait Payload: PayloadAny {
    /// Instance-level content type. Overrides the type-level declaration.
    fn content_type(&self) -> Option<ContentType> {
        None
    }

    /// Type-level content type, the same for every value of the type.
    fn declared_content_type(&self) -> Option<&'static str> {
        None
    }
}

/// The base payload shape, for handlers that serve a whole family.
///
/// Write family handler closures as `|payload: &AnyPayload| ...`; the alias
/// pins the trait object to `'static`, which is what dispatch narrows to.
pub type AnyPayload = dyn Payload;

/// Type-level content-type declaration, used to register by type.
pub trait ContentTyped {
    /// The content type shared by all values of this type.
    const CONTENT_TYPE: &'static str;

    /// Parse [`Self::CONTENT_TYPE`].
    fn declared() -> Result<ContentType, ContentTypeError> {
        payload_content_type(Self::CONTENT_TYPE)
    }
}

/// Determine the content type of a payload.
///
/// The instance-level content type wins when it is present and not none;
/// otherwise the type-level declaration is parsed.
pub fn content_type_of(payload: &dyn Payload) -> Result<ContentType, DispatchError> {
    if let Some(ct) = payload.content_type().filter(|ct| !ct.is_none()) {
        if ct.has_suffix() {
            return Err(ContentTypeError::UnexpectedSuffix(ct.to_string()).into());
        }
        return Ok(ct);
    }

    let not_declared = || DispatchError::ContentTypeNotDeclared {
        type_name: PayloadAny::type_name(payload),
    };
    let declared = payload.declared_content_type().ok_or_else(not_declared)?;
    let ct = payload_content_type(declared)?;
    if ct.is_none() {
        return Err(not_declared());
    }
    Ok(ct)
}

/// Parse text as a payload content type: a hierarchy without suffix.
pub fn payload_content_type(text: &str) -> Result<ContentType, ContentTypeError> {
    let ct = ContentType::parse(text)?;
    if ct.has_suffix() {
        return Err(ContentTypeError::UnexpectedSuffix(text.to_string()));
    }
    Ok(ct)
}

/// Checked narrowing from `dyn Payload` to the shape a handler accepts.
///
/// Concrete payload types narrow by downcast; `dyn Payload` narrows to
/// itself, which is how a handler for a whole family accepts any member.
/// Implement this for your own base trait objects to let handlers take
/// them directly.
pub trait Narrow: Send + Sync + 'static {
    /// Borrow the payload as `Self`, if it is one.
    fn narrow_ref(payload: &AnyPayload) -> Option<&Self>;

    /// Take the shared payload as `Self`, if it is one.
    fn narrow_arc(payload: Arc<AnyPayload>) -> Option<Arc<Self>>;

    /// Name used in mismatch errors.
    fn expected_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<T: Payload> Narrow for T {
    fn narrow_ref(payload: &AnyPayload) -> Option<&Self> {
        PayloadAny::as_any(payload).downcast_ref::<T>()
    }

    fn narrow_arc(payload: Arc<AnyPayload>) -> Option<Arc<Self>> {
        PayloadAny::into_any_arc(payload).downcast::<T>().ok()
    }
}

impl Narrow for dyn Payload {
    fn narrow_ref(payload: &AnyPayload) -> Option<&Self> {
        Some(payload)
    }

    fn narrow_arc(payload: Arc<AnyPayload>) -> Option<Arc<Self>> {
        Some(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Textbox;

    impl ContentTyped for Textbox {
        const CONTENT_TYPE: &'static str = "ui.textbox";
    }

    impl Payload for Textbox {
        fn declared_content_type(&self) -> Option<&'static str> {
            Some(Self::CONTENT_TYPE)
        }
    }

    struct Dynamic {
        runtime: Option<ContentType>,
    }

    impl Payload for Dynamic {
        fn content_type(&self) -> Option<ContentType> {
            self.runtime.clone()
        }

        fn declared_content_type(&self) -> Option<&'static str> {
            Some("doc.generic")
        }
    }

    struct Undeclared;

    impl Payload for Undeclared {}

    #[test]
    fn test_type_level_content_type() {
        assert_eq!(content_type_of(&Textbox).unwrap().to_string(), "ui.textbox");
        assert_eq!(Textbox::declared().unwrap().to_string(), "ui.textbox");
    }

    #[test]
    fn test_instance_level_overrides_type_level() {
        let payload = Dynamic {
            runtime: Some("doc.invoice".parse().unwrap()),
        };
        assert_eq!(content_type_of(&payload).unwrap().to_string(), "doc.invoice");

        let payload = Dynamic {
            runtime: Some(ContentType::none()),
        };
        assert_eq!(content_type_of(&payload).unwrap().to_string(), "doc.generic");

        let payload = Dynamic { runtime: None };
        assert_eq!(content_type_of(&payload).unwrap().to_string(), "doc.generic");
    }

    #[test]
    fn test_undeclared_content_type() {
        let err = content_type_of(&Undeclared).unwrap_err();
        match err {
            DispatchError::ContentTypeNotDeclared { type_name } => {
                assert!(type_name.ends_with("Undeclared"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_suffixed_payload_content_type_rejected() {
        let payload = Dynamic {
            runtime: Some("doc.invoice+render".parse().unwrap()),
        };
        assert!(matches!(
            content_type_of(&payload).unwrap_err(),
            DispatchError::MalformedContentType(ContentTypeError::UnexpectedSuffix(_))
        ));
        assert!(payload_content_type("a+b").is_err());
    }

    #[test]
    fn test_narrow_concrete() {
        let payload: &dyn Payload = &Textbox;
        assert!(Textbox::narrow_ref(payload).is_some());
        assert!(Undeclared::narrow_ref(payload).is_none());

        let shared: Arc<dyn Payload> = Arc::new(Textbox);
        assert!(Textbox::narrow_arc(shared.clone()).is_some());
        assert!(Undeclared::narrow_arc(shared).is_none());
    }

    #[test]
    fn test_narrow_base() {
        let payload: &dyn Payload = &Undeclared;
        assert!(<dyn Payload>::narrow_ref(payload).is_some());
        assert_eq!(PayloadAny::type_name(payload), std::any::type_name::<Undeclared>());
    }
}
