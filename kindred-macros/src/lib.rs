//! Procedural macros for Kindred.
//!
//! - `#[derive(Payload)]` - declare a payload's content type

use proc_macro::TokenStream;

mod payload;

/// Derive `ContentTyped` and `Payload` from a `#[content_type = "..."]`
/// attribute.
///
/// ```rust,ignore
/// #[derive(Payload)]
/// #[content_type = "ui.input.textbox"]
/// struct Textbox {
///     text: String,
/// }
/// ```
///
/// A field marked `#[content_type]` (of type `ContentType` or
/// `Option<ContentType>`) becomes the instance-level content type, which
/// overrides the declared one at dispatch time.
#[proc_macro_derive(Payload, attributes(content_type))]
pub fn derive_payload(input: TokenStream) -> TokenStream {
    payload::derive_payload_impl(input)
}
