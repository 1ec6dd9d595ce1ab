#![allow(dead_code)]

use kindred::{AnyPayload, ContentTyped, Payload, Registry};
use std::sync::Arc;

// ============================================================================
// Test Payload Types
// ============================================================================

#[derive(Clone, Debug)]
pub struct Textbox {
    pub text: String,
}

impl ContentTyped for Textbox {
    const CONTENT_TYPE: &'static str = "ui.textbox";
}

impl Payload for Textbox {
    fn declared_content_type(&self) -> Option<&'static str> {
        Some(Self::CONTENT_TYPE)
    }
}

#[derive(Clone, Debug)]
pub struct Checkbox {
    pub checked: bool,
}

impl ContentTyped for Checkbox {
    const CONTENT_TYPE: &'static str = "ui.checkbox";
}

impl Payload for Checkbox {
    fn declared_content_type(&self) -> Option<&'static str> {
        Some(Self::CONTENT_TYPE)
    }
}

/// Nested deeper than any registration.
#[derive(Clone, Debug)]
pub struct Gauge {
    pub value: f64,
}

impl ContentTyped for Gauge {
    const CONTENT_TYPE: &'static str = "a.b.c.d";
}

impl Payload for Gauge {
    fn declared_content_type(&self) -> Option<&'static str> {
        Some(Self::CONTENT_TYPE)
    }
}

// ============================================================================
// Registry Fixtures
// ============================================================================

/// `render` handlers for `ui.textbox` and the `ui` family.
pub fn ui_render_registry() -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    registry
        .register_handler::<Textbox, _, _>("render", |t: &Textbox| format!("textbox:{}", t.text))
        .unwrap();
    registry
        .register_handler_for::<AnyPayload, _, _>("ui", "render", |p: &AnyPayload| {
            format!("ui:{}", kindred::content_type_of(p).unwrap())
        })
        .unwrap();
    registry
}
