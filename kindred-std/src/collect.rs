//! Distributed registration via `inventory`.
//!
//! Crates that define payloads and handlers can submit their registrations
//! next to the code instead of in one startup function:
//!
//! ```rust,ignore
//! fn register_textbox(registry: &Registry) -> Result<(), RegistryError> {
//!     registry.register_handler::<Textbox, _, _>("render", render_textbox)?;
//!     Ok(())
//! }
//!
//! inventory::submit! { Registration::new("textbox", register_textbox) }
//!
//! // At startup:
//! let registry = Registry::new();
//! registry.collect_registrations()?;
//! ```

use crate::registry::Registry;
use kindred_core::RegistryError;

/// A registration step submitted with `inventory::submit!`.
pub struct Registration {
    /// Name for diagnostics.
    pub name: &'static str,
    /// Applies the registrations.
    pub register: fn(&Registry) -> Result<(), RegistryError>,
}

impl Registration {
    /// Create a registration entry.
    pub const fn new(
        name: &'static str,
        register: fn(&Registry) -> Result<(), RegistryError>,
    ) -> Self {
        Self { name, register }
    }
}

inventory::collect!(Registration);

impl Registry {
    /// Apply every submitted [`Registration`], ordered by name.
    ///
    /// Stops at the first failure. Returns how many steps ran.
    pub fn collect_registrations(&self) -> Result<usize, RegistryError> {
        let mut steps: Vec<&Registration> = inventory::iter::<Registration>().collect();
        steps.sort_by_key(|step| step.name);

        for step in &steps {
            #[cfg(feature = "tracing")]
            tracing::debug!(name = step.name, "applying collected registration");
            (step.register)(self)?;
        }
        Ok(steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_collected(registry: &Registry) -> Result<(), RegistryError> {
        registry.register_instance("collect.test.value", 42u32)?;
        Ok(())
    }

    inventory::submit! { Registration::new("collect-test", register_collected) }

    #[test]
    fn test_collect_registrations() {
        let registry = Registry::new();
        let applied = registry.collect_registrations().unwrap();
        assert!(applied >= 1);

        let value = registry
            .resolve_instance::<u32>("collect.test.value", None)
            .unwrap();
        assert_eq!(*value, 42);

        // Collecting twice collides with the first pass.
        assert!(matches!(
            registry.collect_registrations().unwrap_err(),
            RegistryError::AlreadyRegistered { .. }
        ));
    }
}
