//! Explicit model registration.
//!
//! Models are looked up by type rather than by naming convention: a model
//! must be registered before a [`Database`](crate::Database) hands out
//! resources for it.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use tracing::debug;

use crate::error::{RecordError, Result};
use crate::model::{Model, ResourceDefinition};

#[derive(Debug, Clone)]
struct Entry {
    model: &'static str,
    definition: ResourceDefinition,
}

/// Maps model types to their validated [`ResourceDefinition`].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<TypeId, Entry>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M`, replacing an earlier registration.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] when the model's table or
    /// primary key name is empty.
    pub fn register<M: Model>(&mut self) -> Result<()> {
        let definition = M::definition();
        definition.validate()?;
        debug!(
            model = type_name::<M>(),
            table = %definition.table(),
            primary_key = %definition.primary_key(),
            "registering model"
        );
        self.entries.insert(
            TypeId::of::<M>(),
            Entry {
                model: type_name::<M>(),
                definition,
            },
        );
        Ok(())
    }

    /// Returns the definition registered for `M`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] when `M` is not registered.
    pub fn definition<M: Model>(&self) -> Result<&ResourceDefinition> {
        self.entries
            .get(&TypeId::of::<M>())
            .map(|entry| &entry.definition)
            .ok_or_else(|| {
                RecordError::Configuration(format!("model {} is not registered", type_name::<M>()))
            })
    }

    /// Whether `M` is registered.
    #[must_use]
    pub fn contains<M: Model>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<M>())
    }

    /// Names of the registered model types.
    pub fn models(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.values().map(|entry| entry.model)
    }

    /// Number of registered models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no model is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hooks;
    use crate::record::Record;

    #[derive(Default)]
    struct Order {
        record: Record,
    }

    impl Hooks for Order {}

    impl Model for Order {
        fn definition() -> ResourceDefinition {
            ResourceDefinition::new("orders", "order_id")
        }

        fn record(&self) -> &Record {
            &self.record
        }

        fn record_mut(&mut self) -> &mut Record {
            &mut self.record
        }
    }

    #[derive(Default)]
    struct Broken {
        record: Record,
    }

    impl Hooks for Broken {}

    impl Model for Broken {
        fn definition() -> ResourceDefinition {
            ResourceDefinition::new("", "id")
        }

        fn record(&self) -> &Record {
            &self.record
        }

        fn record_mut(&mut self) -> &mut Record {
            &mut self.record
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.definition::<Order>(),
            Err(RecordError::Configuration(_))
        ));

        registry.register::<Order>().unwrap();
        assert!(registry.contains::<Order>());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.definition::<Order>().unwrap().primary_key(), "order_id");
        assert!(registry.models().any(|name| name.ends_with("Order")));
    }

    #[test]
    fn test_invalid_definition_is_rejected() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register::<Broken>(),
            Err(RecordError::Configuration(_))
        ));
        assert!(!registry.contains::<Broken>());
    }
}
