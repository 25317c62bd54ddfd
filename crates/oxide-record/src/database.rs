//! A connected adapter plus the models registered against it.

use oxide_record_core::Adapter;

use crate::config::DatabaseConfig;
use crate::error::{RecordError, Result};
use crate::model::{Model, ResourceDefinition};
use crate::registry::Registry;
use crate::resource::Resource;

/// Owns one adapter and the model registry.
///
/// Resources borrow the adapter mutably, so only one unit of work runs at a
/// time.
pub struct Database {
    adapter: Box<dyn Adapter>,
    registry: Registry,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.adapter.dialect().name())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Wraps an adapter with an empty registry.
    pub fn new(adapter: impl Adapter + 'static) -> Self {
        Self::with_registry(adapter, Registry::new())
    }

    /// Wraps an adapter with an existing registry.
    pub fn with_registry(adapter: impl Adapter + 'static, registry: Registry) -> Self {
        Self {
            adapter: Box::new(adapter),
            registry,
        }
    }

    /// Connects the adapter named by `config.adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] for an unsupported engine or an
    /// incomplete config, and [`RecordError::Adapter`] if connecting fails.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config.adapter.as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let url = config.connection_url()?;
                let adapter = oxide_record_sqlite::SqliteAdapter::connect(&url)?;
                tracing::info!(adapter = "sqlite", "database connected");
                Ok(Self::new(adapter))
            }
            other => Err(RecordError::Configuration(format!(
                "unsupported database adapter: {other:?}"
            ))),
        }
    }

    /// Registers a model.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] if the model's definition is
    /// incomplete.
    pub fn register<M: Model>(&mut self) -> Result<&mut Self> {
        self.registry.register::<M>()?;
        Ok(self)
    }

    /// The model registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the registered definition of `M`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] if `M` is not registered.
    pub fn definition<M: Model>(&self) -> Result<ResourceDefinition> {
        self.registry.definition::<M>().cloned()
    }

    /// Starts a query over the table of `M`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Configuration`] if `M` is not registered.
    pub fn resource<M: Model>(&mut self) -> Result<Resource<'_, M>> {
        let definition = self.registry.definition::<M>()?.clone();
        Resource::new(self.adapter.as_mut(), definition)
    }

    /// The adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// The adapter, mutably. Use it to open a transaction that several saves
    /// should share.
    pub fn adapter_mut(&mut self) -> &mut dyn Adapter {
        self.adapter.as_mut()
    }
}
