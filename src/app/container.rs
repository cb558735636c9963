//! Dependency injection container for the learning memory.
//!
//! The container owns the durable store, the batch writer and the shared
//! [`Memory`], and hands agents a clone of that memory when it creates them.

use std::sync::Arc;

use log::info;

use super::config::{AgentConfig, AppConfig, StoreConfig};
use crate::{
    Result,
    adapters::{InMemoryStore, MsgPackStore},
    cache::Memory,
    persistence::BatchWriter,
    ports::{EquivalenceRepository, ValueRepository},
    q_learning::ReasoningAgent,
    quarto::Dimensions,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use quarto_memory::app::{App, AppConfig, StoreConfig};
///
/// let config = AppConfig::default().with_store(StoreConfig::at("memory"));
/// let app = App::open(config)?;
/// let agent = app.create_agent(app.config().agent.clone())?;
/// # Ok::<(), quarto_memory::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use quarto_memory::app::App;
/// use quarto_memory::adapters::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let app = App::for_testing()
///     .with_repository(store.clone())
///     .with_default_seed(42)
///     .build()?;
/// # Ok::<(), quarto_memory::Error>(())
/// ```
pub struct App {
    config: AppConfig,
    dimensions: Arc<Dimensions>,
    value_repository: Arc<dyn ValueRepository>,
    writer: Arc<BatchWriter>,
    memory: Memory,
    default_seed: Option<u64>,
}

impl App {
    /// Create an app from a configuration.
    ///
    /// Uses a [`MsgPackStore`] when the store configuration names a directory,
    /// an [`InMemoryStore`] otherwise.
    pub fn open(config: AppConfig) -> Result<Self> {
        config.validate()?;
        match &config.store.directory {
            Some(directory) => {
                let store = Arc::new(MsgPackStore::open(directory)?);
                info!("Using MessagePack store at {directory:?}");
                Self::assemble(config, store.clone(), store, None)
            }
            None => {
                let store = Arc::new(InMemoryStore::new());
                info!("Using in-memory store");
                Self::assemble(config, store.clone(), store, None)
            }
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    fn assemble(
        config: AppConfig,
        values: Arc<dyn ValueRepository>,
        equivalences: Arc<dyn EquivalenceRepository>,
        default_seed: Option<u64>,
    ) -> Result<Self> {
        let writer = Arc::new(BatchWriter::spawn(
            Arc::clone(&values),
            config.store.writer_settings(),
        )?);
        let memory = Memory::new(Arc::clone(&values), equivalences, Arc::clone(&writer));
        Ok(Self {
            dimensions: Arc::new(config.dimensions.clone()),
            config,
            value_repository: values,
            writer,
            memory,
            default_seed,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dimensions(&self) -> &Arc<Dimensions> {
        &self.dimensions
    }

    /// Handle to the shared caches; clones see the same state.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn value_repository(&self) -> Arc<dyn ValueRepository> {
        Arc::clone(&self.value_repository)
    }

    /// Create a new agent sharing this app's memory.
    ///
    /// The config seed wins over the app's default seed.
    pub fn create_agent(&self, mut config: AgentConfig) -> Result<ReasoningAgent> {
        config.seed = config.seed.or(self.default_seed);
        ReasoningAgent::new(config, Arc::clone(&self.dimensions), self.memory.clone())
    }

    /// Block until every queued value update is durable.
    pub fn flush(&self) -> Result<()> {
        self.writer.flush()
    }

    /// Flush outstanding updates and stop the writer thread.
    pub fn shutdown(&self) -> Result<()> {
        self.writer.shutdown()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// Primarily used for testing to inject repositories and control randomness.
pub struct AppBuilder {
    value_repository: Option<Arc<dyn ValueRepository>>,
    equivalence_repository: Option<Arc<dyn EquivalenceRepository>>,
    config: AppConfig,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            value_repository: None,
            equivalence_repository: None,
            config: AppConfig::default(),
            default_seed: None,
        }
    }

    /// Use one store for both value and equivalence records.
    pub fn with_repository<R>(mut self, repo: R) -> Self
    where
        R: ValueRepository + EquivalenceRepository + 'static,
    {
        let repo = Arc::new(repo);
        self.value_repository = Some(repo.clone());
        self.equivalence_repository = Some(repo);
        self
    }

    pub fn with_value_repository<R: ValueRepository + 'static>(mut self, repo: R) -> Self {
        self.value_repository = Some(Arc::new(repo));
        self
    }

    pub fn with_equivalence_repository<R: EquivalenceRepository + 'static>(
        mut self,
        repo: R,
    ) -> Self {
        self.equivalence_repository = Some(Arc::new(repo));
        self
    }

    pub fn with_store_config(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.store.batch_size = batch_size;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Set a default random seed for all agents created by this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app, falling back to a fresh [`InMemoryStore`] for any
    /// repository not provided.
    pub fn build(self) -> Result<App> {
        self.config.validate()?;
        let fallback = Arc::new(InMemoryStore::new());
        let values: Arc<dyn ValueRepository> = match self.value_repository {
            Some(repo) => repo,
            None => fallback.clone(),
        };
        let equivalences: Arc<dyn EquivalenceRepository> = match self.equivalence_repository {
            Some(repo) => repo,
            None => fallback,
        };
        App::assemble(self.config, values, equivalences, self.default_seed)
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::ports::Learner;

    #[test]
    fn test_app_creates_agents_sharing_memory() {
        let store = InMemoryStore::new();
        let app = App::for_testing()
            .with_repository(store.clone())
            .build()
            .unwrap();

        let mut first = app.create_agent(AgentConfig::new("first")).unwrap();
        let mut second = app.create_agent(AgentConfig::new("second")).unwrap();
        first.select_action(&[None; 16], 0).unwrap();
        second.select_action(&[None; 16], 0).unwrap();

        assert_eq!(store.value_count(), 1);
        assert_eq!(app.memory().values().local_len(), 1);
    }

    #[test]
    fn test_config_seed_overrides_app_default() {
        let app = App::for_testing().with_default_seed(42).build().unwrap();
        let seeded = app.create_agent(AgentConfig::new("a")).unwrap();
        assert_eq!(seeded.config().seed, Some(42));
        let own = app.create_agent(AgentConfig::new("b").with_seed(123)).unwrap();
        assert_eq!(own.config().seed, Some(123));
    }

    #[test]
    fn test_open_with_directory_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = AppConfig::default().with_store(StoreConfig::at(temp_dir.path()));

        {
            let app = App::open(config.clone()).unwrap();
            let mut agent = app.create_agent(AgentConfig::new("disk")).unwrap();
            agent.select_action(&[None; 16], 0).unwrap();
            agent.apply_outcome(crate::types::Outcome::Win).unwrap();
            app.shutdown().unwrap();
        }

        let app = App::open(config).unwrap();
        assert_eq!(app.value_repository().keys().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_store_config_rejected() {
        let result = App::for_testing().with_batch_size(0).build();
        assert!(result.is_err());
    }
}
