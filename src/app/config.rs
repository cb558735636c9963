//! Configuration types for agents, the durable store and the whole app.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, persistence::WriterSettings, quarto::Dimensions};

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration {
            message: format!("{name} must be within [0, 1], got {value}"),
        })
    }
}

/// Configuration for creating a learning agent.
///
/// # Examples
///
/// ```
/// use quarto_memory::app::AgentConfig;
///
/// let config = AgentConfig::new("alice")
///     .with_seed(42)
///     .with_exploration(0.2)
///     .with_exploration_decay(0.99);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Name used in logs
    pub name: String,
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Probability of picking a random action
    pub exploration: f64,
    /// Multiplicative exploration decay per finished game
    pub exploration_decay: f64,
    /// Floor for the decayed exploration rate
    pub min_exploration: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Create a configuration with default learning parameters:
    /// α = 0.1, γ = 0.95, exploration 0.05 without decay.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alpha: 0.1,
            gamma: 0.95,
            exploration: 0.05,
            exploration_decay: 1.0,
            min_exploration: 0.0,
            seed: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_exploration_decay(mut self, decay: f64) -> Self {
        self.exploration_decay = decay;
        self
    }

    pub fn with_min_exploration(mut self, min_exploration: f64) -> Self {
        self.min_exploration = min_exploration;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_unit("alpha", self.alpha)?;
        check_unit("gamma", self.gamma)?;
        check_unit("exploration", self.exploration)?;
        check_unit("min_exploration", self.min_exploration)?;
        if !(self.exploration_decay > 0.0 && self.exploration_decay <= 1.0) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "exploration_decay must be within (0, 1], got {}",
                    self.exploration_decay
                ),
            });
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("agent")
    }
}

/// Where learned values live and how the batch writer flushes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory of the MessagePack store; `None` keeps everything in memory.
    pub directory: Option<PathBuf>,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn at(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flush_interval_ms(mut self, millis: u64) -> Self {
        self.flush_interval_ms = millis;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfiguration {
                message: "batch_size must be at least 1".to_string(),
            });
        }
        if self.retry_delay_ms > self.max_retry_delay_ms {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "retry_delay_ms ({}) exceeds max_retry_delay_ms ({})",
                    self.retry_delay_ms, self.max_retry_delay_ms
                ),
            });
        }
        Ok(())
    }

    pub fn writer_settings(&self) -> WriterSettings {
        WriterSettings {
            batch_size: self.batch_size,
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_retry_delay: Duration::from_millis(self.max_retry_delay_ms),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: None,
            batch_size: 100,
            flush_interval_ms: 500,
            retry_delay_ms: 50,
            max_retry_delay_ms: 5000,
        }
    }
}

/// Complete application configuration, loadable from JSON.
///
/// # Examples
///
/// ```
/// use quarto_memory::app::AppConfig;
///
/// let config: AppConfig = serde_json::from_str(r#"{ "store": { "batch_size": 10 } }"#)?;
/// assert_eq!(config.store.batch_size, 10);
/// assert_eq!(config.agent.alpha, 0.1);
/// assert_eq!(config.dimensions.token_count(), 16);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dimensions: Dimensions,
    pub store: StoreConfig,
    pub agent: AgentConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {path:?}"),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.agent.validate()
    }
}
