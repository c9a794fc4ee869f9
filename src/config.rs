//! Configuration for GeneBank
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{GeneBankError, Result};

/// Smallest degree a tree can be built with
pub const MIN_DEGREE: u32 = 2;

/// Main configuration for a tree instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing file of the tree (header block followed by node blocks)
    pub path: PathBuf,

    /// Degree `t` used when creating a tree.
    /// `None` derives the largest degree whose node fits one 4096-byte block.
    pub degree: Option<u32>,

    /// Open without write access; mutations fail and nothing is written back
    pub read_only: bool,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Max resident nodes; 0 disables the cache
    pub cache_size: usize,

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------
    /// Emit per-key and per-eviction trace events
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./genebank.btree"),
            degree: None,
            read_only: false,
            cache_size: 0,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Map a signed degree argument to a config degree.
    ///
    /// Anything below `MIN_DEGREE` (including negatives) means auto.
    pub fn degree_from_arg(degree: i64) -> Result<Option<u32>> {
        if degree < i64::from(MIN_DEGREE) {
            return Ok(None);
        }
        u32::try_from(degree)
            .map(Some)
            .map_err(|_| GeneBankError::Config(format!("degree {} is too large", degree)))
    }

    /// Check values that cannot be expressed by the types alone
    pub fn validate(&self) -> Result<()> {
        if let Some(degree) = self.degree {
            if degree < MIN_DEGREE {
                return Err(GeneBankError::Config(format!(
                    "degree must be at least {}, got {}",
                    MIN_DEGREE, degree
                )));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set an explicit degree (`None` = derive from block size)
    pub fn degree(mut self, degree: Option<u32>) -> Self {
        self.config.degree = degree;
        self
    }

    /// Open the tree read-only
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    /// Set the cache capacity in nodes (0 disables caching)
    pub fn cache_size(mut self, nodes: usize) -> Self {
        self.config.cache_size = nodes;
        self
    }

    /// Enable debug trace events
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
