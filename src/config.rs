//! Writer configuration.
//!
//! `WriterConfig` is plain data with serde support so a host application
//! can embed it in its own config file. Missing fields take their defaults.
//!
//! ```
//! use tagwire::WriterConfig;
//!
//! let config = WriterConfig::default().initial_capacity(256).max_nesting_depth(8);
//! assert_eq!(config.initial_capacity, 256);
//! ```

use serde::{Deserialize, Serialize};

/// Default initial buffer capacity.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Default maximum number of simultaneously open messages.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Configuration for a [`MessageWriter`](crate::MessageWriter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Bytes reserved up front; the buffer still grows past this.
    pub initial_capacity: usize,
    /// Open messages allowed at once before `start_message` fails.
    pub max_nesting_depth: usize,
}

impl WriterConfig {
    /// Set the initial buffer capacity.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the nesting depth limit.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}
