//! Machine configuration and its validation.
//!
//! Validation uses Stillwater's `Validation` type so that every problem in a
//! configuration is reported at once instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use switchyard::config::MachineConfig;
//!
//! let config = MachineConfig {
//!     max_routing_passes: Some(0),
//!     record_capacity: 0,
//! };
//!
//! let errors = config.check().unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Number of transition records retained when not configured.
pub const DEFAULT_RECORD_CAPACITY: usize = 256;

/// Tunables for a [`StateMachine`](crate::StateMachine).
///
/// Missing fields take their defaults when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Upper bound on router resolution passes per transition.
    ///
    /// Router cycles are always detected; `None` sets no further limit.
    /// Routers that keep proposing new states need a limit to terminate.
    pub max_routing_passes: Option<usize>,

    /// How many transition records the machine's history retains.
    pub record_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_routing_passes: None,
            record_capacity: DEFAULT_RECORD_CAPACITY,
        }
    }
}

/// A configuration value out of range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_routing_passes must be at least 1")]
    ZeroRoutingPasses,

    #[error("record_capacity must be at least 1")]
    ZeroRecordCapacity,
}

impl MachineConfig {
    /// Validate every field, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigError>> {
        let passes = if self.max_routing_passes == Some(0) {
            Validation::fail(ConfigError::ZeroRoutingPasses)
        } else {
            Validation::success(())
        };

        let capacity = if self.record_capacity == 0 {
            Validation::fail(ConfigError::ZeroRecordCapacity)
        } else {
            Validation::success(())
        };

        Validation::all_vec(vec![passes, capacity]).map(|_| ())
    }

    /// [`validate`](Self::validate) flattened into a `Result`.
    pub fn check(&self) -> Result<(), Vec<ConfigError>> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
        }
    }
}
