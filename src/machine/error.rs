//! Errors raised by the engine.

use crate::config::ConfigError;
use crate::handlers::DispatchError;
use std::fmt::Debug;
use thiserror::Error;

/// Why a transition did not complete.
///
/// Only [`TransitionError::Dispatch`] can occur after the machine's state
/// has changed; every other variant leaves the machine untouched and fires
/// no handlers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError<S: Debug> {
    #[error("no transition from {from:?} to {to:?}")]
    Illegal { from: Option<S>, to: S },

    #[error(
        "routing from {from:?} toward {requested:?} did not settle after {passes} passes \
         (last proposal {last:?})"
    )]
    RoutingDiverged {
        from: Option<S>,
        requested: S,
        last: S,
        passes: usize,
    },

    #[error("routers redirected {requested:?} to {routed:?}, which is not reachable from {from:?}")]
    RoutedOffGraph {
        from: Option<S>,
        requested: S,
        routed: S,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl<S: Debug> TransitionError<S> {
    /// Whether the failure comes from router configuration rather than the
    /// graph or a handler.
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            Self::RoutingDiverged { .. } | Self::RoutedOffGraph { .. }
        )
    }
}

/// Errors from machine configuration and registration calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("initial state is frozen after {transitions} transitions; call reset() first")]
    InitialStateFrozen { transitions: u64 },

    #[error("sequence pattern must contain at least one state")]
    EmptyPattern,

    #[error("invalid configuration: {0:?}")]
    InvalidConfig(Vec<ConfigError>),
}
