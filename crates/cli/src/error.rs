//! Error types for CLI operations.

use actor_factory::ActorFactoryError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Simulator connection error
    #[error("Failed to connect to simulator at {host}:{port}: {source}")]
    SimulatorConnection {
        host: String,
        port: u16,
        #[source]
        source: ActorFactoryError,
    },

    /// Simulation step failed; the session was torn down
    #[error("Simulation tick {tick} failed: {source}")]
    SimulatorTick {
        tick: u64,
        #[source]
        source: ActorFactoryError,
    },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn simulator_connection(
        host: impl Into<String>,
        port: u16,
        source: ActorFactoryError,
    ) -> Self {
        Self::SimulatorConnection {
            host: host.into(),
            port,
            source,
        }
    }

    pub fn simulator_tick(tick: u64, source: ActorFactoryError) -> Self {
        Self::SimulatorTick { tick, source }
    }
}
