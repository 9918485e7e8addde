//! Layered error definitions
//!
//! Categorized by source: config / simulator / classifier / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Simulator Errors =====
    /// Simulator connection error
    #[error("simulator connection error: {message}")]
    SimulatorConnection { message: String },

    /// Actor spawn error
    #[error("spawn error for '{actor}': {message}")]
    Spawn { actor: String, message: String },

    /// Actor not found
    #[error("actor not found: {actor_id}")]
    ActorNotFound { actor_id: u32 },

    /// Simulation tick failed
    #[error("simulation tick {frame} failed: {message}")]
    Tick { frame: u64, message: String },

    // ===== Perception Errors =====
    /// Classifier invocation failed
    #[error("classifier error: {message}")]
    Classifier { message: String },

    /// Frame could not be decoded
    #[error("frame decode error for camera '{camera}': {message}")]
    FrameDecode { camera: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create spawn error
    pub fn spawn(actor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            actor: actor.into(),
            message: message.into(),
        }
    }

    /// Create tick error
    pub fn tick(frame: u64, message: impl Into<String>) -> Self {
        Self::Tick {
            frame,
            message: message.into(),
        }
    }

    /// Create classifier error
    pub fn classifier(message: impl Into<String>) -> Self {
        Self::Classifier {
            message: message.into(),
        }
    }

    /// Create frame decode error
    pub fn frame_decode(camera: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrameDecode {
            camera: camera.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
