//! Dispatcher error types

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A sink could not open its output
    #[error("failed to open sink '{name}'")]
    SinkCreation {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Two configured sinks share a name
    #[error("duplicate sink name '{0}'")]
    DuplicateSink(String),

    #[error("failed to create assets directory {}", path.display())]
    AssetsDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A warning tone could not be written
    #[error("failed to write tone {}", path.display())]
    ToneWrite {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, source: io::Error) -> Self {
        Self::SinkCreation {
            name: name.into(),
            source,
        }
    }

    pub fn assets_dir(path: &Path, source: io::Error) -> Self {
        Self::AssetsDir {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn tone_write(path: &Path, source: hound::Error) -> Self {
        Self::ToneWrite {
            path: path.to_path_buf(),
            source,
        }
    }
}
