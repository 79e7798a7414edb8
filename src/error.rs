//! Error taxonomy for the provisioning pipeline.
//!
//! Component operations return [`ProvisionError`]; the driver and the CLI wrap
//! it with `anyhow` context naming the dependency and the step that failed.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Clone or checkout failed (network, auth, unknown revision).
    #[error("{operation} of '{target}' failed: {message}")]
    Fetch {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// Copy, remove or create failed.
    #[error("failed to {operation} {}: {source}", path.display())]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The native build tool could not be started or exited non-zero.
    #[error("{program} {step} in {} failed: {detail}", path.display())]
    BuildTool {
        program: String,
        step: String,
        path: PathBuf,
        detail: String,
    },

    /// A declared dependency is malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl ProvisionError {
    pub fn fetch(operation: &'static str, target: impl Into<String>, err: impl ToString) -> Self {
        ProvisionError::Fetch {
            operation,
            target: target.into(),
            message: err.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ProvisionError::Configuration(message.into())
    }
}

/// Attach the failed operation and path to an `io::Result`.
pub trait IoResultExt<T> {
    fn fs_context(self, operation: &'static str, path: &Path) -> Result<T, ProvisionError>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn fs_context(self, operation: &'static str, path: &Path) -> Result<T, ProvisionError> {
        self.map_err(|source| ProvisionError::Filesystem {
            operation,
            path: path.to_path_buf(),
            source,
        })
    }
}
