//! Staging sinks for header trees and per-configuration binaries.
//!
//! A staged directory is always replaced, never merged: any previous content
//! under the same key is deleted before the directory is recreated.

use crate::error::ProvisionError;
use crate::fsops;
use crate::native::BuildConfiguration;
use colored::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Staging {
    include_root: PathBuf,
    lib_root: PathBuf,
}

impl Staging {
    pub fn new(include_root: impl Into<PathBuf>, lib_root: impl Into<PathBuf>) -> Self {
        Self {
            include_root: include_root.into(),
            lib_root: lib_root.into(),
        }
    }

    pub fn include_root(&self) -> &Path {
        &self.include_root
    }

    pub fn lib_root(&self) -> &Path {
        &self.lib_root
    }

    /// Fresh `include/<name>` directory.
    pub fn stage_headers(&self, name: &str) -> Result<PathBuf, ProvisionError> {
        replace_dir(self.include_root.join(name))
    }

    /// Fresh `lib/<name>/<configuration>` directory.
    pub fn stage_binaries(
        &self,
        name: &str,
        configuration: BuildConfiguration,
    ) -> Result<PathBuf, ProvisionError> {
        replace_dir(self.lib_root.join(name).join(configuration.as_str()))
    }

    /// Drop every configuration staged for `name`.
    pub fn clear_binaries(&self, name: &str) -> Result<(), ProvisionError> {
        let path = self.lib_root.join(name);
        if fsops::remove_tree(&path)? {
            println!("   {} Removed {}", "🗑".red(), path.display());
        }
        Ok(())
    }
}

fn replace_dir(path: PathBuf) -> Result<PathBuf, ProvisionError> {
    if fsops::remove_tree(&path)? {
        println!("   {} {} exists, replacing", "!".yellow(), path.display());
    }
    fsops::create_dir(&path)?;
    Ok(path)
}
