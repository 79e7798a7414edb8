//! Declared dependencies and their validation.

use crate::adapter::BuildStrategy;
use crate::error::ProvisionError;
use crate::filter::FilterRule;
use std::collections::HashSet;

/// Names that would collide with the staging roots or the descriptor under `external/`.
pub const RESERVED_NAMES: &[&str] = &["include", "lib", "CMakeLists.txt"];

/// One managed dependency: where it comes from, what to keep, how to stage it.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    pub name: String,
    pub url: String,
    /// Pinned revision; `None` fetches whatever the remote `HEAD` is at fetch time.
    pub revision: Option<String>,
    pub filter: FilterRule,
    pub strategy: BuildStrategy,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            revision: None,
            filter: FilterRule::default(),
            strategy: BuildStrategy::None,
        }
    }

    pub fn pinned(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterRule) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_strategy(mut self, strategy: BuildStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ProvisionError> {
        let name = self.name.as_str();
        if name.is_empty() {
            return Err(ProvisionError::config("dependency name is empty"));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ProvisionError::config(format!(
                "dependency name '{}' must be a single directory name",
                name
            )));
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(ProvisionError::config(format!(
                "dependency name '{}' is reserved",
                name
            )));
        }
        if self.url.trim().is_empty() {
            return Err(ProvisionError::config(format!(
                "dependency '{}' has no source url",
                name
            )));
        }
        if let Some(rev) = &self.revision
            && rev.trim().is_empty()
        {
            return Err(ProvisionError::config(format!(
                "dependency '{}' has an empty revision",
                name
            )));
        }
        if let Some(rev) = &self.revision
            && rev != rev.trim()
        {
            return Err(ProvisionError::config(format!(
                "dependency '{}' revision '{}' has surrounding whitespace",
                name, rev
            )));
        }
        self.strategy
            .validate()
            .map_err(|msg| ProvisionError::config(format!("dependency '{}': {}", name, msg)))
    }
}

/// Validate every declaration and reject duplicate names.
pub fn validate_all(dependencies: &[DependencySpec]) -> Result<(), ProvisionError> {
    let mut seen = HashSet::new();
    for dep in dependencies {
        dep.validate()?;
        if !seen.insert(dep.name.as_str()) {
            return Err(ProvisionError::config(format!(
                "dependency '{}' is declared more than once",
                dep.name
            )));
        }
    }
    Ok(())
}
