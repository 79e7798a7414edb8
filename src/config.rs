//! Settings, on-disk layout and the optional `stagehand.toml` manifest.
//!
//! ## Environment
//!
//! - `BASE_DIRECTORY` - root under which `external/` is created (default `.`)
//! - `CMAKE_COMMAND` - native build tool executable (default `cmake`)
//!
//! ## Manifest
//!
//! When `<base>/stagehand.toml` exists it replaces the built-in catalog.
//! Dependencies are processed in the order their tables appear:
//!
//! ```toml
//! [[dependency]]
//! name = "stb"
//! url = "https://github.com/nothings/stb.git"
//! revision = "f58f558c120e9b32c217290b80bad1a0729fbb2c"
//! filter = { policy = "allow", entries = ["LICENSE", "stb_image.h"] }
//! build = { strategy = "header-only", headers = { files = ["LICENSE", "stb_image.h"] } }
//!
//! [[dependency]]
//! name = "fmtlib"
//! url = "https://github.com/fmtlib/fmt.git"
//! build = { strategy = "cmake-package", options = { FMT_TEST = false } }
//! ```

use crate::adapter::{BuildStrategy, HeaderSelection, ImplementationUnit};
use crate::dependency::DependencySpec;
use crate::error::ProvisionError;
use crate::filter::FilterConfig;
use crate::native::{BuildConfiguration, BuildOptions, OptionValue};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "stagehand.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_directory: PathBuf,
    pub cmake_program: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("."),
            cmake_program: PathBuf::from("cmake"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(base) = std::env::var_os("BASE_DIRECTORY") {
            settings.base_directory = PathBuf::from(base);
        }
        if let Some(cmake) = std::env::var_os("CMAKE_COMMAND") {
            settings.cmake_program = PathBuf::from(cmake);
        }
        settings
    }

    pub fn layout(&self) -> Layout {
        Layout::new(&self.base_directory)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_directory.join(MANIFEST_FILE)
    }
}

/// Where installed trees, staged artifacts and the descriptor live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub install_root: PathBuf,
    pub include_root: PathBuf,
    pub lib_root: PathBuf,
    pub descriptor: PathBuf,
}

impl Layout {
    pub fn new(base: &Path) -> Self {
        let install_root = base.join("external");
        Self {
            include_root: install_root.join("include"),
            lib_root: install_root.join("lib"),
            descriptor: install_root.join("CMakeLists.txt"),
            install_root,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct Manifest {
    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<DependencyEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DependencyEntry {
    pub name: String,
    pub url: String,
    pub revision: Option<String>,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub build: StrategyConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum StrategyConfig {
    #[default]
    None,
    HeaderOnly {
        #[serde(default = "default_header_tree")]
        headers: HeaderSelection,
        implementation: Option<ImplementationUnit>,
    },
    CmakePackage {
        #[serde(default)]
        options: toml::Table,
    },
    CmakeBuild {
        #[serde(default)]
        options: toml::Table,
        #[serde(default = "default_header_subdirectory")]
        headers: HeaderSelection,
        configurations: Option<Vec<BuildConfiguration>>,
    },
}

fn default_header_tree() -> HeaderSelection {
    HeaderSelection::Tree
}

fn default_header_subdirectory() -> HeaderSelection {
    HeaderSelection::Subdirectory(PathBuf::from("include"))
}

fn convert_options(name: &str, table: &toml::Table) -> Result<BuildOptions, ProvisionError> {
    table
        .iter()
        .map(|(key, value)| {
            OptionValue::try_from(value)
                .map(|v| (key.clone(), v))
                .map_err(|msg| {
                    ProvisionError::config(format!(
                        "dependency '{}': option '{}' has an {}",
                        name, key, msg
                    ))
                })
        })
        .collect()
}

impl DependencyEntry {
    pub fn into_spec(self) -> Result<DependencySpec, ProvisionError> {
        let strategy = match self.build {
            StrategyConfig::None => BuildStrategy::None,
            StrategyConfig::HeaderOnly {
                headers,
                implementation,
            } => BuildStrategy::HeaderOnly {
                headers,
                implementation,
            },
            StrategyConfig::CmakePackage { options } => BuildStrategy::NativePackage {
                options: convert_options(&self.name, &options)?,
            },
            StrategyConfig::CmakeBuild {
                options,
                headers,
                configurations,
            } => BuildStrategy::NativeBuild {
                options: convert_options(&self.name, &options)?,
                headers,
                configurations: configurations.unwrap_or_else(|| BuildConfiguration::ALL.to_vec()),
            },
        };

        let mut spec = DependencySpec::new(self.name, self.url)
            .with_filter(self.filter.into())
            .with_strategy(strategy);
        spec.revision = self.revision;
        spec.validate()?;
        Ok(spec)
    }
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse stagehand.toml - check for syntax errors")
    }

    pub fn into_specs(self) -> Result<Vec<DependencySpec>, ProvisionError> {
        self.dependencies
            .into_iter()
            .map(DependencyEntry::into_spec)
            .collect()
    }
}

/// Dependencies from `stagehand.toml` if present, `None` to fall back to the catalog.
pub fn load_manifest(settings: &Settings) -> Result<Option<Vec<DependencySpec>>> {
    let path = settings.manifest_path();
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let specs = Manifest::parse(&content)?.into_specs()?;
    Ok(Some(specs))
}
