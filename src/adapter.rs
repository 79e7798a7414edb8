//! Build adapters: how an installed dependency becomes staged artifacts.
//!
//! Every dependency carries one [`BuildStrategy`]. The strategy runs after the
//! source tree is installed and leaves its result on disk: header trees under
//! `include/<name>`, binaries under `lib/<name>/<Configuration>`, or a block in
//! the aggregate `CMakeLists.txt`.

use crate::dependency::DependencySpec;
use crate::descriptor::AggregateDescriptor;
use crate::error::{IoResultExt, ProvisionError};
use crate::fetch::{InstallationRecord, MARKER_FILE};
use crate::fsops;
use crate::native::{BuildConfiguration, BuildOptions, BuildTool};
use crate::staging::Staging;
use colored::*;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// File extensions copied out of a native build's output directory.
pub const BINARY_EXTENSIONS: &[&str] = &["lib", "dll", "pdb", "a", "so", "dylib"];

/// Which part of the installed tree becomes the staged header tree.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderSelection {
    /// Everything that was installed.
    Tree,
    /// The contents of one subdirectory (e.g. `include`).
    Subdirectory(PathBuf),
    /// An explicit list of files, relative to the install directory.
    Files(Vec<PathBuf>),
}

/// A generated source file that compiles a header-only library's implementation.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImplementationUnit {
    pub file_name: String,
    pub sections: Vec<ImplementationSection>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImplementationSection {
    pub define: String,
    pub header: String,
}

impl ImplementationUnit {
    pub fn new<I>(file_name: impl Into<String>, sections: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        Self {
            file_name: file_name.into(),
            sections: sections
                .into_iter()
                .map(|(define, header)| ImplementationSection {
                    define: define.to_string(),
                    header: header.to_string(),
                })
                .collect(),
        }
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("#define {}\n#include \"{}\"\n", s.define, s.header))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything a strategy may touch while building one dependency.
pub struct BuildContext<'a> {
    pub spec: &'a DependencySpec,
    pub record: &'a InstallationRecord,
    pub staging: &'a Staging,
    pub descriptor: &'a AggregateDescriptor,
    pub tool: &'a dyn BuildTool,
}

/// Dependency-specific build logic that replaces the stock strategies.
pub trait CustomBuild: Send + Sync {
    fn build(&self, context: &BuildContext<'_>) -> Result<(), ProvisionError>;
}

impl<F> CustomBuild for F
where
    F: Fn(&BuildContext<'_>) -> Result<(), ProvisionError> + Send + Sync,
{
    fn build(&self, context: &BuildContext<'_>) -> Result<(), ProvisionError> {
        self(context)
    }
}

#[derive(Clone)]
pub struct CustomAdapter {
    label: String,
    inner: Arc<dyn CustomBuild>,
}

impl CustomAdapter {
    pub fn new<F>(label: impl Into<String>, build: F) -> Self
    where
        F: Fn(&BuildContext<'_>) -> Result<(), ProvisionError> + Send + Sync + 'static,
    {
        Self::from_build(label, build)
    }

    pub fn from_build(label: impl Into<String>, build: impl CustomBuild + 'static) -> Self {
        Self {
            label: label.into(),
            inner: Arc::new(build),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for CustomAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAdapter")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub enum BuildStrategy {
    /// Consumed as the installed source tree; nothing to do.
    #[default]
    None,
    /// Copy headers into `include/<name>`, optionally adding an implementation unit.
    HeaderOnly {
        headers: HeaderSelection,
        implementation: Option<ImplementationUnit>,
    },
    /// Declare the tree as a sub-project of the aggregate `CMakeLists.txt`.
    NativePackage { options: BuildOptions },
    /// Configure and build with the native tool, then stage binaries and headers.
    NativeBuild {
        options: BuildOptions,
        headers: HeaderSelection,
        configurations: Vec<BuildConfiguration>,
    },
    Custom(CustomAdapter),
}

impl BuildStrategy {
    /// `NativeBuild` for every configuration, staging the `include` directory.
    pub fn native_build(options: BuildOptions) -> Self {
        BuildStrategy::NativeBuild {
            options,
            headers: HeaderSelection::Subdirectory(PathBuf::from("include")),
            configurations: BuildConfiguration::ALL.to_vec(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BuildStrategy::None => "none",
            BuildStrategy::HeaderOnly { .. } => "header-only",
            BuildStrategy::NativePackage { .. } => "cmake-package",
            BuildStrategy::NativeBuild { .. } => "cmake-build",
            BuildStrategy::Custom(adapter) => adapter.label(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let (options, headers) = match self {
            BuildStrategy::None | BuildStrategy::Custom(_) => return Ok(()),
            BuildStrategy::HeaderOnly { headers, .. } => (None, Some(headers)),
            BuildStrategy::NativePackage { options } => (Some(options), None),
            BuildStrategy::NativeBuild {
                options,
                headers,
                configurations,
            } => {
                if configurations.is_empty() {
                    return Err("no build configurations selected".to_string());
                }
                (Some(options), Some(headers))
            }
        };

        for (key, _) in options.into_iter().flatten() {
            if key.is_empty() || key.chars().any(char::is_whitespace) {
                return Err(format!("invalid option name '{}'", key));
            }
        }
        if let Some(HeaderSelection::Files(files)) = headers
            && files.is_empty()
        {
            return Err("header file list is empty".to_string());
        }
        if let Some(headers) = headers {
            check_selection(headers)?;
        }
        if let BuildStrategy::HeaderOnly {
            implementation: Some(unit),
            ..
        } = self
        {
            check_file_name(&unit.file_name)?;
        }
        Ok(())
    }

    pub fn build(&self, context: &BuildContext<'_>) -> Result<(), ProvisionError> {
        let name = context.spec.name.as_str();
        let install_dir = context.record.directory.as_path();

        match self {
            BuildStrategy::None => Ok(()),
            BuildStrategy::HeaderOnly {
                headers,
                implementation,
            } => {
                let staged = context.staging.stage_headers(name)?;
                stage_selection(headers, install_dir, &staged)?;
                if let Some(unit) = implementation {
                    check_file_name(&unit.file_name).map_err(ProvisionError::Configuration)?;
                    println!("   {} Generating {}", "📝".magenta(), unit.file_name);
                    let path = staged.join(&unit.file_name);
                    fs::write(&path, unit.render()).fs_context("write", &path)?;
                }
                Ok(())
            }
            BuildStrategy::NativePackage { options } => {
                println!(
                    "   {} Declaring {} in {}",
                    "+".green(),
                    name,
                    context.descriptor.path().display()
                );
                context.descriptor.append(name, options)
            }
            BuildStrategy::NativeBuild {
                options,
                headers,
                configurations,
            } => {
                println!("   {} Configuring {}...", "🔨".yellow(), name);
                context.tool.configure(install_dir, options)?;
                context.staging.clear_binaries(name)?;

                for &configuration in configurations {
                    println!("   {} Building {} ({})", "🔨".yellow(), name, configuration);
                    context.tool.build(install_dir, configuration)?;
                    let staged = context.staging.stage_binaries(name, configuration)?;
                    let output = context.tool.output_dir(install_dir, configuration);
                    if !output.is_dir() {
                        return Err(ProvisionError::BuildTool {
                            program: "cmake".to_string(),
                            step: format!("build ({})", configuration),
                            path: install_dir.to_path_buf(),
                            detail: format!(
                                "no output in {}; a multi-config generator is required",
                                output.display()
                            ),
                        });
                    }
                    let copied = copy_binaries(&output, &staged)?;
                    println!(
                        "   {} Staged {} artifacts in {}",
                        "✓".green(),
                        copied,
                        staged.display()
                    );
                }

                let staged = context.staging.stage_headers(name)?;
                stage_selection(headers, install_dir, &staged)
            }
            BuildStrategy::Custom(adapter) => adapter.inner.build(context),
        }
    }
}

/// Copy the selected part of `install_dir` into a freshly staged header directory.
pub fn stage_selection(
    headers: &HeaderSelection,
    install_dir: &Path,
    staged: &Path,
) -> Result<(), ProvisionError> {
    check_selection(headers).map_err(ProvisionError::Configuration)?;
    match headers {
        HeaderSelection::Tree => {
            for name in fsops::list_entries(install_dir)? {
                if name == MARKER_FILE {
                    continue;
                }
                let src = install_dir.join(&name);
                let dst = staged.join(&name);
                if src.is_dir() {
                    fsops::copy_tree(&src, &dst)?;
                } else {
                    fsops::copy_file(&src, &dst)?;
                }
            }
            Ok(())
        }
        HeaderSelection::Subdirectory(sub) => fsops::copy_tree(&install_dir.join(sub), staged),
        HeaderSelection::Files(files) => {
            for file in files {
                fsops::copy_file(&install_dir.join(file), &staged.join(file))?;
            }
            Ok(())
        }
    }
}

/// `path` must be relative and made of plain names only, so joining it stays inside the base.
fn check_relative(path: &Path) -> Result<(), String> {
    let mut components = path.components().peekable();
    let contained = components.peek().is_some()
        && components.all(|c| matches!(c, Component::Normal(_)));
    if contained {
        Ok(())
    } else {
        Err(format!(
            "path '{}' must be relative and must not leave the dependency",
            path.display()
        ))
    }
}

fn check_selection(headers: &HeaderSelection) -> Result<(), String> {
    match headers {
        HeaderSelection::Tree => Ok(()),
        HeaderSelection::Subdirectory(sub) => check_relative(sub),
        HeaderSelection::Files(files) => files.iter().try_for_each(|f| check_relative(f)),
    }
}

fn check_file_name(file_name: &str) -> Result<(), String> {
    let path = Path::new(file_name);
    check_relative(path)?;
    if path.components().count() != 1 {
        return Err(format!(
            "implementation file '{}' must be a plain file name",
            file_name
        ));
    }
    Ok(())
}

/// Copy every recognized binary from `output` into `staged`. Returns how many were copied.
pub fn copy_binaries(output: &Path, staged: &Path) -> Result<usize, ProvisionError> {
    let mut copied = 0;
    for name in fsops::list_entries(output)? {
        let src = output.join(&name);
        let recognized = src
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext));
        if recognized && src.is_file() {
            fsops::copy_file(&src, &staged.join(&name))?;
            copied += 1;
        }
    }
    Ok(copied)
}
