//! Native build tool access (CMake) and build option values.

use crate::error::{IoResultExt, ProvisionError};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Build profiles staged separately for compiled dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum BuildConfiguration {
    Debug,
    Release,
}

impl BuildConfiguration {
    pub const ALL: [BuildConfiguration; 2] = [BuildConfiguration::Debug, BuildConfiguration::Release];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "Debug",
            BuildConfiguration::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a forced native build option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Booleans become `ON`/`OFF`; everything else passes through unchanged.
    pub fn render(&self) -> String {
        match self {
            OptionValue::Bool(true) => "ON".to_string(),
            OptionValue::Bool(false) => "OFF".to_string(),
            OptionValue::Integer(n) => n.to_string(),
            OptionValue::Float(x) => x.to_string(),
            OptionValue::Text(s) => s.clone(),
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, OptionValue::Bool(_))
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl TryFrom<&toml::Value> for OptionValue {
    type Error = String;

    fn try_from(value: &toml::Value) -> Result<Self, Self::Error> {
        match value {
            toml::Value::Boolean(b) => Ok(OptionValue::Bool(*b)),
            toml::Value::Integer(n) => Ok(OptionValue::Integer(*n)),
            toml::Value::Float(x) => Ok(OptionValue::Float(*x)),
            toml::Value::String(s) => Ok(OptionValue::Text(s.clone())),
            other => Err(format!("unsupported {} value", other.type_str())),
        }
    }
}

/// Ordered set of `KEY = value` options passed to the build tool.
pub type BuildOptions = Vec<(String, OptionValue)>;

/// Build options from `(key, value)` pairs, keeping their order.
pub fn options<I, K, V>(pairs: I) -> BuildOptions
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<OptionValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The operations adapters need from the native build tool.
pub trait BuildTool {
    /// Configure the project at `path` with the given options.
    fn configure(&self, path: &Path, options: &BuildOptions) -> Result<(), ProvisionError>;

    /// Build one configuration of an already configured project.
    fn build(&self, path: &Path, configuration: BuildConfiguration) -> Result<(), ProvisionError>;

    /// Directory holding the binaries of one configuration after [`BuildTool::build`].
    fn output_dir(&self, path: &Path, configuration: BuildConfiguration) -> PathBuf {
        path.join(configuration.as_str())
    }
}

/// [`BuildTool`] that runs the `cmake` executable in-source.
#[derive(Debug, Clone)]
pub struct CMake {
    program: PathBuf,
}

impl Default for CMake {
    fn default() -> Self {
        Self::new("cmake")
    }
}

impl CMake {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, path: &Path, step: &str, args: &[String]) -> Result<(), ProvisionError> {
        let program = self.program.to_string_lossy().to_string();
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(path)
            .status()
            .map_err(|e| ProvisionError::BuildTool {
                program: program.clone(),
                step: step.to_string(),
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        if !status.success() {
            return Err(ProvisionError::BuildTool {
                program,
                step: step.to_string(),
                path: path.to_path_buf(),
                detail: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

/// Per-configuration output directory overrides, so every target's archives,
/// shared libraries and executables land in `<root>/<Configuration>`.
///
/// Only multi-config generators (Visual Studio, Xcode, Ninja Multi-Config)
/// honour these for both configurations; a single-config generator builds one
/// configuration and leaves the other output directory missing.
pub fn output_dir_args(tool: &dyn BuildTool, root: &Path) -> Vec<String> {
    let mut args = Vec::new();
    for configuration in BuildConfiguration::ALL {
        let dir = tool.output_dir(root, configuration);
        let suffix = configuration.as_str().to_uppercase();
        for kind in ["ARCHIVE", "LIBRARY", "RUNTIME"] {
            args.push(format!(
                "-DCMAKE_{}_OUTPUT_DIRECTORY_{}={}",
                kind,
                suffix,
                dir.display()
            ));
        }
    }
    args
}

/// `-DKEY=VALUE` arguments for a configure step.
pub fn define_args(options: &BuildOptions) -> Vec<String> {
    options
        .iter()
        .map(|(key, value)| format!("-D{}={}", key, value.render()))
        .collect()
}

impl BuildTool for CMake {
    fn configure(&self, path: &Path, options: &BuildOptions) -> Result<(), ProvisionError> {
        let root = std::path::absolute(path).fs_context("resolve", path)?;
        let mut args = define_args(options);
        args.extend(output_dir_args(self, &root));
        args.push(".".to_string());
        self.run(path, "configure", &args)
    }

    fn build(&self, path: &Path, configuration: BuildConfiguration) -> Result<(), ProvisionError> {
        let args = [
            "--build".to_string(),
            ".".to_string(),
            "--config".to_string(),
            configuration.to_string(),
        ];
        self.run(path, &format!("build ({})", configuration), &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bool_as_on_off() {
        assert_eq!(OptionValue::Bool(true).render(), "ON");
        assert_eq!(OptionValue::Bool(false).render(), "OFF");
    }

    #[test]
    fn test_render_scalars_unchanged() {
        assert_eq!(OptionValue::Integer(64).render(), "64");
        assert_eq!(OptionValue::Float(1.5).render(), "1.5");
        assert_eq!(OptionValue::Text("c++20".into()).render(), "c++20");
    }

    #[test]
    fn test_define_args_keep_order() {
        let opts = options([("SDL_STATIC", true), ("SDL_AVX", false)]);
        assert_eq!(define_args(&opts), ["-DSDL_STATIC=ON", "-DSDL_AVX=OFF"]);
    }

    #[test]
    fn test_option_from_toml_rejects_arrays() {
        let value = toml::Value::Array(vec![]);
        assert!(OptionValue::try_from(&value).is_err());
        let value = toml::Value::Boolean(true);
        assert_eq!(OptionValue::try_from(&value), Ok(OptionValue::Bool(true)));
    }

    #[test]
    fn test_missing_program_is_build_tool_error() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = CMake::new(tmp.path().join("no-such-cmake"));
        let err = tool
            .build(tmp.path(), BuildConfiguration::Debug)
            .unwrap_err();
        assert!(matches!(err, ProvisionError::BuildTool { .. }));
    }

    #[test]
    fn test_output_dir_args_pin_every_artifact_kind() {
        let args = output_dir_args(&CMake::default(), Path::new("/work/external/SDL"));
        assert_eq!(args.len(), 6);
        assert_eq!(
            args[0],
            "-DCMAKE_ARCHIVE_OUTPUT_DIRECTORY_DEBUG=/work/external/SDL/Debug"
        );
        assert!(args.contains(
            &"-DCMAKE_RUNTIME_OUTPUT_DIRECTORY_RELEASE=/work/external/SDL/Release".to_string()
        ));
    }

    #[test]
    fn test_default_output_dir_is_per_configuration() {
        let tool = CMake::default();
        assert_eq!(
            tool.output_dir(Path::new("external/Tracy"), BuildConfiguration::Release),
            Path::new("external/Tracy/Release")
        );
    }
}
