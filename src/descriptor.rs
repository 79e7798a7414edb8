//! The generated `CMakeLists.txt` that pulls declared sub-projects into the
//! downstream build.
//!
//! The file is removed once at the start of a run and then appended to, one
//! block per native package, in declaration order.

use crate::error::{IoResultExt, ProvisionError};
use crate::native::{BuildOptions, OptionValue};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AggregateDescriptor {
    path: PathBuf,
}

impl AggregateDescriptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the descriptor left over from a previous run.
    pub fn reset(&self) -> Result<(), ProvisionError> {
        if self.path.exists() {
            fs::remove_file(&self.path).fs_context("remove", &self.path)?;
        }
        Ok(())
    }

    /// Append one sub-project block. Repeated subdirectories are not merged.
    pub fn append(&self, subdirectory: &str, options: &BuildOptions) -> Result<(), ProvisionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).fs_context("create", parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .fs_context("open", &self.path)?;
        file.write_all(render_block(subdirectory, options).as_bytes())
            .fs_context("write", &self.path)
    }
}

pub fn render_block(subdirectory: &str, options: &BuildOptions) -> String {
    let mut block = String::new();
    for (key, value) in options {
        block.push_str(&render_option(key, value));
        block.push('\n');
    }
    block.push_str(&format!("add_subdirectory({})\n\n", subdirectory));
    block
}

fn render_option(key: &str, value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(_) => format!("set({} {} CACHE BOOL \"\" FORCE)", key, value.render()),
        OptionValue::Text(s) => format!(
            "set({} \"{}\" CACHE STRING \"\" FORCE)",
            key,
            s.replace('\\', "\\\\").replace('"', "\\\"")
        ),
        _ => format!("set({} {} CACHE STRING \"\" FORCE)", key, value.render()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::options;
    use tempfile::tempdir;

    #[test]
    fn test_render_block_without_options() {
        assert_eq!(render_block("volk", &Vec::new()), "add_subdirectory(volk)\n\n");
    }

    #[test]
    fn test_render_block_with_options() {
        let opts = options([("FMT_INSTALL", false), ("FMT_TEST", false)]);
        assert_eq!(
            render_block("fmtlib", &opts),
            "set(FMT_INSTALL OFF CACHE BOOL \"\" FORCE)\n\
             set(FMT_TEST OFF CACHE BOOL \"\" FORCE)\n\
             add_subdirectory(fmtlib)\n\n"
        );
    }

    #[test]
    fn test_render_scalar_options() {
        let opts = vec![
            ("LEVEL".to_string(), OptionValue::Integer(3)),
            ("STD".to_string(), OptionValue::Text("c++20".into())),
        ];
        let block = render_block("x", &opts);
        assert!(block.contains("set(LEVEL 3 CACHE STRING \"\" FORCE)"));
        assert!(block.contains("set(STD \"c++20\" CACHE STRING \"\" FORCE)"));
    }

    #[test]
    fn test_text_options_escape_quotes_and_backslashes() {
        let opts = vec![(
            "TRACY_NAME".to_string(),
            OptionValue::Text(r#"say "hi" C:\tmp"#.into()),
        )];
        assert_eq!(
            render_block("Tracy", &opts),
            "set(TRACY_NAME \"say \\\"hi\\\" C:\\\\tmp\" CACHE STRING \"\" FORCE)\n\
             add_subdirectory(Tracy)\n\n"
        );
    }

    #[test]
    fn test_blocks_keep_append_order() {
        let tmp = tempdir().unwrap();
        let descriptor = AggregateDescriptor::new(tmp.path().join("external/CMakeLists.txt"));
        descriptor.append("X", &options([("X_OPT", true)])).unwrap();
        descriptor.append("Y", &Vec::new()).unwrap();
        descriptor.append("Z", &options([("Z_OPT", false)])).unwrap();

        let text = fs::read_to_string(descriptor.path()).unwrap();
        assert_eq!(
            text,
            "set(X_OPT ON CACHE BOOL \"\" FORCE)\nadd_subdirectory(X)\n\n\
             add_subdirectory(Y)\n\n\
             set(Z_OPT OFF CACHE BOOL \"\" FORCE)\nadd_subdirectory(Z)\n\n"
        );
    }

    #[test]
    fn test_reset_truncates_previous_run() {
        let tmp = tempdir().unwrap();
        let descriptor = AggregateDescriptor::new(tmp.path().join("CMakeLists.txt"));
        descriptor.append("old", &Vec::new()).unwrap();
        descriptor.reset().unwrap();
        assert!(!descriptor.path().exists());
        descriptor.reset().unwrap();

        descriptor.append("new", &Vec::new()).unwrap();
        let text = fs::read_to_string(descriptor.path()).unwrap();
        assert_eq!(text, "add_subdirectory(new)\n\n");
    }

    #[test]
    fn test_duplicate_subdirectory_is_not_merged() {
        let tmp = tempdir().unwrap();
        let descriptor = AggregateDescriptor::new(tmp.path().join("CMakeLists.txt"));
        descriptor.append("SDL", &Vec::new()).unwrap();
        descriptor.append("SDL", &Vec::new()).unwrap();
        let text = fs::read_to_string(descriptor.path()).unwrap();
        assert_eq!(text.matches("add_subdirectory(SDL)").count(), 2);
    }
}
