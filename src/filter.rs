//! Filter rules applied while copying a fetched tree into its install location.
//!
//! A rule is asked once per visited directory: given the directory (relative to
//! the root of the copy) and its entries, it answers which entries to leave
//! behind. Matching is by exact name at the current level only.
//!
//! ## Policies
//!
//! - [`FilterRule::Deny`] - keep everything except known clutter (VCS metadata,
//!   docs, examples, tests, IDE projects, lint/CI files)
//! - [`FilterRule::Allow`] - keep only the named entries, in every directory
//! - [`FilterRule::Scoped`] - allow-list inside one subdirectory, deny-list
//!   everywhere else

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Directory names dropped from the root of a dependency's tree.
pub const IGNORED_DIRECTORIES: &[&str] = &[
    ".git",
    ".github",
    "bin",
    "media",
    "tools",
    "docs",
    "doc",
    "examples",
    "misc",
    "tests",
    "test",
    "VisualC-GDK",
    "VisualC",
    "XCode",
    "android-project",
];

/// File names dropped from every directory.
pub const IGNORED_FILES: &[&str] = &[
    ".gitignore",
    ".gitmodules",
    ".readthedocs.yaml",
    ".clang-format",
    ".clang-tidy",
    "Doxyfile",
    "CHANGELOG.md",
    "CONTRIBUTING.md",
    ".gitattributes",
    ".editorconfig",
    ".wikiheaders-options",
    "Android.mk",
    "BUGS.txt",
    "WhatsNew.txt",
    ".codecov.yml",
];

/// One entry of a visited directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyList {
    directories: BTreeSet<String>,
    files: BTreeSet<String>,
}

impl Default for DenyList {
    fn default() -> Self {
        Self {
            directories: IGNORED_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
            files: IGNORED_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DenyList {
    /// A deny-list with no entries at all.
    pub fn empty() -> Self {
        Self {
            directories: BTreeSet::new(),
            files: BTreeSet::new(),
        }
    }

    pub fn with_directories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directories.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(names.into_iter().map(Into::into));
        self
    }

    fn excludes(&self, directory: &Path, entry: &Entry) -> bool {
        // Directory names are only matched against directories at the root of the tree.
        let at_root = directory.as_os_str().is_empty();
        (at_root && entry.is_dir && self.directories.contains(&entry.name))
            || self.files.contains(&entry.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRule {
    Deny(DenyList),
    Allow(BTreeSet<String>),
    Scoped {
        subdirectory: PathBuf,
        allow: BTreeSet<String>,
        fallback: DenyList,
    },
}

impl Default for FilterRule {
    fn default() -> Self {
        FilterRule::Deny(DenyList::default())
    }
}

impl FilterRule {
    pub fn allow<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterRule::Allow(names.into_iter().map(Into::into).collect())
    }

    /// Allow-list inside `subdirectory`, default deny-list elsewhere.
    pub fn scoped<I, S>(subdirectory: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterRule::Scoped {
            subdirectory: subdirectory.into(),
            allow: names.into_iter().map(Into::into).collect(),
            fallback: DenyList::default(),
        }
    }

    /// Whether `entry` inside `directory` (relative to the copy root) is dropped.
    pub fn excludes(&self, directory: &Path, entry: &Entry) -> bool {
        match self {
            FilterRule::Deny(deny) => deny.excludes(directory, entry),
            FilterRule::Allow(allow) => !allow.contains(&entry.name),
            FilterRule::Scoped {
                subdirectory,
                allow,
                fallback,
            } => {
                if directory == subdirectory.as_path() {
                    !allow.contains(&entry.name)
                } else {
                    fallback.excludes(directory, entry)
                }
            }
        }
    }

    /// Entries of `directory` that must not be copied.
    pub fn excluded<'a>(&self, directory: &Path, entries: &'a [Entry]) -> Vec<&'a Entry> {
        entries
            .iter()
            .filter(|entry| self.excludes(directory, entry))
            .collect()
    }

    /// Entries of `directory` that survive the copy.
    pub fn included<'a>(&self, directory: &Path, entries: &'a [Entry]) -> Vec<&'a Entry> {
        entries
            .iter()
            .filter(|entry| !self.excludes(directory, entry))
            .collect()
    }
}

/// Manifest form of a [`FilterRule`].
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum FilterConfig {
    Deny {
        #[serde(default)]
        directories: Vec<String>,
        #[serde(default)]
        files: Vec<String>,
    },
    Allow {
        entries: Vec<String>,
    },
    Scoped {
        subdirectory: PathBuf,
        entries: Vec<String>,
    },
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig::Deny {
            directories: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl From<FilterConfig> for FilterRule {
    fn from(config: FilterConfig) -> Self {
        match config {
            FilterConfig::Deny { directories, files } => FilterRule::Deny(
                DenyList::default()
                    .with_directories(directories)
                    .with_files(files),
            ),
            FilterConfig::Allow { entries } => FilterRule::allow(entries),
            FilterConfig::Scoped {
                subdirectory,
                entries,
            } => FilterRule::scoped(subdirectory, entries),
        }
    }
}
