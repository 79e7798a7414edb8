//! Source fetching with a revision-keyed install cache.
//!
//! Each dependency lives in `<install_root>/<name>/` next to a marker file that
//! records the revision last installed there. When the marker matches the
//! pinned revision the directory is trusted as-is; otherwise the repository is
//! cloned into a scratch directory, checked out, and copied over through the
//! dependency's filter rule.

use crate::dependency::DependencySpec;
use crate::error::{IoResultExt, ProvisionError};
use crate::fsops;
use crate::vcs::{SourceControl, short_hash};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// File inside an install directory holding the installed revision.
pub const MARKER_FILE: &str = ".stagehand-revision";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// Marker matched the pinned revision; nothing was touched.
    CacheHit,
    /// The tree was fetched and copied in this run.
    Fetched,
}

/// An installed dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationRecord {
    pub directory: PathBuf,
    pub revision: String,
    pub status: InstallStatus,
}

impl InstallationRecord {
    pub fn marker_path(&self) -> PathBuf {
        self.directory.join(MARKER_FILE)
    }
}

pub struct SourceFetcher<'a> {
    install_root: PathBuf,
    source_control: &'a dyn SourceControl,
}

impl<'a> SourceFetcher<'a> {
    pub fn new(install_root: impl Into<PathBuf>, source_control: &'a dyn SourceControl) -> Self {
        Self {
            install_root: install_root.into(),
            source_control,
        }
    }

    pub fn install_dir(&self, name: &str) -> PathBuf {
        self.install_root.join(name)
    }

    /// Revision recorded by the last successful install, if any.
    pub fn cached_revision(&self, name: &str) -> Option<String> {
        read_marker(&self.install_dir(name))
    }

    pub fn install(&self, spec: &DependencySpec) -> Result<InstallationRecord, ProvisionError> {
        let install_dir = self.install_dir(&spec.name);

        if let Some(pinned) = spec.revision.as_deref()
            && self.cached_revision(&spec.name).as_deref() == Some(pinned)
        {
            println!(
                "   {} {} is up to date ({})",
                "⚡".green(),
                spec.name,
                short_hash(pinned)
            );
            return Ok(InstallationRecord {
                directory: install_dir,
                revision: pinned.to_string(),
                status: InstallStatus::CacheHit,
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("stagehand-")
            .tempdir()
            .fs_context("create", &std::env::temp_dir())?;
        let checkout_dir = scratch.path().join(&spec.name);

        let resolved = self.pull(spec, &checkout_dir)?;

        if fsops::remove_tree(&install_dir)? {
            println!(
                "   {} Removed stale {}",
                "🗑".red(),
                install_dir.display()
            );
        }

        println!(
            "   {} Copying {} to {}",
            "→".cyan(),
            spec.name,
            install_dir.display()
        );
        fsops::copy_tree_filtered(&checkout_dir, &install_dir, &spec.filter)?;

        let pruned = fsops::prune_empty_dirs(&install_dir)?;
        if pruned > 0 {
            println!("   {} Pruned {} empty directories", "✂".dimmed(), pruned);
        }

        let marker_value = spec.revision.clone().unwrap_or_else(|| resolved.clone());
        let marker = install_dir.join(MARKER_FILE);
        fs::write(&marker, &marker_value).fs_context("write", &marker)?;

        drop(scratch);
        Ok(InstallationRecord {
            directory: install_dir,
            revision: resolved,
            status: InstallStatus::Fetched,
        })
    }

    /// Clone into `checkout_dir` and check out the pinned revision (or `HEAD`).
    fn pull(&self, spec: &DependencySpec, checkout_dir: &Path) -> Result<String, ProvisionError> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]),
        );
        pb.set_message(format!("Cloning {}...", spec.url));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        if let Err(err) = self.source_control.clone_repo(&spec.url, checkout_dir, false) {
            pb.finish_with_message(format!("{} Failed {}", "x".red(), spec.name));
            return Err(err);
        }

        let revision = spec.revision.as_deref().unwrap_or("HEAD");
        match self.source_control.checkout(checkout_dir, revision) {
            Ok(resolved) => {
                pb.finish_with_message(format!(
                    "{} Fetched {} at {}",
                    "✓".green(),
                    spec.name,
                    short_hash(&resolved)
                ));
                Ok(resolved)
            }
            Err(err) => {
                pb.finish_with_message(format!("{} Failed {}", "x".red(), spec.name));
                Err(err)
            }
        }
    }
}

fn read_marker(install_dir: &Path) -> Option<String> {
    fs::read_to_string(install_dir.join(MARKER_FILE))
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterRule;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// Serves canned trees keyed by revision and counts clones.
    #[derive(Default)]
    struct FakeRemote {
        trees: HashMap<String, Vec<(&'static str, &'static str)>>,
        clones: Cell<usize>,
        checked_out: RefCell<Vec<String>>,
    }

    impl FakeRemote {
        fn with(mut self, rev: &str, files: Vec<(&'static str, &'static str)>) -> Self {
            self.trees.insert(rev.to_string(), files);
            self
        }
    }

    impl SourceControl for FakeRemote {
        fn clone_repo(&self, _url: &str, dest: &Path, _checkout: bool) -> Result<(), ProvisionError> {
            self.clones.set(self.clones.get() + 1);
            fs::create_dir_all(dest.join(".git")).unwrap();
            Ok(())
        }

        fn checkout(&self, dest: &Path, revision: &str) -> Result<String, ProvisionError> {
            let files = self
                .trees
                .get(revision)
                .ok_or_else(|| ProvisionError::fetch("checkout", revision, "unknown revision"))?;
            for (path, contents) in files {
                let full = dest.join(path);
                fs::create_dir_all(full.parent().unwrap()).unwrap();
                fs::write(full, contents).unwrap();
            }
            self.checked_out.borrow_mut().push(revision.to_string());
            Ok(if revision == "HEAD" {
                "resolved-head".to_string()
            } else {
                revision.to_string()
            })
        }
    }

    fn tree_a() -> Vec<(&'static str, &'static str)> {
        vec![
            ("include/a.h", "a"),
            ("src/a.c", "a"),
            ("docs/index.md", "doc"),
            (".clang-format", "x"),
        ]
    }

    #[test]
    fn test_install_copies_filtered_tree_and_writes_marker() {
        let tmp = tempdir().unwrap();
        let remote = FakeRemote::default().with("A", tree_a());
        let fetcher = SourceFetcher::new(tmp.path(), &remote);
        let spec = DependencySpec::new("dep", "url").pinned("A");

        let record = fetcher.install(&spec).unwrap();

        assert_eq!(record.status, InstallStatus::Fetched);
        assert_eq!(record.revision, "A");
        let entries = fsops::list_entries(&record.directory).unwrap();
        assert_eq!(entries, [MARKER_FILE, "include", "src"]);
        assert_eq!(fetcher.cached_revision("dep").as_deref(), Some("A"));
    }

    #[test]
    fn test_second_install_is_cache_hit() {
        let tmp = tempdir().unwrap();
        let remote = FakeRemote::default().with("A", tree_a());
        let fetcher = SourceFetcher::new(tmp.path(), &remote);
        let spec = DependencySpec::new("dep", "url").pinned("A");

        fetcher.install(&spec).unwrap();
        let header = tmp.path().join("dep/include/a.h");
        let before = fs::read(&header).unwrap();

        let record = fetcher.install(&spec).unwrap();

        assert_eq!(record.status, InstallStatus::CacheHit);
        assert_eq!(remote.clones.get(), 1);
        assert_eq!(fs::read(&header).unwrap(), before);
    }

    #[test]
    fn test_new_revision_replaces_old_tree() {
        let tmp = tempdir().unwrap();
        let remote = FakeRemote::default()
            .with("A", tree_a())
            .with("B", vec![("include/b.h", "b")]);
        let fetcher = SourceFetcher::new(tmp.path(), &remote);

        fetcher
            .install(&DependencySpec::new("dep", "url").pinned("A"))
            .unwrap();
        let record = fetcher
            .install(&DependencySpec::new("dep", "url").pinned("B"))
            .unwrap();

        assert_eq!(record.status, InstallStatus::Fetched);
        assert!(!tmp.path().join("dep/src").exists());
        assert!(!tmp.path().join("dep/include/a.h").exists());
        assert!(tmp.path().join("dep/include/b.h").exists());
        assert_eq!(fetcher.cached_revision("dep").as_deref(), Some("B"));
    }

    #[test]
    fn test_unpinned_dependency_always_refetches() {
        let tmp = tempdir().unwrap();
        let remote = FakeRemote::default().with("HEAD", vec![("x.h", "x")]);
        let fetcher = SourceFetcher::new(tmp.path(), &remote);
        let spec = DependencySpec::new("dep", "url");

        let first = fetcher.install(&spec).unwrap();
        let second = fetcher.install(&spec).unwrap();

        assert_eq!(first.revision, "resolved-head");
        assert_eq!(second.status, InstallStatus::Fetched);
        assert_eq!(remote.clones.get(), 2);
        assert_eq!(*remote.checked_out.borrow(), ["HEAD", "HEAD"]);
    }

    #[test]
    fn test_failed_checkout_leaves_existing_install_untouched() {
        let tmp = tempdir().unwrap();
        let remote = FakeRemote::default().with("A", tree_a());
        let fetcher = SourceFetcher::new(tmp.path(), &remote);
        fetcher
            .install(&DependencySpec::new("dep", "url").pinned("A"))
            .unwrap();

        let err = fetcher
            .install(&DependencySpec::new("dep", "url").pinned("missing"))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Fetch { .. }));
        assert_eq!(fetcher.cached_revision("dep").as_deref(), Some("A"));
        assert!(tmp.path().join("dep/include/a.h").exists());
    }

    #[test]
    fn test_directories_emptied_by_filter_are_pruned() {
        let tmp = tempdir().unwrap();
        let remote = FakeRemote::default().with(
            "A",
            vec![("stb_image.h", "i"), ("deprecated/old.c", "o"), ("LICENSE", "l")],
        );
        let fetcher = SourceFetcher::new(tmp.path(), &remote);
        let spec = DependencySpec::new("stb", "url")
            .pinned("A")
            .with_filter(FilterRule::scoped("deprecated", ["keep.c"]));

        let record = fetcher.install(&spec).unwrap();

        assert!(!record.directory.join("deprecated").exists());
        assert!(record.directory.join("stb_image.h").exists());
    }
}
