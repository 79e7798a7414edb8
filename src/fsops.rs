//! Filesystem helpers used by the fetcher, the staging sinks and the adapters.
//!
//! Every failure is reported as [`ProvisionError::Filesystem`] with the
//! operation and path that failed.

use crate::error::{IoResultExt, ProvisionError};
use crate::filter::{Entry, FilterRule};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Remove a directory tree if it exists. Returns whether anything was removed.
pub fn remove_tree(path: &Path) -> Result<bool, ProvisionError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path).fs_context("remove", path)?;
    Ok(true)
}

/// Create `path`, failing if it already exists. Missing parents are created.
pub fn create_dir(path: &Path) -> Result<(), ProvisionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).fs_context("create", parent)?;
    }
    fs::create_dir(path).fs_context("create", path)
}

pub fn copy_file(src: &Path, dst: &Path) -> Result<(), ProvisionError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).fs_context("create", parent)?;
    }
    fs::copy(src, dst).fs_context("copy", src)?;
    Ok(())
}

/// Recursively copy `src` into `dst`, merging with whatever `dst` already holds.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<(), ProvisionError> {
    fs::create_dir_all(dst).fs_context("create", dst)?;
    for entry in fs::read_dir(src).fs_context("read", src)? {
        let entry = entry.fs_context("read", src)?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_tree(&path, &target)?;
        } else {
            fs::copy(&path, &target).fs_context("copy", &path)?;
        }
    }
    Ok(())
}

/// Copy `src` into `dst`, asking `rule` which entries to leave out of each directory.
pub fn copy_tree_filtered(src: &Path, dst: &Path, rule: &FilterRule) -> Result<(), ProvisionError> {
    copy_level(src, dst, Path::new(""), rule)
}

fn copy_level(
    src_root: &Path,
    dst_root: &Path,
    relative: &Path,
    rule: &FilterRule,
) -> Result<(), ProvisionError> {
    let src_dir = src_root.join(relative);
    let dst_dir = dst_root.join(relative);
    fs::create_dir_all(&dst_dir).fs_context("create", &dst_dir)?;

    let entries = read_entries(&src_dir)?;
    for entry in rule.included(relative, &entries) {
        let child = relative.join(&entry.name);
        let src_path = src_root.join(&child);
        if entry.is_dir {
            copy_level(src_root, dst_root, &child, rule)?;
        } else {
            let dst_path = dst_root.join(&child);
            fs::copy(&src_path, &dst_path).fs_context("copy", &src_path)?;
        }
    }
    Ok(())
}

/// Entry names of a directory, sorted.
pub fn list_entries(dir: &Path) -> Result<Vec<String>, ProvisionError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).fs_context("read", dir)? {
        let entry = entry.fs_context("read", dir)?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}

/// Entries of a directory with their kind, sorted by name.
pub fn read_entries(dir: &Path) -> Result<Vec<Entry>, ProvisionError> {
    Ok(list_entries(dir)?
        .into_iter()
        .map(|name| Entry {
            is_dir: dir.join(&name).is_dir(),
            name,
        })
        .collect())
}

/// Remove every empty directory below `root`, deepest first. `root` itself is kept.
///
/// Returns the number of directories removed.
pub fn prune_empty_dirs(root: &Path) -> Result<usize, ProvisionError> {
    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| ProvisionError::Filesystem {
            operation: "walk",
            path: root.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let is_empty = fs::read_dir(path)
            .fs_context("read", path)?
            .next()
            .is_none();
        if is_empty {
            fs::remove_dir(path).fs_context("remove", path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DenyList;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    #[test]
    fn test_copy_tree_filtered_drops_excluded_entries() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("src/lib.c"));
        touch(&src.join("tests/test.c"));
        touch(&src.join(".git/HEAD"));
        touch(&src.join("README.md"));

        let dst = tmp.path().join("dst");
        let rule = FilterRule::Deny(DenyList::empty().with_directories([".git", "tests"]));
        copy_tree_filtered(&src, &dst, &rule).unwrap();

        assert_eq!(list_entries(&dst).unwrap(), ["README.md", "src"]);
        assert!(dst.join("src/lib.c").is_file());
    }

    #[test]
    fn test_copy_tree_filtered_keeps_root_file_named_like_ignored_directory() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("test"));
        touch(&src.join("tools/gen.py"));
        touch(&src.join("include/lib.h"));

        let dst = tmp.path().join("dst");
        copy_tree_filtered(&src, &dst, &FilterRule::default()).unwrap();

        assert_eq!(list_entries(&dst).unwrap(), ["include", "test"]);
        assert!(dst.join("test").is_file());
    }

    #[test]
    fn test_allow_list_copy_keeps_only_named_files() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("LICENSE"));
        touch(&src.join("stb_image.h"));
        touch(&src.join("stb_truetype.h"));
        touch(&src.join("stb_vorbis.c"));
        touch(&src.join("deprecated/stb_image.h"));

        let dst = tmp.path().join("dst");
        copy_tree_filtered(&src, &dst, &FilterRule::allow(["LICENSE", "stb_image.h"])).unwrap();

        assert_eq!(list_entries(&dst).unwrap(), ["LICENSE", "stb_image.h"]);
    }

    #[test]
    fn test_prune_removes_nested_empty_directories() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        touch(&root.join("keep/file.h"));
        fs::create_dir_all(root.join("keep/empty")).unwrap();

        let removed = prune_empty_dirs(root).unwrap();

        assert_eq!(removed, 4);
        assert!(!root.join("a").exists());
        assert!(!root.join("keep/empty").exists());
        assert!(root.join("keep/file.h").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_create_dir_fails_if_present() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("x/y");
        create_dir(&dir).unwrap();
        assert!(create_dir(&dir).is_err());
    }

    #[test]
    fn test_copy_tree_merges_into_existing_destination() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        touch(&src.join("inner/new.h"));
        let dst = tmp.path().join("dst");
        touch(&dst.join("old.h"));

        copy_tree(&src, &dst).unwrap();

        assert!(dst.join("old.h").exists());
        assert!(dst.join("inner/new.h").exists());
    }

    #[test]
    fn test_remove_tree_missing_is_noop() {
        let tmp = tempdir().unwrap();
        assert!(!remove_tree(&tmp.path().join("missing")).unwrap());
    }
}
