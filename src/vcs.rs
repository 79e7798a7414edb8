//! Version-control access for fetching dependency sources.

use crate::error::ProvisionError;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{BranchType, Oid, Repository};
use std::path::Path;

/// The operations the fetcher needs from a version-control client.
pub trait SourceControl {
    /// Clone `url` into `destination`, optionally without populating a working tree.
    fn clone_repo(
        &self,
        url: &str,
        destination: &Path,
        checkout_working_tree: bool,
    ) -> Result<(), ProvisionError>;

    /// Check out `revision` in the clone at `destination`. Returns the resolved commit id.
    fn checkout(&self, destination: &Path, revision: &str) -> Result<String, ProvisionError>;
}

/// [`SourceControl`] backed by libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git;

impl SourceControl for Git {
    fn clone_repo(
        &self,
        url: &str,
        destination: &Path,
        checkout_working_tree: bool,
    ) -> Result<(), ProvisionError> {
        let mut checkout = CheckoutBuilder::new();
        if !checkout_working_tree {
            checkout.dry_run();
        }
        RepoBuilder::new()
            .with_checkout(checkout)
            .clone(url, destination)
            .map_err(|e| ProvisionError::fetch("clone", url, e))?;
        Ok(())
    }

    fn checkout(&self, destination: &Path, revision: &str) -> Result<String, ProvisionError> {
        let repo = Repository::open(destination)
            .map_err(|e| ProvisionError::fetch("checkout", revision, e))?;
        let oid = resolve_revision(&repo, revision)
            .ok_or_else(|| ProvisionError::fetch("checkout", revision, "revision not found"))?;

        let object = repo
            .find_object(oid, None)
            .map_err(|e| ProvisionError::fetch("checkout", revision, e))?;
        let mut checkout_opts = CheckoutBuilder::new();
        checkout_opts.force();
        repo.checkout_tree(&object, Some(&mut checkout_opts))
            .map_err(|e| ProvisionError::fetch("checkout", revision, e))?;
        repo.set_head_detached(oid)
            .map_err(|e| ProvisionError::fetch("checkout", revision, e))?;
        Ok(oid.to_string())
    }
}

/// Commit for a revision: commit id, tag, `HEAD`, local branch, then `origin/<branch>`.
fn resolve_revision(repo: &Repository, revision: &str) -> Option<Oid> {
    if let Ok(object) = repo.revparse_single(revision)
        && let Ok(commit) = object.peel_to_commit()
    {
        return Some(commit.id());
    }

    if let Ok(branch) = repo.find_branch(revision, BranchType::Local)
        && let Ok(commit) = branch.get().peel_to_commit()
    {
        return Some(commit.id());
    }

    let remote_ref = format!("origin/{}", revision);
    if let Ok(branch) = repo.find_branch(&remote_ref, BranchType::Remote)
        && let Ok(commit) = branch.get().peel_to_commit()
    {
        return Some(commit.id());
    }

    None
}

/// First seven characters of a revision, for display.
pub fn short_hash(rev: &str) -> &str {
    match rev.char_indices().nth(7) {
        Some((idx, _)) => &rev[..idx],
        None => rev,
    }
}
