//! Repository access abstraction layer
//!
//! The release pipeline only needs read access to a repository's history
//! and blobs. This module provides a trait-based abstraction over those
//! operations so the pipeline can run against a real clone or an in-memory
//! fixture.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A mock implementation for testing
//!
//! Commits are identified by their hexadecimal id as a `String`, because a
//! release label may itself be a raw commit identifier that never passes
//! through object lookup.
//!
//! ```rust
//! # use app_registry::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> app_registry::Result<()> {
//! let branch = repo.current_branch()?;
//! for tag in repo.tags_merged_into(&branch)? {
//!     let commit = repo.commit_for_tag(&tag)?;
//!     println!("{} -> {}", tag, commit);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Read-only git operations needed for release discovery
///
/// ## Error Handling
///
/// Implementations map backend failures onto the repository-state variants
/// of [crate::error::RegistryError], keeping the backend's diagnostic text.
pub trait Repository {
    /// Name of the checked-out branch
    ///
    /// # Errors
    /// * `BranchResolution` - If HEAD is detached or unborn
    fn current_branch(&self) -> Result<String>;

    /// Tags whose commit is an ancestor of (or equal to) the tip of `branch`
    ///
    /// `branch` names the remote-tracking branch `origin/<branch>`, which is
    /// what a fresh clone carries. A local `refs/heads/<branch>` is accepted
    /// when no such remote branch exists, so repositories opened in place
    /// resolve too. Tags are returned in the order the backend reports them.
    ///
    /// # Errors
    /// * `UnknownBranch` - If neither ref exists, with the backend's message
    fn tags_merged_into(&self, branch: &str) -> Result<Vec<String>>;

    /// Commit a tag points to, annotated tags dereferenced
    ///
    /// # Errors
    /// * `UnknownRef` - If the tag does not exist, with the backend's message
    fn commit_for_tag(&self, tag: &str) -> Result<String>;

    /// Commits selected by a git revision-range expression such as `v1.0..v2.0`
    ///
    /// # Errors
    /// * `InvalidRevisionSelector` - If the expression cannot be evaluated
    fn commits_reachable_from(&self, selector: &str) -> Result<Vec<String>>;

    /// Contents of `path` as of `commit`
    ///
    /// # Errors
    /// * `FileNotFound` - If the commit exists but the path does not
    /// * `UnknownCommit` - If the commit cannot be resolved
    fn read_file_at(&self, commit: &str, path: &str) -> Result<Vec<u8>>;
}
