use crate::error::{RegistryError, Result};
use crate::git::Repository;
use std::collections::{HashMap, HashSet};

/// Mock repository for testing without actual git operations
#[derive(Debug, Default)]
pub struct MockRepository {
    current_branch: Option<String>,
    branch_tags: HashMap<String, Vec<String>>,
    tags: HashMap<String, String>,
    selections: HashMap<String, Vec<String>>,
    commits: HashSet<String>,
    files: HashMap<(String, String), Vec<u8>>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out a branch; `None` simulates a detached HEAD
    pub fn set_current_branch(&mut self, branch: Option<&str>) {
        self.current_branch = branch.map(str::to_string);
    }

    /// Declare a branch with the tags merged into it, in reported order
    pub fn add_branch(&mut self, branch: impl Into<String>, merged_tags: &[&str]) {
        self.branch_tags.insert(
            branch.into(),
            merged_tags.iter().map(|t| t.to_string()).collect(),
        );
    }

    /// Add a tag pointing to a commit
    pub fn add_tag(&mut self, name: impl Into<String>, commit: impl Into<String>) {
        let commit = commit.into();
        self.commits.insert(commit.clone());
        self.tags.insert(name.into(), commit);
    }

    /// Define the commits a revision selector evaluates to
    pub fn add_selection(&mut self, selector: impl Into<String>, commits: &[&str]) {
        self.selections.insert(
            selector.into(),
            commits.iter().map(|c| c.to_string()).collect(),
        );
    }

    /// Make a commit known without tagging it
    pub fn add_commit(&mut self, commit: impl Into<String>) {
        self.commits.insert(commit.into());
    }

    /// Add a file at a commit
    pub fn add_file(&mut self, commit: impl Into<String>, path: impl Into<String>, content: &str) {
        let commit = commit.into();
        self.commits.insert(commit.clone());
        self.files
            .insert((commit, path.into()), content.as_bytes().to_vec());
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        self.current_branch
            .clone()
            .ok_or_else(|| RegistryError::BranchResolution("HEAD is detached".to_string()))
    }

    fn tags_merged_into(&self, branch: &str) -> Result<Vec<String>> {
        self.branch_tags
            .get(branch)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownBranch {
                branch: branch.to_string(),
                message: "no such branch in mock".to_string(),
            })
    }

    fn commit_for_tag(&self, tag: &str) -> Result<String> {
        self.tags
            .get(tag)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownRef {
                reference: tag.to_string(),
                message: "no such tag in mock".to_string(),
            })
    }

    fn commits_reachable_from(&self, selector: &str) -> Result<Vec<String>> {
        self.selections
            .get(selector)
            .cloned()
            .ok_or_else(|| RegistryError::InvalidRevisionSelector {
                selector: selector.to_string(),
                message: "unknown revision".to_string(),
            })
    }

    fn read_file_at(&self, commit: &str, path: &str) -> Result<Vec<u8>> {
        if !self.commits.contains(commit) {
            return Err(RegistryError::UnknownCommit {
                commit: commit.to_string(),
                message: "invalid object name".to_string(),
            });
        }

        self.files
            .get(&(commit.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::FileNotFound {
                commit: commit.to_string(),
                path: path.to_string(),
            })
    }
}
