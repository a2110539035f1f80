use crate::domain::ReleaseLine;
use crate::error::{RegistryError, Result};
use crate::git::Repository;
use std::collections::HashSet;
use tracing::debug;

/// A release discovered on a release line: its label and the commit it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseCommit {
    pub label: String,
    pub commit: String,
}

impl ReleaseCommit {
    pub fn new(label: impl Into<String>, commit: impl Into<String>) -> Self {
        ReleaseCommit {
            label: label.into(),
            commit: commit.into(),
        }
    }
}

/// Parse a release line expression and expand it against `repo`.
pub fn resolve<R: Repository + ?Sized>(expression: &str, repo: &R) -> Result<Vec<ReleaseCommit>> {
    let line = ReleaseLine::parse(expression)?;
    resolve_line(&line, repo)
}

/// Expand a parsed release line into `(label, commit)` pairs.
///
/// The ref is tried, in order, as a branch (every tag merged into it), as a
/// tag, and finally as a raw commit that labels itself. When the line has a
/// revision selector only commits it selects are kept. Output order is the
/// order the repository reports merged tags in.
pub fn resolve_line<R: Repository + ?Sized>(
    line: &ReleaseLine,
    repo: &R,
) -> Result<Vec<ReleaseCommit>> {
    let selected: Option<HashSet<String>> = match &line.selector {
        Some(selector) => Some(repo.commits_reachable_from(selector)?.into_iter().collect()),
        None => None,
    };
    let is_selected =
        |commit: &str| selected.as_ref().map_or(true, |commits| commits.contains(commit));

    let reference = if line.uses_current_branch() {
        repo.current_branch()?
    } else {
        line.reference.clone()
    };

    let mut releases = Vec::new();

    match repo.tags_merged_into(&reference) {
        Ok(tags) => {
            debug!(branch = %reference, tags = tags.len(), "Resolving tags merged into branch");
            for tag in tags {
                let commit = repo.commit_for_tag(&tag)?;
                if is_selected(&commit) {
                    releases.push(ReleaseCommit::new(tag, commit));
                }
            }
        }
        Err(RegistryError::UnknownBranch { .. }) => match repo.commit_for_tag(&reference) {
            Ok(commit) => {
                debug!(tag = %reference, "Release line names a tag");
                if is_selected(&commit) {
                    releases.push(ReleaseCommit::new(reference, commit));
                }
            }
            Err(RegistryError::UnknownRef { .. }) => {
                debug!(commit = %reference, "Release line names a commit");
                if is_selected(&reference) {
                    releases.push(ReleaseCommit::new(reference.clone(), reference));
                }
            }
            Err(e) => return Err(e),
        },
        Err(e) => return Err(e),
    }

    Ok(releases)
}
