use crate::error::{RegistryError, Result};
use git2::{
    build::RepoBuilder, ErrorCode, FetchOptions, ObjectType, Oid, RemoteCallbacks,
    Repository as Git2Repo, RevparseMode, Sort,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Remote whose tracking branches a fresh clone carries
const ORIGIN: &str = "origin";

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open the repository at exactly `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::open(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Clone `url` into `destination`.
    ///
    /// Any `#fragment` is stripped first: fragments carry release lines, not
    /// clone targets. The clone runs on its own thread and is abandoned once
    /// `timeout` has elapsed, whether or not the server ever answers; the
    /// abandoned transfer stops at its next progress callback.
    ///
    /// # Returns
    /// * `Ok(Git2Repository)` - The freshly cloned repository
    /// * `Err(Transport)` - If the clone fails or times out
    pub fn clone_from(url: &str, destination: &Path, timeout: Duration) -> Result<Self> {
        let clone_url = url.split_once('#').map_or(url, |(base, _)| base).to_string();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();

        {
            let clone_url = clone_url.clone();
            let destination = destination.to_path_buf();
            let cancelled = Arc::clone(&cancelled);
            thread::Builder::new()
                .name("git-clone".to_string())
                .spawn(move || {
                    let result = clone_until_cancelled(&clone_url, &destination, &cancelled);
                    // Nobody is listening once the deadline has passed.
                    let _ = sender.send(result);
                })?;
        }

        match receiver.recv_timeout(timeout) {
            Ok(Ok(repo)) => Ok(Git2Repository { repo }),
            Ok(Err(e)) => Err(RegistryError::transport(clone_url, e.message())),
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Relaxed);
                warn!(url = %clone_url, timeout_secs = timeout.as_secs(), "Abandoning stalled clone");
                Err(RegistryError::transport(
                    clone_url,
                    format!("clone timed out after {}s", timeout.as_secs()),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err(RegistryError::transport(
                clone_url,
                "clone thread exited without a result",
            )),
        }
    }

    /// Working directory of the repository (its git dir when bare)
    pub fn path(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    fn find_branch_tip(&self, branch: &str) -> Result<Oid> {
        let candidates = [
            format!("refs/remotes/{}/{}", ORIGIN, branch),
            format!("refs/heads/{}", branch),
        ];

        let mut message = String::new();
        for name in &candidates {
            match self.repo.find_reference(name) {
                Ok(reference) => return Ok(reference.peel_to_commit()?.id()),
                Err(e) => message = e.message().to_string(),
            }
        }

        Err(RegistryError::UnknownBranch {
            branch: branch.to_string(),
            message,
        })
    }

    /// Commit behind a tag, or `None` for tags that do not point at a commit
    fn peel_tag(&self, tag: &str) -> Option<Oid> {
        self.repo
            .find_reference(&format!("refs/tags/{}", tag))
            .and_then(|reference| reference.peel_to_commit())
            .map(|commit| commit.id())
            .ok()
    }
}

fn clone_until_cancelled(
    url: &str,
    destination: &Path,
    cancelled: &AtomicBool,
) -> std::result::Result<Git2Repo, git2::Error> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.transfer_progress(|_progress| !cancelled.load(Ordering::Relaxed));
    callbacks.sideband_progress(|_data| !cancelled.load(Ordering::Relaxed));

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);

    RepoBuilder::new()
        .fetch_options(fetch_options)
        .clone(url, destination)
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| RegistryError::BranchResolution(e.message().to_string()))?;

        if !head.is_branch() {
            return Err(RegistryError::BranchResolution(
                "HEAD does not point at a branch, likely detached".to_string(),
            ));
        }

        head.shorthand().map(str::to_string).ok_or_else(|| {
            RegistryError::BranchResolution("branch name is not valid UTF-8".to_string())
        })
    }

    fn tags_merged_into(&self, branch: &str) -> Result<Vec<String>> {
        let tip = self.find_branch_tip(branch)?;

        // `git tag --merged` lists in refname order.
        let mut names: Vec<String> = self
            .repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(str::to_string)
            .collect();
        names.sort();

        let mut merged = Vec::new();
        for name in names {
            let Some(commit) = self.peel_tag(&name) else {
                continue;
            };

            if commit == tip || self.repo.graph_descendant_of(tip, commit)? {
                merged.push(name);
            }
        }

        Ok(merged)
    }

    fn commit_for_tag(&self, tag: &str) -> Result<String> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", tag))
            .map_err(|e| match e.code() {
                ErrorCode::NotFound | ErrorCode::InvalidSpec => RegistryError::UnknownRef {
                    reference: tag.to_string(),
                    message: e.message().to_string(),
                },
                _ => RegistryError::Git(e),
            })?;

        Ok(reference.peel_to_commit()?.id().to_string())
    }

    fn commits_reachable_from(&self, selector: &str) -> Result<Vec<String>> {
        let invalid = |e: git2::Error| RegistryError::InvalidRevisionSelector {
            selector: selector.to_string(),
            message: e.message().to_string(),
        };
        let missing_end = || RegistryError::InvalidRevisionSelector {
            selector: selector.to_string(),
            message: "range is missing an endpoint".to_string(),
        };

        let spec = self.repo.revparse(selector).map_err(invalid)?;
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;

        let from = spec
            .from()
            .ok_or_else(missing_end)?
            .peel_to_commit()
            .map_err(invalid)?
            .id();

        if spec.mode().contains(RevparseMode::SINGLE) {
            walk.push(from)?;
        } else {
            let to = spec
                .to()
                .ok_or_else(missing_end)?
                .peel_to_commit()
                .map_err(invalid)?
                .id();

            walk.push(to)?;
            if spec.mode().contains(RevparseMode::MERGE_BASE) {
                walk.push(from)?;
                walk.hide(self.repo.merge_base(from, to).map_err(invalid)?)?;
            } else {
                walk.hide(from)?;
            }
        }

        walk.map(|oid| -> Result<String> { Ok(oid?.to_string()) })
            .collect()
    }

    fn read_file_at(&self, commit: &str, path: &str) -> Result<Vec<u8>> {
        let unknown_commit = |e: git2::Error| RegistryError::UnknownCommit {
            commit: commit.to_string(),
            message: e.message().to_string(),
        };
        let file_not_found = || RegistryError::FileNotFound {
            commit: commit.to_string(),
            path: path.to_string(),
        };

        let tree = self
            .repo
            .revparse_single(commit)
            .and_then(|object| object.peel_to_commit())
            .map_err(unknown_commit)?
            .tree()?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Err(file_not_found()),
            Err(e) => return Err(e.into()),
        };

        if entry.kind() != Some(ObjectType::Blob) {
            return Err(file_not_found());
        }

        let blob = self.repo.find_blob(entry.id())?;
        Ok(blob.content().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use git2::{Commit, RepositoryInitOptions, Signature};
    use std::net::TcpListener;
    use std::time::Instant;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Git2Repo) {
        let dir = TempDir::new().expect("Could not create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Git2Repo::init_opts(dir.path(), &opts).expect("Could not init git repo");
        (dir, repo)
    }

    fn commit(
        repo: &Git2Repo,
        update_ref: Option<&str>,
        files: &[(&str, &str)],
        parents: &[Oid],
        message: &str,
    ) -> Oid {
        let mut builder = repo.treebuilder(None).unwrap();
        for (name, content) in files {
            let blob = repo.blob(content.as_bytes()).unwrap();
            builder.insert(*name, blob, 0o100644).unwrap();
        }
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parents: Vec<Commit> = parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        repo.commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    /// main: c1 (v1.0, lightweight) -> c2 (v2.0, annotated)
    /// side branch off c1: c3 (side-1.0)
    fn fixture() -> (TempDir, Git2Repo, Oid, Oid, Oid) {
        let (dir, repo) = init_repo();
        let c1 = commit(
            &repo,
            Some("HEAD"),
            &[("requirements.txt", "numpy>=1.0\n")],
            &[],
            "initial",
        );
        let c2 = commit(
            &repo,
            Some("HEAD"),
            &[("requirements.txt", "numpy>=1.5\n"), ("README.md", "hi\n")],
            &[c1],
            "second",
        );
        let c3 = commit(&repo, None, &[("side.txt", "x")], &[c1], "side");

        repo.tag_lightweight("v1.0", &repo.find_object(c1, None).unwrap(), false)
            .unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        repo.tag("v2.0", &repo.find_object(c2, None).unwrap(), &sig, "release", false)
            .unwrap();
        repo.tag_lightweight("side-1.0", &repo.find_object(c3, None).unwrap(), false)
            .unwrap();
        repo.branch("side", &repo.find_commit(c3).unwrap(), false)
            .unwrap();

        (dir, repo, c1, c2, c3)
    }

    #[test]
    fn test_current_branch() {
        let (_dir, repo, ..) = fixture();
        let repo = Git2Repository::from_git2(repo);
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn test_current_branch_detached_fails() {
        let (_dir, repo, c1, ..) = fixture();
        repo.set_head_detached(c1).unwrap();
        let repo = Git2Repository::from_git2(repo);
        assert!(matches!(
            repo.current_branch(),
            Err(RegistryError::BranchResolution(_))
        ));
    }

    #[test]
    fn test_tags_merged_into_branch() {
        let (_dir, repo, ..) = fixture();
        let repo = Git2Repository::from_git2(repo);

        assert_eq!(repo.tags_merged_into("main").unwrap(), vec!["v1.0", "v2.0"]);
        assert_eq!(repo.tags_merged_into("side").unwrap(), vec!["side-1.0", "v1.0"]);
    }

    #[test]
    fn test_tags_merged_into_unknown_branch() {
        let (_dir, repo, ..) = fixture();
        let repo = Git2Repository::from_git2(repo);

        assert!(matches!(
            repo.tags_merged_into("v1.0"),
            Err(RegistryError::UnknownBranch { ref branch, ref message })
                if branch == "v1.0" && message.contains("not found")
        ));
    }

    #[test]
    fn test_commit_for_tag_dereferences_annotated() {
        let (_dir, repo, c1, c2, _) = fixture();
        let repo = Git2Repository::from_git2(repo);

        assert_eq!(repo.commit_for_tag("v1.0").unwrap(), c1.to_string());
        assert_eq!(repo.commit_for_tag("v2.0").unwrap(), c2.to_string());
        match repo.commit_for_tag("v9.9") {
            Err(RegistryError::UnknownRef { reference, message }) => {
                assert_eq!(reference, "v9.9");
                assert!(message.contains("refs/tags/v9.9"), "got '{}'", message);
            }
            other => panic!("expected unknown ref, got {:?}", other),
        }
    }

    #[test]
    fn test_commits_reachable_from_range() {
        let (_dir, repo, c1, c2, _) = fixture();
        let repo = Git2Repository::from_git2(repo);

        assert_eq!(
            repo.commits_reachable_from("v1.0..v2.0").unwrap(),
            vec![c2.to_string()]
        );

        let all = repo.commits_reachable_from("main").unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&c1.to_string()));
    }

    #[test]
    fn test_commits_reachable_from_invalid_selector() {
        let (_dir, repo, ..) = fixture();
        let repo = Git2Repository::from_git2(repo);

        assert!(matches!(
            repo.commits_reachable_from("no-such-rev..main"),
            Err(RegistryError::InvalidRevisionSelector { .. })
        ));
    }

    #[test]
    fn test_read_file_at_commit() {
        let (_dir, repo, c1, c2, _) = fixture();
        let repo = Git2Repository::from_git2(repo);

        let old = repo.read_file_at(&c1.to_string(), "requirements.txt").unwrap();
        let new = repo.read_file_at(&c2.to_string(), "requirements.txt").unwrap();
        assert_eq!(old, b"numpy>=1.0\n");
        assert_eq!(new, b"numpy>=1.5\n");
    }

    #[test]
    fn test_read_file_at_distinguishes_missing_file_and_commit() {
        let (_dir, repo, c1, ..) = fixture();
        let repo = Git2Repository::from_git2(repo);

        assert!(matches!(
            repo.read_file_at(&c1.to_string(), "README.md"),
            Err(RegistryError::FileNotFound { .. })
        ));
        assert!(matches!(
            repo.read_file_at("0123456789abcdef0123456789abcdef01234567", "README.md"),
            Err(RegistryError::UnknownCommit { .. })
        ));
    }

    #[test]
    fn test_clone_strips_fragment_and_tracks_origin() {
        let (source_dir, _repo, ..) = fixture();
        let target = TempDir::new().unwrap();
        let url = format!("{}#main:v1.0..v2.0", source_dir.path().display());

        let clone = Git2Repository::clone_from(
            &url,
            &target.path().join("clone"),
            Duration::from_secs(30),
        )
        .unwrap();

        assert_eq!(clone.current_branch().unwrap(), "main");
        assert_eq!(clone.tags_merged_into("main").unwrap(), vec!["v1.0", "v2.0"]);
        assert_eq!(clone.tags_merged_into("side").unwrap(), vec!["side-1.0", "v1.0"]);
    }

    #[test]
    fn test_clone_failure_is_transport_error() {
        let target = TempDir::new().unwrap();
        let missing = target.path().join("does-not-exist");

        let result = Git2Repository::clone_from(
            &missing.display().to_string(),
            &target.path().join("clone"),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(RegistryError::Transport { .. })));
    }

    #[test]
    fn test_clone_from_silent_server_times_out() {
        // Connections queue in the backlog and never get an answer.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/foo.git", listener.local_addr().unwrap());
        let target = TempDir::new().unwrap();

        let started = Instant::now();
        let result = Git2Repository::clone_from(
            &url,
            &target.path().join("clone"),
            Duration::from_secs(1),
        );

        assert!(started.elapsed() < Duration::from_secs(10));
        match result {
            Err(RegistryError::Transport { url: failed, message }) => {
                assert_eq!(failed, url);
                assert_eq!(message, "clone timed out after 1s");
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
        drop(listener);
    }
}
