//! Helpers for building throwaway git repositories.
#![allow(dead_code)]

use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature};
use std::path::Path;

/// Initialize a repository whose first branch is `main`
pub fn init_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(path, &opts).unwrap()
}

/// Commit a tree holding exactly `files` on top of HEAD
pub fn commit(repo: &Repository, files: &[(&str, &str)], message: &str) -> Oid {
    let mut builder = repo.treebuilder(None).unwrap();
    for (name, content) in files {
        let blob = repo.blob(content.as_bytes()).unwrap();
        builder.insert(*name, blob, 0o100644).unwrap();
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();

    let parents: Vec<Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

pub fn tag(repo: &Repository, name: &str, oid: Oid) {
    let object = repo.find_object(oid, None).unwrap();
    repo.tag_lightweight(name, &object, false).unwrap();
}

pub fn annotated_tag(repo: &Repository, name: &str, oid: Oid) {
    let object = repo.find_object(oid, None).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    repo.tag(name, &object, &sig, &format!("Release {}", name), false)
        .unwrap();
}

/// A repository with two releases on `main`:
/// `0.1.0` requiring `numpy>=1.0` and (annotated) `0.2.0` adding scipy
pub fn two_release_repo(path: &Path) -> (Oid, Oid) {
    let repo = init_repo(path);
    let first = commit(&repo, &[("requirements.txt", "numpy>=1.0\n")], "First release");
    tag(&repo, "0.1.0", first);
    let second = commit(
        &repo,
        &[
            ("requirements.txt", "# runtime\nnumpy>=1.5\nscipy\n"),
            ("requirements-jupyter.txt", "ipywidgets\n"),
        ],
        "Second release",
    );
    annotated_tag(&repo, "0.2.0", second);
    (first, second)
}
