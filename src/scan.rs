//! Environment scanning: turn one on-disk revision of an app into the
//! requirements it declares.
//!
//! Two URL forms are understood:
//!
//! - `file:<dir>` - a plain directory
//! - `git+file:<repo>@<commit>` - a commit of a local repository, read
//!   without checking it out

use crate::domain::{Environment, PYTHON_REQUIREMENTS};
use crate::error::{RegistryError, Result};
use crate::git::{Git2Repository, Repository};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Requirement files and the ecosystem each one describes
pub const REQUIREMENT_FILES: &[(&str, &str)] = &[
    ("requirements.txt", PYTHON_REQUIREMENTS),
    ("requirements-jupyter.txt", "jupyter-requirements"),
];

/// Produces the environment of one revision of an app
pub trait EnvironmentScanner {
    fn scan(&self, url: &str) -> Result<Environment>;
}

impl<F> EnvironmentScanner for F
where
    F: Fn(&str) -> Result<Environment>,
{
    fn scan(&self, url: &str) -> Result<Environment> {
        self(url)
    }
}

/// Default scanner reading [REQUIREMENT_FILES]
#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementsScanner;

impl RequirementsScanner {
    pub fn new() -> Self {
        RequirementsScanner
    }

    fn scan_directory(&self, dir: &Path) -> Result<Environment> {
        let mut environment = Environment::new();
        for (file, ecosystem) in REQUIREMENT_FILES {
            match fs::read_to_string(dir.join(file)) {
                Ok(content) => environment.insert(*ecosystem, parse_requirements(&content)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(dir = %dir.display(), file, "No requirements file");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(environment)
    }

    fn scan_commit(&self, repo_path: &Path, commit: &str) -> Result<Environment> {
        let repo = Git2Repository::open(repo_path)?;
        let mut environment = Environment::new();
        for (file, ecosystem) in REQUIREMENT_FILES {
            match repo.read_file_at(commit, file) {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes);
                    environment.insert(*ecosystem, parse_requirements(&content));
                }
                Err(e) if e.is_file_not_found() => {
                    debug!(commit, file, "No requirements file at commit");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(environment)
    }
}

impl EnvironmentScanner for RequirementsScanner {
    fn scan(&self, url: &str) -> Result<Environment> {
        if let Some(rest) = url.strip_prefix("git+file:") {
            let (path, commit) = rest.rsplit_once('@').ok_or_else(|| {
                RegistryError::UnsupportedSource {
                    url: url.to_string(),
                    reason: "missing '@<commit>' suffix".to_string(),
                }
            })?;
            self.scan_commit(&local_path(path, url)?, commit)
        } else if let Some(rest) = url.strip_prefix("file:") {
            self.scan_directory(&local_path(rest, url)?)
        } else {
            Err(RegistryError::UnsupportedSource {
                url: url.to_string(),
                reason: "only file: and git+file: URLs can be scanned".to_string(),
            })
        }
    }
}

/// URL for scanning `commit` of the repository at `repo_path`
pub fn commit_url(repo_path: &Path, commit: &str) -> String {
    format!("git+file:{}@{}", repo_path.display(), commit)
}

/// URL for scanning the directory `dir`
pub fn directory_url(dir: &Path) -> String {
    format!("file:{}", dir.display())
}

/// Requirement lines of a requirements file, comments and blanks dropped
pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn local_path(rest: &str, url: &str) -> Result<PathBuf> {
    if rest.starts_with("//") {
        Url::parse(&format!("file:{}", rest))
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| RegistryError::UnsupportedSource {
                url: url.to_string(),
                reason: "not a local file path".to_string(),
            })
    } else {
        Ok(PathBuf::from(rest))
    }
}
