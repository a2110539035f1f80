//! Acquisition of release sources
//!
//! Every source is materialized into a directory the build exclusively
//! owns: git sources are cloned and tarballs unpacked into fresh temporary
//! directories, removed again when the returned handle is dropped, on
//! success and failure alike.

pub mod archive;
pub mod transport;

pub use transport::{HttpTransport, ReqwestTransport, StaticTransport};

use crate::error::Result;
use crate::git::{Git2Repository, Repository};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::info;
use url::Url;

/// Acquires release sources for the aggregator
pub trait Fetcher {
    type Repo: Repository;

    /// Clone a git repository; any `#fragment` on `url` is ignored
    fn clone_repository(&self, url: &str) -> Result<Checkout<Self::Repo>>;

    /// Body of a remote resource
    fn download(&self, url: &Url) -> Result<Vec<u8>>;
}

/// A repository together with the directory it lives in.
///
/// Fields drop in declaration order, so the repository handle is closed
/// before its temporary directory is removed.
pub struct Checkout<R> {
    pub repo: R,
    path: PathBuf,
    _workdir: Option<TempDir>,
}

impl<R> Checkout<R> {
    /// A repository at a location the caller manages
    pub fn new(repo: R, path: impl Into<PathBuf>) -> Self {
        Checkout {
            repo,
            path: path.into(),
            _workdir: None,
        }
    }

    /// A repository owning `workdir`, deleted on drop
    pub fn in_temp_dir(repo: R, workdir: TempDir) -> Self {
        Checkout {
            repo,
            path: workdir.path().to_path_buf(),
            _workdir: Some(workdir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A directory tree holding one release
pub struct SourceTree {
    root: PathBuf,
    _workdir: Option<TempDir>,
}

impl SourceTree {
    /// A local directory as-is, or a local tarball unpacked
    pub fn local(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(SourceTree {
                root: path.to_path_buf(),
                _workdir: None,
            });
        }
        Self::unpack(&fs::read(path)?)
    }

    /// Unpack tarball bytes, descending into a lone top-level directory
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let workdir = archive::unpack_to_temp(bytes)?;
        let root = archive::this_or_only_subdir(workdir.path())?;
        Ok(SourceTree {
            root,
            _workdir: Some(workdir),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Fetcher backed by git2 clones and an [HttpTransport]
pub struct GitFetcher<T = ReqwestTransport> {
    timeout: Duration,
    transport: T,
}

impl GitFetcher<ReqwestTransport> {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_transport(timeout, ReqwestTransport::new(timeout)?))
    }
}

impl<T: HttpTransport> GitFetcher<T> {
    pub fn with_transport(timeout: Duration, transport: T) -> Self {
        GitFetcher { timeout, transport }
    }
}

impl<T: HttpTransport> Fetcher for GitFetcher<T> {
    type Repo = Git2Repository;

    fn clone_repository(&self, url: &str) -> Result<Checkout<Git2Repository>> {
        let workdir = TempDir::new()?;
        info!(url, dest = %workdir.path().display(), "Cloning repository");
        let repo = Git2Repository::clone_from(url, workdir.path(), self.timeout)?;
        Ok(Checkout::in_temp_dir(repo, workdir))
    }

    fn download(&self, url: &Url) -> Result<Vec<u8>> {
        info!(%url, "Downloading release archive");
        self.transport.get(url)
    }
}
