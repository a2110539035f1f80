use crate::error::{RegistryError, Result};
use std::path::PathBuf;
use url::Url;

const GIT_SCHEME_PREFIX: &str = "git+";

/// Where a release specification URL points, decided by its scheme.
///
/// | URL form                         | variant          |
/// |----------------------------------|------------------|
/// | `path/to/dir`, `file:///dir`     | `LocalPath`      |
/// | `git+file:///repo#<line>`        | `LocalGitRepo`   |
/// | `https://host/app.tar.gz`        | `RemoteTarball`  |
/// | `git+https://host/app.git#<line>`| `RemoteGitRepo`  |
///
/// The URL fragment of a git source is its release line; it is never part
/// of what gets cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSource {
    /// A directory or tarball on the local filesystem
    LocalPath { path: PathBuf },
    /// A git repository on the local filesystem
    LocalGitRepo { path: PathBuf, release_line: String },
    /// A tarball downloaded over http(s)
    RemoteTarball { url: Url },
    /// A git repository cloned over the network
    RemoteGitRepo { url: Url, release_line: String },
}

impl ReleaseSource {
    /// Classify a release specification URL.
    pub fn classify(spec_url: &str) -> Result<Self> {
        let (base, fragment) = split_fragment(spec_url);
        let release_line = fragment.unwrap_or_default().to_string();

        let url = match Url::parse(base) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(ReleaseSource::LocalPath {
                    path: PathBuf::from(base),
                });
            }
            Err(e) => return Err(unsupported(spec_url, e.to_string())),
        };

        match url.scheme() {
            "file" => Ok(ReleaseSource::LocalPath {
                path: file_path(&url, spec_url)?,
            }),
            "http" | "https" => Ok(ReleaseSource::RemoteTarball { url }),
            scheme if scheme.starts_with(GIT_SCHEME_PREFIX) => {
                // `git+https` -> `https`; the url crate refuses to switch a
                // non-special scheme to a special one, so reparse instead.
                let inner = Url::parse(&base[GIT_SCHEME_PREFIX.len()..])
                    .map_err(|e| unsupported(spec_url, e.to_string()))?;

                match inner.scheme() {
                    "file" => Ok(ReleaseSource::LocalGitRepo {
                        path: file_path(&inner, spec_url)?,
                        release_line,
                    }),
                    "http" | "https" | "ssh" => Ok(ReleaseSource::RemoteGitRepo {
                        url: inner,
                        release_line,
                    }),
                    other => Err(unsupported(
                        spec_url,
                        format!("unsupported git transport '{}'", other),
                    )),
                }
            }
            other => Err(unsupported(spec_url, format!("unsupported scheme '{}'", other))),
        }
    }

    /// The release line carried by a git source
    pub fn release_line(&self) -> Option<&str> {
        match self {
            ReleaseSource::LocalGitRepo { release_line, .. }
            | ReleaseSource::RemoteGitRepo { release_line, .. } => Some(release_line),
            ReleaseSource::LocalPath { .. } | ReleaseSource::RemoteTarball { .. } => None,
        }
    }

    pub fn is_git(&self) -> bool {
        self.release_line().is_some()
    }
}

/// Rewrite a release specification URL so that it names one commit: the
/// fragment (release line) is replaced by the commit identifier.
pub fn pin_to_commit(spec_url: &str, commit: &str) -> String {
    let (base, _) = split_fragment(spec_url);
    format!("{}#{}", base, commit)
}

/// Split off the fragment before any URL parsing so that revision syntax
/// (`~`, `^`, `..`) reaches git untouched.
fn split_fragment(spec_url: &str) -> (&str, Option<&str>) {
    match spec_url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (spec_url, None),
    }
}

fn file_path(url: &Url, spec_url: &str) -> Result<PathBuf> {
    url.to_file_path()
        .map_err(|_| unsupported(spec_url, "not a local file path"))
}

fn unsupported(url: &str, reason: impl Into<String>) -> RegistryError {
    RegistryError::UnsupportedSource {
        url: url.to_string(),
        reason: reason.into(),
    }
}
