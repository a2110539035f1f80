use crate::domain::{source::pin_to_commit, Release, ReleaseSource};
use crate::error::{RegistryError, Result};
use crate::fetch::{Fetcher, SourceTree};
use crate::registry::{AppConfig, ReleaseSpec};
use crate::releases::{reconcile, resolver};
use crate::scan::{self, EnvironmentScanner};
use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, info};

/// Discovers every release of an app.
///
/// Holds no per-app state, so one aggregator can serve many apps
/// concurrently as long as its fetcher and scanner can be shared.
pub struct ReleaseAggregator<F, S> {
    fetcher: F,
    scanner: S,
}

impl<F, S> ReleaseAggregator<F, S>
where
    F: Fetcher,
    S: EnvironmentScanner,
{
    pub fn new(fetcher: F, scanner: S) -> Self {
        ReleaseAggregator { fetcher, scanner }
    }

    /// Map each version label of `app` to its release.
    ///
    /// Specs are processed in order and releases keep discovery order. A
    /// label produced twice is an error, even for the same commit.
    pub fn gather_releases(&self, app: &AppConfig) -> Result<IndexMap<String, Release>> {
        let mut releases: IndexMap<String, Release> = IndexMap::new();

        for spec in app.release_specs() {
            for (version, release) in self.releases_for_spec(app, &spec)? {
                match releases.entry(version) {
                    Entry::Occupied(existing) => {
                        return Err(RegistryError::DuplicateVersion {
                            app: app.id.clone(),
                            version: existing.key().clone(),
                            first: existing.get().origin().to_string(),
                            second: release.origin().to_string(),
                        });
                    }
                    Entry::Vacant(slot) => {
                        debug!(version = %slot.key(), url = %release.url, "Discovered release");
                        slot.insert(release);
                    }
                }
            }
        }

        info!(releases = releases.len(), "Gathered releases");
        Ok(releases)
    }

    fn releases_for_spec(&self, app: &AppConfig, spec: &ReleaseSpec) -> Result<Vec<(String, Release)>> {
        let url = spec.url();

        let discovered = match ReleaseSource::classify(url)? {
            ReleaseSource::LocalGitRepo { path, release_line } => {
                self.git_releases(app, url, &path.to_string_lossy(), &release_line)?
            }
            ReleaseSource::RemoteGitRepo {
                url: remote,
                release_line,
            } => self.git_releases(app, url, remote.as_str(), &release_line)?,
            ReleaseSource::LocalPath { path } => {
                let tree = SourceTree::local(&path)?;
                vec![self.tree_release(app, spec, &tree)?]
            }
            ReleaseSource::RemoteTarball { url: remote } => {
                let tree = SourceTree::unpack(&self.fetcher.download(&remote)?)?;
                vec![self.tree_release(app, spec, &tree)?]
            }
        };

        discovered
            .into_iter()
            .map(|(label, mut release)| {
                if let Some(environment) = spec.environment_override() {
                    release.environment = environment.clone();
                }
                let version = spec
                    .version_override()
                    .map(str::to_string)
                    .or(label)
                    .ok_or_else(|| RegistryError::UnresolvableVersion {
                        app: app.id.clone(),
                        url: url.to_string(),
                    })?;
                Ok((version, release))
            })
            .collect()
    }

    /// One release per commit the release line selects, each scanned at
    /// that commit and published under a URL pinned to it.
    fn git_releases(
        &self,
        app: &AppConfig,
        spec_url: &str,
        clone_url: &str,
        release_line: &str,
    ) -> Result<Vec<(Option<String>, Release)>> {
        let checkout = self.fetcher.clone_repository(clone_url)?;
        let commits = resolver::resolve(release_line, &checkout.repo)?;
        debug!(release_line, commits = commits.len(), "Resolved release line");

        let mut releases = Vec::with_capacity(commits.len());
        for rc in commits {
            let parsed = self
                .scanner
                .scan(&scan::commit_url(checkout.path(), &rc.commit))?;
            let environment = reconcile(&app.dependencies, parsed, &rc.label)?;

            releases.push((
                Some(rc.label),
                Release {
                    url: pin_to_commit(spec_url, &rc.commit),
                    environment,
                    commit: Some(rc.commit),
                },
            ));
        }
        Ok(releases)
    }

    /// The single, unlabeled release a directory or tarball provides
    fn tree_release(
        &self,
        app: &AppConfig,
        spec: &ReleaseSpec,
        tree: &SourceTree,
    ) -> Result<(Option<String>, Release)> {
        let mut environment = self.scanner.scan(&scan::directory_url(tree.root()))?;
        if let Some(version) = spec.version_override() {
            environment = reconcile(&app.dependencies, environment, version)?;
        }

        Ok((
            None,
            Release {
                url: spec.url().to_string(),
                environment,
                commit: None,
            },
        ))
    }
}
