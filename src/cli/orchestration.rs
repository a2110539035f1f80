//! Build workflow orchestration
//!
//! Separates CLI argument parsing from the build itself: every app is
//! processed independently on a worker pool, its failure recorded rather
//! than propagated, and the API written from the apps that succeeded.

use crate::config::Config;
use crate::error::{RegistryError, Result};
use crate::fetch::{Fetcher, GitFetcher};
use crate::index::{self, AppDocument, AppsIndex};
use crate::registry::{AppConfig, RegistryData};
use crate::releases::ReleaseAggregator;
use crate::scan::{EnvironmentScanner, RequirementsScanner};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};

/// Arguments for the build workflow
///
/// Mirrors the CLI arguments, but lets the build be driven programmatically
/// without depending on clap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildArgs {
    /// Registry data file, overriding `data.apps`
    pub apps_file: Option<PathBuf>,

    /// Output directory, overriding `build.output`
    pub output: Option<PathBuf>,

    /// Worker count, overriding `build.jobs`
    pub jobs: Option<usize>,

    /// Restrict the build to these app ids
    pub only: Vec<String>,
}

/// What happened to one app
#[derive(Debug)]
pub enum AppOutcome {
    Built { app: String, releases: usize },
    Failed { app: String, error: RegistryError },
}

impl AppOutcome {
    pub fn app(&self) -> &str {
        match self {
            AppOutcome::Built { app, .. } | AppOutcome::Failed { app, .. } => app,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AppOutcome::Failed { .. })
    }
}

/// Result of a build: per-app outcomes in app id order
#[derive(Debug)]
pub struct BuildReport {
    pub outcomes: Vec<AppOutcome>,
    pub index_path: PathBuf,
}

impl BuildReport {
    pub fn failures(&self) -> impl Iterator<Item = &AppOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn built_count(&self) -> usize {
        self.outcomes.len() - self.failures().count()
    }
}

/// Main build workflow
///
/// 1. Load the registry data
/// 2. Discover the releases of every selected app concurrently
/// 3. Write the API for the apps that succeeded
///
/// Individual app failures are reported in the returned [BuildReport];
/// only failures affecting the build as a whole are returned as errors.
pub fn run_build(args: &BuildArgs, config: &Config) -> Result<BuildReport> {
    let apps_file = args.apps_file.as_deref().unwrap_or(&config.data.apps);
    let output = args.output.as_deref().unwrap_or(&config.build.output);
    let jobs = args.jobs.unwrap_or(config.build.jobs);

    info!(data = %apps_file.display(), "Loading registry data");
    let data = RegistryData::load(apps_file)?;

    let aggregator = ReleaseAggregator::new(
        GitFetcher::new(config.network.timeout())?,
        RequirementsScanner::new(),
    );

    build_registry(&data, &aggregator, &args.only, jobs, output)
}

/// Build the API for `data` with the given aggregator.
pub fn build_registry<F, S>(
    data: &RegistryData,
    aggregator: &ReleaseAggregator<F, S>,
    only: &[String],
    jobs: usize,
    output: &Path,
) -> Result<BuildReport>
where
    F: Fetcher + Sync,
    S: EnvironmentScanner + Sync,
{
    let apps = select_apps(data, only)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|index| format!("registry-build-{}", index))
        .build()
        .map_err(|e| RegistryError::config(format!("Failed to start worker pool: {}", e)))?;

    info!(apps = apps.len(), jobs, "Building registry");
    let results: Vec<(AppOutcome, Option<AppDocument>)> = pool.install(|| {
        apps.par_iter()
            .map(|app| build_app(app, aggregator))
            .collect()
    });

    let mut outcomes = Vec::with_capacity(results.len());
    let mut documents = Vec::new();
    for (outcome, document) in results {
        outcomes.push(outcome);
        documents.extend(document);
    }

    let index = AppsIndex::build(data, &documents);
    let index_path = index::write_index(output, &index, &documents)?;

    Ok(BuildReport {
        outcomes,
        index_path,
    })
}

fn build_app<F, S>(app: &AppConfig, aggregator: &ReleaseAggregator<F, S>) -> (AppOutcome, Option<AppDocument>)
where
    F: Fetcher,
    S: EnvironmentScanner,
{
    let span = info_span!("app", app = %app.id);
    let _enter = span.enter();

    match aggregator.gather_releases(app) {
        Ok(releases) => {
            let outcome = AppOutcome::Built {
                app: app.id.clone(),
                releases: releases.len(),
            };
            (outcome, Some(AppDocument::new(app, releases)))
        }
        Err(e) => {
            let error = e.for_app(&app.id);
            error!(error = %error, "App failed");
            (
                AppOutcome::Failed {
                    app: app.id.clone(),
                    error,
                },
                None,
            )
        }
    }
}

fn select_apps<'a>(data: &'a RegistryData, only: &[String]) -> Result<Vec<&'a AppConfig>> {
    if only.is_empty() {
        return Ok(data.apps.values().collect());
    }

    if let Some(unknown) = only.iter().find(|id| !data.apps.contains_key(id.as_str())) {
        return Err(RegistryError::config(format!("Unknown app '{}'", unknown)));
    }
    Ok(data
        .apps
        .values()
        .filter(|app| only.contains(&app.id))
        .collect())
}
