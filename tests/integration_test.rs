// tests/integration_test.rs
mod common;

use app_registry::cli::{run_build, BuildArgs};
use app_registry::config::Config;
use app_registry::domain::PYTHON_REQUIREMENTS;
use app_registry::fetch::GitFetcher;
use app_registry::registry::{AppConfig, ReleaseSpec};
use app_registry::releases::ReleaseAggregator;
use app_registry::scan::RequirementsScanner;
use app_registry::RegistryError;
use flate2::{write::GzEncoder, Compression};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

fn aggregator() -> ReleaseAggregator<GitFetcher, RequirementsScanner> {
    ReleaseAggregator::new(
        GitFetcher::new(Duration::from_secs(30)).unwrap(),
        RequirementsScanner::new(),
    )
}

fn git_app(id: &str, repo: &std::path::Path, release_line: &str) -> AppConfig {
    let mut app = AppConfig::new(id);
    app.git_url = Some(Url::from_file_path(repo).unwrap().to_string());
    app.release_line = release_line.to_string();
    app
}

#[test]
fn test_app_registry_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_app-registry"))
        .arg("--help")
        .output()
        .expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("app-registry"));
    assert!(stdout.contains("Discover app releases"));
}

#[test]
fn test_gather_releases_from_local_git_repository() {
    let source = TempDir::new().unwrap();
    let (first, second) = common::two_release_repo(source.path());
    let app = git_app("foo", source.path(), "main");

    let releases = aggregator().gather_releases(&app).unwrap();

    let versions: Vec<&str> = releases.keys().map(String::as_str).collect();
    assert_eq!(versions, vec!["0.1.0", "0.2.0"]);

    let base = format!("git+{}", Url::from_file_path(source.path()).unwrap());
    assert_eq!(releases["0.1.0"].url, format!("{}#{}", base, first));
    assert_eq!(releases["0.2.0"].url, format!("{}#{}", base, second));

    assert_eq!(
        releases["0.1.0"].environment.get(PYTHON_REQUIREMENTS).unwrap(),
        ["numpy>=1.0"]
    );
    assert!(releases["0.1.0"].environment.get("jupyter-requirements").is_none());
    assert_eq!(
        releases["0.2.0"].environment.get(PYTHON_REQUIREMENTS).unwrap(),
        ["numpy>=1.5", "scipy"]
    );
    assert_eq!(
        releases["0.2.0"].environment.get("jupyter-requirements").unwrap(),
        ["ipywidgets"]
    );
}

#[test]
fn test_empty_release_line_uses_cloned_branch() {
    let source = TempDir::new().unwrap();
    common::two_release_repo(source.path());
    let app = git_app("foo", source.path(), "");

    let releases = aggregator().gather_releases(&app).unwrap();
    assert_eq!(releases.len(), 2);
}

#[test]
fn test_revision_selector_narrows_releases() {
    let source = TempDir::new().unwrap();
    let (_, second) = common::two_release_repo(source.path());
    let app = git_app("foo", source.path(), "main:0.1.0..main");

    let releases = aggregator().gather_releases(&app).unwrap();
    let versions: Vec<&str> = releases.keys().map(String::as_str).collect();
    assert_eq!(versions, vec!["0.2.0"]);
    assert!(releases["0.2.0"].url.ends_with(&second.to_string()));
}

#[test]
fn test_tag_release_line() {
    let source = TempDir::new().unwrap();
    let (first, _) = common::two_release_repo(source.path());
    let app = git_app("foo", source.path(), "0.1.0");

    let releases = aggregator().gather_releases(&app).unwrap();
    assert_eq!(releases.len(), 1);
    assert!(releases["0.1.0"].url.ends_with(&first.to_string()));
}

#[test]
fn test_commit_release_line_labels_itself() {
    let source = TempDir::new().unwrap();
    let (first, _) = common::two_release_repo(source.path());
    let app = git_app("foo", source.path(), &first.to_string());

    let releases = aggregator().gather_releases(&app).unwrap();
    let label = first.to_string();
    assert_eq!(
        releases[label.as_str()].environment.get(PYTHON_REQUIREMENTS).unwrap(),
        ["numpy>=1.0"]
    );
}

#[test]
fn test_unknown_commit_fails() {
    let source = TempDir::new().unwrap();
    common::two_release_repo(source.path());
    let app = git_app("foo", source.path(), "no-such-ref");

    let result = aggregator().gather_releases(&app);
    assert!(matches!(result, Err(RegistryError::UnknownCommit { .. })));
}

#[test]
fn test_local_tarball_release() {
    let dir = TempDir::new().unwrap();
    let mut builder = tar::Builder::new(Vec::new());
    let content = b"pandas\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "bar-1.0/requirements.txt", &content[..])
        .unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&builder.into_inner().unwrap()).unwrap();
    let archive = dir.path().join("bar-1.0.tar.gz");
    fs::write(&archive, encoder.finish().unwrap()).unwrap();

    let mut app = AppConfig::new("bar");
    app.releases = Some(vec![ReleaseSpec::Detailed {
        url: Url::from_file_path(&archive).unwrap().to_string(),
        environment: None,
        version: Some("1.0".to_string()),
    }]);

    let releases = aggregator().gather_releases(&app).unwrap();
    assert_eq!(
        releases["1.0"].environment.get(PYTHON_REQUIREMENTS).unwrap(),
        ["pandas"]
    );
}

#[test]
fn test_run_build_writes_api() {
    let source = TempDir::new().unwrap();
    let (first, _) = common::two_release_repo(source.path());
    let work = TempDir::new().unwrap();

    let apps_file = work.path().join("apps.toml");
    fs::write(
        &apps_file,
        format!(
            r#"
[categories.utils]
title = "Utilities"

[apps.foo]
git_url = "{}"
release_line = "main"
categories = ["utils"]

[apps.foo.metadata]
description = "Foo app"

[apps.foo.dependencies]
"^0.2" = ["numpy==1.26"]
"#,
            Url::from_file_path(source.path()).unwrap()
        ),
    )
    .unwrap();

    let mut config = Config::default();
    config.data.apps = apps_file;
    config.build.output = work.path().join("build");
    config.build.jobs = 2;

    let report = run_build(&BuildArgs::default(), &config).unwrap();
    assert!(!report.has_failures());
    assert_eq!(report.built_count(), 1);

    let index: Value = serde_json::from_str(&fs::read_to_string(&report.index_path).unwrap()).unwrap();
    assert_eq!(index["apps"]["foo"], json!({"name": "foo", "categories": ["utils"]}));
    assert_eq!(index["categories"]["utils"]["title"], "Utilities");

    let app_doc: Value = serde_json::from_str(
        &fs::read_to_string(work.path().join("build/api/v1/apps/foo.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(app_doc["metadata"]["title"], "foo");
    assert_eq!(app_doc["metadata"]["state"], "registered");
    assert_eq!(
        app_doc["releases"]["0.1.0"]["environment"],
        json!({"python-requirements": ["numpy>=1.0"]})
    );
    assert!(app_doc["releases"]["0.1.0"]["url"]
        .as_str()
        .unwrap()
        .ends_with(&first.to_string()));
    assert_eq!(
        app_doc["releases"]["0.2.0"]["environment"],
        json!({"python-requirements": ["numpy==1.26"]})
    );
}
