//! JSON API written by a build
//!
//! ```text
//! <output>/api/v1/apps_index.json
//! <output>/api/v1/apps/<app-id>.json
//! ```

use crate::domain::Release;
use crate::error::Result;
use crate::registry::{AppConfig, Category, RegistryData};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const API_DIR: &str = "api/v1";
pub const INDEX_FILE: &str = "apps_index.json";
pub const APPS_DIR: &str = "apps";

/// Everything published about one app
#[derive(Debug, Clone, Serialize)]
pub struct AppDocument {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,

    pub metadata: Map<String, Value>,
    pub categories: Vec<String>,
    pub releases: IndexMap<String, Release>,
}

impl AppDocument {
    pub fn new(app: &AppConfig, releases: IndexMap<String, Release>) -> Self {
        AppDocument {
            name: app.id.clone(),
            git_url: app.git_url.clone(),
            metadata: app.completed_metadata(),
            categories: app.categories.clone(),
            releases,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub categories: Vec<String>,
}

/// Summary of every published app plus the category table
#[derive(Debug, Clone, Serialize)]
pub struct AppsIndex {
    pub apps: BTreeMap<String, IndexEntry>,
    pub categories: BTreeMap<String, Category>,
}

impl AppsIndex {
    pub fn build(data: &RegistryData, documents: &[AppDocument]) -> Self {
        let apps = documents
            .iter()
            .map(|doc| {
                (
                    doc.name.clone(),
                    IndexEntry {
                        name: doc.name.clone(),
                        categories: doc.categories.clone(),
                    },
                )
            })
            .collect();

        AppsIndex {
            apps,
            categories: data.categories.clone(),
        }
    }
}

/// Write the index and one document per app below `output`.
///
/// Returns the path of the index file.
pub fn write_index(output: &Path, index: &AppsIndex, documents: &[AppDocument]) -> Result<PathBuf> {
    let api_dir = output.join(API_DIR);
    let apps_dir = api_dir.join(APPS_DIR);
    fs::create_dir_all(&apps_dir)?;

    for doc in documents {
        let path = apps_dir.join(format!("{}.json", doc.name));
        fs::write(&path, serde_json::to_string_pretty(doc)?)?;
    }

    let index_path = api_dir.join(INDEX_FILE);
    fs::write(&index_path, serde_json::to_string_pretty(index)?)?;
    info!(path = %index_path.display(), apps = index.apps.len(), "Wrote apps index");

    Ok(index_path)
}
