//! Declarative registry data: the apps, how their releases are found and
//! which categories they belong to.
//!
//! ```toml
//! [categories.quantum]
//! title = "Quantum"
//!
//! [apps.foo]
//! git_url = "https://example.test/aiidalab/foo.git"
//! release_line = "main"
//! categories = ["quantum"]
//!
//! [apps.foo.metadata]
//! description = "Does foo."
//!
//! [apps.foo.dependencies]
//! "<0.2" = ["numpy<1.20"]
//! ```

use crate::domain::Environment;
use crate::error::{RegistryError, Result};
use crate::releases::DeclaredOverrides;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use url::Url;

/// Metadata keys that are no longer published
const DEPRECATED_METADATA_KEYS: &[&str] = &["logo", "requires", "version"];

/// The whole registry, as loaded from its data file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryData {
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,

    #[serde(default)]
    pub apps: BTreeMap<String, AppConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    pub title: String,

    #[serde(default)]
    pub description: String,
}

/// One registered application.
///
/// Immutable once loaded; the build only ever reads it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Key of the app in the registry, filled in on load
    #[serde(skip)]
    pub id: String,

    #[serde(default)]
    pub git_url: Option<String>,

    /// Release line used when `releases` is not given
    #[serde(default)]
    pub release_line: String,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Declared dependency overrides keyed by version specifier
    #[serde(default)]
    pub dependencies: DeclaredOverrides,

    #[serde(default)]
    pub releases: Option<Vec<ReleaseSpec>>,
}

/// Where to find releases: a bare URL or a URL with overrides
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReleaseSpec {
    Url(String),
    Detailed {
        url: String,

        #[serde(default, alias = "environment-override")]
        environment: Option<Environment>,

        #[serde(default, alias = "version-override")]
        version: Option<String>,
    },
}

impl ReleaseSpec {
    pub fn url(&self) -> &str {
        match self {
            ReleaseSpec::Url(url) | ReleaseSpec::Detailed { url, .. } => url,
        }
    }

    pub fn environment_override(&self) -> Option<&Environment> {
        match self {
            ReleaseSpec::Url(_) => None,
            ReleaseSpec::Detailed { environment, .. } => environment.as_ref(),
        }
    }

    /// Declared version label; an empty one counts as absent
    pub fn version_override(&self) -> Option<&str> {
        match self {
            ReleaseSpec::Url(_) => None,
            ReleaseSpec::Detailed { version, .. } => {
                version.as_deref().filter(|version| !version.is_empty())
            }
        }
    }
}

impl RegistryData {
    /// Load and validate the registry data file at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RegistryError::config(format!("Cannot read registry data {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse and validate registry data from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let mut data: RegistryData = toml::from_str(content)
            .map_err(|e| RegistryError::config(format!("Invalid registry data: {}", e)))?;

        for (id, app) in data.apps.iter_mut() {
            validate_app_id(id)?;
            app.id = id.clone();
        }
        data.validate_categories()?;

        Ok(data)
    }

    fn validate_categories(&self) -> Result<()> {
        for app in self.apps.values() {
            if let Some(category) = app
                .categories
                .iter()
                .find(|c| !self.categories.contains_key(c.as_str()))
            {
                return Err(RegistryError::UnknownCategory {
                    app: app.id.clone(),
                    category: category.clone(),
                });
            }
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn new(id: impl Into<String>) -> Self {
        AppConfig {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Release specifications of this app.
    ///
    /// Without an explicit `releases` list, the git URL becomes the single
    /// source, its fragment carrying the release line.
    pub fn release_specs(&self) -> Vec<ReleaseSpec> {
        if let Some(releases) = &self.releases {
            return releases.clone();
        }

        match &self.git_url {
            Some(git_url) if git_url.contains('#') || self.release_line.is_empty() => {
                vec![ReleaseSpec::Url(format!("git+{}", git_url))]
            }
            Some(git_url) => vec![ReleaseSpec::Url(format!(
                "git+{}#{}",
                git_url, self.release_line
            ))],
            None => Vec::new(),
        }
    }

    /// Published metadata: defaults filled in, deprecated keys removed
    pub fn completed_metadata(&self) -> Map<String, Value> {
        let mut metadata = self.metadata.clone();
        metadata
            .entry("state")
            .or_insert_with(|| Value::from("registered"));
        metadata
            .entry("title")
            .or_insert_with(|| Value::from(self.id.clone()));
        if let Some(author) = self.git_url.as_deref().and_then(git_author) {
            metadata.entry("authors").or_insert(Value::from(author));
        }
        for key in DEPRECATED_METADATA_KEYS {
            metadata.remove(*key);
        }
        metadata
    }
}

/// App ids become file names, so they are restricted to `[A-Za-z0-9_-]`
pub fn validate_app_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidAppId(id.to_string()))
    }
}

/// First path segment of a hosted git URL, e.g. the GitHub owner
fn git_author(git_url: &str) -> Option<String> {
    let url = Url::parse(git_url).ok()?;
    url.path_segments()?
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
