use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ecosystem assumed for declared dependencies given as a flat list
pub const PYTHON_REQUIREMENTS: &str = "python-requirements";

/// Runtime requirements of one release, keyed by ecosystem name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(BTreeMap<String, Vec<String>>);

impl Environment {
    pub fn new() -> Self {
        Environment(BTreeMap::new())
    }

    /// Set the requirements of one ecosystem, replacing any previous list
    pub fn insert(&mut self, ecosystem: impl Into<String>, requirements: Vec<String>) {
        self.0.insert(ecosystem.into(), requirements);
    }

    pub fn with(mut self, ecosystem: impl Into<String>, requirements: Vec<String>) -> Self {
        self.insert(ecosystem, requirements);
        self
    }

    pub fn get(&self, ecosystem: &str) -> Option<&[String]> {
        self.0.get(ecosystem).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ecosystems(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Vec<String>>> for Environment {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Environment(map)
    }
}

/// One discovered, versioned snapshot of an app.
///
/// Serializes to the `{url, environment}` record of the API index; the
/// commit is kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub url: String,
    pub environment: Environment,
    #[serde(skip)]
    pub commit: Option<String>,
}

impl Release {
    /// What identifies where this release came from: its commit when
    /// git-backed, its URL otherwise.
    pub fn origin(&self) -> &str {
        self.commit.as_deref().unwrap_or(&self.url)
    }
}
