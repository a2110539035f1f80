use crate::domain::{Environment, PYTHON_REQUIREMENTS};
use crate::error::{RegistryError, Result};
use crate::version::Specifier;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dependencies an app author declares for a range of versions.
///
/// A flat list is shorthand for the `python-requirements` ecosystem:
///
/// ```toml
/// [apps.foo.dependencies]
/// ">=1.0" = ["numpy>=1.20"]
/// "<1.0" = { python-requirements = ["numpy<1.20"], jupyter-requirements = [] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclaredDependencies {
    Flat(Vec<String>),
    ByEcosystem(BTreeMap<String, Vec<String>>),
}

impl DeclaredDependencies {
    pub fn to_environment(&self) -> Environment {
        match self {
            DeclaredDependencies::Flat(requirements) => {
                Environment::new().with(PYTHON_REQUIREMENTS, requirements.clone())
            }
            DeclaredDependencies::ByEcosystem(map) => Environment::from(map.clone()),
        }
    }
}

/// Declared dependency overrides keyed by version specifier, in authoring order
pub type DeclaredOverrides = IndexMap<String, DeclaredDependencies>;

/// Pick the effective environment of `version`.
///
/// No matching specifier keeps `parsed`; exactly one replaces it wholesale;
/// more than one is an authoring error.
pub fn reconcile(
    declared: &DeclaredOverrides,
    parsed: Environment,
    version: &str,
) -> Result<Environment> {
    let mut matched = Vec::new();
    for (specifier, dependencies) in declared {
        if Specifier::parse(specifier)?.matches(version) {
            matched.push((specifier, dependencies));
        }
    }

    match matched.as_slice() {
        [] => Ok(parsed),
        [(_, dependencies)] => Ok(dependencies.to_environment()),
        _ => Err(RegistryError::AmbiguousDependencySpecification {
            version: version.to_string(),
            specifiers: matched.iter().map(|(s, _)| s.to_string()).collect(),
        }),
    }
}
