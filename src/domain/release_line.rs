use crate::error::{RegistryError, Result};
use std::fmt;

/// Parsed form of a release line expression: `<ref>[:<revision-selector>]`.
///
/// An empty `reference` stands for the repository's current branch. The
/// selector is an opaque git revision-range expression handed verbatim to
/// the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLine {
    pub reference: String,
    pub selector: Option<String>,
}

impl ReleaseLine {
    /// Parse a release line expression.
    ///
    /// More than one `:` separator, or a `:` followed by nothing, is invalid.
    ///
    /// # Example
    /// ```
    /// # use app_registry::domain::ReleaseLine;
    /// let line = ReleaseLine::parse("main:v1.0..v2.0").unwrap();
    /// assert_eq!(line.reference, "main");
    /// assert_eq!(line.selector.as_deref(), Some("v1.0..v2.0"));
    /// assert!(ReleaseLine::parse("a:b:c").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split(':');
        let reference = parts.next().unwrap_or_default();
        let selector = parts.next();

        if parts.next().is_some() || selector == Some("") {
            return Err(RegistryError::InvalidReleaseLine(line.to_string()));
        }

        Ok(ReleaseLine {
            reference: reference.to_string(),
            selector: selector.map(str::to_string),
        })
    }

    /// True when the line names no ref and resolves against the current branch
    pub fn uses_current_branch(&self) -> bool {
        self.reference.is_empty()
    }
}

impl fmt::Display for ReleaseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "{}:{}", self.reference, selector),
            None => write!(f, "{}", self.reference),
        }
    }
}
