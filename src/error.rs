use thiserror::Error;

/// Unified error type for app-registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid release line specification: '{0}'")]
    InvalidReleaseLine(String),

    #[error(
        "Ambiguous dependency specification for version '{version}': matched by {}",
        .specifiers.join(", ")
    )]
    AmbiguousDependencySpecification {
        version: String,
        specifiers: Vec<String>,
    },

    #[error("Duplicate version '{version}' for app '{app}' ({first} and {second})")]
    DuplicateVersion {
        app: String,
        version: String,
        first: String,
        second: String,
    },

    #[error("Unable to determine version for app '{app}' release {url}")]
    UnresolvableVersion { app: String, url: String },

    #[error("Invalid version specifier '{specifier}': {reason}")]
    InvalidSpecifier { specifier: String, reason: String },

    #[error("Unsupported release source '{url}': {reason}")]
    UnsupportedSource { url: String, reason: String },

    #[error("Invalid app id '{0}': only ASCII letters, digits, '_' and '-' are allowed")]
    InvalidAppId(String),

    #[error("App '{app}' references unknown category '{category}'")]
    UnknownCategory { app: String, category: String },

    #[error("Unable to determine current branch: {0}")]
    BranchResolution(String),

    #[error("Not a branch '{branch}': {message}")]
    UnknownBranch { branch: String, message: String },

    #[error("Unknown ref '{reference}': {message}")]
    UnknownRef { reference: String, message: String },

    #[error("Invalid revision selector '{selector}': {message}")]
    InvalidRevisionSelector { selector: String, message: String },

    #[error("Unknown commit '{commit}': {message}")]
    UnknownCommit { commit: String, message: String },

    #[error("File not found: {commit}:{path}")]
    FileNotFound { commit: String, path: String },

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("App '{app}': {source}")]
    App {
        app: String,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in app-registry
pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        RegistryError::Config(msg.into())
    }

    /// Create a transport error for the given URL
    pub fn transport(url: impl Into<String>, msg: impl ToString) -> Self {
        RegistryError::Transport {
            url: url.into(),
            message: msg.to_string(),
        }
    }

    /// Attach the app identifier to an error raised while processing it.
    ///
    /// Errors that already carry an app context are returned unchanged.
    pub fn for_app(self, app: impl Into<String>) -> Self {
        match self {
            RegistryError::App { .. } => self,
            other => RegistryError::App {
                app: app.into(),
                source: Box::new(other),
            },
        }
    }

    /// True for the "no such file at this revision" signal, which callers
    /// scanning for optional files treat as absence rather than failure.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, RegistryError::FileNotFound { .. })
    }
}
