//! Domain types - pure data and parsing, independent of git operations

pub mod release;
pub mod release_line;
pub mod source;

pub use release::{Environment, Release, PYTHON_REQUIREMENTS};
pub use release_line::ReleaseLine;
pub use source::ReleaseSource;
