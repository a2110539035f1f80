pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod git;
pub mod index;
pub mod logging;
pub mod registry;
pub mod releases;
pub mod scan;
pub mod ui;
pub mod version;

pub use error::{RegistryError, Result};
