//! Release discovery
//!
//! - [resolver]: expands a release line into `(label, commit)` pairs
//! - [reconciler]: picks the effective environment of one version
//! - [aggregator]: drives both over every release source of an app

pub mod aggregator;
pub mod reconciler;
pub mod resolver;

pub use aggregator::ReleaseAggregator;
pub use reconciler::{reconcile, DeclaredDependencies, DeclaredOverrides};
pub use resolver::{resolve, resolve_line, ReleaseCommit};
