pub mod orchestration;

pub use orchestration::{build_registry, run_build, AppOutcome, BuildArgs, BuildReport};
