//! User interface module - terminal output for the build binary.
//!
//! All formatting lives in `formatter`; summaries are built as strings so
//! they can be tested without capturing stdout.

pub mod formatter;

pub use formatter::{
    display_build_summary, display_error, display_status, display_success, format_build_summary,
};
