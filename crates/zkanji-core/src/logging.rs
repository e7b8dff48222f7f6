//! Logging facilities for zkanji.
//!
//! zkanji uses the `tracing` crate for instrumentation. The libraries never
//! install a subscriber; applications and tests do that themselves:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("zkanji_groups::tree=debug")
//!         .init();
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core plumbing target.
    pub const CORE: &str = "zkanji_core";
    /// Signal emission target.
    pub const SIGNAL: &str = "zkanji_core::signal";
    /// Category/group tree mutations.
    pub const TREE: &str = "zkanji_groups::tree";
    /// Loading and saving of group files.
    pub const PERSIST: &str = "zkanji_groups::persist";
    /// UI-facing tree models.
    pub const MODEL: &str = "zkanji_groups::model";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for timing load/save and other bulk operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "zkanji::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
