//! Options controlling capture and reporting.

use crate::trace::DEFAULT_BATCH_LINES;

/// Default subtest name attached to emitted records.
pub const DEFAULT_SUBTEST: &str = "Shutdown";

/// Configuration for a [`crate::ShutdownLeakFinder`] run.
#[derive(Clone, Debug)]
pub struct FinderOptions {
    /// Subtest name placed on every record.
    pub subtest: String,
    /// Whether to apply cosmetic rewrites to node names in formatted paths.
    pub clean_names: bool,
    /// Whether trace log readers reject unrecognized lines.
    pub strict_trace: bool,
    /// Lines consumed per pull when reading a trace log.
    pub batch_lines: usize,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            subtest: DEFAULT_SUBTEST.to_string(),
            clean_names: true,
            strict_trace: false,
            batch_lines: DEFAULT_BATCH_LINES,
        }
    }
}

impl FinderOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subtest name.
    pub fn subtest(mut self, subtest: impl Into<String>) -> Self {
        self.subtest = subtest.into();
        self
    }

    /// Enables or disables node name cleanup.
    pub fn clean_names(mut self, enabled: bool) -> Self {
        self.clean_names = enabled;
        self
    }

    /// Enables or disables strict trace parsing.
    pub fn strict_trace(mut self, strict: bool) -> Self {
        self.strict_trace = strict;
        self
    }

    /// Sets the number of log lines per pull.
    pub fn batch_lines(mut self, lines: usize) -> Self {
        self.batch_lines = lines.max(1);
        self
    }
}
