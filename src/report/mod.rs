//! Turns search outcomes into structured test-status records.

mod format;

pub use format::{clean_name, extract_url, root_annotation};

use std::io::Write;

use serde::Serialize;

use crate::candidate::LeakCandidate;
use crate::graph::Snapshot;
use crate::options::FinderOptions;
use crate::search::{RetentionPath, SearchOutcome};
use crate::types::NodeIdx;
use crate::Result;

/// Structured failure record for one leak candidate.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LeakRecord {
    /// Log action, always `test_status`.
    pub action: &'static str,
    /// Test that leaked the object.
    pub test: String,
    /// Phase the failure is attributed to.
    pub subtest: String,
    /// Always `FAIL`.
    pub status: &'static str,
    /// Always `PASS`.
    pub expected: &'static str,
    /// One-line summary including the leaked window's URL when known.
    pub message: String,
    /// Retention path or fallback diagnostic, one item per line.
    pub stack: String,
    /// Timing metadata carried over from the candidate; zero is treated as absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

/// Destination for emitted records.
pub trait RecordSink {
    /// Emits one record.
    fn emit(&mut self, record: &LeakRecord) -> Result<()>;
}

/// Writes each record as one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &LeakRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Records in emission order.
    pub records: Vec<LeakRecord>,
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &LeakRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Formats nodes, paths and records against one snapshot.
pub struct Reporter<'a> {
    snapshot: &'a Snapshot,
    options: &'a FinderOptions,
}

impl<'a> Reporter<'a> {
    /// Creates a reporter over `snapshot`.
    pub fn new(snapshot: &'a Snapshot, options: &'a FinderOptions) -> Self {
        Self { snapshot, options }
    }

    /// Display text for `node`, with the root annotation when it is a root.
    pub fn format_node(&self, node: NodeIdx) -> String {
        let store = self.snapshot.store();
        let raw = store.name(node);
        let mut out = if self.options.clean_names {
            clean_name(raw).into_owned()
        } else {
            raw.to_string()
        };
        if let Some(known) = store.known_edges(node) {
            out.push(' ');
            out.push_str(&root_annotation(store.ref_count(node), known));
        }
        out
    }

    /// Renders `path` target first, one node per line, each later line prefixed
    /// by the label of the edge that reaches it.
    pub fn format_path(&self, path: &RetentionPath) -> String {
        let store = self.snapshot.store();
        let mut lines = Vec::with_capacity(path.nodes.len());
        for (i, &node) in path.nodes.iter().enumerate() {
            let text = format!("{} @ {}", self.format_node(node), store.address(node));
            if i == 0 {
                lines.push(text);
            } else {
                let label = store.edge(path.edges[i - 1]).label;
                lines.push(format!("  {label} \u{2014} {text}"));
            }
        }
        lines.join("\n")
    }

    /// URL embedded in `node`'s raw display name.
    pub fn associated_url(&self, node: NodeIdx) -> Option<&'a str> {
        extract_url(self.snapshot.store().name(node))
    }

    /// Builds the record for `candidate` given its search outcome.
    pub fn record(&self, candidate: &LeakCandidate, outcome: &SearchOutcome) -> LeakRecord {
        let (stack, url) = match outcome {
            SearchOutcome::Found(path) => {
                (self.format_path(path), self.associated_url(path.target()))
            }
            SearchOutcome::Exhausted {
                target, garbage, ..
            } => {
                let mut detail = String::from("no path to root found");
                if *garbage {
                    detail.push_str(" (garbage cycle)");
                }
                (
                    format!("{}\n{detail}", self.format_node(*target)),
                    self.associated_url(*target),
                )
            }
            SearchOutcome::Missing => (
                format!(
                    "{}\nnot found in CC graph at {}",
                    candidate.serial_desc(),
                    candidate.address
                ),
                None,
            ),
        };
        LeakRecord {
            action: "test_status",
            test: candidate.test.clone(),
            subtest: self.options.subtest.clone(),
            status: "FAIL",
            expected: "PASS",
            message: format!(
                "leaked window until shutdown [url = {}]",
                url.unwrap_or("unknown")
            ),
            stack,
            time: candidate.time.filter(|&t| t != 0),
        }
    }
}
