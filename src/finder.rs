//! Capture, index, search and report: the three phases of one leak run.

use std::io::BufRead;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::candidate::LeakCandidate;
use crate::graph::{GraphStore, Snapshot};
use crate::options::FinderOptions;
use crate::report::{RecordSink, Reporter};
use crate::search::{PathFinder, SearchOutcome};
use crate::trace::{self, CcLogSource, TraceSource};
use crate::types::Address;
use crate::Result;

/// Counters describing a finished capture.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptureSummary {
    /// Distinct nodes observed.
    pub nodes: usize,
    /// Edges observed, duplicates included.
    pub edges: usize,
    /// Nodes flagged as roots.
    pub roots: usize,
    /// Nodes flagged as garbage-cycle members.
    pub garbage: usize,
    /// Largest number of owners of any node.
    pub max_in_degree: usize,
    /// Times the trace source was pulled.
    pub pulls: usize,
    /// Wall time spent ingesting and indexing.
    pub elapsed_ms: f64,
}

/// Tally of outcomes across the candidates of one report.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Candidates processed; one record was emitted for each.
    pub candidates: usize,
    /// Candidates with a retention path.
    pub found: usize,
    /// Candidates present in the graph with no path to a root.
    pub exhausted: usize,
    /// Candidates absent from the graph.
    pub missing: usize,
}

/// Entry point tying capture, search and reporting together.
#[derive(Clone, Debug, Default)]
pub struct ShutdownLeakFinder {
    options: FinderOptions,
}

impl ShutdownLeakFinder {
    /// Creates a finder with `options`.
    pub fn new(options: FinderOptions) -> Self {
        Self { options }
    }

    /// Active options.
    pub fn options(&self) -> &FinderOptions {
        &self.options
    }

    /// Wraps `reader` in a log source configured from these options.
    pub fn log_source<R: BufRead>(&self, reader: R) -> CcLogSource<R> {
        CcLogSource::new(reader)
            .strict(self.options.strict_trace)
            .batch_lines(self.options.batch_lines)
    }

    /// Pulls `source` to completion and freezes the result.
    pub fn capture(&self, source: &mut dyn TraceSource) -> Result<Capture> {
        let start = Instant::now();
        info!("capture.begin");
        let mut store = GraphStore::new();
        let pulls = trace::drain(source, &mut store)?;
        let snapshot = store.freeze();
        let store = snapshot.store();
        let summary = CaptureSummary {
            nodes: store.node_count(),
            edges: store.edge_count(),
            roots: store.root_count(),
            garbage: store.garbage_count(),
            max_in_degree: snapshot.owners().max_in_degree(),
            pulls,
            elapsed_ms: start.elapsed().as_secs_f64() * 1_000.0,
        };
        info!(
            nodes = summary.nodes,
            edges = summary.edges,
            roots = summary.roots,
            garbage = summary.garbage,
            pulls = summary.pulls,
            duration_ms = summary.elapsed_ms,
            "capture.completed"
        );
        Ok(Capture {
            snapshot,
            summary,
            options: self.options.clone(),
        })
    }

    /// Captures `source`, then reports every candidate into `sink`.
    pub fn find_and_report(
        &self,
        source: &mut dyn TraceSource,
        candidates: &[LeakCandidate],
        sink: &mut dyn RecordSink,
    ) -> Result<ReportSummary> {
        info!(candidates = candidates.len(), "leakpath.run.begin");
        let capture = self.capture(source)?;
        capture.report(candidates, sink)
    }
}

/// One frozen capture, ready to answer searches.
#[derive(Debug)]
pub struct Capture {
    snapshot: Snapshot,
    summary: CaptureSummary,
    options: FinderOptions,
}

impl Capture {
    /// The frozen graph.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Counters recorded while capturing.
    pub fn summary(&self) -> &CaptureSummary {
        &self.summary
    }

    /// Runs a single search.
    pub fn search(&self, address: Address) -> SearchOutcome {
        PathFinder::new(&self.snapshot).find_address(address)
    }

    /// A reporter bound to this capture.
    pub fn reporter(&self) -> Reporter<'_> {
        Reporter::new(&self.snapshot, &self.options)
    }

    /// Searches each candidate once, in order, emitting exactly one record per candidate.
    pub fn report(
        &self,
        candidates: &[LeakCandidate],
        sink: &mut dyn RecordSink,
    ) -> Result<ReportSummary> {
        let mut finder = PathFinder::new(&self.snapshot);
        let reporter = self.reporter();
        let mut summary = ReportSummary::default();
        for candidate in candidates {
            let outcome = finder.find_address(candidate.address);
            match &outcome {
                SearchOutcome::Found(path) => {
                    summary.found += 1;
                    debug!(
                        test = %candidate.test,
                        address = %candidate.address,
                        path_len = path.len(),
                        "report.candidate.found"
                    );
                }
                SearchOutcome::Exhausted {
                    garbage, visited, ..
                } => {
                    summary.exhausted += 1;
                    debug!(
                        test = %candidate.test,
                        address = %candidate.address,
                        garbage,
                        visited,
                        "report.candidate.exhausted"
                    );
                }
                SearchOutcome::Missing => {
                    summary.missing += 1;
                    debug!(
                        test = %candidate.test,
                        address = %candidate.address,
                        "report.candidate.missing"
                    );
                }
            }
            sink.emit(&reporter.record(candidate, &outcome))?;
            summary.candidates += 1;
        }
        info!(
            candidates = summary.candidates,
            found = summary.found,
            exhausted = summary.exhausted,
            missing = summary.missing,
            "report.completed"
        );
        Ok(summary)
    }
}
