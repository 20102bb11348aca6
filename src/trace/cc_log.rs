use std::io::BufRead;

use tracing::warn;

use super::{TraceEvent, TraceSink, TraceSource};
use crate::types::Address;
use crate::{LeakPathError, Result};

const RESULTS_SEPARATOR: &str = "==========";

/// Default number of log lines consumed per pull.
pub const DEFAULT_BATCH_LINES: usize = 4096;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Section {
    Graph,
    Results,
}

/// Reads a textual cycle-collector edge log.
///
/// The graph section lists nodes, each followed by its outgoing edges:
///
/// ```text
/// 0x7f00a0 [rc=2] nsGlobalWindowInner # 12 inner about:blank
/// > 0x7f00b0 mDoc
/// 0x7f00b0 [gc.marked] JS Object (Function - onload)
/// ==========
/// 0x7f00a0 [known=1]
/// 0x7f00b0 [garbage]
/// ```
///
/// Everything after the `==========` separator describes roots and garbage.
pub struct CcLogSource<R> {
    reader: R,
    strict: bool,
    batch_lines: usize,
    section: Section,
    current: Option<Address>,
    line_no: usize,
    buf: Vec<u8>,
    skipped: usize,
}

impl<R: BufRead> CcLogSource<R> {
    /// Creates a lenient reader over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            strict: false,
            batch_lines: DEFAULT_BATCH_LINES,
            section: Section::Graph,
            current: None,
            line_no: 0,
            buf: Vec::new(),
            skipped: 0,
        }
    }

    /// Rejects unrecognized lines instead of skipping them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets how many lines are consumed per pull.
    pub fn batch_lines(mut self, lines: usize) -> Self {
        self.batch_lines = lines.max(1);
        self
    }

    /// Number of lines skipped so far in lenient mode.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    fn reject(&mut self, reason: &str) -> Result<()> {
        if self.strict {
            return Err(LeakPathError::MalformedTrace {
                line: self.line_no,
                reason: reason.to_string(),
            });
        }
        self.skipped += 1;
        warn!(line = self.line_no, reason, "trace.skip_line");
        Ok(())
    }

    fn handle_line(&mut self, sink: &mut dyn TraceSink) -> Result<()> {
        let raw = std::mem::take(&mut self.buf);
        let outcome = match std::str::from_utf8(&raw) {
            Ok(line) => self.dispatch(trim_newline(line), sink),
            Err(_) if self.strict => self.reject("invalid UTF-8"),
            Err(_) => {
                warn!(line = self.line_no, "trace.lossy_line");
                let line = String::from_utf8_lossy(&raw);
                self.dispatch(trim_newline(&line), sink)
            }
        };
        self.buf = raw;
        outcome
    }

    fn dispatch(&mut self, line: &str, sink: &mut dyn TraceSink) -> Result<()> {
        if line.trim().is_empty() || line.starts_with('#') {
            return Ok(());
        }
        if line == RESULTS_SEPARATOR {
            self.section = Section::Results;
            self.current = None;
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix("> ") {
            return self.edge_line(rest, sink);
        }
        let Some((address, tag, name)) = split_node_line(line) else {
            return self.reject("unrecognized line");
        };
        match (self.section, tag) {
            (Section::Graph, "gc") | (Section::Graph, "gc.marked") => {
                self.current = Some(address);
                sink.observe(TraceEvent::GcNode {
                    address,
                    marked: tag == "gc.marked",
                    name: name.to_string(),
                });
            }
            (Section::Graph, tag) if tag.starts_with("rc=") => {
                let Ok(ref_count) = tag["rc=".len()..].parse::<u64>() else {
                    return self.reject("invalid reference count");
                };
                self.current = Some(address);
                sink.observe(TraceEvent::RefCountedNode {
                    address,
                    ref_count,
                    name: name.to_string(),
                });
            }
            (Section::Results, "garbage") => {
                sink.observe(TraceEvent::Garbage { address });
            }
            (Section::Results, tag) if tag.starts_with("known=") => {
                let Ok(known_edges) = tag["known=".len()..].parse::<u64>() else {
                    return self.reject("invalid known edge count");
                };
                sink.observe(TraceEvent::Root {
                    address,
                    known_edges,
                });
            }
            _ => return self.reject("unexpected tag for section"),
        }
        Ok(())
    }

    fn edge_line(&mut self, rest: &str, sink: &mut dyn TraceSink) -> Result<()> {
        if self.section != Section::Graph {
            return self.reject("edge outside graph section");
        }
        let Some(from) = self.current else {
            return self.reject("edge without a preceding node");
        };
        let (raw_to, label) = rest.split_once(' ').unwrap_or((rest, ""));
        let Ok(to) = raw_to.parse::<Address>() else {
            return self.reject("invalid edge target address");
        };
        sink.observe(TraceEvent::Edge {
            from,
            to,
            label: label.to_string(),
        });
        Ok(())
    }
}

impl<R: BufRead> TraceSource for CcLogSource<R> {
    fn process_next(&mut self, sink: &mut dyn TraceSink) -> Result<bool> {
        for _ in 0..self.batch_lines {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(false);
            }
            self.line_no += 1;
            self.handle_line(sink)?;
        }
        Ok(true)
    }
}

fn trim_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Splits `0xADDR [tag] name` into its parts. The name may be empty.
fn split_node_line(line: &str) -> Option<(Address, &str, &str)> {
    let (raw_address, rest) = line.split_once(' ')?;
    let address = raw_address.parse::<Address>().ok()?;
    let rest = rest.strip_prefix('[')?;
    let (tag, name) = rest.split_once(']')?;
    Some((address, tag, name.strip_prefix(' ').unwrap_or(name)))
}
