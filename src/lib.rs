//! Shutdown leak retention-path finder.
//!
//! Given a snapshot of an object reference graph captured at shutdown, explains
//! why suspected-leaked objects are still alive by finding a shortest chain of
//! owning references from each one back to a root.
//!
//! A run has three phases that never re-enter each other: a [`trace::TraceSource`]
//! is drained into a [`graph::GraphStore`], the store is frozen into a
//! [`graph::Snapshot`] with its reverse [`graph::OwnerIndex`], and each candidate
//! is searched by a [`search::PathFinder`] and written out by a
//! [`report::Reporter`].

pub mod candidate;
pub mod error;
pub mod finder;
pub mod graph;
pub mod options;
pub mod report;
pub mod search;
pub mod trace;
pub mod types;

pub use candidate::{load_candidates, LeakCandidate};
pub use error::{LeakPathError, Result};
pub use finder::{Capture, CaptureSummary, ReportSummary, ShutdownLeakFinder};
pub use options::FinderOptions;
pub use types::{Address, EdgeIdx, NodeIdx, MAX_ARENA_LEN};
