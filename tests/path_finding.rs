#![allow(missing_docs)]

use leakpath::graph::{GraphStore, Snapshot};
use leakpath::report::{MemorySink, Reporter};
use leakpath::search::{PathFinder, SearchOutcome};
use leakpath::trace::{EventSource, TraceEvent};
use leakpath::{Address, FinderOptions, LeakCandidate, ShutdownLeakFinder};
use proptest::prelude::*;
use std::collections::HashMap;

const LEAF: Address = Address(0x100);
const MID: Address = Address(0x200);
const ROOT: Address = Address(0x300);

fn leaf_mid_root() -> Snapshot {
    let mut store = GraphStore::new();
    store.note_gc_node(LEAF, "Leaf");
    store.note_gc_node(MID, "Mid");
    store.note_ref_counted_node(ROOT, 1, "Root");
    store.note_edge(MID, LEAF, "field1");
    store.note_edge(ROOT, MID, "field2");
    store.note_root(ROOT, 0);
    store.freeze()
}

fn path_addresses(snapshot: &Snapshot, outcome: &SearchOutcome) -> Vec<Address> {
    match outcome {
        SearchOutcome::Found(path) => path
            .nodes
            .iter()
            .map(|n| snapshot.store().address(*n))
            .collect(),
        other => panic!("expected a path, got {other:?}"),
    }
}

#[test]
fn end_to_end_leaf_mid_root() {
    let snapshot = leaf_mid_root();
    let mut finder = PathFinder::new(&snapshot);
    let outcome = finder.find_address(LEAF);
    assert_eq!(path_addresses(&snapshot, &outcome), vec![LEAF, MID, ROOT]);

    let SearchOutcome::Found(path) = &outcome else {
        unreachable!()
    };
    let labels: Vec<_> = path
        .edges
        .iter()
        .map(|e| snapshot.store().edge(*e).label)
        .collect();
    assert_eq!(labels, vec!["field1", "field2"]);

    let options = FinderOptions::default();
    let text = Reporter::new(&snapshot, &options).format_path(path);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Leaf @ 0x100",
            "  field1 \u{2014} Mid @ 0x200",
            "  field2 \u{2014} Root [root, 1 unknown ref(s)] @ 0x300",
        ]
    );
}

#[test]
fn duplicate_edges_are_distinct_owners() {
    let mut store = GraphStore::new();
    let a = store.note_edge(Address(1), Address(2), "mSlot");
    let b = store.note_edge(Address(1), Address(2), "mSlot");
    let snapshot = store.freeze();
    let target = snapshot.lookup(Address(2)).unwrap();
    assert_eq!(snapshot.owners().owners(target), &[a, b]);
}

#[test]
fn shortest_of_two_paths_wins() {
    // Long path (4 edges) is registered first so arrival order cannot explain the result.
    let mut store = GraphStore::new();
    let t = Address(1);
    store.note_edge(Address(10), t, "long0");
    store.note_edge(Address(11), Address(10), "long1");
    store.note_edge(Address(12), Address(11), "long2");
    store.note_edge(Address(99), Address(12), "long3");
    store.note_edge(Address(20), t, "short0");
    store.note_edge(Address(99), Address(20), "short1");
    store.note_root(Address(99), 2);
    let snapshot = store.freeze();
    let outcome = PathFinder::new(&snapshot).find_address(t);
    assert_eq!(
        path_addresses(&snapshot, &outcome),
        vec![t, Address(20), Address(99)]
    );
}

#[test]
fn nearest_of_two_roots_wins() {
    let mut store = GraphStore::new();
    store.note_edge(Address(2), Address(1), "a");
    store.note_edge(Address(3), Address(2), "b");
    store.note_edge(Address(4), Address(1), "c");
    store.note_root(Address(3), 0);
    store.note_root(Address(4), 0);
    let snapshot = store.freeze();
    let outcome = PathFinder::new(&snapshot).find_address(Address(1));
    assert_eq!(
        path_addresses(&snapshot, &outcome),
        vec![Address(1), Address(4)]
    );
}

#[test]
fn two_node_cycle_terminates_without_path() {
    let mut store = GraphStore::new();
    store.note_edge(Address(0xa), Address(0xb), "owns");
    store.note_edge(Address(0xb), Address(0xa), "owns");
    let snapshot = store.freeze();
    let outcome = PathFinder::new(&snapshot).find_address(Address(0xa));
    assert_eq!(
        outcome,
        SearchOutcome::Exhausted {
            target: snapshot.lookup(Address(0xa)).unwrap(),
            garbage: false,
            visited: 2
        }
    );
}

#[test]
fn edges_point_away_from_target_are_ignored() {
    // The target owns the root; ownership does not flow backwards along that edge.
    let mut store = GraphStore::new();
    store.note_edge(Address(1), Address(2), "owns");
    store.note_root(Address(2), 0);
    let snapshot = store.freeze();
    assert!(matches!(
        PathFinder::new(&snapshot).find_address(Address(1)),
        SearchOutcome::Exhausted { .. }
    ));
}

#[test]
fn missing_target_is_distinct_from_exhausted() {
    let snapshot = leaf_mid_root();
    let mut finder = PathFinder::new(&snapshot);
    assert_eq!(finder.find_address(Address(0xdead)), SearchOutcome::Missing);
}

#[test]
fn garbage_cycle_annotation() {
    let events = vec![
        TraceEvent::GcNode {
            address: Address(0x1),
            marked: false,
            name: "nsGlobalWindowInner # 3 inner about:blank".into(),
        },
        TraceEvent::Edge {
            from: Address(0x2),
            to: Address(0x1),
            label: "mWindow".into(),
        },
        TraceEvent::Edge {
            from: Address(0x1),
            to: Address(0x2),
            label: "mListener".into(),
        },
        TraceEvent::Garbage {
            address: Address(0x1),
        },
        TraceEvent::GcNode {
            address: Address(0x5),
            marked: true,
            name: "Lonely".into(),
        },
    ];
    let candidates = vec![
        LeakCandidate::new(Address(0x1), "browser_cycle.js"),
        LeakCandidate::new(Address(0x5), "browser_lonely.js"),
    ];
    let finder = ShutdownLeakFinder::default();
    let mut sink = MemorySink::default();
    let summary = finder
        .find_and_report(&mut EventSource::new(events), &candidates, &mut sink)
        .unwrap();
    assert_eq!(summary.exhausted, 2);
    assert_eq!(
        sink.records[0].stack,
        "nsGlobalWindowInner # 3 inner about:blank\nno path to root found (garbage cycle)"
    );
    assert_eq!(
        sink.records[0].message,
        "leaked window until shutdown [url = about:blank]"
    );
    assert_eq!(sink.records[1].stack, "Lonely\nno path to root found");
}

#[test]
fn every_candidate_gets_exactly_one_record() {
    let snapshot_events = vec![
        TraceEvent::Edge {
            from: MID,
            to: LEAF,
            label: "field1".into(),
        },
        TraceEvent::Root {
            address: MID,
            known_edges: 0,
        },
    ];
    let candidates = vec![
        LeakCandidate::new(LEAF, "a.js"),
        LeakCandidate::new(Address(0x999), "b.js"),
        LeakCandidate::new(LEAF, "c.js"),
    ];
    let finder = ShutdownLeakFinder::default();
    let mut sink = MemorySink::default();
    let summary = finder
        .find_and_report(&mut EventSource::new(snapshot_events), &candidates, &mut sink)
        .unwrap();
    assert_eq!(summary.candidates, 3);
    assert_eq!((summary.found, summary.missing), (2, 1));
    let tests: Vec<_> = sink.records.iter().map(|r| r.test.as_str()).collect();
    assert_eq!(tests, vec!["a.js", "b.js", "c.js"]);
    assert!(sink.records.iter().all(|r| r.status == "FAIL"));
    assert_eq!(
        sink.records[1].stack,
        "serial=unknown\nnot found in CC graph at 0x999"
    );
}

fn edge_strategy() -> impl Strategy<Value = (u64, u64)> {
    (0u64..24, 0u64..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ensure_index_is_stable(addresses in prop::collection::vec(0u64..64, 1..200)) {
        let mut store = GraphStore::new();
        let mut seen: HashMap<u64, leakpath::NodeIdx> = HashMap::new();
        for raw in addresses {
            let idx = store.ensure_index(Address(raw));
            let expected = *seen.entry(raw).or_insert(idx);
            prop_assert_eq!(idx, expected);
        }
        prop_assert_eq!(store.node_count(), seen.len());
        let mut indices: Vec<_> = seen.values().copied().collect();
        indices.sort();
        indices.dedup();
        prop_assert_eq!(indices.len(), seen.len());
    }

    #[test]
    fn search_terminates_and_paths_are_valid(
        edges in prop::collection::vec(edge_strategy(), 0..80),
        roots in prop::collection::vec(0u64..24, 0..4),
        target in 0u64..24,
    ) {
        let mut store = GraphStore::new();
        for (from, to) in &edges {
            store.note_edge(Address(*from), Address(*to), "e");
        }
        for root in &roots {
            store.note_root(Address(*root), 0);
        }
        let snapshot = store.freeze();
        let mut finder = PathFinder::new(&snapshot);
        match finder.find_address(Address(target)) {
            SearchOutcome::Found(path) => {
                prop_assert_eq!(path.nodes.len(), path.edges.len() + 1);
                prop_assert_eq!(snapshot.store().address(path.target()), Address(target));
                prop_assert!(snapshot.store().is_root(path.root()));
                for (i, edge) in path.edges.iter().enumerate() {
                    let e = snapshot.store().edge(*edge);
                    prop_assert_eq!(e.to, path.nodes[i]);
                    prop_assert_eq!(e.from, path.nodes[i + 1]);
                }
                // Only the last node may be a root on a shortest path.
                for node in &path.nodes[..path.nodes.len() - 1] {
                    prop_assert!(!snapshot.store().is_root(*node));
                }
            }
            SearchOutcome::Exhausted { visited, .. } => {
                prop_assert!(visited >= 1 && visited <= snapshot.store().node_count());
            }
            SearchOutcome::Missing => {
                prop_assert!(snapshot.lookup(Address(target)).is_none());
            }
        }
    }
}
