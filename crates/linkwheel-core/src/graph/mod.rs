//! Graph Health Module
//!
//! Topology metrics over the vault's note-to-note link graph. Pure and
//! re-entrant: large graphs use deterministic stride sampling, never an
//! RNG, so repeated runs agree.

mod topology;

pub use topology::{
    BETWEENNESS_TOP_SHARE, GraphHealthReport, LARGE_GRAPH_NODES, LinkGraph, SAMPLE_STARTS,
    analyze_graph, build_graph, round3,
};
