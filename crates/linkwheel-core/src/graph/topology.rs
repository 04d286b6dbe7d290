//! Link Graph Topology
//!
//! Flat adjacency arrays with a name → id side map; BFS and Brandes run
//! over contiguous ids, which keeps the hot loops cache-friendly.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::index::normalize_name;
use crate::vault::NoteFile;

/// Graphs above this node count sample their path/betweenness sources
pub const LARGE_GRAPH_NODES: usize = 100;

/// Number of sampled BFS starts on large graphs
pub const SAMPLE_STARTS: usize = 50;

/// Share of nodes counted as "top" for the betweenness concentration metric
pub const BETWEENNESS_TOP_SHARE: f64 = 0.05;

/// Undirected note-to-note link graph
#[derive(Debug, Clone)]
pub struct LinkGraph {
    names: Vec<String>,
    adjacency: Vec<Vec<u32>>,
    /// Unique undirected edges
    edge_count: usize,
    /// Distinct resolved link targets
    target_count: usize,
}

impl LinkGraph {
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn neighbors(&self, node: usize) -> &[u32] {
        &self.adjacency[node]
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }
}

/// Build the undirected graph by resolving every wikilink target to a note
///
/// Resolution order: exact basename match (case-insensitive), then
/// hyphen/space normalization. Unresolvable targets are dropped.
pub fn build_graph(notes: &[NoteFile]) -> LinkGraph {
    let mut exact: HashMap<String, u32> = HashMap::new();
    let mut normalized: HashMap<String, u32> = HashMap::new();
    for (id, note) in notes.iter().enumerate() {
        exact.entry(note.title.to_lowercase()).or_insert(id as u32);
        normalized
            .entry(normalize_name(&note.title))
            .or_insert(id as u32);
    }

    let mut edges: HashSet<(u32, u32)> = HashSet::new();
    let mut targets: HashSet<u32> = HashSet::new();
    for (source, note) in notes.iter().enumerate() {
        for raw in &note.links {
            let Some(target) = resolve(raw, &exact, &normalized) else {
                continue;
            };
            targets.insert(target);
            let (a, b) = if (source as u32) <= target {
                (source as u32, target)
            } else {
                (target, source as u32)
            };
            if a != b {
                edges.insert((a, b));
            }
        }
    }

    let mut adjacency = vec![Vec::new(); notes.len()];
    for &(a, b) in &edges {
        adjacency[a as usize].push(b);
        adjacency[b as usize].push(a);
    }
    for list in &mut adjacency {
        list.sort_unstable();
    }

    LinkGraph {
        names: notes.iter().map(|n| n.path.clone()).collect(),
        adjacency,
        edge_count: edges.len(),
        target_count: targets.len(),
    }
}

fn resolve(raw: &str, exact: &HashMap<String, u32>, normalized: &HashMap<String, u32>) -> Option<u32> {
    let mut target = raw;
    for sep in ['#', '^'] {
        if let Some(idx) = target.find(sep) {
            target = &target[..idx];
        }
    }
    if let Some(idx) = target.rfind('/') {
        target = &target[idx + 1..];
    }
    let target = target.strip_suffix(".md").unwrap_or(target).trim();
    if target.is_empty() {
        return None;
    }
    exact
        .get(&target.to_lowercase())
        .or_else(|| normalized.get(&normalize_name(target)))
        .copied()
}

/// Topology metrics, all real values rounded to three decimals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphHealthReport {
    pub note_count: usize,
    pub link_count: usize,
    pub link_density: f64,
    pub orphan_count: usize,
    pub orphan_rate: f64,
    pub entity_coverage: f64,
    pub connectedness: f64,
    pub cluster_count: usize,
    pub largest_cluster_size: usize,
    pub gini_coefficient: f64,
    pub clustering_coefficient: f64,
    pub avg_path_length: f64,
    pub degree_centrality_std_dev: f64,
    pub betweenness_top5_pct_share: f64,
    pub avg_degree: f64,
    pub max_degree: usize,
}

/// Compute the full metric set over a built graph
///
/// `entity_count` is the number of entity notes in the index, for the
/// coverage ratio.
pub fn analyze_graph(graph: &LinkGraph, entity_count: usize) -> GraphHealthReport {
    let n = graph.node_count();
    if n == 0 {
        return GraphHealthReport {
            note_count: 0,
            link_count: 0,
            link_density: 0.0,
            orphan_count: 0,
            orphan_rate: 0.0,
            entity_coverage: 0.0,
            connectedness: 0.0,
            cluster_count: 0,
            largest_cluster_size: 0,
            gini_coefficient: 0.0,
            clustering_coefficient: 0.0,
            avg_path_length: 0.0,
            degree_centrality_std_dev: 0.0,
            betweenness_top5_pct_share: 0.0,
            avg_degree: 0.0,
            max_degree: 0,
        };
    }

    let degrees: Vec<usize> = (0..n).map(|v| graph.degree(v)).collect();
    let orphan_count = degrees.iter().filter(|&&d| d == 0).count();
    let (cluster_count, largest) = components(graph);
    let sources = sample_sources(n);

    let entity_coverage = if entity_count == 0 {
        0.0
    } else {
        (graph.target_count as f64 / entity_count as f64).min(1.0)
    };

    GraphHealthReport {
        note_count: n,
        link_count: graph.edge_count,
        link_density: round3(graph.edge_count as f64 / n as f64),
        orphan_count,
        orphan_rate: round3(orphan_count as f64 / n as f64),
        entity_coverage: round3(entity_coverage),
        connectedness: round3(largest as f64 / n as f64),
        cluster_count,
        largest_cluster_size: largest,
        gini_coefficient: round3(gini(&degrees)),
        clustering_coefficient: round3(mean_local_clustering(graph)),
        avg_path_length: round3(avg_path_length(graph, &sources)),
        degree_centrality_std_dev: round3(degree_centrality_std_dev(&degrees)),
        betweenness_top5_pct_share: round3(betweenness_top_share(graph, &sources)),
        avg_degree: round3(degrees.iter().sum::<usize>() as f64 / n as f64),
        max_degree: degrees.iter().copied().max().unwrap_or(0),
    }
}

/// Round to three decimals
pub fn round3(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 1000.0).round() / 1000.0
}

/// Deterministic stride sample of BFS sources
fn sample_sources(n: usize) -> Vec<usize> {
    if n <= LARGE_GRAPH_NODES {
        return (0..n).collect();
    }
    let stride = n as f64 / SAMPLE_STARTS as f64;
    (0..SAMPLE_STARTS)
        .map(|i| ((i as f64 * stride) as usize).min(n - 1))
        .collect()
}

/// (component count, largest component size)
fn components(graph: &LinkGraph) -> (usize, usize) {
    let n = graph.node_count();
    let mut visited = vec![false; n];
    let mut count = 0;
    let mut largest = 0;

    for start in 0..n {
        if visited[start] {
            continue;
        }
        count += 1;
        let mut size = 0;
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(v) = queue.pop_front() {
            size += 1;
            for &w in graph.neighbors(v) {
                if !visited[w as usize] {
                    visited[w as usize] = true;
                    queue.push_back(w as usize);
                }
            }
        }
        largest = largest.max(size);
    }
    (count, largest)
}

/// Gini coefficient over the degree distribution
fn gini(degrees: &[usize]) -> f64 {
    let n = degrees.len();
    let total: usize = degrees.iter().sum();
    if n == 0 || total == 0 {
        return 0.0;
    }
    let mut sorted: Vec<usize> = degrees.to_vec();
    sorted.sort_unstable();
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &d)| (i + 1) as f64 * d as f64)
        .sum();
    let n_f = n as f64;
    ((2.0 * weighted) / (n_f * total as f64) - (n_f + 1.0) / n_f).clamp(0.0, 1.0)
}

/// Mean local clustering coefficient
fn mean_local_clustering(graph: &LinkGraph) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }
    let sets: Vec<HashSet<u32>> = (0..n)
        .map(|v| graph.neighbors(v).iter().copied().collect())
        .collect();

    let mut sum = 0.0;
    for v in 0..n {
        let neighbors = graph.neighbors(v);
        let k = neighbors.len();
        if k < 2 {
            continue;
        }
        let mut closed = 0usize;
        for (i, &a) in neighbors.iter().enumerate() {
            for &b in &neighbors[i + 1..] {
                if sets[a as usize].contains(&b) {
                    closed += 1;
                }
            }
        }
        sum += closed as f64 / (k * (k - 1) / 2) as f64;
    }
    sum / n as f64
}

/// Average shortest-path length over reachable pairs from the sources
fn avg_path_length(graph: &LinkGraph, sources: &[usize]) -> f64 {
    let mut total = 0u64;
    let mut pairs = 0u64;
    for &source in sources {
        for distance in bfs_distances(graph, source).into_iter().flatten() {
            if distance > 0 {
                total += distance as u64;
                pairs += 1;
            }
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total as f64 / pairs as f64
    }
}

fn bfs_distances(graph: &LinkGraph, source: usize) -> Vec<Option<u32>> {
    let mut distances = vec![None; graph.node_count()];
    distances[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        let d = distances[v].expect("visited node has distance");
        for &w in graph.neighbors(v) {
            if distances[w as usize].is_none() {
                distances[w as usize] = Some(d + 1);
                queue.push_back(w as usize);
            }
        }
    }
    distances
}

/// Standard deviation of normalized degree centrality
fn degree_centrality_std_dev(degrees: &[usize]) -> f64 {
    let n = degrees.len();
    if n < 2 {
        return 0.0;
    }
    let scale = (n - 1) as f64;
    let centralities: Vec<f64> = degrees.iter().map(|&d| d as f64 / scale).collect();
    let mean = centralities.iter().sum::<f64>() / n as f64;
    let variance = centralities.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n as f64;
    variance.sqrt()
}

/// Share of total betweenness held by the top 5% of nodes
///
/// Brandes accumulation restricted to the sampled sources; with all nodes
/// as sources this is exact unweighted betweenness.
fn betweenness_top_share(graph: &LinkGraph, sources: &[usize]) -> f64 {
    let n = graph.node_count();
    let mut centrality = vec![0.0f64; n];

    for &source in sources {
        // Brandes single-source shortest-path accumulation.
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<u32>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut distance: Vec<i64> = vec![-1; n];
        sigma[source] = 1.0;
        distance[source] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in graph.neighbors(v) {
                let w = w as usize;
                if distance[w] < 0 {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v as u32);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                let v = v as usize;
                if sigma[w] > 0.0 {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
            }
            if w != source {
                centrality[w] += delta[w];
            }
        }
    }

    let total: f64 = centrality.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut sorted = centrality;
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top = ((n as f64 * BETWEENNESS_TOP_SHARE).ceil() as usize).max(1);
    sorted.iter().take(top).sum::<f64>() / total
}
