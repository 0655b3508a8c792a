use crate::graph::Graph;
use crate::options::{MatchingStrategy, Options};

/// A matching of vertices into supernodes of one, two, or three fine
/// vertices, used to drive one coarsening step.
///
/// `matching[a]` is `b + 1` when `a` and `b` are matched (`a + 1` for an
/// orphan self match) and 0 while `a` is unmatched, so a value of zero
/// always means "not yet matched". Three-way matches are encoded by
/// chaining: `matching[a] = b + 1`, `matching[b] = c + 1`,
/// `matching[c] = a + 1`. `matchmap` takes fine vertices to their coarse
/// id, and `invmatchmap` holds one representative fine vertex per coarse
/// vertex.
pub struct Matching {
    matching: Vec<usize>,
    matchmap: Vec<usize>,
    invmatchmap: Vec<usize>,
    // Isolated vertex waiting to be paired with a second one.
    singleton: Option<usize>,
}

impl Matching {
    fn new(n: usize) -> Self {
        Self {
            matching: vec![0; n],
            matchmap: vec![0; n],
            invmatchmap: Vec::new(),
            singleton: None,
        }
    }

    /// The number of coarse vertices (supernodes) formed so far.
    pub fn coarse_len(&self) -> usize {
        self.invmatchmap.len()
    }

    pub fn is_matched(&self, vertex: usize) -> bool {
        self.matching[vertex] != 0
    }

    /// The next vertex in the match chain of `vertex`.
    pub fn partner(&self, vertex: usize) -> usize {
        debug_assert!(self.is_matched(vertex));
        self.matching[vertex] - 1
    }

    /// The coarse vertex containing `vertex`.
    pub fn coarse_id(&self, vertex: usize) -> usize {
        debug_assert!(self.is_matched(vertex));
        self.matchmap[vertex]
    }

    /// The one to three fine vertices of the coarse vertex `coarse`.
    pub fn members(&self, coarse: usize) -> ([usize; 3], usize) {
        let mut fine = [0; 3];
        fine[0] = self.invmatchmap[coarse];
        fine[1] = self.partner(fine[0]);
        if fine[1] == fine[0] {
            return (fine, 1);
        }
        fine[2] = self.partner(fine[1]);
        if fine[2] == fine[0] {
            (fine, 2)
        } else {
            (fine, 3)
        }
    }

    fn create_match(&mut self, a: usize, b: usize) {
        debug_assert!(!self.is_matched(a));
        debug_assert!(a == b || !self.is_matched(b));
        let coarse = self.invmatchmap.len();
        self.matching[a] = b + 1;
        self.matching[b] = a + 1;
        self.matchmap[a] = coarse;
        self.matchmap[b] = coarse;
        self.invmatchmap.push(a);
    }

    /// Attach `vertex` to the supernode of the already matched `anchor`,
    /// forming a three-way chain. Falls back to an orphan self match when
    /// the anchor's supernode is already full.
    fn create_community_match(&mut self, anchor: usize, vertex: usize) {
        debug_assert!(self.is_matched(anchor));
        debug_assert!(!self.is_matched(vertex));
        let second = self.partner(anchor);
        if self.partner(second) != anchor {
            // Anchor is already in a three-way match.
            self.create_match(vertex, vertex);
            return;
        }
        self.matching[second] = vertex + 1;
        self.matching[vertex] = anchor + 1;
        self.matchmap[vertex] = self.matchmap[anchor];
    }

    /// Panic if the matching is not a valid partition of the vertices
    /// into supernodes of size one to three. Expensive-checks mode only.
    fn validate(&self, n: usize) {
        let mut seen = vec![false; n];
        for coarse in 0..self.coarse_len() {
            let (fine, size) = self.members(coarse);
            for &vertex in &fine[..size] {
                assert!(!seen[vertex], "vertex in two supernodes");
                assert_eq!(self.matchmap[vertex], coarse);
                seen[vertex] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "unmatched vertex after cleanup");
    }
}

/// Compute a matching of the graph under the configured strategy, then
/// fill unmatched vertices with the cleanup rule.
pub fn match_vertices(graph: &Graph, options: &Options) -> Matching {
    let mut matching = Matching::new(graph.len());

    match options.matching_strategy {
        MatchingStrategy::Random => matching_random(graph, &mut matching),
        MatchingStrategy::Hem => matching_hem(graph, &mut matching),
        MatchingStrategy::HemPa => {
            matching_hem(graph, &mut matching);
            matching_pa(graph, options, &mut matching);
        }
        MatchingStrategy::HemDavisPa => {
            matching_hem(graph, &mut matching);
            matching_davis_pa(graph, options, &mut matching);
        }
    }
    matching_cleanup(graph, &mut matching);

    if options.do_expensive_checks {
        matching.validate(graph.len());
    }
    matching
}

// Match each vertex with its first unmatched neighbor in storage order.
// Traversal is not randomized; the strategy has no edge priority.
fn matching_random(graph: &Graph, matching: &mut Matching) {
    for k in 0..graph.len() {
        if matching.is_matched(k) {
            continue;
        }
        if let Some((neighbor, _)) = graph
            .neighbors(k)
            .find(|&(neighbor, _)| !matching.is_matched(neighbor))
        {
            matching.create_match(k, neighbor);
        }
    }
}

// Heavy edge matching: pair each vertex with its unmatched neighbor of
// maximum edge weight, ties broken by first occurrence.
fn matching_hem(graph: &Graph, matching: &mut Matching) {
    for k in 0..graph.len() {
        if matching.is_matched(k) {
            continue;
        }

        let mut heaviest_neighbor = None;
        let mut heaviest_weight = -1.0;
        for (neighbor, weight) in graph.neighbors(k) {
            if matching.is_matched(neighbor) {
                continue;
            }
            if weight > heaviest_weight {
                heaviest_weight = weight;
                heaviest_neighbor = Some(neighbor);
            }
        }

        if let Some(neighbor) = heaviest_neighbor {
            matching.create_match(k, neighbor);
        }
    }
}

// Pair the still unmatched neighbors of a brother vertex in storage
// order; an odd one out becomes a community member or an orphan.
fn pair_brother_neighbors(
    graph: &Graph,
    options: &Options,
    matching: &mut Matching,
    brother: usize,
) {
    let mut pending = None;
    for (neighbor, _) in graph.neighbors(brother) {
        if matching.is_matched(neighbor) {
            continue;
        }
        match pending.take() {
            None => pending = Some(neighbor),
            Some(first) => matching.create_match(first, neighbor),
        }
    }

    if let Some(leftover) = pending {
        if options.do_community_matching {
            matching.create_community_match(brother, leftover);
        } else {
            matching.create_match(leftover, leftover);
        }
    }
}

// Passive-aggressive matching: every unmatched vertex asks its heaviest
// (matched) neighbor to pair up that neighbor's unmatched neighbors.
fn matching_pa(graph: &Graph, options: &Options, matching: &mut Matching) {
    for k in 0..graph.len() {
        if matching.is_matched(k) {
            continue;
        }

        let mut heaviest_neighbor = None;
        let mut heaviest_weight = -1.0;
        for (neighbor, weight) in graph.neighbors(k) {
            if weight > heaviest_weight {
                heaviest_weight = weight;
                heaviest_neighbor = Some(neighbor);
            }
        }

        if let Some(brother) = heaviest_neighbor {
            pair_brother_neighbors(graph, options, matching, brother);
        }
    }
}

// Davis variant: run the brotherly pairing from every matched vertex
// whose degree reaches the threshold multiple of the average degree.
// Requires a prior matching pass; unmatched vertices are left to cleanup.
fn matching_davis_pa(graph: &Graph, options: &Options, matching: &mut Matching) {
    let average_degree = graph.nnz() as f64 / graph.len() as f64;
    let brotherly_threshold = options.davis_brotherly_threshold * average_degree;

    for k in 0..graph.len() {
        if !matching.is_matched(k) {
            continue;
        }
        if (graph.degree(k) as f64) >= brotherly_threshold {
            pair_brother_neighbors(graph, options, matching, k);
        }
    }
}

// Orphan every remaining unmatched vertex. Isolated vertices are paired
// with each other; a leftover isolated vertex is matched to itself.
fn matching_cleanup(graph: &Graph, matching: &mut Matching) {
    for k in 0..graph.len() {
        if matching.is_matched(k) {
            continue;
        }
        if graph.degree(k) == 0 {
            match matching.singleton.take() {
                None => matching.singleton = Some(k),
                Some(other) => matching.create_match(k, other),
            }
        } else {
            matching.create_match(k, k);
        }
    }

    if let Some(leftover) = matching.singleton.take() {
        matching.create_match(leftover, leftover);
    }
}
