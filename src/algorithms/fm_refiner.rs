// Boundary Fiduccia-Mattheyses refinement. Vertices with at least one
// neighbor across the cut are held in one max-heap per block, keyed by
// gain (the cut reduction if the vertex moves). Each pass greedily swaps
// boundary vertices, allowing the balance to degrade temporarily, and
// finally rolls back to the best prefix seen, preferring balanced states
// and breaking ties by cut.

use crate::graph::Graph;
use crate::heap::IndexedMaxHeap;
use crate::imbalance::block_weights;
use crate::options::Options;

/// Refine a partition in place with repeated FM passes. Returns the
/// final cut. The cut never increases, and the balance distance to the
/// tolerance band never increases either.
pub(crate) fn fm_refine(graph: &Graph, options: &Options, partition: &mut [usize]) -> f64 {
    let n = graph.len();
    if n == 0 {
        return 0.0;
    }
    let (lo, hi) = options.split_bounds(graph.total_vertex_weight());
    let band_distance = |w0: f64| (lo - w0).max(w0 - hi).max(0.0);

    let mut cut = 0.0;
    let mut blocks = block_weights(partition, graph.vertex_weights.iter().cloned());

    let mut gains = vec![0.0; n];
    let mut cross_count = vec![0_usize; n];
    let mut heaps = [IndexedMaxHeap::new(n), IndexedMaxHeap::new(n)];

    for _ in 0..options.fm_max_num_refinements {
        // Rebuild gains and the boundary heaps from scratch; the cut is
        // reseeded from the same scan, so it cannot drift across passes.
        heaps[0].clear();
        heaps[1].clear();
        let mut external_total = 0.0;
        for v in 0..n {
            let mut internal = 0.0;
            let mut external = 0.0;
            let mut crossings = 0;
            for (u, w) in graph.neighbors(v) {
                if partition[u] == partition[v] {
                    internal += w;
                } else {
                    external += w;
                    crossings += 1;
                }
            }
            gains[v] = external - internal;
            cross_count[v] = crossings;
            external_total += external;
            if crossings > 0 {
                heaps[partition[v]].insert(v, gains[v]);
            }
        }
        cut = external_total / 2.0;
        let pass_start = (band_distance(blocks[0]), cut);

        let mut moved = vec![false; n];
        let mut swaps: Vec<usize> = Vec::new();
        let mut best = pass_start;
        let mut best_len = 0;

        for _ in 0..options.fm_search_depth {
            let Some(vertex) = select_move(graph, options, &mut heaps, &blocks, lo, hi) else {
                break;
            };
            let from = partition[vertex];
            let to = 1 - from;
            let weight = graph.vertex_weights[vertex];

            partition[vertex] = to;
            moved[vertex] = true;
            blocks[from] -= weight;
            blocks[to] += weight;
            cut -= gains[vertex];
            gains[vertex] = -gains[vertex];

            for (u, w) in graph.neighbors(vertex) {
                if partition[u] == to {
                    // The edge to u just left the cut.
                    gains[u] -= 2.0 * w;
                    cross_count[u] -= 1;
                    if heaps[to].contains(u) {
                        if cross_count[u] == 0 {
                            heaps[to].remove(u);
                        } else {
                            heaps[to].update(u, gains[u]);
                        }
                    }
                } else {
                    // The edge to u just entered the cut.
                    gains[u] += 2.0 * w;
                    cross_count[u] += 1;
                    if heaps[from].contains(u) {
                        heaps[from].update(u, gains[u]);
                    } else if !moved[u] && cross_count[u] == 1 {
                        heaps[from].insert(u, gains[u]);
                    }
                }
            }

            swaps.push(vertex);
            let state = (band_distance(blocks[0]), cut);
            if state.0 < best.0 - f64::EPSILON
                || (state.0 <= best.0 + f64::EPSILON && state.1 < best.1 - f64::EPSILON)
            {
                best = state;
                best_len = swaps.len();
            }
        }

        // Unwind the swaps past the best prefix.
        for &vertex in swaps[best_len..].iter().rev() {
            let from = partition[vertex];
            let to = 1 - from;
            let weight = graph.vertex_weights[vertex];
            partition[vertex] = to;
            blocks[from] -= weight;
            blocks[to] += weight;
        }
        cut = best.1;

        let progressed = best.0 < pass_start.0 - f64::EPSILON
            || (best.0 <= pass_start.0 + f64::EPSILON && best.1 < pass_start.1 - f64::EPSILON);
        if !progressed {
            break;
        }
    }
    cut
}

// Pick the next vertex to move. The heavier side (relative to its target
// share) is tried first; up to `fm_consider_count` top candidates are
// popped from its heap, preferring one whose move does not push the
// block-A weight further from the tolerance band, then the best gain.
// Unchosen candidates go back on the heap.
fn select_move(
    graph: &Graph,
    options: &Options,
    heaps: &mut [IndexedMaxHeap; 2],
    blocks: &[f64; 2],
    lo: f64,
    hi: f64,
) -> Option<usize> {
    let band_distance = |w0: f64| (lo - w0).max(w0 - hi).max(0.0);
    let total = blocks[0] + blocks[1];
    let excess0 = blocks[0] - options.target_split * total;
    let excess1 = blocks[1] - (1.0 - options.target_split) * total;
    let first = if excess0 >= excess1 { 0 } else { 1 };

    for side in [first, 1 - first] {
        let current_distance = band_distance(blocks[0]);
        let mut popped: Vec<(usize, f64)> = Vec::new();
        while popped.len() < options.fm_consider_count.max(1) {
            match heaps[side].pop() {
                Some(entry) => popped.push(entry),
                None => break,
            }
        }

        let mut chosen: Option<(usize, bool, f64)> = None;
        for &(vertex, gain) in &popped {
            let weight = graph.vertex_weights[vertex];
            let new_w0 = if side == 0 {
                blocks[0] - weight
            } else {
                blocks[0] + weight
            };
            let keeps_band = band_distance(new_w0) <= current_distance + f64::EPSILON;
            let better = match chosen {
                None => true,
                Some((_, best_keeps, best_gain)) => {
                    (keeps_band, gain) > (best_keeps, best_gain)
                }
            };
            if better {
                chosen = Some((vertex, keeps_band, gain));
            }
        }

        if let Some((vertex, _, _)) = chosen {
            for (other, gain) in popped {
                if other != vertex {
                    heaps[side].insert(other, gain);
                }
            }
            return Some(vertex);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> Graph {
        let edges: Vec<(usize, usize, f64)> =
            (0..n - 1).map(|v| (v, v + 1, 1.0)).collect();
        Graph::from_edges(n, &edges, None).unwrap()
    }

    #[test]
    fn test_fm_fixes_alternating_partition() {
        // Arrange
        let graph = path(4);
        let options = Options::default();
        let mut partition = vec![0, 1, 0, 1];

        // Act
        let cut = fm_refine(&graph, &options, &mut partition);

        // Assert
        assert_eq!(partition, vec![0, 0, 1, 1]);
        assert_eq!(cut, 1.0);
        assert_eq!(graph.edge_cut(&partition), 1.0);
    }

    #[test]
    fn test_fm_keeps_an_optimal_partition() {
        // Arrange
        let graph = path(4);
        let options = Options::default();
        let mut partition = vec![0, 0, 1, 1];

        // Act
        let cut = fm_refine(&graph, &options, &mut partition);

        // Assert
        assert_eq!(partition, vec![0, 0, 1, 1]);
        assert_eq!(cut, 1.0);
    }

    #[test]
    fn test_fm_restores_balance() {
        // Arrange: seven vertices on one side of an eight-vertex chain.
        let graph = path(8);
        let options = Options::default();
        let mut partition = vec![0, 0, 0, 0, 0, 0, 0, 1];

        // Act
        let cut = fm_refine(&graph, &options, &mut partition);

        // Assert
        assert_eq!(partition, vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(cut, 1.0);
    }

    #[test]
    fn test_fm_never_increases_the_cut() {
        // Arrange: a weighted ring with a mediocre but balanced split.
        let graph = Graph::from_edges(
            6,
            &[
                (0, 1, 3.0),
                (1, 2, 1.0),
                (2, 3, 3.0),
                (3, 4, 1.0),
                (4, 5, 3.0),
                (5, 0, 1.0),
            ],
            None,
        )
        .unwrap();
        let options = Options::default();
        let mut partition = vec![0, 0, 0, 1, 1, 1];
        let initial_cut = graph.edge_cut(&partition);

        // Act
        let cut = fm_refine(&graph, &options, &mut partition);

        // Assert
        assert!(cut <= initial_cut);
        assert_eq!(cut, graph.edge_cut(&partition));
    }

    #[test]
    fn test_fm_moves_respect_heavy_vertex_weights() {
        // Arrange: the only cut-improving move would wreck the balance.
        let graph = Graph::from_edges(
            4,
            &[(0, 1, 1.0), (1, 2, 5.0), (2, 3, 1.0)],
            Some(vec![1.0, 1.0, 1.0, 1.0]),
        )
        .unwrap();
        let options = Options::default();
        let mut partition = vec![0, 0, 1, 1];

        // Act
        let cut = fm_refine(&graph, &options, &mut partition);

        // Assert: vertex 2 cannot join block 0 without unbalancing, so
        // the split stays where it was.
        assert_eq!(partition, vec![0, 0, 1, 1]);
        assert_eq!(cut, 5.0);
    }
}
