// Initial partition of the coarsest graph. The quality bar is low since
// refinement runs on every level afterwards, but a good guess saves
// refinement work.

use crate::algorithms::qp_refiner::qp_guess;
use crate::algorithms::Error;
use crate::graph::Graph;
use crate::options::{GuessCutType, Options};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Assign each vertex of the coarsest graph to a block.
pub(crate) fn initial_guess(
    graph: &Graph,
    options: &Options,
    partition: &mut [usize],
) -> Result<(), Error> {
    match options.guess_cut_type {
        GuessCutType::Qp => qp_guess(graph, options, partition)?,
        GuessCutType::Random => random_guess(options, partition),
        GuessCutType::NaturalOrder => natural_order_guess(graph, options, partition),
    }
    Ok(())
}

// Bernoulli(1/2) per vertex, seeded so runs are reproducible.
fn random_guess(options: &Options, partition: &mut [usize]) {
    let mut rng = SmallRng::seed_from_u64(options.random_seed);
    for block in partition.iter_mut() {
        *block = rng.gen_range(0..2) as usize;
    }
}

// Fill block A in BFS order from a pseudoperipheral root until it holds
// the target share of the vertex weight.
fn natural_order_guess(graph: &Graph, options: &Options, partition: &mut [usize]) {
    let root = pseudoperipheral_root(graph, options.guess_search_depth);
    let order = bfs_order(graph, root);

    partition.fill(1);
    let target_weight = options.target_split * graph.total_vertex_weight();
    let mut block_weight = 0.0;
    for vertex in order {
        if block_weight >= target_weight {
            break;
        }
        partition[vertex] = 0;
        block_weight += graph.vertex_weights[vertex];
    }
}

// Repeated BFS sweeps: restart from the deepest vertex found until the
// eccentricity stops growing or the search depth is exhausted.
fn pseudoperipheral_root(graph: &Graph, search_depth: usize) -> usize {
    let mut root = 0;
    let mut eccentricity = 0;
    for _ in 0..search_depth.max(1) {
        let (farthest, depth) = bfs_farthest(graph, root);
        if depth > eccentricity {
            eccentricity = depth;
            root = farthest;
        } else {
            break;
        }
    }
    root
}

fn bfs_farthest(graph: &Graph, root: usize) -> (usize, usize) {
    let mut distance = vec![usize::MAX; graph.len()];
    let mut queue = std::collections::VecDeque::new();
    distance[root] = 0;
    queue.push_back(root);
    let mut farthest = root;
    let mut depth = 0;
    while let Some(vertex) = queue.pop_front() {
        for (neighbor, _) in graph.neighbors(vertex) {
            if distance[neighbor] == usize::MAX {
                distance[neighbor] = distance[vertex] + 1;
                if distance[neighbor] > depth {
                    depth = distance[neighbor];
                    farthest = neighbor;
                }
                queue.push_back(neighbor);
            }
        }
    }
    (farthest, depth)
}

// BFS order from the root; vertices in other components follow in id
// order so every vertex is placed exactly once.
fn bfs_order(graph: &Graph, root: usize) -> Vec<usize> {
    let n = graph.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue = std::collections::VecDeque::new();
    visited[root] = true;
    queue.push_back(root);
    while let Some(vertex) = queue.pop_front() {
        order.push(vertex);
        for (neighbor, _) in graph.neighbors(vertex) {
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }
    }
    for vertex in 0..n {
        if !visited[vertex] {
            order.push(vertex);
        }
    }
    order
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
    fn test_random_guess_is_deterministic() {
        // Arrange
        let graph = path(16);
        let options = Options {
            guess_cut_type: GuessCutType::Random,
            random_seed: 42,
            ..Default::default()
        };
        let mut first = vec![0; 16];
        let mut second = vec![0; 16];

        // Act
        initial_guess(&graph, &options, &mut first).unwrap();
        initial_guess(&graph, &options, &mut second).unwrap();

        // Assert
        assert_eq!(first, second);
        assert!(first.iter().all(|&block| block < 2));
    }

    #[test]
    fn test_natural_order_splits_a_path_in_half() {
        // Arrange
        let graph = path(8);
        let options = Options {
            guess_cut_type: GuessCutType::NaturalOrder,
            ..Default::default()
        };
        let mut partition = vec![0; 8];

        // Act
        initial_guess(&graph, &options, &mut partition).unwrap();

        // Assert: a contiguous half of the chain forms block A.
        assert_eq!(graph.edge_cut(&partition), 1.0);
        assert_eq!(partition.iter().filter(|&&block| block == 0).count(), 4);
    }

    #[test]
    fn test_pseudoperipheral_root_of_path_is_an_endpoint() {
        // Arrange
        let graph = path(9);

        // Act
        let root = pseudoperipheral_root(&graph, 10);

        // Assert
        assert!(root == 0 || root == 8);
    }

    #[test]
    fn test_bfs_order_covers_all_vertices() {
        // Arrange
        let graph = path(5);

        // Act
        let order = bfs_order(&graph, 2);

        // Assert
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
        assert_eq!(order[0], 2);
    }
}
