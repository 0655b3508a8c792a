use crate::algorithms::fm_refiner::fm_refine;
use crate::algorithms::initial_guess::initial_guess;
use crate::algorithms::qp_refiner::qp_refine;
use crate::algorithms::Error;
use crate::coarsening::{coarsen, weight_conserved};
use crate::graph::Graph;
use crate::imbalance::{block_weights, imbalance};
use crate::matching::{match_vertices, Matching};
use crate::options::Options;
use crate::Partition;

// Coarsening stops once a matching fails to shrink the graph by at
// least this factor.
const MIN_REDUCTION: f64 = 0.9;

/// Summary of a computed separator.
#[derive(Clone, Copy, Debug)]
pub struct SeparatorStats {
    /// Total weight of the cut edges.
    pub cut_cost: f64,
    /// Vertex weight of block A and block B.
    pub block_weights: [f64; 2],
    /// `|W0 / W - target_split|` of the final partition.
    pub imbalance: f64,
    /// Number of graph levels in the multilevel hierarchy.
    pub levels: usize,
}

/// Compute a two-way edge separator of a conditioned graph.
///
/// The graph is coarsened through a sequence of matchings, an initial
/// partition is chosen on the coarsest level, and the partition is
/// projected back up, refined at every level by the FM and QP engines.
/// On success `partition` holds the block (0 or 1) of every vertex; on
/// error it is left untouched.
pub fn compute_edge_separator(
    graph: &Graph,
    options: &Options,
    partition: &mut [usize],
) -> Result<SeparatorStats, Error> {
    if partition.len() != graph.len() {
        return Err(Error::InputLenMismatch {
            expected: graph.len(),
            actual: partition.len(),
        });
    }
    if graph.is_empty() {
        return Err(Error::InvalidGraph("graph has no vertices"));
    }
    if options.do_expensive_checks {
        graph.check()?;
    }

    // Coarsening phase: an owned stack of levels, finest first.
    let mut levels: Vec<Graph> = vec![graph.clone()];
    let mut matchings: Vec<Matching> = Vec::new();
    while levels.last().unwrap().len() > options.coarsen_limit {
        let current = levels.last().unwrap();
        let matching = match_vertices(current, options);
        if (matching.coarse_len() as f64) > MIN_REDUCTION * current.len() as f64 {
            break;
        }
        let coarse = coarsen(current, &matching);
        if options.do_expensive_checks {
            coarse.check()?;
            if !weight_conserved(current, &coarse) {
                return Err(Error::InvalidGraph("coarsening lost vertex weight"));
            }
        }
        matchings.push(matching);
        levels.push(coarse);
    }

    // Initial guess on the coarsest level.
    let mut current = vec![0_usize; levels.last().unwrap().len()];
    initial_guess(levels.last().unwrap(), options, &mut current)?;

    // Uncoarsening phase: refine, then project onto the finer level.
    for level in (0..levels.len()).rev() {
        refine(&levels[level], options, &mut current)?;
        if level > 0 {
            let matching = &matchings[level - 1];
            let finer = &levels[level - 1];
            let mut projected = vec![0_usize; finer.len()];
            for (vertex, block) in projected.iter_mut().enumerate() {
                *block = current[matching.coarse_id(vertex)];
            }
            current = projected;
        }
    }
    partition.copy_from_slice(&current);

    let cut_cost = graph.edge_cut(partition);
    let blocks = block_weights(partition, graph.vertex_weights.iter().cloned());
    Ok(SeparatorStats {
        cut_cost,
        block_weights: blocks,
        imbalance: imbalance(
            options.target_split,
            partition,
            graph.vertex_weights.iter().cloned(),
        ),
        levels: levels.len(),
    })
}

// One refinement round on a level: the configured number of FM/QP
// dances.
fn refine(graph: &Graph, options: &Options, partition: &mut [usize]) -> Result<(), Error> {
    for _ in 0..options.num_dances.max(1) {
        if options.use_fm {
            fm_refine(graph, options, partition);
        }
        if options.use_qp_grad_proj {
            qp_refine(graph, options, partition)?;
        }
    }
    Ok(())
}

/// Multilevel edge separator.
///
/// # Example
///
/// ```rust
/// use edgesep::algorithms::EdgeSeparator;
/// use edgesep::graph::Graph;
/// use edgesep::Partition;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = Graph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)], None)?;
/// let mut partition = vec![0; graph.len()];
///
/// let stats = EdgeSeparator::default().partition(&mut partition, &graph)?;
///
/// assert_eq!(stats.cut_cost, graph.edge_cut(&partition));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeSeparator {
    /// Pipeline configuration.
    pub options: Options,
}

impl Partition<&Graph> for EdgeSeparator {
    type Metadata = SeparatorStats;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [usize],
        graph: &Graph,
    ) -> Result<Self::Metadata, Self::Error> {
        compute_edge_separator(graph, &self.options, part_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(n: usize, offset: usize, weight: f64) -> Vec<(usize, usize, f64)> {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                edges.push((offset + i, offset + j, weight));
            }
        }
        edges
    }

    fn checked_options() -> Options {
        Options {
            do_expensive_checks: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_graph_on_four_vertices() {
        // Arrange
        let graph = Graph::from_edges(4, &complete(4, 0, 1.0), None).unwrap();
        let mut partition = vec![0; 4];

        // Act
        let stats = compute_edge_separator(&graph, &checked_options(), &mut partition).unwrap();

        // Assert: any optimal separator of K4 cuts four edges.
        assert_eq!(stats.cut_cost, 4.0);
        assert_eq!(stats.block_weights, [2.0, 2.0]);
        assert_eq!(stats.imbalance, 0.0);
    }

    #[test]
    fn test_chain_of_eight_vertices() {
        // Arrange
        let edges: Vec<(usize, usize, f64)> = (0..7).map(|v| (v, v + 1, 1.0)).collect();
        let graph = Graph::from_edges(8, &edges, None).unwrap();
        let mut partition = vec![0; 8];

        // Act
        let options = checked_options();
        let stats = compute_edge_separator(&graph, &options, &mut partition).unwrap();

        // Assert
        assert_eq!(stats.cut_cost, 1.0);
        assert!(
            (stats.block_weights[0] - stats.block_weights[1]).abs()
                <= options.tolerance * graph.total_vertex_weight()
        );
    }

    #[test]
    fn test_two_cliques_with_a_bridge() {
        // Arrange: two K4 cliques joined by a single unit edge.
        let mut edges = complete(4, 0, 1.0);
        edges.extend(complete(4, 4, 1.0));
        edges.push((3, 4, 1.0));
        let graph = Graph::from_edges(8, &edges, None).unwrap();
        let mut partition = vec![0; 8];

        // Act
        let stats = compute_edge_separator(&graph, &checked_options(), &mut partition).unwrap();

        // Assert: the separator is the bridge.
        assert_eq!(stats.cut_cost, 1.0);
        assert_eq!(stats.block_weights, [4.0, 4.0]);
        assert_eq!(partition[0], partition[3]);
        assert_eq!(partition[4], partition[7]);
        assert_ne!(partition[3], partition[4]);
    }

    #[test]
    fn test_isolated_vertex_next_to_triangle() {
        // Arrange: the singleton rule must absorb the isolated vertex
        // while the rest of the pipeline runs normally.
        let graph =
            Graph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)], None).unwrap();
        let mut partition = vec![0; 4];
        let options = Options {
            coarsen_limit: 2,
            do_expensive_checks: true,
            ..Default::default()
        };

        // Act
        let stats = compute_edge_separator(&graph, &options, &mut partition).unwrap();

        // Assert
        assert!(partition.iter().all(|&block| block < 2));
        assert_eq!(stats.block_weights, [2.0, 2.0]);
        assert_eq!(stats.imbalance, 0.0);
    }

    #[test]
    fn test_multilevel_pipeline_on_bridged_cliques() {
        // Arrange: two K8 cliques with heavy internal edges and a light
        // bridge, coarsened down to four vertices.
        let mut edges = complete(8, 0, 2.0);
        edges.extend(complete(8, 8, 2.0));
        edges.push((7, 8, 1.0));
        let graph = Graph::from_edges(16, &edges, None).unwrap();
        let mut partition = vec![0; 16];
        let options = Options {
            coarsen_limit: 4,
            do_expensive_checks: true,
            ..Default::default()
        };

        // Act
        let stats = compute_edge_separator(&graph, &options, &mut partition).unwrap();

        // Assert: three levels are built and the bridge is found.
        assert_eq!(stats.levels, 3);
        assert_eq!(stats.cut_cost, 1.0);
        assert_eq!(stats.block_weights, [8.0, 8.0]);
    }

    #[test]
    fn test_runs_are_deterministic() {
        // Arrange
        let mut edges = complete(4, 0, 1.0);
        edges.extend(complete(4, 4, 1.0));
        edges.push((0, 4, 1.0));
        let graph = Graph::from_edges(8, &edges, None).unwrap();
        let options = Options::default();
        let mut first = vec![0; 8];
        let mut second = vec![0; 8];

        // Act
        compute_edge_separator(&graph, &options, &mut first).unwrap();
        compute_edge_separator(&graph, &options, &mut second).unwrap();

        // Assert
        assert_eq!(first, second);
    }

    #[test]
    fn test_cut_cost_matches_cross_edges() {
        // Arrange
        let edges: Vec<(usize, usize, f64)> = (0..9).map(|v| (v, (v + 1) % 10, 2.0)).collect();
        let graph = Graph::from_edges(10, &edges, None).unwrap();
        let mut partition = vec![0; 10];

        // Act
        let stats = compute_edge_separator(&graph, &checked_options(), &mut partition).unwrap();

        // Assert
        assert_eq!(stats.cut_cost, graph.edge_cut(&partition));
        let weights = block_weights(&partition, graph.vertex_weights.iter().cloned());
        assert_eq!(stats.block_weights[0], weights[0]);
    }

    #[test]
    fn test_partition_length_mismatch_is_rejected() {
        // Arrange
        let graph = Graph::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)], None).unwrap();
        let mut partition = vec![0; 2];

        // Act
        let result = compute_edge_separator(&graph, &Options::default(), &mut partition);

        // Assert
        assert_eq!(
            result.unwrap_err(),
            Error::InputLenMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_empty_graph_is_rejected() {
        // Arrange
        let graph = Graph::from_edges(0, &[], None).unwrap();
        let mut partition = vec![];

        // Act
        let result = compute_edge_separator(&graph, &Options::default(), &mut partition);

        // Assert
        assert_eq!(result.unwrap_err(), Error::InvalidGraph("graph has no vertices"));
    }
}
