use crate::algorithms::Error;
use crate::graph::Graph;
use sprs::{CsMat, TriMat};

/// Condition an arbitrary sparse matrix into a valid separator input.
///
/// The adjacency is symmetrized as `(A + A^T) / 2`, edge weights are
/// replaced by their absolute values, self loops and numerically zero
/// entries are dropped, and non-positive vertex weights default to 1.
/// Conditioning an already conditioned graph reproduces it exactly.
pub fn condition(graph: &Graph) -> Result<Graph, Error> {
    let n = graph.len();

    // Symmetrize first; duplicate triplets are summed on conversion.
    let mut symmetric = TriMat::with_capacity((n, n), 2 * graph.nnz());
    for (weight, (row, col)) in graph.adjacency.iter() {
        symmetric.add_triplet(row, col, 0.5 * weight);
        symmetric.add_triplet(col, row, 0.5 * weight);
    }
    let summed: CsMat<f64> = symmetric.to_csr();

    // Strip the diagonal and entries that cancelled to zero, and make
    // the surviving weights positive.
    let mut cleaned = TriMat::with_capacity((n, n), summed.nnz());
    for (weight, (row, col)) in summed.iter() {
        if row != col && *weight != 0.0 {
            cleaned.add_triplet(row, col, weight.abs());
        }
    }

    let vertex_weights = graph
        .vertex_weights
        .iter()
        .map(|&w| if w > 0.0 { w } else { 1.0 })
        .collect();

    Graph::new(cleaned.to_csr(), vertex_weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    fn raw_graph(n: usize, triplets: &[(usize, usize, f64)]) -> Graph {
        let mut matrix = TriMat::new((n, n));
        for &(row, col, weight) in triplets {
            matrix.add_triplet(row, col, weight);
        }
        Graph::with_unit_weights(matrix.to_csr()).unwrap()
    }

    #[test]
    fn test_symmetrizes_one_sided_entries() {
        // Arrange
        let graph = raw_graph(3, &[(0, 1, 2.0), (1, 2, 4.0)]);

        // Act
        let conditioned = condition(&graph).unwrap();

        // Assert
        assert_eq!(conditioned.adjacency.get(0, 1), Some(&1.0));
        assert_eq!(conditioned.adjacency.get(1, 0), Some(&1.0));
        assert_eq!(conditioned.adjacency.get(1, 2), Some(&2.0));
        assert_eq!(conditioned.adjacency.get(2, 1), Some(&2.0));
        assert!(conditioned.check().is_ok());
    }

    #[test]
    fn test_drops_self_loops_and_negative_weights() {
        // Arrange
        let graph = raw_graph(2, &[(0, 0, 5.0), (0, 1, -3.0), (1, 0, -3.0)]);

        // Act
        let conditioned = condition(&graph).unwrap();

        // Assert
        assert_eq!(conditioned.adjacency.get(0, 0), None);
        assert_eq!(conditioned.adjacency.get(0, 1), Some(&3.0));
        assert!(conditioned.check().is_ok());
    }

    #[test]
    fn test_drops_cancelled_entries() {
        // Arrange
        let graph = raw_graph(2, &[(0, 1, 1.0), (1, 0, -1.0)]);

        // Act
        let conditioned = condition(&graph).unwrap();

        // Assert
        assert_eq!(conditioned.nnz(), 0);
    }

    #[test]
    fn test_conditioning_is_idempotent() {
        // Arrange
        let graph = raw_graph(4, &[(0, 1, 2.0), (1, 2, -1.0), (2, 3, 4.0), (3, 3, 1.0)]);

        // Act
        let once = condition(&graph).unwrap();
        let twice = condition(&once).unwrap();

        // Assert
        assert_eq!(once.adjacency, twice.adjacency);
        assert_eq!(once.vertex_weights, twice.vertex_weights);
    }
}
