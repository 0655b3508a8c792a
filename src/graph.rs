use crate::algorithms::Error;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator as _;
use rustc_hash::FxHashMap;
use sprs::{CsMat, TriMat};
use std::iter::{Cloned, Zip};
use std::slice::Iter;

/// An undirected weighted graph stored as a sparse symmetric matrix.
///
/// The adjacency is kept in CSR format (from sprs): the neighbors of a
/// vertex are the stored entries of its row, and every undirected edge
/// appears twice, once per direction, with equal weight. Self loops are
/// never stored. Each vertex additionally carries a strictly positive
/// weight used for balancing the separator.
#[derive(Clone)]
pub struct Graph {
    /// CSR adjacency; entry (i, j) is the weight of edge {i, j}.
    pub adjacency: CsMat<f64>,
    /// Per-vertex weights, parallel to the rows of `adjacency`.
    pub vertex_weights: Vec<f64>,
    // Cached weight summaries.
    total_vertex_weight: f64,
    total_edge_weight: f64,
}

impl Graph {
    /// Wrap an adjacency matrix and vertex weights into a graph.
    ///
    /// The matrix must be square and the weight vector must have one
    /// entry per vertex. Structural soundness (symmetry, positivity, no
    /// self loops) is only verified by [`Graph::check`].
    pub fn new(adjacency: CsMat<f64>, vertex_weights: Vec<f64>) -> Result<Self, Error> {
        if adjacency.rows() != adjacency.cols() {
            return Err(Error::InvalidGraph("adjacency matrix is not square"));
        }
        if adjacency.rows() != vertex_weights.len() {
            return Err(Error::InputLenMismatch {
                expected: adjacency.rows(),
                actual: vertex_weights.len(),
            });
        }
        let total_vertex_weight = vertex_weights.iter().sum();
        let total_edge_weight = adjacency.data().iter().sum();
        Ok(Self {
            adjacency,
            vertex_weights,
            total_vertex_weight,
            total_edge_weight,
        })
    }

    /// Wrap an adjacency matrix, giving every vertex weight 1.
    pub fn with_unit_weights(adjacency: CsMat<f64>) -> Result<Self, Error> {
        let n = adjacency.rows();
        Self::new(adjacency, vec![1.0; n])
    }

    /// Build a graph from a list of undirected edges.
    ///
    /// Each edge is listed once and stored in both directions. Useful for
    /// small graphs in tests and demos.
    pub fn from_edges(
        n: usize,
        edges: &[(usize, usize, f64)],
        vertex_weights: Option<Vec<f64>>,
    ) -> Result<Self, Error> {
        let mut triplets = TriMat::with_capacity((n, n), 2 * edges.len());
        for &(u, v, w) in edges {
            triplets.add_triplet(u, v, w);
            triplets.add_triplet(v, u, w);
        }
        let weights = vertex_weights.unwrap_or_else(|| vec![1.0; n]);
        Self::new(triplets.to_csr(), weights)
    }

    /// The number of vertices in the graph.
    pub fn len(&self) -> usize {
        self.adjacency.rows()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of stored (directed) edge entries.
    pub fn nnz(&self) -> usize {
        self.adjacency.nnz()
    }

    /// The number of neighbors of a vertex.
    pub fn degree(&self, vertex: usize) -> usize {
        self.adjacency.outer_view(vertex).unwrap().nnz()
    }

    /// Sum of all vertex weights. Invariant across coarsening.
    pub fn total_vertex_weight(&self) -> f64 {
        self.total_vertex_weight
    }

    /// Sum of all stored edge entries (each undirected edge counted
    /// twice). Decreases as coarsening collapses self loops.
    pub fn total_edge_weight(&self) -> f64 {
        self.total_edge_weight
    }

    /// A cheap upper bound on the cost of any edge separator.
    pub fn heuristic_cut_bound(&self) -> f64 {
        2.0 * self.total_edge_weight
    }

    /// An iterator over the neighbors of the given vertex with the
    /// connecting edge weights.
    pub fn neighbors(&self, vertex: usize) -> Zip<Cloned<Iter<'_, usize>>, Cloned<Iter<'_, f64>>> {
        let (indices, data) = self.adjacency.outer_view(vertex).unwrap().into_raw_storage();
        indices.iter().cloned().zip(data.iter().cloned())
    }

    /// The edge cut of a two-way partition: the total weight of edges
    /// whose endpoints lie in different blocks, each undirected edge
    /// counted once.
    pub fn edge_cut(&self, partition: &[usize]) -> f64 {
        debug_assert_eq!(self.len(), partition.len());

        let indptr = self.adjacency.indptr().into_raw_storage();
        let indices = self.adjacency.indices();
        let data = self.adjacency.data();
        (0..self.len())
            .into_par_iter()
            .map(|vertex| {
                let start = indptr[vertex];
                let end = indptr[vertex + 1];
                let neighbors = &indices[start..end];
                let edge_weights = &data[start..end];
                let vertex_part = partition[vertex];
                neighbors
                    .iter()
                    .zip(edge_weights)
                    .take_while(|(neighbor, _edge_weight)| **neighbor < vertex)
                    .filter(|(neighbor, _edge_weight)| vertex_part != partition[**neighbor])
                    .map(|(_neighbor, edge_weight)| *edge_weight)
                    .sum::<f64>()
            })
            .sum()
    }

    /// Verify the structural invariants: stored symmetry with equal
    /// mirror weights, no self loops, strictly positive edge and vertex
    /// weights. Intended for the expensive-checks mode.
    pub fn check(&self) -> Result<(), Error> {
        for &w in &self.vertex_weights {
            if w <= 0.0 {
                return Err(Error::InvalidGraph("non-positive vertex weight"));
            }
        }

        let mut edges = FxHashMap::default();
        for vertex in 0..self.len() {
            for (neighbor, weight) in self.neighbors(vertex) {
                if neighbor == vertex {
                    return Err(Error::InvalidGraph("self loop stored"));
                }
                if weight <= 0.0 {
                    return Err(Error::InvalidGraph("non-positive edge weight"));
                }
                edges.insert((vertex, neighbor), weight);
            }
        }
        // Mirror weights are sums of the same fine edges accumulated in
        // different orders, so allow a few ulps of drift.
        for (&(u, v), &w) in &edges {
            match edges.get(&(v, u)) {
                Some(&mirror) if (mirror - w).abs() <= w.abs() * 64.0 * f64::EPSILON => {}
                _ => return Err(Error::InvalidGraph("asymmetric adjacency")),
            }
        }
        Ok(())
    }
}
