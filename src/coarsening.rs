use crate::graph::Graph;
use crate::matching::Matching;
use sprs::TriMat;

/// Build the coarse graph induced by a matching.
///
/// Each supernode of the matching becomes one coarse vertex whose weight
/// is the sum of its fine vertex weights. Fine edges are re-targeted
/// through the matching; edges that fall inside a supernode are dropped,
/// and parallel edges onto the same coarse target are merged by summing
/// their weights. The total vertex weight is preserved exactly.
pub fn coarsen(graph: &Graph, matching: &Matching) -> Graph {
    let coarse_n = matching.coarse_len();

    // The scatter table holds, per coarse target, the position of its
    // entry in the current column. A value below the column start means
    // the target has not been seen in this column yet.
    let mut htable = vec![-1_i64; coarse_n];
    let mut coarse_targets: Vec<usize> = Vec::with_capacity(graph.nnz());
    let mut coarse_weights: Vec<f64> = Vec::with_capacity(graph.nnz());
    let mut column_starts: Vec<usize> = Vec::with_capacity(coarse_n + 1);
    let mut coarse_vertex_weights = vec![0.0; coarse_n];
    let mut munch = 0_usize;

    for k in 0..coarse_n {
        let column_start = munch;
        column_starts.push(column_start);

        let (fine, size) = matching.members(k);
        let mut node_weight = 0.0;
        for &vertex in &fine[..size] {
            node_weight += graph.vertex_weights[vertex];

            for (neighbor, edge_weight) in graph.neighbors(vertex) {
                let target = matching.coarse_id(neighbor);
                if target == k {
                    // Edge collapsed into the supernode.
                    continue;
                }

                let position = htable[target];
                if position < column_start as i64 {
                    htable[target] = munch as i64;
                    coarse_targets.push(target);
                    coarse_weights.push(edge_weight);
                    munch += 1;
                } else {
                    coarse_weights[position as usize] += edge_weight;
                }
            }
        }

        coarse_vertex_weights[k] = node_weight;
    }
    column_starts.push(munch);

    let mut triplets = TriMat::with_capacity((coarse_n, coarse_n), munch);
    for k in 0..coarse_n {
        for position in column_starts[k]..column_starts[k + 1] {
            triplets.add_triplet(k, coarse_targets[position], coarse_weights[position]);
        }
    }

    Graph::new(triplets.to_csr(), coarse_vertex_weights)
        .expect("coarse adjacency is square by construction")
}

/// Relative check that coarsening preserved the total vertex weight.
/// Exact equality is too strict in floating point; a per-add ulp scale
/// is allowed.
pub fn weight_conserved(fine: &Graph, coarse: &Graph) -> bool {
    let fine_total = fine.total_vertex_weight();
    let coarse_total = coarse.total_vertex_weight();
    let scale = fine_total.abs().max(1.0);
    (fine_total - coarse_total).abs() <= scale * f64::EPSILON * fine.len() as f64
}
