// Quadratic refinement of a two-way partition. The cut is relaxed to
// the continuous objective f(x) = x'(W + D)(1 - x) over the unit box,
// subject to the weight band lo <= a'x <= hi, where W is the adjacency,
// D twice the incident edge weight per vertex, and a the vertex weights.
// At integral x the objective equals the cut, and the Hessian -2(W + D)
// makes f concave, so minimizers sit at well-separated corners. The
// relaxation is solved by gradient projection and rounded back to a
// partition with a threshold sweep.

use crate::algorithms::napsack::napsack;
use crate::algorithms::Error;
use crate::graph::Graph;
use crate::imbalance::imbalance;
use crate::options::Options;

/// Working state of the continuous relaxation on one graph level.
pub(crate) struct QpDelta {
    /// Relaxation iterate, kept inside [0, 1]^n.
    pub x: Vec<f64>,
    // Diagonal of the quadratic form: twice the incident edge weight.
    diagonal: Vec<f64>,
    // Half the true gradient: (W + D)(0.5 - x), maintained incrementally.
    gradient: Vec<f64>,
    // -1 pinned at zero, +1 pinned at one, 0 free in (0, 1).
    free_status: Vec<i8>,
    free_list: Vec<usize>,
    /// Weight currently on side A: a'x.
    pub b: f64,
    lo: f64,
    hi: f64,
    // -1 if b <= lo, +1 if b >= hi, 0 if strictly inside the band.
    ib: i8,
    // Warm start for the napsack multiplier search.
    lambda: f64,
    tol: f64,
}

impl QpDelta {
    /// Set up the relaxation state for an initial iterate.
    pub fn new(graph: &Graph, options: &Options, x: Vec<f64>) -> Result<Self, Error> {
        let n = graph.len();
        let (lo, hi) = options.split_bounds(graph.total_vertex_weight());

        let mut diagonal = vec![0.0; n];
        for k in 0..n {
            let incident: f64 = graph.neighbors(k).map(|(_, w)| w).sum();
            diagonal[k] = 2.0 * incident;
        }

        let mut delta = Self {
            x,
            diagonal,
            gradient: vec![0.0; n],
            free_status: vec![0; n],
            free_list: Vec::with_capacity(n),
            b: 0.0,
            lo,
            hi,
            ib: 0,
            lambda: 0.0,
            tol: f64::EPSILON.sqrt() * graph.total_vertex_weight().max(1.0),
        };
        delta.links(graph)?;
        Ok(delta)
    }

    // Compute the gradient, free set, and constraint value from scratch.
    fn links(&mut self, graph: &Graph) -> Result<(), Error> {
        let n = graph.len();
        let a = &graph.vertex_weights;

        for k in 0..n {
            self.gradient[k] = (0.5 - self.x[k]) * self.diagonal[k];
        }

        self.free_list.clear();
        let mut b = 0.0;
        for k in 0..n {
            let xk = self.x[k];
            if !(0.0..=1.0).contains(&xk) {
                return Err(Error::RelaxationOutOfBounds);
            }
            b += a[k] * xk;

            let residual = 0.5 - xk;
            for (neighbor, weight) in graph.neighbors(k) {
                self.gradient[neighbor] += residual * weight;
            }

            if xk >= 1.0 {
                self.free_status[k] = 1;
            } else if xk <= 0.0 {
                self.free_status[k] = -1;
            } else {
                self.free_status[k] = 0;
                self.free_list.push(k);
            }
        }

        self.b = b;
        self.update_ib();
        Ok(())
    }

    fn update_ib(&mut self) {
        self.ib = if self.b <= self.lo {
            -1
        } else if self.b < self.hi {
            0
        } else {
            1
        };
    }

    // Move x[k] by delta, keeping b and the gradient in sync.
    fn shift(&mut self, graph: &Graph, k: usize, delta: f64) {
        self.x[k] += delta;
        self.b += graph.vertex_weights[k] * delta;
        self.gradient[k] -= self.diagonal[k] * delta;
        for (neighbor, weight) in graph.neighbors(k) {
            self.gradient[neighbor] -= weight * delta;
        }
    }

    // Re-bucket a vertex after its x value changed.
    fn reclassify(&mut self, k: usize) {
        self.free_status[k] = if self.x[k] >= 1.0 {
            1
        } else if self.x[k] <= 0.0 {
            -1
        } else {
            0
        };
    }

    fn rebuild_free_list(&mut self) {
        self.free_list.clear();
        for k in 0..self.free_status.len() {
            if self.free_status[k] == 0 {
                self.free_list.push(k);
            }
        }
    }

    /// Drive free variables onto the box faces without leaving the
    /// weight band.
    ///
    /// Stage one pins single coordinates: moving x[k] to a face changes
    /// the objective by `2 g delta - D delta^2`, so any move following
    /// the gradient sign that keeps `a'x` inside the band is applied.
    /// Stage two sweeps two pointers over the surviving free list and
    /// moves the outermost pair in opposite, weight-neutral directions
    /// until one of the two hits a face. The concave objective makes
    /// these face moves profitable, which is what pushes the centered
    /// initial guess off its saddle point; at most one free variable
    /// survives the sweep.
    pub fn boundary_pass(&mut self, graph: &Graph) {
        let candidates = self.free_list.clone();
        for k in candidates {
            if self.free_status[k] != 0 {
                continue;
            }
            let g = self.gradient[k];
            let ak = graph.vertex_weights[k];
            let up = 1.0 - self.x[k];
            let down = -self.x[k];

            let up_feasible = self.b + ak * up <= self.hi + self.tol;
            let down_feasible = self.b + ak * down >= self.lo - self.tol;
            let up_change = 2.0 * g * up - self.diagonal[k] * up * up;
            let down_change = 2.0 * g * down - self.diagonal[k] * down * down;

            let mut moves = [
                (up_feasible && up_change <= 0.0, up_change, up),
                (down_feasible && down_change <= 0.0, down_change, down),
            ];
            if down_change < up_change {
                moves.swap(0, 1);
            }
            for (feasible, _, delta) in moves {
                if feasible {
                    self.shift(graph, k, delta);
                    self.snap(k);
                    self.reclassify(k);
                    break;
                }
            }
        }

        self.rebuild_free_list();
        let free = self.free_list.clone();
        if free.len() >= 2 {
            let mut low = 0;
            let mut high = free.len() - 1;
            while low < high {
                self.pair_move(graph, free[low], free[high]);
                let low_free = self.free_status[free[low]] == 0;
                let high_free = self.free_status[free[high]] == 0;
                if !low_free {
                    low += 1;
                }
                if !high_free {
                    high -= 1;
                }
                if low_free && high_free {
                    // Numerical stalemate; leave the pair free.
                    break;
                }
            }
            self.rebuild_free_list();
        }
        self.update_ib();
    }

    // Move x[j] and x[k] in opposite directions along the weight-neutral
    // line a_j dx_j + a_k dx_k = 0, following the gradient, until one of
    // them reaches a box face.
    fn pair_move(&mut self, graph: &Graph, j: usize, k: usize) {
        let aj = graph.vertex_weights[j];
        let ak = graph.vertex_weights[k];
        let slope = self.gradient[j] / aj - self.gradient[k] / ak;
        let sign = if slope <= 0.0 { 1.0 } else { -1.0 };

        let cap_j = if sign > 0.0 {
            aj * (1.0 - self.x[j])
        } else {
            aj * self.x[j]
        };
        let cap_k = if sign > 0.0 {
            ak * self.x[k]
        } else {
            ak * (1.0 - self.x[k])
        };
        let t = cap_j.min(cap_k);

        self.shift(graph, j, sign * t / aj);
        self.shift(graph, k, -sign * t / ak);
        for vertex in [j, k] {
            self.snap(vertex);
            self.reclassify(vertex);
        }
    }

    // Land exactly on a face when a move ended within rounding of it.
    fn snap(&mut self, k: usize) {
        if self.x[k] < 1e-12 {
            self.x[k] = 0.0;
        } else if self.x[k] > 1.0 - 1e-12 {
            self.x[k] = 1.0;
        }
    }

    /// Gradient projection outer loop.
    ///
    /// Each iteration takes a unit step along the negative gradient,
    /// projects onto the box (and, through the napsack, onto the weight
    /// band), and minimizes the quadratic exactly along the projected
    /// direction. Terminates when the projected step is below the
    /// configured tolerance, when no descent remains, or at the
    /// iteration limit.
    pub fn gradient_projection(&mut self, graph: &Graph, options: &Options) -> Result<(), Error> {
        let n = graph.len();
        let a = &graph.vertex_weights;

        for _ in 0..options.gradproj_iteration_limit {
            let mut y: Vec<f64> = (0..n).map(|k| self.x[k] - self.gradient[k]).collect();
            if options.use_qp_ball_opt {
                self.lambda = napsack(&mut y, self.lo, self.hi, a, self.lambda, self.tol)?;
            } else {
                for yk in &mut y {
                    *yk = yk.clamp(0.0, 1.0);
                }
            }

            let direction: Vec<f64> = (0..n).map(|k| y[k] - self.x[k]).collect();
            let step_size = direction.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
            if step_size <= options.gradproj_tol {
                break;
            }

            // Slope 2 g'd and curvature d'(W + D)d of the objective
            // along the direction, accumulated over changed vertices.
            let mut slope = 0.0;
            let mut curvature = 0.0;
            for k in 0..n {
                let dk = direction[k];
                if dk == 0.0 {
                    continue;
                }
                slope += self.gradient[k] * dk;
                curvature += self.diagonal[k] * dk * dk;
                for (neighbor, weight) in graph.neighbors(k) {
                    curvature += weight * dk * direction[neighbor];
                }
            }
            slope *= 2.0;
            if slope >= 0.0 {
                break;
            }

            // Concave along d (curvature >= 0): the endpoint wins.
            // Convex: stop at the interior minimizer.
            let t = if curvature < 0.0 {
                (slope / (2.0 * curvature)).min(1.0)
            } else {
                1.0
            };

            for k in 0..n {
                let dk = direction[k];
                if dk == 0.0 {
                    continue;
                }
                let delta = t * dk;
                self.shift(graph, k, delta);
                if t >= 1.0 {
                    self.x[k] = y[k];
                }
                self.x[k] = self.x[k].clamp(0.0, 1.0);
                self.reclassify(k);
            }
            self.rebuild_free_list();
            self.update_ib();
        }
        Ok(())
    }
}

/// Round a continuous iterate to a partition with a threshold sweep.
///
/// Vertices are visited by decreasing x value; each sweep position is a
/// candidate threshold, and the cut and block weight are maintained
/// incrementally. Among the thresholds meeting the balance tolerance the
/// cheapest cut wins; if none is feasible the nearest-to-feasible one is
/// used. Returns the cut and block A weight of the chosen partition.
pub(crate) fn round_by_threshold(
    graph: &Graph,
    options: &Options,
    x: &[f64],
    partition: &mut [usize],
) -> (f64, f64) {
    let n = graph.len();
    let (lo, hi) = options.split_bounds(graph.total_vertex_weight());

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| x[j].partial_cmp(&x[i]).unwrap().then(i.cmp(&j)));

    let mut side = vec![1_usize; n];
    let mut cut = 0.0;
    let mut block_weight = 0.0;
    // (cut, prefix length, block weight) of the best feasible threshold,
    // plus the closest-to-feasible fallback with its band distance.
    let mut best: Option<(f64, usize, f64)> = None;
    let mut fallback = (f64::INFINITY, 0.0, 0, 0.0);

    for (position, &vertex) in order.iter().enumerate() {
        for (neighbor, weight) in graph.neighbors(vertex) {
            if side[neighbor] == 0 {
                cut -= weight;
            } else {
                cut += weight;
            }
        }
        side[vertex] = 0;
        block_weight += graph.vertex_weights[vertex];

        // A threshold can only fall between distinct x values.
        let splittable = position + 1 == n || x[order[position + 1]] < x[vertex];
        if !splittable {
            continue;
        }

        if block_weight >= lo && block_weight <= hi {
            if best.map_or(true, |(best_cut, _, _)| cut < best_cut) {
                best = Some((cut, position + 1, block_weight));
            }
        }
        let distance = (lo - block_weight).max(block_weight - hi).max(0.0);
        if distance < fallback.0 || (distance == fallback.0 && cut < fallback.1) {
            fallback = (distance, cut, position + 1, block_weight);
        }
    }

    let (cut, prefix, block_weight) =
        best.unwrap_or((fallback.1, fallback.2, fallback.3));
    for (position, &vertex) in order.iter().enumerate() {
        partition[vertex] = if position < prefix { 0 } else { 1 };
    }
    (cut, block_weight)
}

/// Refine an existing partition through the continuous relaxation.
/// The rounded result replaces the input only when it is an improvement.
pub(crate) fn qp_refine(
    graph: &Graph,
    options: &Options,
    partition: &mut [usize],
) -> Result<(), Error> {
    let x: Vec<f64> = partition
        .iter()
        .map(|&block| if block == 0 { 1.0 } else { 0.0 })
        .collect();
    let mut qp = QpDelta::new(graph, options, x)?;
    // A projected partition can land outside the weight band; restore
    // feasibility before descending.
    if options.use_qp_ball_opt && qp.ib != 0 {
        qp.lambda = napsack(&mut qp.x, qp.lo, qp.hi, &graph.vertex_weights, qp.lambda, qp.tol)?;
        qp.links(graph)?;
    }
    qp.gradient_projection(graph, options)?;
    qp.boundary_pass(graph);

    let mut candidate = vec![0; graph.len()];
    let (candidate_cut, _) = round_by_threshold(graph, options, &qp.x, &mut candidate);

    let weights = || graph.vertex_weights.iter().cloned();
    let old_cut: f64 = (0..graph.len())
        .map(|v| {
            graph
                .neighbors(v)
                .filter(|&(u, _)| partition[u] != partition[v])
                .map(|(_, w)| w)
                .sum::<f64>()
        })
        .sum::<f64>()
        / 2.0;
    let old_imbalance = imbalance(options.target_split, partition, weights());
    let new_imbalance = imbalance(options.target_split, &candidate, weights());

    let balanced = new_imbalance <= options.tolerance + f64::EPSILON;
    let improves = candidate_cut < old_cut || old_imbalance > options.tolerance + f64::EPSILON;
    if balanced && improves {
        partition.copy_from_slice(&candidate);
    }
    Ok(())
}

/// Solve the relaxation from the 0.5 center and round, producing the QP
/// initial guess on the coarsest graph.
pub(crate) fn qp_guess(
    graph: &Graph,
    options: &Options,
    partition: &mut [usize],
) -> Result<(), Error> {
    let mut qp = QpDelta::new(graph, options, vec![0.5; graph.len()])?;
    // The exact center is a stationary saddle; the boundary sweep must
    // run first to break it.
    qp.boundary_pass(graph);
    if options.use_qp_grad_proj {
        qp.gradient_projection(graph, options)?;
        qp.boundary_pass(graph);
    }
    round_by_threshold(graph, options, &qp.x, partition);
    Ok(())
}
