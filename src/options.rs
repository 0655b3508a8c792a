/// How vertices are matched into supernodes during coarsening.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchingStrategy {
    /// Match each vertex with its first unmatched neighbor in storage
    /// order.
    Random,
    /// Heavy edge matching: match each vertex with its unmatched
    /// neighbor of maximum edge weight.
    Hem,
    /// Heavy edge matching followed by a passive-aggressive pass over
    /// the vertices left unmatched.
    HemPa,
    /// Heavy edge matching followed by a passive-aggressive pass over
    /// matched high-degree vertices.
    HemDavisPa,
}

/// How the partition of the coarsest graph is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuessCutType {
    /// Solve the continuous relaxation from the 0.5 center and round.
    Qp,
    /// Assign each vertex to a block with probability 1/2.
    Random,
    /// Fill block A in BFS order from a pseudoperipheral root.
    NaturalOrder,
}

/// Configuration of the edge separator pipeline.
///
/// The engine is deterministic given a graph and an `Options` value: all
/// randomness is drawn from `random_seed`, and every stage iterates in
/// vertex-id and storage order.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Seed for the RNG used by the random initial guess.
    pub random_seed: u64,

    /// Stop coarsening once the graph has at most this many vertices.
    pub coarsen_limit: usize,
    /// Matching strategy used at every level.
    pub matching_strategy: MatchingStrategy,
    /// Allow 3-way community matches in the passive-aggressive passes.
    pub do_community_matching: bool,
    /// Multiplier of the average degree above which the Davis
    /// passive-aggressive pass considers a matched vertex.
    pub davis_brotherly_threshold: f64,

    /// Initial guess strategy on the coarsest graph.
    pub guess_cut_type: GuessCutType,
    /// Number of BFS sweeps when searching for a pseudoperipheral root.
    pub guess_search_depth: usize,

    /// FM/QP alternations per level during uncoarsening.
    pub num_dances: u32,

    /// Enable the boundary FM refinement.
    pub use_fm: bool,
    /// Maximum number of swaps attempted per FM pass.
    pub fm_search_depth: usize,
    /// Number of top heap candidates examined per swap.
    pub fm_consider_count: usize,
    /// Maximum number of FM passes per refinement call.
    pub fm_max_num_refinements: u32,

    /// Enable the gradient projection refinement.
    pub use_qp_grad_proj: bool,
    /// Enable the napsack re-projection onto the weight constraint.
    pub use_qp_ball_opt: bool,
    /// Stop gradient projection once the projected step is this small.
    pub gradproj_tol: f64,
    /// Iteration limit for the gradient projection outer loop.
    pub gradproj_iteration_limit: u32,

    /// Desired fraction of the total vertex weight in block A.
    pub target_split: f64,
    /// Allowed absolute deviation of `W0 / W` from the target split.
    pub tolerance: f64,

    /// Run the expensive structural checks between stages.
    pub do_expensive_checks: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            random_seed: 0,
            coarsen_limit: 256,
            matching_strategy: MatchingStrategy::HemDavisPa,
            do_community_matching: false,
            davis_brotherly_threshold: 2.0,
            guess_cut_type: GuessCutType::Qp,
            guess_search_depth: 10,
            num_dances: 1,
            use_fm: true,
            fm_search_depth: 50,
            fm_consider_count: 3,
            fm_max_num_refinements: 20,
            use_qp_grad_proj: true,
            use_qp_ball_opt: true,
            gradproj_tol: 1e-3,
            gradproj_iteration_limit: 50,
            target_split: 0.5,
            tolerance: 0.01,
            do_expensive_checks: false,
        }
    }
}

impl Options {
    /// Lower and upper bound on the block A weight for a graph of total
    /// vertex weight `total`.
    pub fn split_bounds(&self, total: f64) -> (f64, f64) {
        let lo = total * (self.target_split - self.tolerance);
        let hi = total * (self.target_split + self.tolerance);
        (lo.max(0.0), hi.min(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Arrange and Act
        let options = Options::default();

        // Assert
        assert_eq!(options.coarsen_limit, 256);
        assert_eq!(options.matching_strategy, MatchingStrategy::HemDavisPa);
        assert_eq!(options.guess_cut_type, GuessCutType::Qp);
        assert_eq!(options.fm_consider_count, 3);
        assert_eq!(options.target_split, 0.5);
        assert_eq!(options.tolerance, 0.01);
    }

    #[test]
    fn test_split_bounds_clamped() {
        // Arrange
        let options = Options {
            target_split: 0.5,
            tolerance: 0.6,
            ..Default::default()
        };

        // Act
        let (lo, hi) = options.split_bounds(10.0);

        // Assert
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 10.0);
    }
}
