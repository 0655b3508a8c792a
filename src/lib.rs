//! Multilevel two-way edge separators for large sparse symmetric
//! graphs.
//!
//! A graph (a symmetric matrix interpreted as the adjacency of its
//! graph) is coarsened through a sequence of matchings, an initial
//! partition is guessed on the coarsest level, and the partition is
//! projected back up while two cooperating local searches refine it: a
//! boundary Fiduccia-Mattheyses swap heuristic and a quadratic
//! programming relaxation solved by gradient projection.

pub mod algorithms;
pub mod coarsening;
pub mod conditioning;
pub mod graph;
pub mod heap;
pub mod imbalance;
pub mod io;
pub mod matching;
pub mod options;

// The `Partition` trait allows for partitioning data.
// Partitioning algorithms implement this trait.
// The generic argument `M` defines the input of the algorithms (e.g. an
// adjacency matrix or a 2D set of points).
// The input partition must be of the correct size and its contents may or may
// not be used by the algorithms.
pub trait Partition<M> {
    // Diagnostic data returned for a specific run of the algorithm.
    type Metadata;

    // Error details, should the algorithm fail to run.
    type Error;

    // Partition the given data and output the part ID of each element in
    // `part_ids`.
    //
    // Part IDs must be contiguous and start from zero, meaning the number of
    // parts is one plus the maximum of `part_ids`.  If a lower ID does not
    // appear in the array, the part is assumed to be empty.
    fn partition(&mut self, part_ids: &mut [usize], data: M)
                 -> Result<Self::Metadata, Self::Error>;
}
