use std::fmt;

mod edge_separator;
mod fm_refiner;
mod initial_guess;
mod napsack;
mod qp_refiner;

pub use edge_separator::{compute_edge_separator, EdgeSeparator, SeparatorStats};

/// Common errors thrown by algorithms.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Input sets don't have matching lengths.
    InputLenMismatch { expected: usize, actual: usize },

    /// The graph violates a structural requirement (stored symmetry, no
    /// self loops, strictly positive edge and vertex weights).
    InvalidGraph(&'static str),

    /// A continuous iterate escaped the unit box, so the relaxation
    /// cannot be set up.
    RelaxationOutOfBounds,

    /// The napsack projector could not reach its target weight. This can
    /// only happen on malformed input, since the projection is always
    /// feasible for a conditioned graph.
    InfeasibleConstraint,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputLenMismatch { expected, actual } => write!(
                f,
                "input sets don't have the same length (expected {expected} items, got {actual})",
            ),
            Error::InvalidGraph(reason) => write!(f, "invalid graph: {reason}"),
            Error::RelaxationOutOfBounds => {
                write!(f, "relaxation iterate escaped the unit box")
            }
            Error::InfeasibleConstraint => {
                write!(f, "weight constraint cannot be met by the projector")
            }
        }
    }
}

impl std::error::Error for Error {}
