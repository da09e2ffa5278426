use thiserror::Error as ThisError;

use crate::params::Branch;

/// Broad class of a failure, used by callers to tell bad input from bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid parameters, raised before any matrix work
    Configuration,
    /// A matrix computation left the tolerance of a probability
    Numerical,
    /// An internal invariant of the state spaces was broken
    Structural,
}

#[rustfmt::skip]
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("Parameter {name} of branch {branch} is not finite: {value}")]
    NonFinite { branch: Branch, name: &'static str, value: f64 },

    #[error("Branch {branch} has a negative length: {value}")]
    NegativeLength { branch: Branch, value: f64 },

    #[error("Branch {branch} needs a positive coalescence rate, got {value}")]
    NonPositiveCoalescence { branch: Branch, value: f64 },

    #[error("Branch {branch} has a negative recombination rate: {value}")]
    NegativeRecombination { branch: Branch, value: f64 },

    #[error("Branch {branch} needs at least one interval, got {count}")]
    IntervalCount { branch: Branch, count: usize },

    #[error("Matrix is singular at pivot {pivot}")]
    Singular { pivot: usize },

    #[error("Matrix contains a non-finite entry at ({row}, {col})")]
    NonFiniteEntry { row: usize, col: usize },

    #[error("Row {row} sums to {sum}, which is not within {tolerance} of one")]
    RowSum { row: usize, sum: f64, tolerance: f64 },

    #[error("Probability at ({row}, {col}) is negative: {value}")]
    NegativeProbability { row: usize, col: usize, value: f64 },

    #[error("Tracked mass on branch {branch} deviates from the composed propagator by {deviation}")]
    MassMismatch { branch: Branch, deviation: f64 },

    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    Dimension { context: &'static str, expected: usize, found: usize },

    #[error("Cannot join states sharing samples: {left:#05b} and {right:#05b}")]
    OverlappingSamples { left: u8, right: u8 },

    #[error("State is not part of the {context} state space")]
    UnknownState { context: &'static str },

    #[error("Locus history cannot be mapped to a hidden state: {history}")]
    History { history: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonFinite { .. }
            | Self::NegativeLength { .. }
            | Self::NonPositiveCoalescence { .. }
            | Self::NegativeRecombination { .. }
            | Self::IntervalCount { .. } => ErrorKind::Configuration,
            Self::Singular { .. }
            | Self::NonFiniteEntry { .. }
            | Self::RowSum { .. }
            | Self::NegativeProbability { .. }
            | Self::MassMismatch { .. } => ErrorKind::Numerical,
            Self::Dimension { .. }
            | Self::OverlappingSamples { .. }
            | Self::UnknownState { .. }
            | Self::History { .. } => ErrorKind::Structural,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
