use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::hidden::{HiddenState, HiddenStates};

/// Entries below this are left out of the triples
pub const NEGLIGIBLE_PROBABILITY: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    pub from: HiddenState,
    pub to: HiddenState,
    pub probability: f64,
}

/// Joint probabilities of the hidden states of the left (rows) and the right (columns) locus.
///
/// The whole table sums to one. Row sums give the distribution of the first position of an
/// HMM, rows divided by their sums the transition matrix.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    states: HiddenStates,
    joint: Array2<f64>,
}

impl TransitionTable {
    pub fn new(states: HiddenStates, joint: Array2<f64>) -> Result<Self> {
        let n = states.len();
        if joint.nrows() != n || joint.ncols() != n {
            return Err(Error::Dimension {
                context: "transition table",
                expected: n,
                found: if joint.nrows() != n { joint.nrows() } else { joint.ncols() },
            });
        }

        for ((row, col), v) in joint.indexed_iter() {
            if !v.is_finite() {
                return Err(Error::NonFiniteEntry { row, col });
            }
            if *v < 0.0 || *v > 1.0 {
                return Err(Error::NegativeProbability { row, col, value: *v });
            }
        }

        Ok(Self { states, joint })
    }

    pub fn states(&self) -> &HiddenStates {
        &self.states
    }

    pub fn joint(&self) -> ArrayView2<f64> {
        self.joint.view()
    }

    pub fn total(&self) -> f64 {
        self.joint.sum()
    }

    pub fn probability(&self, from: &HiddenState, to: &HiddenState) -> Option<f64> {
        let i = self.states.index_of(from)?;
        let j = self.states.index_of(to)?;
        Some(self.joint[[i, j]])
    }

    /// Non-negligible joint probabilities, row-major in the canonical state order
    pub fn triples(&self) -> Vec<Triple> {
        flatten(&self.states, self.joint.view())
    }

    /// Probability of each hidden state at a single locus
    pub fn marginals(&self) -> Array1<f64> {
        self.joint.sum_axis(Axis(1))
    }

    /// Rows conditioned on the left locus. States that never occur keep a zero row.
    pub fn transition_matrix(&self) -> Array2<f64> {
        let mut out = self.joint.clone();
        let marginals = self.marginals();
        for (mut row, &m) in out.rows_mut().into_iter().zip(marginals.iter()) {
            if m > NEGLIGIBLE_PROBABILITY {
                row.mapv_inplace(|v| v / m);
            } else {
                row.fill(0.0);
            }
        }
        out
    }

    pub fn conditional_triples(&self) -> Vec<Triple> {
        flatten(&self.states, self.transition_matrix().view())
    }
}

fn flatten(states: &HiddenStates, m: ArrayView2<f64>) -> Vec<Triple> {
    let mut out = Vec::new();
    for (i, from) in states.iter().enumerate() {
        for (j, to) in states.iter().enumerate() {
            let probability = m[[i, j]];
            if probability >= NEGLIGIBLE_PROBABILITY {
                out.push(Triple { from: *from, to: *to, probability });
            }
        }
    }
    out
}
