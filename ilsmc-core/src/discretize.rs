use statrs::distribution::{ContinuousCDF, Exp};

use crate::error::{Error, Result};
use crate::params::{Branch, ModelParams};

/// Cut points of an internal branch, measured from the start of the branch.
///
/// Intervals carry equal coalescent probability mass: for `AB` the mass of an exponential
/// with rate `coal_AB` truncated to the branch length, for `ABC` the full exponential with
/// rate `coal_ABC`, whose last interval reaches infinity. Increasing the count by an integer
/// factor only adds cut points.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    branch: Branch,
    cuts: Vec<f64>,
}

impl Discretization {
    pub fn new(params: &ModelParams, branch: Branch) -> Result<Self> {
        let bp = params.branch(branch);
        let n = params
            .intervals(branch)
            .ok_or(Error::IntervalCount { branch, count: 0 })?;
        if n < 1 {
            return Err(Error::IntervalCount { branch, count: n });
        }

        let exp = Exp::new(bp.coal)
            .map_err(|_| Error::NonPositiveCoalescence { branch, value: bp.coal })?;
        let quantile = |p: f64| -(-p).ln_1p() / bp.coal;

        let cuts: Vec<f64> = if bp.length.is_finite() {
            let mass = exp.cdf(bp.length);
            (0..=n)
                .map(|k| match k {
                    0 => 0.0,
                    k if k == n => bp.length,
                    k => quantile(k as f64 / n as f64 * mass),
                })
                .collect()
        } else {
            (0..=n)
                .map(|k| match k {
                    0 => 0.0,
                    k if k == n => f64::INFINITY,
                    k => quantile(k as f64 / n as f64),
                })
                .collect()
        };

        tracing::debug!("Cut points of {branch}: {cuts:?}");
        Ok(Self { branch, cuts })
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn cut_points(&self) -> &[f64] {
        &self.cuts
    }

    /// Number of intervals
    pub fn len(&self) -> usize {
        self.cuts.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interval lengths in chronological order, the last one of the root being infinite
    pub fn lengths(&self) -> Vec<f64> {
        self.cuts
            .windows(2)
            .map(|w| if w[1].is_infinite() { f64::INFINITY } else { w[1] - w[0] })
            .collect()
    }
}
