use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::lineage::Event;
use crate::params::BranchParams;
use crate::state_space::StateSpace;

const GENERATOR_TOLERANCE: f64 = 1e-9;

/// Continuous time Markov chain generator of one population segment.
///
/// Off-diagonal entries are the event rates between local states, the diagonal makes every
/// row sum to zero.
#[derive(Debug, Clone)]
pub struct RateMatrix {
    q: Array2<f64>,
}

impl RateMatrix {
    pub fn new(space: &StateSpace, rates: &BranchParams) -> Result<Self> {
        let n = space.len();
        let mut q = Array2::<f64>::zeros((n, n));

        for (i, state) in space.iter().enumerate() {
            for (next, event) in state.transitions() {
                let j = space
                    .index_of(&next)
                    .ok_or(Error::UnknownState { context: "rate matrix" })?;
                q[[i, j]] += match event {
                    Event::Coalescence => rates.coal,
                    Event::Recombination => rates.rho,
                };
            }
        }

        for i in 0..n {
            let out: f64 = q.row(i).sum();
            q[[i, i]] = -out;
        }

        let rm = Self { q };
        rm.validate(GENERATOR_TOLERANCE)?;
        tracing::trace!(
            "Built a {n}x{n} generator with coal {} and rho {}",
            rates.coal,
            rates.rho
        );
        Ok(rm)
    }

    pub fn view(&self) -> ArrayView2<f64> {
        self.q.view()
    }

    pub fn dim(&self) -> usize {
        self.q.nrows()
    }

    /// Off-diagonal rates are non-negative and every row sums to zero
    pub fn validate(&self, tol: f64) -> Result<()> {
        validate_generator(&self.q.view(), tol)
    }

    /// Transitive closure of the positive-rate graph. `reach[[i, j]]` is true when state `j`
    /// can follow state `i` after any number of events, including none.
    pub fn reachability(&self) -> Array2<bool> {
        let n = self.dim();
        let mut reach = Array2::from_elem((n, n), false);

        for start in 0..n {
            let mut stack = vec![start];
            reach[[start, start]] = true;
            while let Some(i) = stack.pop() {
                for j in 0..n {
                    if i != j && self.q[[i, j]] > 0.0 && !reach[[start, j]] {
                        reach[[start, j]] = true;
                        stack.push(j);
                    }
                }
            }
        }
        reach
    }
}

pub fn validate_generator(q: &ArrayView2<f64>, tol: f64) -> Result<()> {
    let n = q.nrows();
    if q.ncols() != n {
        return Err(Error::Dimension { context: "generator", expected: n, found: q.ncols() });
    }

    for i in 0..n {
        let mut row_sum = 0.0;
        for j in 0..n {
            let v = q[[i, j]];
            if !v.is_finite() {
                return Err(Error::NonFiniteEntry { row: i, col: j });
            }
            if i != j && v < 0.0 {
                return Err(Error::NegativeProbability { row: i, col: j, value: v });
            }
            row_sum += v;
        }
        if row_sum.abs() > tol {
            return Err(Error::RowSum { row: i, sum: row_sum, tolerance: tol });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::{GenealogyState, Lineage};

    fn rates(coal: f64, rho: f64) -> BranchParams {
        BranchParams { length: 1.0, coal, rho }
    }

    #[test]
    fn leaf_generator() {
        let space = StateSpace::leaf(1);
        let q = RateMatrix::new(&space, &rates(0.5, 2.0)).unwrap();
        let linked = space.index_of(&GenealogyState::linked(1)).unwrap();
        let split = 1 - linked;

        assert_eq!(q.view()[[linked, split]], 2.0);
        assert_eq!(q.view()[[split, linked]], 0.5);
        assert_eq!(q.view()[[linked, linked]], -2.0);
    }

    #[test]
    fn rows_sum_to_zero() {
        let ab = StateSpace::joined(&StateSpace::leaf(1), &StateSpace::leaf(2)).unwrap();
        let q = RateMatrix::new(&ab, &rates(1.0, 3.0)).unwrap();
        for row in q.view().rows() {
            assert!(row.sum().abs() < 1e-12);
        }
    }

    #[test]
    fn zero_recombination_is_well_formed() {
        let ab = StateSpace::joined(&StateSpace::leaf(1), &StateSpace::leaf(2)).unwrap();
        let q = RateMatrix::new(&ab, &rates(1.0, 0.0)).unwrap();
        assert!(q.validate(1e-12).is_ok());

        // Without recombination linked lineages stay linked
        let linked = GenealogyState::new(vec![Lineage::linked(1), Lineage::linked(2)]);
        let i = ab.index_of(&linked).unwrap();
        let root = GenealogyState::new(vec![Lineage::new(3, 3)]).with_first_merge(3, 3);
        let j = ab.index_of(&root).unwrap();
        assert_eq!(q.view()[[i, i]], -1.0);
        assert_eq!(q.view()[[i, j]], 1.0);

        let reach = q.reachability();
        assert!(reach[[i, j]]);
        assert!(!reach[[j, i]]);
    }

    #[test]
    fn invalid_generator() {
        let q = ndarray::array![[-1.0, 0.5], [0.0, 0.0]];
        assert!(matches!(
            validate_generator(&q.view(), 1e-9),
            Err(Error::RowSum { row: 0, .. })
        ));
    }
}
