use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Error, Result};

const SINGULAR_PIVOT: f64 = 1e-300;

/// LU decomposition with partial pivoting, `P A = L U` stored in one matrix
#[derive(Debug, Clone)]
pub struct Lu {
    lu: Array2<f64>,
    perm: Vec<usize>,
}

impl Lu {
    pub fn new(a: ArrayView2<f64>) -> Result<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(Error::Dimension { context: "LU decomposition", expected: n, found: a.ncols() });
        }

        let mut lu = a.to_owned();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            let (max_idx, max_val) = (k..n)
                .map(|i| (i, lu[[i, k]].abs()))
                .fold((k, -1.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

            if !(max_val > SINGULAR_PIVOT) {
                return Err(Error::Singular { pivot: k });
            }

            if max_idx != k {
                for j in 0..n {
                    lu.swap([k, j], [max_idx, j]);
                }
                perm.swap(k, max_idx);
            }

            let pivot = lu[[k, k]];
            for i in (k + 1)..n {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                if factor == 0.0 {
                    continue;
                }
                for j in (k + 1)..n {
                    lu[[i, j]] -= factor * lu[[k, j]];
                }
            }
        }

        Ok(Self { lu, perm })
    }

    /// Solve `A X = B` for every column of `B`
    pub fn solve(&self, b: ArrayView2<f64>) -> Result<Array2<f64>> {
        let n = self.lu.nrows();
        if b.nrows() != n {
            return Err(Error::Dimension { context: "LU solve", expected: n, found: b.nrows() });
        }

        let mut x = b.select(Axis(0), &self.perm);

        for col in 0..x.ncols() {
            // Forward substitution, unit lower triangle
            for i in 0..n {
                let mut v = x[[i, col]];
                for j in 0..i {
                    v -= self.lu[[i, j]] * x[[j, col]];
                }
                x[[i, col]] = v;
            }
            // Backward substitution
            for i in (0..n).rev() {
                let mut v = x[[i, col]];
                for j in (i + 1)..n {
                    v -= self.lu[[i, j]] * x[[j, col]];
                }
                x[[i, col]] = v / self.lu[[i, i]];
            }
        }

        Ok(x)
    }
}

/// Solve `A X = B`
pub fn solve(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Result<Array2<f64>> {
    Lu::new(a)?.solve(b)
}

/// Maximum absolute column sum
pub fn norm_1(a: ArrayView2<f64>) -> f64 {
    a.columns()
        .into_iter()
        .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}
