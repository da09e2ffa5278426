use ndarray::{s, Array1, Array2, ArrayView2};

use crate::error::{Error, Result};
use crate::linalg::{norm_1, solve};
use crate::params::Branch;
use crate::rate_matrix::RateMatrix;

/// Largest tolerated deviation of a row sum from one before renormalization is refused
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Negative entries above this are rounding noise and set to zero
const NEGATIVE_TOLERANCE: f64 = 1e-9;

// Higham (2005), scaling and squaring with Pade approximants
const PADE_3: [f64; 4] = [120.0, 60.0, 12.0, 1.0];
const PADE_5: [f64; 6] = [30240.0, 15120.0, 3360.0, 420.0, 30.0, 1.0];
const PADE_7: [f64; 8] = [17297280.0, 8648640.0, 1995840.0, 277200.0, 25200.0, 1512.0, 56.0, 1.0];
const PADE_9: [f64; 10] = [
    17643225600.0, 8821612800.0, 2075673600.0, 302702400.0, 30270240.0, 2162160.0, 110880.0,
    3960.0, 90.0, 1.0,
];
const PADE_13: [f64; 14] = [
    64764752532480000.0, 32382376266240000.0, 7771770303897600.0, 1187353796428800.0,
    129060195264000.0, 10559470521600.0, 670442572800.0, 33522128640.0, 1323241920.0,
    40840800.0, 960960.0, 16380.0, 182.0, 1.0,
];
const THETA_3: f64 = 1.495585217958292e-2;
const THETA_5: f64 = 2.539398330063230e-1;
const THETA_7: f64 = 9.504178996162932e-1;
const THETA_9: f64 = 2.097847961257068;
const THETA_13: f64 = 5.371920351148152;

/// Turns the generator of one branch segment into finite-time transition probabilities.
#[derive(Debug, Clone)]
pub struct Propagator {
    branch: Branch,
    q: RateMatrix,
    reach: Array2<bool>,
}

impl Propagator {
    pub fn new(branch: Branch, q: RateMatrix) -> Self {
        let reach = q.reachability();
        Self { branch, q, reach }
    }

    pub fn rate_matrix(&self) -> &RateMatrix {
        &self.q
    }

    /// `exp(Q dt)`, or the limit for `dt = +inf`.
    ///
    /// Entries between states that cannot reach each other are exactly zero, rows are checked
    /// to sum to one within [`ROW_SUM_TOLERANCE`] and then renormalized.
    pub fn transition(&self, dt: f64) -> Result<Array2<f64>> {
        if dt.is_nan() || dt < 0.0 {
            return Err(Error::NegativeLength { branch: self.branch, value: dt });
        }

        let p = if dt.is_infinite() {
            limit(&self.q, &self.reach)?
        } else if dt == 0.0 {
            Array2::eye(self.q.dim())
        } else {
            expm(self.q.view().mapv(|v| v * dt).view())?
        };

        tracing::trace!("Propagated branch {} over {dt}", self.branch);
        sanitize(p, &self.reach)
    }
}

/// Sequential application of transition matrices, `P_1 P_2 ... P_k`
pub fn compose(mats: &[Array2<f64>]) -> Result<Array2<f64>> {
    let Some(first) = mats.first() else {
        return Err(Error::Dimension { context: "compose", expected: 1, found: 0 });
    };

    let mut out = first.clone();
    for m in &mats[1..] {
        if m.nrows() != out.ncols() {
            return Err(Error::Dimension {
                context: "compose",
                expected: out.ncols(),
                found: m.nrows(),
            });
        }
        out = out.dot(m);
    }
    Ok(out)
}

/// Check that `p` is a transition probability matrix, up to rounding
pub fn check_stochastic(p: ArrayView2<f64>, tol: f64) -> Result<()> {
    for (i, row) in p.rows().into_iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            if !v.is_finite() {
                return Err(Error::NonFiniteEntry { row: i, col: j });
            }
            if *v < -tol || *v > 1.0 + tol {
                return Err(Error::NegativeProbability { row: i, col: j, value: *v });
            }
        }
        let sum = row.sum();
        if (sum - 1.0).abs() > tol {
            return Err(Error::RowSum { row: i, sum, tolerance: tol });
        }
    }
    Ok(())
}

fn sanitize(mut p: Array2<f64>, reach: &Array2<bool>) -> Result<Array2<f64>> {
    for ((i, j), v) in p.indexed_iter_mut() {
        if !v.is_finite() {
            return Err(Error::NonFiniteEntry { row: i, col: j });
        }
        if !reach[[i, j]] {
            *v = 0.0;
        } else if *v < 0.0 {
            if *v < -NEGATIVE_TOLERANCE {
                return Err(Error::NegativeProbability { row: i, col: j, value: *v });
            }
            *v = 0.0;
        }
    }

    for (i, mut row) in p.rows_mut().into_iter().enumerate() {
        let sum = row.sum();
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(Error::RowSum { row: i, sum, tolerance: ROW_SUM_TOLERANCE });
        }
        row.mapv_inplace(|v| v / sum);
    }
    Ok(p)
}

/// Matrix exponential by scaling and squaring
pub fn expm(a: ArrayView2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::Dimension { context: "expm", expected: n, found: a.ncols() });
    }
    if let Some(((row, col), _)) = a.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::NonFiniteEntry { row, col });
    }

    let norm = norm_1(a);
    if norm == 0.0 {
        return Ok(Array2::eye(n));
    }

    if norm <= THETA_3 {
        return pade(a, &PADE_3);
    }
    if norm <= THETA_5 {
        return pade(a, &PADE_5);
    }
    if norm <= THETA_7 {
        return pade(a, &PADE_7);
    }
    if norm <= THETA_9 {
        return pade(a, &PADE_9);
    }

    let squarings = (norm / THETA_13).log2().ceil().max(0.0) as i32;
    let scaled = a.mapv(|v| v / 2f64.powi(squarings));
    let mut r = pade_13(scaled.view())?;
    for _ in 0..squarings {
        r = r.dot(&r);
    }
    Ok(r)
}

// Low degree approximant: U = A * sum(b_odd A^(k-1)), V = sum(b_even A^k)
fn pade(a: ArrayView2<f64>, b: &[f64]) -> Result<Array2<f64>> {
    let n = a.nrows();
    let ident = Array2::<f64>::eye(n);
    let a2 = a.dot(&a);

    let mut power = ident.clone();
    let mut u = Array2::<f64>::zeros((n, n));
    let mut v = Array2::<f64>::zeros((n, n));
    for k in (0..b.len()).step_by(2) {
        v.scaled_add(b[k], &power);
        u.scaled_add(b[k + 1], &power);
        if k + 2 < b.len() {
            power = power.dot(&a2);
        }
    }
    let u = a.dot(&u);

    solve((&v - &u).view(), (&v + &u).view())
}

fn pade_13(a: ArrayView2<f64>) -> Result<Array2<f64>> {
    let b = &PADE_13;
    let n = a.nrows();
    let ident = Array2::<f64>::eye(n);
    let a2 = a.dot(&a);
    let a4 = a2.dot(&a2);
    let a6 = a4.dot(&a2);

    let inner_u = &a6 * b[13] + &a4 * b[11] + &a2 * b[9];
    let u = a6.dot(&inner_u) + &a6 * b[7] + &a4 * b[5] + &a2 * b[3] + &ident * b[1];
    let u = a.dot(&u);

    let inner_v = &a6 * b[12] + &a4 * b[10] + &a2 * b[8];
    let v = a6.dot(&inner_v) + &a6 * b[6] + &a4 * b[4] + &a2 * b[2] + &ident * b[0];

    solve((&v - &u).view(), (&v + &u).view())
}

/// `lim exp(Q t)` for `t -> inf`.
///
/// Transient states end up in one of the closed classes of the chain, with the first entry
/// probabilities `(-Q_TT)^-1 Q_TR`. Inside a closed class the mass is spread according to the
/// stationary distribution of that class.
fn limit(q: &RateMatrix, reach: &Array2<bool>) -> Result<Array2<f64>> {
    let n = q.dim();
    let q = q.view();

    let recurrent = (0..n)
        .map(|i| (0..n).all(|j| !reach[[i, j]] || reach[[j, i]]))
        .collect::<Vec<bool>>();

    // Smallest member of the class as its id
    let class = (0..n)
        .map(|i| recurrent[i].then(|| (0..n).find(|&j| reach[[i, j]] && reach[[j, i]]).unwrap_or(i)))
        .collect::<Vec<Option<usize>>>();

    let mut stationary = Array1::<f64>::zeros(n);
    for id in (0..n).filter(|&i| class[i] == Some(i)) {
        let members = (0..n).filter(|&j| class[j] == Some(id)).collect::<Vec<usize>>();
        let pi = class_stationary(q, &members)?;
        for (k, &m) in members.iter().enumerate() {
            stationary[m] = pi[k];
        }
    }

    let transient = (0..n).filter(|&i| !recurrent[i]).collect::<Vec<usize>>();
    let closed = (0..n).filter(|&i| recurrent[i]).collect::<Vec<usize>>();

    let mut p = Array2::<f64>::zeros((n, n));
    for &i in &closed {
        for &j in &closed {
            if class[i] == class[j] {
                p[[i, j]] = stationary[j];
            }
        }
    }

    if transient.is_empty() {
        return Ok(p);
    }

    let q_tt = q.select(ndarray::Axis(0), &transient).select(ndarray::Axis(1), &transient);
    let q_tr = q.select(ndarray::Axis(0), &transient).select(ndarray::Axis(1), &closed);
    let entry = solve((-q_tt).view(), q_tr.view())?;

    for (ti, &i) in transient.iter().enumerate() {
        let mut absorbed = vec![0.0; n];
        for (ri, &r) in closed.iter().enumerate() {
            if let Some(id) = class[r] {
                absorbed[id] += entry[[ti, ri]];
            }
        }
        for &j in &closed {
            if let Some(id) = class[j] {
                p[[i, j]] = absorbed[id] * stationary[j];
            }
        }
    }

    Ok(p)
}

// Solve pi Q_CC = 0 with sum(pi) = 1 by replacing one balance equation with the normalization
fn class_stationary(q: ArrayView2<f64>, members: &[usize]) -> Result<Vec<f64>> {
    let k = members.len();
    if k == 1 {
        return Ok(vec![1.0]);
    }

    let q_cc = q.select(ndarray::Axis(0), members).select(ndarray::Axis(1), members);
    let mut a = q_cc.t().to_owned();
    a.slice_mut(s![k - 1, ..]).fill(1.0);
    let mut rhs = Array2::<f64>::zeros((k, 1));
    rhs[[k - 1, 0]] = 1.0;

    let pi = solve(a.view(), rhs.view())?;
    Ok(pi.column(0).to_vec())
}
