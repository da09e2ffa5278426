use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Branches of the fixed three taxon species tree ((A,B),C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Branch {
    A,
    B,
    AB,
    C,
    ABC,
}

impl Branch {
    pub const ALL: [Branch; 5] = [Branch::A, Branch::B, Branch::AB, Branch::C, Branch::ABC];

    /// Sample bit of a leaf branch
    pub fn sample(&self) -> Option<u8> {
        match self {
            Self::A => Some(1),
            Self::B => Some(2),
            Self::C => Some(4),
            Self::AB | Self::ABC => None,
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::AB => write!(f, "AB"),
            Self::C => write!(f, "C"),
            Self::ABC => write!(f, "ABC"),
        }
    }
}

/// Length and rates of one population branch. The root branch has an infinite length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchParams {
    pub length: f64,
    pub coal: f64,
    pub rho: f64,
}

/// All parameters of one transition table computation.
///
/// Constructed once, validated with [`ModelParams::validate`] and then passed by reference
/// through every stage of the pipeline. The default is the documented example parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub t_a: f64,
    pub t_b: f64,
    pub t_ab: f64,
    pub t_c: f64,
    pub rho_a: f64,
    pub rho_b: f64,
    pub rho_ab: f64,
    pub rho_c: f64,
    pub rho_abc: f64,
    pub coal_a: f64,
    pub coal_b: f64,
    pub coal_ab: f64,
    pub coal_c: f64,
    pub coal_abc: f64,
    pub n_int_ab: usize,
    pub n_int_abc: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            t_a: 0.1,
            t_b: 0.1,
            t_ab: 1.0,
            t_c: 2.0,
            rho_a: 2.0,
            rho_b: 1.0,
            rho_ab: 3.0,
            rho_c: 1.0,
            rho_abc: 1.0,
            coal_a: 1.0,
            coal_b: 0.5,
            coal_ab: 1.0,
            coal_c: 1.0,
            coal_abc: 1.0,
            n_int_ab: 3,
            n_int_abc: 3,
        }
    }
}

impl ModelParams {
    pub fn branch(&self, branch: Branch) -> BranchParams {
        match branch {
            Branch::A => BranchParams { length: self.t_a, coal: self.coal_a, rho: self.rho_a },
            Branch::B => BranchParams { length: self.t_b, coal: self.coal_b, rho: self.rho_b },
            Branch::AB => BranchParams { length: self.t_ab, coal: self.coal_ab, rho: self.rho_ab },
            Branch::C => BranchParams { length: self.t_c, coal: self.coal_c, rho: self.rho_c },
            Branch::ABC => BranchParams {
                length: f64::INFINITY,
                coal: self.coal_abc,
                rho: self.rho_abc,
            },
        }
    }

    /// Number of discretization intervals of an internal branch
    pub fn intervals(&self, branch: Branch) -> Option<usize> {
        match branch {
            Branch::AB => Some(self.n_int_ab),
            Branch::ABC => Some(self.n_int_abc),
            _ => None,
        }
    }

    /// Check the parameter domain. Lengths are finite and non-negative, coalescence rates
    /// positive, recombination rates non-negative and interval counts at least one.
    pub fn validate(&self) -> Result<()> {
        for branch in Branch::ALL {
            let BranchParams { length, coal, rho } = self.branch(branch);

            if branch != Branch::ABC {
                if !length.is_finite() {
                    return Err(Error::NonFinite { branch, name: "length", value: length });
                }
                if length < 0.0 {
                    return Err(Error::NegativeLength { branch, value: length });
                }
            }

            if !coal.is_finite() {
                return Err(Error::NonFinite { branch, name: "coalescence rate", value: coal });
            }
            if coal <= 0.0 {
                return Err(Error::NonPositiveCoalescence { branch, value: coal });
            }

            if !rho.is_finite() {
                return Err(Error::NonFinite { branch, name: "recombination rate", value: rho });
            }
            if rho < 0.0 {
                return Err(Error::NegativeRecombination { branch, value: rho });
            }

            if let Some(count) = self.intervals(branch) {
                if count < 1 {
                    return Err(Error::IntervalCount { branch, count });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_is_valid() {
        assert!(ModelParams::default().validate().is_ok());
    }

    #[test]
    fn root_branch_is_infinite() {
        let params = ModelParams::default();
        assert!(params.branch(Branch::ABC).length.is_infinite());
        assert_eq!(params.branch(Branch::B).coal, 0.5);
        assert_eq!(params.intervals(Branch::AB), Some(3));
        assert_eq!(params.intervals(Branch::C), None);
    }

    #[test]
    fn configuration_errors() {
        let params = ModelParams { t_ab: -1.0, ..Default::default() };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, Error::NegativeLength { branch: Branch::AB, .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let params = ModelParams { coal_c: 0.0, ..Default::default() };
        assert!(matches!(
            params.validate(),
            Err(Error::NonPositiveCoalescence { branch: Branch::C, .. })
        ));

        let params = ModelParams { rho_a: -0.5, ..Default::default() };
        assert!(matches!(
            params.validate(),
            Err(Error::NegativeRecombination { branch: Branch::A, .. })
        ));

        let params = ModelParams { n_int_abc: 0, ..Default::default() };
        assert!(matches!(
            params.validate(),
            Err(Error::IntervalCount { branch: Branch::ABC, count: 0 })
        ));

        let params = ModelParams { t_b: f64::NAN, ..Default::default() };
        assert!(matches!(params.validate(), Err(Error::NonFinite { branch: Branch::B, .. })));
    }

    #[test]
    fn zero_recombination_and_length_are_allowed() {
        let params = ModelParams {
            rho_a: 0.0,
            rho_ab: 0.0,
            t_ab: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }
}
