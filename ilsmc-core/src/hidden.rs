use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::params::Branch;

/// Discretized genealogy of one locus.
///
/// `topology` 0 means the first coalescence happened in `AB` interval `first` and the second
/// one in `ABC` interval `second`. Topologies 1, 2 and 3 are deep coalescences, both inside
/// `ABC` with `first <= second`, where the first merge joined A with B, A with C or B with C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HiddenState {
    pub topology: u8,
    pub first: usize,
    pub second: usize,
}

impl HiddenState {
    pub fn new(topology: u8, first: usize, second: usize) -> Self {
        Self { topology, first, second }
    }

    pub fn is_deep(&self) -> bool {
        self.topology != 0
    }

    /// Short name of the genealogy class
    pub fn label(&self) -> &'static str {
        match self.topology {
            0 => "V0",
            1 => "V1",
            2 => "V2",
            _ => "V3",
        }
    }

    /// Newick-like topology of the locus tree
    pub fn newick(&self) -> &'static str {
        match self.topology {
            0 | 1 => "((A,B),C)",
            2 => "((A,C),B)",
            _ => "((B,C),A)",
        }
    }

    /// Topology of a deep coalescence from the first merged block of the locus
    pub fn deep_topology(first_merge: u8) -> Option<u8> {
        match first_merge {
            0b011 => Some(1),
            0b101 => Some(2),
            0b110 => Some(3),
            _ => None,
        }
    }
}

impl std::fmt::Display for HiddenState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.topology, self.first, self.second)
    }
}

/// Arena of all hidden states, in lexicographic order.
#[derive(Debug, Clone)]
pub struct HiddenStates {
    states: IndexSet<HiddenState>,
    n_int_ab: usize,
    n_int_abc: usize,
}

impl HiddenStates {
    pub fn enumerate(n_int_ab: usize, n_int_abc: usize) -> Result<Self> {
        if n_int_ab < 1 {
            return Err(Error::IntervalCount { branch: Branch::AB, count: n_int_ab });
        }
        if n_int_abc < 1 {
            return Err(Error::IntervalCount { branch: Branch::ABC, count: n_int_abc });
        }

        let mut states = IndexSet::with_capacity(Self::count(n_int_ab, n_int_abc));
        for l in 0..n_int_ab {
            for big_l in 0..n_int_abc {
                states.insert(HiddenState::new(0, l, big_l));
            }
        }
        for topology in 1..=3 {
            for l in 0..n_int_abc {
                for big_l in l..n_int_abc {
                    states.insert(HiddenState::new(topology, l, big_l));
                }
            }
        }

        tracing::debug!("Enumerated {} hidden states", states.len());
        Ok(Self { states, n_int_ab, n_int_abc })
    }

    /// `n_AB * n_ABC + 3 * n_ABC + 3 * n_ABC * (n_ABC - 1) / 2`
    pub fn count(n_int_ab: usize, n_int_abc: usize) -> usize {
        n_int_ab * n_int_abc + 3 * n_int_abc * (n_int_abc + 1) / 2
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HiddenState> {
        self.states.iter()
    }

    pub fn state(&self, idx: usize) -> Option<&HiddenState> {
        self.states.get_index(idx)
    }

    pub fn index_of(&self, state: &HiddenState) -> Option<usize> {
        self.states.get_index_of(state)
    }

    pub fn n_int_ab(&self) -> usize {
        self.n_int_ab
    }

    pub fn n_int_abc(&self) -> usize {
        self.n_int_abc
    }
}
