use std::collections::VecDeque;

use indexmap::IndexSet;
use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};
use crate::lineage::{GenealogyState, Locus};

/// Dense arena of the local states of one population.
///
/// Every state reachable from the entry states gets a contiguous index up front. The states
/// are sorted, so the index of a state only depends on the set of states and rate matrices
/// can be addressed by plain integers.
#[derive(Debug, Clone)]
pub struct StateSpace {
    states: IndexSet<GenealogyState>,
}

impl StateSpace {
    /// All states reachable from `entry` through coalescence and recombination
    pub fn closure<I: IntoIterator<Item = GenealogyState>>(entry: I) -> Self {
        let mut seen: IndexSet<GenealogyState> = IndexSet::new();
        let mut queue: VecDeque<GenealogyState> = VecDeque::new();

        for state in entry {
            if seen.insert(state.clone()) {
                queue.push_back(state);
            }
        }

        while let Some(state) = queue.pop_front() {
            for (next, _) in state.transitions() {
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        seen.sort_unstable();
        Self { states: seen }
    }

    /// Two states of a single sample: both loci on one lineage, or split by a recombination
    pub fn leaf(sample: u8) -> Self {
        Self::closure([GenealogyState::linked(sample)])
    }

    /// State space of the population formed by joining two populations
    pub fn joined(left: &StateSpace, right: &StateSpace) -> Result<Self> {
        let mut entry = Vec::with_capacity(left.len() * right.len());
        for l in left.iter() {
            for r in right.iter() {
                entry.push(l.union(r)?);
            }
        }
        Ok(Self::closure(entry))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenealogyState> {
        self.states.iter()
    }

    pub fn state(&self, idx: usize) -> Option<&GenealogyState> {
        self.states.get_index(idx)
    }

    pub fn index_of(&self, state: &GenealogyState) -> Option<usize> {
        self.states.get_index_of(state)
    }

    /// Number of samples whose ancestry lives in this population
    pub fn samples(&self) -> u32 {
        self.states
            .first()
            .map(|s| (s.samples(Locus::Left) | s.samples(Locus::Right)).count_ones())
            .unwrap_or(0)
    }

    /// Coalescences undergone by each locus, per state
    pub fn coalescences(&self) -> Vec<[usize; 2]> {
        self.states
            .iter()
            .map(|s| [s.coalescences(Locus::Left), s.coalescences(Locus::Right)])
            .collect()
    }

    /// Distribution with all mass on `state`
    pub fn point_mass(&self, state: &GenealogyState) -> Result<Array1<f64>> {
        let idx = self
            .index_of(state)
            .ok_or(Error::UnknownState { context: "entry" })?;
        let mut p = Array1::zeros(self.len());
        p[idx] = 1.0;
        Ok(p)
    }
}

/// Join two independent distributions at a speciation node.
///
/// Index law: the mass `p_left[i] * p_right[j]` is placed at the index of
/// `left.state(i) ∪ right.state(j)` in `joint`. The result sums to the product of the
/// input sums.
pub fn join(
    left: &StateSpace,
    p_left: ArrayView1<f64>,
    right: &StateSpace,
    p_right: ArrayView1<f64>,
    joint: &StateSpace,
) -> Result<Array1<f64>> {
    if p_left.len() != left.len() {
        return Err(Error::Dimension {
            context: "join, left distribution",
            expected: left.len(),
            found: p_left.len(),
        });
    }
    if p_right.len() != right.len() {
        return Err(Error::Dimension {
            context: "join, right distribution",
            expected: right.len(),
            found: p_right.len(),
        });
    }

    let mut out = Array1::zeros(joint.len());
    for (i, l) in left.iter().enumerate() {
        if p_left[i] == 0.0 {
            continue;
        }
        for (j, r) in right.iter().enumerate() {
            let idx = joint
                .index_of(&l.union(r)?)
                .ok_or(Error::UnknownState { context: "joined" })?;
            out[idx] += p_left[i] * p_right[j];
        }
    }
    Ok(out)
}
