use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::discretize::Discretization;
use crate::error::{Error, Result};
use crate::hidden::HiddenStates;
use crate::history::{Epoch, LocusHistory, Mark, Tracked};
use crate::lineage::{GenealogyState, Locus};
use crate::params::{Branch, ModelParams};
use crate::propagator::{compose, Propagator, ROW_SUM_TOLERANCE};
use crate::rate_matrix::RateMatrix;
use crate::state_space::{join, StateSpace};
use crate::table::TransitionTable;

/// Local state spaces of every branch of the species tree
#[derive(Debug, Clone)]
pub struct Spaces {
    pub a: StateSpace,
    pub b: StateSpace,
    pub c: StateSpace,
    pub ab: StateSpace,
    pub abc: StateSpace,
}

impl Spaces {
    pub fn build() -> Result<Self> {
        let a = StateSpace::leaf(1);
        let b = StateSpace::leaf(2);
        let c = StateSpace::leaf(4);
        let ab = StateSpace::joined(&a, &b)?;
        let abc = StateSpace::joined(&ab, &c)?;

        tracing::debug!(
            "Local state spaces: {} per leaf, {} in AB, {} in ABC",
            a.len(),
            ab.len(),
            abc.len()
        );
        Ok(Self { a, b, c, ab, abc })
    }

    pub fn get(&self, branch: Branch) -> &StateSpace {
        match branch {
            Branch::A => &self.a,
            Branch::B => &self.b,
            Branch::C => &self.c,
            Branch::AB => &self.ab,
            Branch::ABC => &self.abc,
        }
    }
}

/// Walks the species tree from the leaves to the root.
///
/// Leaves start linked and are propagated independently. `A` and `B` are joined into `AB`,
/// which is propagated interval by interval while the coalescences of both loci are recorded.
/// The result is joined with `C` and the root is propagated the same way, its last interval
/// being infinite. The recorded histories are finally mapped to pairs of hidden states.
#[derive(Debug)]
pub struct Composer<'a> {
    params: &'a ModelParams,
    spaces: Spaces,
    hidden: HiddenStates,
}

impl<'a> Composer<'a> {
    pub fn new(params: &'a ModelParams) -> Result<Self> {
        params.validate()?;
        let hidden = HiddenStates::enumerate(params.n_int_ab, params.n_int_abc)?;
        let spaces = Spaces::build()?;
        Ok(Self { params, spaces, hidden })
    }

    pub fn spaces(&self) -> &Spaces {
        &self.spaces
    }

    pub fn hidden_states(&self) -> &HiddenStates {
        &self.hidden
    }

    fn propagator(&self, branch: Branch) -> Result<Propagator> {
        let q = RateMatrix::new(self.spaces.get(branch), &self.params.branch(branch))?;
        Ok(Propagator::new(branch, q))
    }

    /// Distribution at the top of a leaf branch
    pub fn leaf(&self, branch: Branch) -> Result<Array1<f64>> {
        let sample = branch.sample().ok_or(Error::UnknownState { context: "leaf" })?;
        let space = self.spaces.get(branch);

        let entry = space.point_mass(&GenealogyState::linked(sample))?;
        let p = self.propagator(branch)?.transition(self.params.branch(branch).length)?;
        Ok(entry.dot(&p))
    }

    /// Leaves `A`, `B` and `C`, computed in parallel
    pub fn leaves(&self) -> Result<[Array1<f64>; 3]> {
        let (a, (b, c)) = rayon::join(
            || self.leaf(Branch::A),
            || rayon::join(|| self.leaf(Branch::B), || self.leaf(Branch::C)),
        );
        Ok([a?, b?, c?])
    }

    /// Transition matrices of the intervals of an internal branch, in chronological order
    pub fn interval_transitions(&self, branch: Branch) -> Result<Vec<Array2<f64>>> {
        let prop = self.propagator(branch)?;
        let lengths = Discretization::new(self.params, branch)?.lengths();
        lengths.par_iter().map(|dt| prop.transition(*dt)).collect()
    }

    /// `P_1 P_2 ... P_k` over all intervals of an internal branch
    pub fn branch_transition(&self, branch: Branch) -> Result<Array2<f64>> {
        compose(&self.interval_transitions(branch)?)
    }

    fn epoch(&self, branch: Branch, entry: Tracked, epoch: Epoch) -> Result<Tracked> {
        let counts = self.spaces.get(branch).coalescences();
        let transitions = self.interval_transitions(branch)?;
        let expected = entry.collapse().dot(&compose(&transitions)?);

        let mut tracked = entry;
        for (k, p) in transitions.iter().enumerate() {
            tracked = tracked.observe(p, &counts, Mark::new(epoch, k))?;
            tracing::debug!("Branch {branch}, interval {k}: {} histories", tracked.len());
        }

        let deviation = tracked
            .collapse()
            .iter()
            .zip(expected.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max);
        if deviation > ROW_SUM_TOLERANCE {
            return Err(Error::MassMismatch { branch, deviation });
        }
        Ok(tracked)
    }

    /// Tracked distribution at the bottom of the root branch
    pub fn root_entry(&self) -> Result<Tracked> {
        let [a, b, c] = self.leaves()?;
        let s = &self.spaces;

        let ab = join(&s.a, a.view(), &s.b, b.view(), &s.ab)?;
        let tracked = self.epoch(Branch::AB, Tracked::untracked(ab), Epoch::Ab)?;
        tracked.join(&s.ab, &s.c, c.view(), &s.abc)
    }

    fn hidden_index(&self, history: &LocusHistory, first_merge: u8) -> Result<usize> {
        let state = history.hidden_state(first_merge)?;
        self.hidden
            .index_of(&state)
            .ok_or_else(|| Error::History { history: history.to_string() })
    }

    pub fn run(&self) -> Result<TransitionTable> {
        let entry = self.root_entry()?;
        let tracked = self.epoch(Branch::ABC, entry, Epoch::Abc)?;

        let n = self.hidden.len();
        let mut joint = Array2::<f64>::zeros((n, n));
        for (history, v) in tracked.iter() {
            for (j, mass) in v.iter().enumerate() {
                if *mass == 0.0 {
                    continue;
                }
                let state = self
                    .spaces
                    .abc
                    .state(j)
                    .ok_or(Error::UnknownState { context: "root" })?;
                let left = self.hidden_index(&history[0], state.first_merge(Locus::Left))?;
                let right = self.hidden_index(&history[1], state.first_merge(Locus::Right))?;
                joint[[left, right]] += mass;
            }
        }

        TransitionTable::new(self.hidden.clone(), joint)
    }
}

/// Joint probabilities of the hidden states of two linked loci
pub fn transition_table(params: &ModelParams) -> Result<TransitionTable> {
    tracing::info!(
        "Computing the transition table with {} AB and {} ABC intervals",
        params.n_int_ab,
        params.n_int_abc
    );
    let table = Composer::new(params)?.run()?;
    tracing::info!("Table has {} hidden states", table.states().len());
    Ok(table)
}
