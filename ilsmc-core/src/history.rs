use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::hidden::HiddenState;
use crate::state_space::{join, StateSpace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Epoch {
    Ab,
    Abc,
}

/// Interval of an internal branch in which a coalescence was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark {
    pub epoch: Epoch,
    pub interval: usize,
}

impl Mark {
    pub fn new(epoch: Epoch, interval: usize) -> Self {
        Self { epoch, interval }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.epoch {
            Epoch::Ab => write!(f, "AB:{}", self.interval),
            Epoch::Abc => write!(f, "ABC:{}", self.interval),
        }
    }
}

/// The intervals in which the coalescences of one locus happened, oldest last
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocusHistory {
    marks: Vec<Mark>,
}

impl LocusHistory {
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Record `mark` for every coalescence beyond the ones already seen
    pub fn extended(&self, coalescences: usize, mark: Mark) -> Result<Self> {
        if coalescences < self.marks.len() {
            return Err(Error::History { history: format!("{self} followed by {mark}") });
        }
        let mut marks = self.marks.clone();
        marks.resize(coalescences, mark);
        Ok(Self { marks })
    }

    /// Hidden state of a complete history. `first_merge` is the first block the locus formed.
    pub fn hidden_state(&self, first_merge: u8) -> Result<HiddenState> {
        let err = || Error::History { history: self.to_string() };

        let [first, second] = self.marks.as_slice() else {
            return Err(err());
        };
        if second.epoch != Epoch::Abc {
            return Err(err());
        }

        match first.epoch {
            Epoch::Ab => Ok(HiddenState::new(0, first.interval, second.interval)),
            Epoch::Abc => {
                let topology = HiddenState::deep_topology(first_merge).ok_or_else(err)?;
                Ok(HiddenState::new(topology, first.interval, second.interval))
            }
        }
    }
}

impl std::fmt::Display for LocusHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.marks.is_empty() {
            return write!(f, "-");
        }
        write!(f, "{}", itertools::join(self.marks.iter(), ","))
    }
}

/// Histories of the left and the right locus
pub type HistoryPair = [LocusHistory; 2];

/// A distribution over local states, split by the coalescence history of both loci.
///
/// The parts sum to the untracked distribution. Parts are kept in key order, so every
/// reduction over them is deterministic.
#[derive(Debug, Clone)]
pub struct Tracked {
    dim: usize,
    parts: BTreeMap<HistoryPair, Array1<f64>>,
}

impl Tracked {
    /// A distribution in which neither locus has coalesced yet
    pub fn untracked(p: Array1<f64>) -> Self {
        let dim = p.len();
        let mut parts = BTreeMap::new();
        parts.insert(HistoryPair::default(), p);
        Self { dim, parts }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HistoryPair, &Array1<f64>)> {
        self.parts.iter()
    }

    pub fn total(&self) -> f64 {
        self.parts.values().map(|v| v.sum()).sum()
    }

    /// Sum over histories
    pub fn collapse(&self) -> Array1<f64> {
        let mut out = Array1::zeros(self.dim);
        for v in self.parts.values() {
            out += v;
        }
        out
    }

    /// Propagate every part with `p` and record `mark` for the coalescences that happened.
    /// `counts[j]` holds the coalescences of the left and right locus in state `j`.
    pub fn observe(&self, p: &Array2<f64>, counts: &[[usize; 2]], mark: Mark) -> Result<Self> {
        if p.nrows() != self.dim {
            return Err(Error::Dimension { context: "observe", expected: self.dim, found: p.nrows() });
        }
        if counts.len() != p.ncols() {
            return Err(Error::Dimension {
                context: "observe, coalescence counts",
                expected: p.ncols(),
                found: counts.len(),
            });
        }

        let dim = p.ncols();
        let propagated = self
            .parts
            .par_iter()
            .map(|(history, v)| {
                let next = v.dot(p);

                let mut groups: BTreeMap<[usize; 2], Array1<f64>> = BTreeMap::new();
                for (j, mass) in next.iter().enumerate() {
                    if *mass == 0.0 {
                        continue;
                    }
                    groups.entry(counts[j]).or_insert_with(|| Array1::zeros(dim))[j] = *mass;
                }

                groups
                    .into_iter()
                    .map(|([left, right], part)| {
                        let history = [
                            history[0].extended(left, mark)?,
                            history[1].extended(right, mark)?,
                        ];
                        Ok((history, part))
                    })
                    .collect::<Result<Vec<(HistoryPair, Array1<f64>)>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::merge(dim, propagated.into_iter().flatten()))
    }

    /// Join every part with the independent distribution of another population
    pub fn join(
        &self,
        left: &StateSpace,
        right: &StateSpace,
        p_right: ArrayView1<f64>,
        joint: &StateSpace,
    ) -> Result<Self> {
        if left.len() != self.dim {
            return Err(Error::Dimension { context: "tracked join", expected: self.dim, found: left.len() });
        }

        let joined = self
            .parts
            .par_iter()
            .map(|(history, v)| Ok((history.clone(), join(left, v.view(), right, p_right, joint)?)))
            .collect::<Result<Vec<(HistoryPair, Array1<f64>)>>>()?;

        Ok(Self::merge(joint.len(), joined))
    }

    fn merge<I: IntoIterator<Item = (HistoryPair, Array1<f64>)>>(dim: usize, parts: I) -> Self {
        let mut merged: BTreeMap<HistoryPair, Array1<f64>> = BTreeMap::new();
        for (history, v) in parts {
            match merged.get_mut(&history) {
                Some(acc) => *acc += &v,
                None => {
                    merged.insert(history, v);
                }
            }
        }
        Self { dim, parts: merged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::Locus;
    use crate::params::BranchParams;
    use crate::propagator::Propagator;
    use crate::rate_matrix::RateMatrix;
    use crate::params::Branch;
    use ndarray::array;

    fn history(marks: &[Mark]) -> LocusHistory {
        LocusHistory { marks: marks.to_vec() }
    }

    #[test]
    fn mapping_to_hidden_states() {
        let ab = Mark::new(Epoch::Ab, 1);
        let abc = Mark::new(Epoch::Abc, 2);

        let h = history(&[ab, abc]);
        assert_eq!(h.hidden_state(3).unwrap(), HiddenState::new(0, 1, 2));

        let h = history(&[Mark::new(Epoch::Abc, 0), abc]);
        assert_eq!(h.hidden_state(5).unwrap(), HiddenState::new(2, 0, 2));
        assert_eq!(h.to_string(), "ABC:0,ABC:2");

        assert!(matches!(history(&[abc]).hidden_state(3), Err(Error::History { .. })));
        assert!(matches!(history(&[ab, ab]).hidden_state(3), Err(Error::History { .. })));
        // a deep coalescence needs a pairwise first merge
        assert!(history(&[abc, abc]).hidden_state(7).is_err());
    }

    #[test]
    fn both_coalescences_in_one_interval() {
        let h = LocusHistory::default().extended(2, Mark::new(Epoch::Abc, 1)).unwrap();
        assert_eq!(h.marks().len(), 2);
        assert_eq!(h.hidden_state(6).unwrap(), HiddenState::new(3, 1, 1));

        assert!(h.extended(1, Mark::new(Epoch::Abc, 2)).is_err());
    }

    #[test]
    fn observe_preserves_mass() {
        let space = StateSpace::joined(&StateSpace::leaf(1), &StateSpace::leaf(2)).unwrap();
        let rates = BranchParams { length: 1.0, coal: 1.0, rho: 3.0 };
        let prop = Propagator::new(Branch::AB, RateMatrix::new(&space, &rates).unwrap());
        let counts = space.coalescences();

        let entry = space
            .point_mass(&crate::lineage::GenealogyState::new(vec![
                crate::lineage::Lineage::linked(1),
                crate::lineage::Lineage::linked(2),
            ]))
            .unwrap();
        let p = prop.transition(0.4).unwrap();

        let tracked = Tracked::untracked(entry.clone());
        let next = tracked.observe(&p, &counts, Mark::new(Epoch::Ab, 0)).unwrap();

        // none, left, right or both loci coalesced
        assert_eq!(next.len(), 4);
        assert!((next.total() - 1.0).abs() < 1e-12);

        let expected = entry.dot(&p);
        for (x, y) in next.collapse().iter().zip(expected.iter()) {
            assert!((x - y).abs() < 1e-15);
        }

        for (h, v) in next.iter() {
            for (j, mass) in v.iter().enumerate() {
                if *mass > 0.0 {
                    let state = space.state(j).unwrap();
                    assert_eq!(h[0].marks().len(), state.coalescences(Locus::Left));
                    assert_eq!(h[1].marks().len(), state.coalescences(Locus::Right));
                }
            }
        }
    }

    #[test]
    fn observe_dimension_mismatch() {
        let tracked = Tracked::untracked(array![1.0, 0.0, 0.0]);
        let p = Array2::<f64>::eye(2);
        let res = tracked.observe(&p, &[[0, 0], [0, 0]], Mark::new(Epoch::Ab, 0));
        assert!(matches!(res, Err(Error::Dimension { expected: 3, found: 2, .. })));
    }
}
