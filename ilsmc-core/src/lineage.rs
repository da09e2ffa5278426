use crate::error::{Error, Result};

/// One of the two linked loci tracked along the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Locus {
    Left,
    Right,
}

impl Locus {
    pub const BOTH: [Locus; 2] = [Locus::Left, Locus::Right];

    fn idx(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// An ancestral lineage. Each label is the bitwise OR of the samples (A = 1, B = 2, C = 4)
/// whose material at that locus the lineage carries, zero if it carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lineage {
    pub left: u8,
    pub right: u8,
}

impl Lineage {
    pub fn new(left: u8, right: u8) -> Self {
        Self { left, right }
    }

    /// A lineage carrying both loci of a single sample
    pub fn linked(sample: u8) -> Self {
        Self { left: sample, right: sample }
    }

    pub fn label(&self, locus: Locus) -> u8 {
        match locus {
            Locus::Left => self.left,
            Locus::Right => self.right,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.left != 0 && self.right != 0
    }

    pub fn merge(&self, other: &Lineage) -> Lineage {
        Lineage::new(self.left | other.left, self.right | other.right)
    }
}

impl std::fmt::Display for Lineage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{})", self.left, self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Coalescence,
    Recombination,
}

/// Local state of a population: the lineages present plus, per locus, the first merged block.
///
/// The first merge is remembered after the locus coalesces further, so the topology of a
/// genealogy can be read even when both of its coalescences fall into one interval.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenealogyState {
    lineages: Vec<Lineage>,
    first_merge: [u8; 2],
}

impl GenealogyState {
    pub fn new(mut lineages: Vec<Lineage>) -> Self {
        lineages.sort_unstable();
        Self { lineages, first_merge: [0, 0] }
    }

    /// Entry state of a leaf branch
    pub fn linked(sample: u8) -> Self {
        Self::new(vec![Lineage::linked(sample)])
    }

    pub fn with_first_merge(mut self, left: u8, right: u8) -> Self {
        self.first_merge = [left, right];
        self
    }

    pub fn lineages(&self) -> &[Lineage] {
        &self.lineages
    }

    pub fn first_merge(&self, locus: Locus) -> u8 {
        self.first_merge[locus.idx()]
    }

    /// Samples whose material at `locus` is present
    pub fn samples(&self, locus: Locus) -> u8 {
        self.lineages.iter().fold(0, |acc, l| acc | l.label(locus))
    }

    /// Number of lineages carrying material at `locus`
    pub fn blocks(&self, locus: Locus) -> usize {
        self.lineages.iter().filter(|l| l.label(locus) != 0).count()
    }

    /// Number of coalescences the locus has undergone so far
    pub fn coalescences(&self, locus: Locus) -> usize {
        self.samples(locus).count_ones() as usize - self.blocks(locus)
    }

    /// Put two populations together at a speciation node. The sample sets have to be
    /// disjoint; first merges are carried over from whichever side has one.
    pub fn union(&self, other: &GenealogyState) -> Result<GenealogyState> {
        let (mine, theirs) = (self.all_samples(), other.all_samples());
        if mine & theirs != 0 {
            return Err(Error::OverlappingSamples { left: mine, right: theirs });
        }

        let lineages = self.lineages.iter().chain(other.lineages.iter()).copied().collect();

        Ok(Self::new(lineages).with_first_merge(
            self.first_merge[0] | other.first_merge[0],
            self.first_merge[1] | other.first_merge[1],
        ))
    }

    fn all_samples(&self) -> u8 {
        self.samples(Locus::Left) | self.samples(Locus::Right)
    }

    /// All states reachable by a single event, with the kind of the event. The structure does
    /// not depend on the rates, so a zero recombination rate still lists recombinations.
    pub fn transitions(&self) -> Vec<(GenealogyState, Event)> {
        let n = self.lineages.len();
        let mut out = Vec::with_capacity(n * n);

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.lineages[i], self.lineages[j]);

                let mut lineages = self
                    .lineages
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != i && *k != j)
                    .map(|(_, l)| *l)
                    .collect::<Vec<Lineage>>();
                lineages.push(a.merge(&b));

                let mut first_merge = self.first_merge;
                for locus in Locus::BOTH {
                    let (la, lb) = (a.label(locus), b.label(locus));
                    if la != 0 && lb != 0 && first_merge[locus.idx()] == 0 {
                        first_merge[locus.idx()] = la | lb;
                    }
                }

                let state = Self::new(lineages).with_first_merge(first_merge[0], first_merge[1]);
                out.push((state, Event::Coalescence));
            }
        }

        for (i, lineage) in self.lineages.iter().enumerate() {
            if !lineage.is_linked() {
                continue;
            }
            let mut lineages = self.lineages.clone();
            lineages.swap_remove(i);
            lineages.push(Lineage::new(lineage.left, 0));
            lineages.push(Lineage::new(0, lineage.right));

            let state = Self::new(lineages).with_first_merge(self.first_merge[0], self.first_merge[1]);
            out.push((state, Event::Recombination));
        }

        out
    }
}

impl std::fmt::Display for GenealogyState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let lineages = itertools::join(self.lineages.iter(), ",");
        write!(f, "{{{lineages}}}|{},{}", self.first_merge[0], self.first_merge[1])
    }
}
