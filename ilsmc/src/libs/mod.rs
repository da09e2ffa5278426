// ILSMC - Transition tables for the two-locus ILS coalescent
// Copyright (C) 2024  Osma S. Rautila
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! ILSMC - Transition tables for the two-locus ILS coalescent
//!
//! Computes the joint probabilities of the discretized genealogies of two linked loci in a
//! three taxon species tree ((A,B),C). The genealogies distinguish coalescences inside the
//! internal branch AB from deep coalescences above the root, where incomplete lineage
//! sorting can produce any of the three topologies. The table is the transition kernel of a
//! coalescent hidden Markov model.
//!
//! ILSMC commands
//!
//! * Joint or conditional transition table
//! * Listing of the hidden states
//! * Single locus distribution of the hidden states
//!
//! ## Running ILSMC
//!
//! ```bash
//! ilsmc table --t-ab 1.0 --n-int-ab 3 --n-int-abc 3 -o ${outdir}
//!
//! ilsmc table --config params.json --conditional --npy -o ${outdir}
//!
//! ilsmc states --n-int-ab 3 --n-int-abc 3 -o -
//!
//! ilsmc marginals --tsv -o ${outdir}
//! ```

#[doc(hidden)]
pub mod args;

#[doc(hidden)]
pub mod io;

#[doc(hidden)]
pub mod utils;

#[cfg(feature = "clap")]
pub mod clap;
