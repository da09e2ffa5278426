/// Joint or conditional transition table between the hidden states of two linked loci
pub mod table;

/// Listing of the hidden states
pub mod states;

/// Single locus distribution of the hidden states
pub mod marginals;
