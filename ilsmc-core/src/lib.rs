pub mod composer;
pub mod discretize;
pub mod error;
pub mod hidden;
pub mod history;
pub mod lineage;
pub mod linalg;
pub mod params;
pub mod propagator;
pub mod rate_matrix;
pub mod state_space;
pub mod table;

pub use composer::{transition_table, Composer};
pub use error::{Error, ErrorKind};
pub use hidden::{HiddenState, HiddenStates};
pub use params::{Branch, ModelParams};
pub use table::{TransitionTable, Triple, NEGLIGIBLE_PROBABILITY};
