#![allow(dead_code)]
use std::path::PathBuf;

use ilsmc::args::OutputArgs;
use ilsmc_core::{HiddenState, TransitionTable};

#[cfg(feature = "clap")]
use ilsmc::clap::LogAndVerbosity;

pub const OUTDIR: &str = "tests/results";

pub fn output_args(prefix: &str, tsv: bool) -> OutputArgs {
    std::fs::create_dir_all(OUTDIR).unwrap();
    OutputArgs {
        output: PathBuf::from(OUTDIR),
        prefix: Some(String::from(prefix)),
        tsv,
    }
}

#[cfg(feature = "clap")]
pub fn silent_verbosity() -> LogAndVerbosity {
    LogAndVerbosity {
        verbosity: 1,
        log_file: None,
        silent: false,
    }
}

pub fn probability(table: &TransitionTable, from: (u8, usize, usize), to: (u8, usize, usize)) -> f64 {
    table
        .probability(
            &HiddenState::new(from.0, from.1, from.2),
            &HiddenState::new(to.0, to.1, to.2),
        )
        .unwrap()
}

pub fn assert_close(found: f64, expected: f64, tol: f64) {
    assert!(
        (found - expected).abs() < tol,
        "{found} is not within {tol} of {expected}"
    );
}
