mod common;

use ilsmc::args::ModelArgs;

#[test]
#[cfg(feature = "clap")]
fn hidden_states() {
    let cmd = ilsmc::clap::SubCommand::States {
        model: ModelArgs { n_int_ab: 1, n_int_abc: 2, ..Default::default() },
        output: common::output_args("small", true),
        log_and_verbosity: common::silent_verbosity(),
    };
    ilsmc::clap::run_cmd(cmd).unwrap();

    let res = std::fs::read_to_string("tests/results/small_states.tsv").unwrap();
    insta::assert_snapshot!("hidden_states", res);
}

#[test]
#[cfg(feature = "clap")]
fn marginals() {
    let cmd = ilsmc::clap::SubCommand::Marginals {
        model: ModelArgs::default(),
        output: common::output_args("default", false),
        log_and_verbosity: common::silent_verbosity(),
        threads: 2,
    };
    ilsmc::clap::run_cmd(cmd).unwrap();

    let mut rdr = csv::Reader::from_path("tests/results/default_marginals.csv").unwrap();
    let records = rdr.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(records.len(), 27);
    assert_eq!(&records[0][1], "V0");

    let total: f64 = records.iter().map(|r| r[2].parse::<f64>().unwrap()).sum();
    common::assert_close(total, 1.0, 1e-9);

    // AB coalescence within t_AB = 1 at rate 1
    let v0: f64 = records
        .iter()
        .filter(|r| &r[1] == "V0")
        .map(|r| r[2].parse::<f64>().unwrap())
        .sum();
    common::assert_close(v0, 1.0 - (-1.0f64).exp(), 1e-9);
}
