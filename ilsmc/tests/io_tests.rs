mod common;

use std::path::PathBuf;

use ilsmc::args::ModelArgs;
use ilsmc::io::{get_input, get_output, read_params_json};
use ilsmc_core::ModelParams;

#[test]
fn params_from_json() {
    std::fs::create_dir_all(common::OUTDIR).unwrap();
    let path = PathBuf::from("tests/results/params.json");

    let params = ModelParams { t_ab: 0.25, rho_abc: 0.0, n_int_abc: 4, ..Default::default() };
    let mut output = get_output(Some(path.clone())).unwrap();
    serde_json::to_writer_pretty(&mut output, &params).unwrap();
    drop(output);

    assert_eq!(read_params_json(&path).unwrap(), params);

    // a config file replaces the values of the flags
    let args = ModelArgs { config: Some(path), t_ab: 5.0, ..Default::default() };
    assert_eq!(args.params().unwrap(), params);
}

#[test]
fn malformed_json() {
    std::fs::create_dir_all(common::OUTDIR).unwrap();
    let path = PathBuf::from("tests/results/malformed.json");
    std::fs::write(&path, "{\"t_a\": 0.1").unwrap();
    assert!(read_params_json(&path).is_err());
}

#[test]
fn missing_input() {
    assert!(get_input(Some(PathBuf::from("tests/results/missing.json.gz"))).is_err());
}
