use std::io;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use csv::{Writer, WriterBuilder};

use ilsmc_core::ModelParams;

use crate::args::OutputArgs;
use crate::utils::strip_prefix;

pub fn get_input(filename: Option<PathBuf>) -> Result<Box<dyn io::Read>> {
    let input: Box<dyn io::Read> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdin()),
            Some(name) => {
                let r = match niffler::from_path(name) {
                    Ok(x) => x.0,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}")),
                };
                Box::new(r)
            }
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdin()),
    };
    Ok(input)
}

pub fn get_output(filename: Option<PathBuf>) -> Result<Box<dyn io::Write>> {
    let output: Box<dyn io::Write> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdout()),
            Some(name) => Box::new(
                match std::fs::File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(name)
                {
                    Ok(x) => x,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}")),
                },
            ),
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

pub fn get_csv_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(false)
        .from_writer(output)
}

pub fn get_strict_tsv_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(false)
        .from_writer(output)
}

/// Csv or tsv writer to `name`, following `--tsv`
pub fn open_table_writer(args: &OutputArgs, name: PathBuf) -> Result<Writer<Box<dyn io::Write>>> {
    let output = get_output(Some(name))?;
    Ok(match args.tsv {
        true => get_strict_tsv_writer(output),
        false => get_csv_writer(output),
    })
}

/// Append `[prefix_]name.suffix` to the output directory. Stdout stays stdout.
pub fn push_to_output(args: &OutputArgs, output: &mut PathBuf, name: &str, suffix: &str) {
    if args.is_stdout() {
        return;
    }
    match strip_prefix(args.prefix.clone()) {
        Some(prefix) => output.push(format!("{prefix}_{name}.{suffix}")),
        None => output.push(format!("{name}.{suffix}")),
    }
}

/// Model parameters from a json file, which may be compressed
pub fn read_params_json(path: &Path) -> Result<ModelParams> {
    let input = get_input(Some(path.to_path_buf()))?;
    let params: ModelParams = serde_json::from_reader(input)
        .wrap_err_with(|| format!("Unable to parse model parameters from {path:?}"))?;
    Ok(params)
}
