use std::io;

use color_eyre::{eyre::WrapErr, Result};
use csv::Writer;

use ilsmc_core::{transition_table, Triple};

use crate::args::{ModelArgs, OutputArgs};
use crate::io::{open_table_writer, push_to_output};

#[doc(hidden)]
pub fn run(model: ModelArgs, args: OutputArgs, conditional: bool, want_npy: bool) -> Result<()> {
    let params = model.params()?;
    tracing::debug!("{params:?}");

    let table = transition_table(&params).wrap_err("Failed to compute the transition table")?;

    let (name, triples, dense) = match conditional {
        true => ("transition_matrix", table.conditional_triples(), table.transition_matrix()),
        false => ("joint_table", table.triples(), table.joint().to_owned()),
    };

    let mut output = args.output.clone();
    push_to_output(&args, &mut output, name, args.extension());

    let mut writer = open_table_writer(&args, output)?;
    write_triples(&mut writer, &triples)?;
    tracing::info!(
        "Wrote {} of {} entries",
        triples.len(),
        table.states().len() * table.states().len()
    );

    if want_npy {
        if args.is_stdout() {
            tracing::warn!("Skipping the .npy output, no output directory was given");
        } else {
            let mut npy_output = args.output.clone();
            push_to_output(&args, &mut npy_output, name, "npy");
            ndarray_npy::write_npy(&npy_output, &dense)
                .wrap_err_with(|| format!("Unable to write {npy_output:?}"))?;
        }
    }

    Ok(())
}

pub fn write_triples<W: io::Write>(writer: &mut Writer<W>, triples: &[Triple]) -> Result<()> {
    writer.write_record(["from_state", "to_state", "probability"])?;
    for t in triples {
        writer.write_record([t.from.to_string(), t.to.to_string(), t.probability.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
