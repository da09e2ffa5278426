use color_eyre::{eyre::WrapErr, Result};

use ilsmc_core::transition_table;

use crate::args::{ModelArgs, OutputArgs};
use crate::io::{open_table_writer, push_to_output};

#[doc(hidden)]
pub fn run(model: ModelArgs, args: OutputArgs) -> Result<()> {
    let params = model.params()?;
    let table = transition_table(&params).wrap_err("Failed to compute the transition table")?;
    let marginals = table.marginals();

    let mut output = args.output.clone();
    push_to_output(&args, &mut output, "marginals", args.extension());

    let mut writer = open_table_writer(&args, output)?;
    writer.write_record(["state", "label", "probability"])?;
    for (state, p) in table.states().iter().zip(marginals.iter()) {
        writer.write_record([state.to_string(), state.label().to_string(), p.to_string()])?;
    }
    writer.flush()?;

    let deep: f64 = table
        .states()
        .iter()
        .zip(marginals.iter())
        .filter(|(s, _)| s.is_deep())
        .map(|(_, p)| p)
        .sum();
    tracing::info!("Probability of a deep coalescence: {deep:.6}");
    Ok(())
}
