use color_eyre::{eyre::WrapErr, Result};

use ilsmc_core::HiddenStates;

use crate::args::{ModelArgs, OutputArgs};
use crate::io::{open_table_writer, push_to_output};

#[doc(hidden)]
pub fn run(model: ModelArgs, args: OutputArgs) -> Result<()> {
    let params = model.params()?;
    let states = HiddenStates::enumerate(params.n_int_ab, params.n_int_abc)
        .wrap_err("Invalid interval counts")?;

    let mut output = args.output.clone();
    push_to_output(&args, &mut output, "states", args.extension());

    let mut writer = open_table_writer(&args, output)?;
    writer.write_record(["index", "topology", "first", "second", "label", "tree"])?;
    for (idx, state) in states.iter().enumerate() {
        writer.write_record([
            idx.to_string(),
            state.topology.to_string(),
            state.first.to_string(),
            state.second.to_string(),
            state.label().to_string(),
            state.newick().to_string(),
        ])?;
    }
    writer.flush()?;

    tracing::info!("Listed {} hidden states", states.len());
    Ok(())
}
