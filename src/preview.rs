use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    dataset::{self, LoadOptions},
    io_utils, table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let options = LoadOptions {
        delimiter: io_utils::resolve_input_delimiter(&args.input, args.delimiter),
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        placeholders_as_missing: false,
    };
    let dataset = dataset::load_csv(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;
    print!("{}", table::render_dataset(&dataset, args.rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        dataset.len().min(args.rows),
        dataset.len(),
        args.input
    );
    Ok(())
}
