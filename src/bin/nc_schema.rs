//! Prints the schema of a NetCDF file: every group with its attributes,
//! dimensions and variables.

use clap::Parser;
use nc_conform::cli::SchemaArgs;
use nc_conform::{logging, metadata};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = SchemaArgs::parse();
    logging::init(&args.log_level);

    metadata::print_schema(&args.nc)?;
    Ok(())
}
