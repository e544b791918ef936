//! Adds the time coordinate of one NetCDF file to another with the same
//! number of time steps.

use clap::Parser;
use nc_conform::cli::TimeCopyArgs;
use nc_conform::{logging, timecopy};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = TimeCopyArgs::parse();
    logging::init(&args.log_level);

    timecopy::add_time_coords(&args.with_time, &args.without_time, &args.out)?;
    println!("✅ Saved result to {}", args.out.display());
    Ok(())
}
