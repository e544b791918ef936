//! Entry point for nc-conform.
//! Parses the model code and file paths, then runs one conversion.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use nc_conform::calibration::CalibrationTable;
use nc_conform::cli::ConvertArgs;
use nc_conform::{convert_with, logging};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = match ConvertArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", ConvertArgs::command().render_usage());
            return ExitCode::from(1);
        }
    };

    logging::init(&args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &ConvertArgs) -> nc_conform::Result<()> {
    let mut options = args.options();
    if let Some(path) = &args.calibration {
        options = options.with_calibration(CalibrationTable::from_json_path(path)?);
    }

    let report = convert_with(&args.model, &args.src, &args.out, &options)?;

    println!(
        "Converted {} ({} grid, {} members)",
        report.model, report.domain, report.members
    );
    for (var, attachment) in &report.attachments {
        println!("  {var}: coordinates {attachment}");
    }
    println!("✅ Saved result to {}", args.out.display());
    Ok(())
}
