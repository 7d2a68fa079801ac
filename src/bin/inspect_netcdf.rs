//! Print a short report (dimensions, variables, time axis) for NetCDF files.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use senorge::{init_tracing, NcReader};

#[derive(Parser, Debug)]
#[command(name = "inspect_netcdf", version, about = "Summarize seNorge NetCDF files")]
struct Cli {
    /// Files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Also print the attributes of this variable
    #[arg(short, long)]
    variable: Option<String>,

    #[arg(long, env = "SENORGE_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    for path in &cli.files {
        let reader = NcReader::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let report = reader
            .report()
            .with_context(|| format!("failed to read {}", path.display()))?;
        println!("{}", report);

        if let Some(name) = &cli.variable {
            let grid = reader
                .read_variable(name, 0)
                .with_context(|| format!("failed to read {} from {}", name, path.display()))?;
            println!("\t{} [{}] {:?}", name, grid.dtype(), grid.shape());
            for attr in ["units", "long_name", "_FillValue", "least_significant_digit"] {
                if let Some(value) = reader.variable_attribute(name, attr) {
                    println!("\t\t{}: {:?}", attr, value);
                }
            }
        }
    }
    Ok(())
}
