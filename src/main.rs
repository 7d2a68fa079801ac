//! senorge - convert a seNorge BIL theme file to CF NetCDF
//!
//! Reads `<theme>_YYYY_MM_DD.bil`, flips it south-up, stores it as int16
//! with the Norway mask applied and writes `<theme>_YYYY_MM_DD.nc`.

use std::time::Instant;
use tracing::{info, warn};

use senorge::dates::{epoch_seconds, split_filename, theme_time};
use senorge::{
    init_tracing, log_error, log_grid_stats, log_operation_end, log_operation_start,
    log_timed_operation, BilCodec, Config, DataType, FillValuePolicy, NcWriter, NoDataMask,
    Result, SenorgeError, ThemeVariable,
};

fn main() -> Result<()> {
    let (config, args) = Config::load()?;
    init_tracing(&config.log_level);

    info!("Starting senorge v{}", env!("CARGO_PKG_VERSION"));

    run(&config, &args).map_err(|e| {
        log_error(&e, "BIL to NetCDF conversion");
        e
    })
}

fn run(config: &Config, args: &senorge::config::Args) -> Result<()> {
    let start = Instant::now();
    let bil_path = config.resolve_bil_path(&args.bil_file);
    log_operation_start("bil_to_netcdf", bil_path.to_str());

    let policy = FillValuePolicy::default();
    let dtype = DataType::parse(&args.dtype);
    let codec = BilCodec::new(&config.grid);

    let raw = log_timed_operation("read_bil", || codec.read(&bil_path, dtype))?;
    log_grid_stats("bil", &raw, &policy);

    let (theme_name, date) = split_filename(&bil_path)?;
    let time = epoch_seconds(theme_time(date));

    let mut grid = raw.flipud().cast(DataType::Int16, &policy);

    match &config.paths.mask_file {
        Some(path) if path.exists() => {
            let mask = NoDataMask::load(path, config.grid.shape())?.flipud();
            grid.apply_mask(&mask, &policy)?;
            info!(path = %path.display(), masked = mask.count(), "Applied no-data mask");
        }
        Some(path) => warn!(path = %path.display(), "Mask file not found, writing unmasked"),
        None => {}
    }
    log_grid_stats("netcdf", &grid, &policy);

    let stem = bil_path
        .file_stem()
        .ok_or_else(|| SenorgeError::InvalidParameter {
            param: "bil_file".to_string(),
            message: format!("{} has no file name", bil_path.display()),
        })?;
    std::fs::create_dir_all(&config.paths.netcdf_out)?;
    let out_path = config.paths.netcdf_out.join(stem).with_extension("nc");

    let theme = ThemeVariable::new(
        args.var_name.clone().unwrap_or(theme_name),
        DataType::Int16,
    )
    .with_units(args.units.as_str())
    .with_long_name(args.long_name.as_str())
    .with_lsd(1);

    let mut writer = NcWriter::create(&out_path, config, &[time])?;
    writer.add_variable(&theme, grid.view())?;
    writer.close()?;

    info!(
        input = %bil_path.display(),
        output = %out_path.display(),
        variable = %theme.name,
        "Wrote NetCDF theme"
    );
    log_operation_end("bil_to_netcdf", start, true);
    Ok(())
}
