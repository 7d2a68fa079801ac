//! Logging utilities for the senorge tools.
//!
//! Structured key/value events via `tracing`, so batch runs over many theme
//! files stay searchable.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::fill::FillValuePolicy;
use crate::raster::RasterGrid;

/// Initialize the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed with warnings"
        );
    }
}

/// Run `f`, logging its duration
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    debug!(operation = operation, "Starting operation");

    let result = f();

    info!(
        operation = operation,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log shape, type and valid/missing cell counts of a raster
pub fn log_grid_stats(label: &str, grid: &RasterGrid, policy: &FillValuePolicy) {
    let (valid, missing) = grid.count_valid(policy);
    let (min, max) = grid
        .data()
        .iter()
        .filter(|v| !v.is_nan() && **v != grid.fill_sentinel(policy))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    info!(
        grid = label,
        rows = grid.height(),
        cols = grid.width(),
        dtype = %grid.dtype(),
        valid = valid,
        missing = missing,
        min = min,
        max = max,
        "Grid statistics"
    );
}

/// Log an error with context
pub fn log_error(error: &crate::error::SenorgeError, context: &str) {
    error!(
        error = %error,
        context = context,
        error_type = std::any::type_name_of_val(error),
        "Error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DataType;
    use std::time::Duration;

    #[test]
    fn test_log_timed_operation() {
        let result = log_timed_operation("test_operation", || {
            std::thread::sleep(Duration::from_millis(1));
            42
        });

        assert_eq!(result, 42);
    }

    #[test]
    fn test_log_grid_stats_handles_all_missing() {
        let policy = FillValuePolicy::default();
        let grid = RasterGrid::filled(2, 2, DataType::Float32, f64::NAN);
        log_grid_stats("empty", &grid, &policy);
        assert_eq!(grid.count_valid(&policy), (0, 4));
    }
}
