//! Integration tests for senorge
//!
//! End-to-end runs of the BIL -> NetCDF conversion and of the regridding
//! pipeline, through files on disk.

mod common;

use common::{assertions, test_data};
use ndarray::Array2;
use pretty_assertions::assert_eq;

use senorge::config::GridConfig;
use senorge::dates::{epoch_seconds, split_filename, theme_time};
use senorge::interpolation::{interp, MaskPolicy};
use senorge::{
    regrid_to_senorge, BilCodec, Config, DataType, FillValuePolicy, InterpolationOrder,
    NcReader, NcWriter, NoDataMask, RegridOptions, SenorgeError, ThemeVariable,
};

#[test]
fn test_bil_theme_to_netcdf() {
    let dir = tempfile::tempdir().unwrap();
    let grid_config = GridConfig::default();
    let shape = grid_config.shape();
    let policy = FillValuePolicy::default();

    let theme = test_data::ramp_field(shape);
    let bil_path = test_data::write_bil_theme(dir.path(), "swe", "2010_01_15", &theme).unwrap();
    let mask_path = dir.path().join("norway_mask.bil");
    test_data::corner_mask(shape, 10, 20).save(&mask_path).unwrap();

    // Same steps as the senorge binary
    let raw = BilCodec::new(&grid_config)
        .read(&bil_path, DataType::Uint16)
        .unwrap();
    assert_eq!(raw, theme);

    let (name, date) = split_filename(&bil_path).unwrap();
    assert_eq!(name, "swe");
    let time = epoch_seconds(theme_time(date));

    let mut grid = raw.flipud().cast(DataType::Int16, &policy);
    let mask = NoDataMask::load(&mask_path, shape).unwrap().flipud();
    grid.apply_mask(&mask, &policy).unwrap();

    let nc_path = dir.path().join("swe_2010_01_15.nc");
    let mut writer = NcWriter::create(&nc_path, &Config::default(), &[time]).unwrap();
    let variable = ThemeVariable::new(name, DataType::Int16)
        .with_units("mm")
        .with_lsd(1);
    writer.add_variable(&variable, grid.view()).unwrap();
    writer.close().unwrap();

    let reader = NcReader::open(&nc_path).unwrap();
    assert_eq!(reader.times().unwrap(), vec![time]);
    let stored = reader.read_variable("swe", 0).unwrap();
    assert_eq!(stored.dtype(), &DataType::Int16);
    assert_eq!(stored.shape(), (1550, 1195));

    let sentinel = 32767.0;
    // South-up: BIL row 0 is the last NetCDF row
    assert_eq!(stored.data()[[1549, 0]], sentinel);
    assert_eq!(stored.data()[[1540, 19]], sentinel);
    assert_eq!(stored.data()[[1539, 19]], theme.data()[[10, 19]]);
    assert_eq!(stored.data()[[1549, 20]], theme.data()[[0, 20]]);
    assert_eq!(stored.data()[[0, 1194]], sentinel);
    assert_eq!(stored.data()[[0, 0]], theme.data()[[1549, 0]]);

    let (valid, missing) = stored.count_valid(&policy);
    assert_eq!(missing, 10 * 20 + 1);
    assert_eq!(valid + missing, 1550 * 1195);
}

#[test]
fn test_regrid_model_field_to_netcdf() {
    let dir = tempfile::tempdir().unwrap();
    let target = test_data::small_grid();
    let (x, y, z) = test_data::model_field();
    let mask = test_data::corner_mask(target.shape(), 1, 1);

    let regridded =
        regrid_to_senorge(z.view(), x.view(), y.view(), &target, Some(&mask)).unwrap();
    let expected = Array2::from_shape_fn(target.shape(), |(j, i)| {
        if (j, i) == (2, 0) {
            f64::NAN
        } else {
            i as f64 + 10.0 * j as f64
        }
    });
    assertions::assert_grid_approx_eq(regridded.view(), expected.view(), None);

    let path = dir.path().join("tm_2012_06_01.nc");
    let mut writer =
        NcWriter::create_with_grid(&path, &Config::default(), target.clone(), &[0.0]).unwrap();
    writer
        .add_variable(&ThemeVariable::new("tm", DataType::Float32), regridded.view())
        .unwrap();
    writer.close().unwrap();

    let mut stored = NcReader::open(&path).unwrap().read_variable("tm", 0).unwrap();
    assert_eq!(stored.dtype(), &DataType::Float32);
    assert_eq!(stored.restore_missing(&FillValuePolicy::default()), 1);
    assertions::assert_grid_approx_eq(stored.view(), expected.view(), None);
}

#[test]
fn test_regrid_rejects_source_not_covering_target() {
    let target = test_data::small_grid();
    let (x, y, z) = test_data::model_field();
    let x_shifted = x.mapv(|v| v + 2000.0);

    let result = regrid_to_senorge(z.view(), x_shifted.view(), y.view(), &target, None);
    assert!(matches!(result, Err(SenorgeError::OutOfBounds { .. })));
}

#[test]
fn test_orders_agree_on_linear_field() {
    let (x, y, z) = test_data::model_field();
    let (xout, yout) = test_data::small_grid().target_mesh();
    let xout = xout.mapv(|v| v + 250.0);
    let yout = yout.mapv(|v| v + 250.0);

    let exact = Array2::from_shape_fn(xout.dim(), |idx| {
        xout[idx] / 1000.0 + 10.0 * (yout[idx] - 6_600_000.0) / 1000.0
    });

    for order in [InterpolationOrder::Bilinear, InterpolationOrder::Cubic] {
        let options = RegridOptions {
            order,
            checkbounds: true,
            masked: MaskPolicy::None,
        };
        let out = interp(z.view(), x.view(), y.view(), xout.view(), yout.view(), &options)
            .unwrap();
        assertions::assert_grid_approx_eq(out.data.view(), exact.view(), Some(1e-6));
    }

    // Nearest is off by at most half a source cell in each direction
    let nearest = interp(
        z.view(),
        x.view(),
        y.view(),
        xout.view(),
        yout.view(),
        &RegridOptions {
            order: InterpolationOrder::Nearest,
            ..Default::default()
        },
    )
    .unwrap();
    for (a, e) in nearest.data.iter().zip(exact.iter()) {
        assertions::assert_in_range(a - e, -2.75, 2.75);
    }
}
