// tests/io_tests.rs
//
// Raster round-trips through GDAL's in-memory filesystem.
use std::path::{Path, PathBuf};

use gdal::raster::{Buffer, GdalDataType, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};

use ndwi_calc::io::{read_band, write_ndwi, WriterOptions};
use ndwi_calc::processing::indices::{calculate_ndwi, NDWI};
use ndwi_calc::processing::{BandSource, IndexCalculator, NdwiJob, ParallelProcessor};
use ndwi_calc::{Band, NdwiError};

const GEO_TRANSFORM: [f64; 6] = [740000.0, 30.0, 0.0, 2330000.0, 0.0, -30.0];
const EPSG_UTM_4N: i32 = 32604;

fn mem_path(name: &str) -> PathBuf {
    PathBuf::from(format!("/vsimem/ndwi-calc-tests/{name}"))
}

/// Write a single-band GeoTIFF with a fixed UTM georeference
fn write_test_raster<T: GdalType + Copy>(
    path: &Path,
    cols: usize,
    rows: usize,
    data: Vec<T>,
    nodata: Option<f64>,
) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<T, _>(path, cols, rows, 1)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();
    dataset
        .set_spatial_ref(&SpatialRef::from_epsg(EPSG_UTM_4N as u32).unwrap())
        .unwrap();

    let mut band = dataset.rasterband(1).unwrap();
    band.set_no_data_value(nodata).unwrap();
    let mut buffer = Buffer::new((cols, rows), data);
    band.write((0, 0), (cols, rows), &mut buffer).unwrap();
}

/// Green/NIR pair with a water-like left half and a land-like right half
fn scene(cols: usize, rows: usize) -> (Vec<u16>, Vec<u16>) {
    let mut green = Vec::with_capacity(cols * rows);
    let mut nir = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let water = col < cols / 2;
            let jitter = ((row * 31 + col * 17) % 97) as u16;
            green.push(if water { 9000 + jitter } else { 7000 + jitter });
            nir.push(if water { 5000 + jitter } else { 16000 + jitter });
        }
    }
    // Fill value corner, both channels zero
    green[0] = 0;
    nir[0] = 0;
    (green, nir)
}

/// Calculator whose every window fails, as a bad read would
struct FailingCalculator;

impl IndexCalculator for FailingCalculator {
    fn calculate(&self, inputs: &[Band]) -> ndwi_calc::error::Result<Band> {
        Err(NdwiError::MissingBand {
            index: inputs.len(),
            provided: inputs.len(),
        })
    }

    fn required_bands(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn bits(band: &Band) -> Vec<u32> {
    band.data().iter().map(|v| v.to_bits()).collect()
}

#[test]
fn read_band_returns_values_and_profile() {
    let path = mem_path("read/green.tif");
    write_test_raster(&path, 3, 2, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], Some(-9999.0));

    let (band, profile) = read_band(&path, 1).unwrap();

    assert_eq!(band.shape(), (2, 3));
    assert_eq!(band.row(1), &[4.0, 5.0, 6.0]);
    assert_eq!(profile.shape(), (2, 3));
    assert_eq!(profile.geo_transform, Some(GEO_TRANSFORM));
    assert_eq!(profile.nodata, Some(-9999.0));
    assert_eq!(profile.driver, "GTiff");
    assert!(!profile.projection.is_empty());
}

#[test]
fn read_band_widens_integer_imagery() {
    let path = mem_path("read/u16.tif");
    write_test_raster(&path, 2, 1, vec![0u16, 65535], None);

    let (band, _) = read_band(&path, 1).unwrap();
    assert_eq!(band.data(), &[0.0, 65535.0]);
}

#[test]
fn read_band_names_missing_file() {
    let path = mem_path("read/missing.tif");
    let err = read_band(&path, 1).unwrap_err();
    assert!(format!("{err:#}").contains("missing.tif"));
}

#[test]
fn read_band_rejects_missing_band() {
    let path = mem_path("read/one-band.tif");
    write_test_raster(&path, 1, 1, vec![1.0f32], None);
    assert!(read_band(&path, 2).is_err());
}

#[test]
fn write_ndwi_forwards_profile_as_float32() {
    let input = mem_path("write/green.tif");
    let output = mem_path("write/ndwi.tif");
    write_test_raster(&input, 2, 2, vec![100u16, 0, 40, 0], Some(0.0));

    let (green, profile) = read_band(&input, 1).unwrap();
    let nir = Band::from_rows(&[[20.0, 0.0], [40.0, 30.0]]).unwrap();
    let ndwi = calculate_ndwi(&green, &nir).unwrap();

    write_ndwi(&output, &ndwi, &profile, &WriterOptions::default()).unwrap();

    let dataset = Dataset::open(&output).unwrap();
    assert_eq!(dataset.raster_count(), 1);
    assert_eq!(dataset.raster_size(), (2, 2));
    assert_eq!(dataset.geo_transform().unwrap(), GEO_TRANSFORM);
    assert_eq!(dataset.spatial_ref().unwrap().auth_code().unwrap(), EPSG_UTM_4N);

    let band = dataset.rasterband(1).unwrap();
    assert_eq!(band.band_type(), GdalDataType::Float32);
    assert_eq!(band.no_data_value(), Some(0.0));

    let (written, _) = read_band(&output, 1).unwrap();
    assert_eq!(bits(&written), bits(&ndwi));
}

#[test]
fn write_ndwi_rejects_grid_that_does_not_fit_profile() {
    let input = mem_path("write-mismatch/green.tif");
    write_test_raster(&input, 2, 2, vec![1.0f32; 4], None);
    let (_, profile) = read_band(&input, 1).unwrap();

    let ndwi = Band::filled(3, 2, 0.0).unwrap();
    let output = mem_path("write-mismatch/ndwi.tif");
    assert!(write_ndwi(&output, &ndwi, &profile, &WriterOptions::default()).is_err());
}

#[test]
fn job_runs_end_to_end() {
    let (cols, rows) = (16, 8);
    let (green_dn, nir_dn) = scene(cols, rows);
    let green_path = mem_path("job/B3.TIF");
    let nir_path = mem_path("job/B5.TIF");
    let output = mem_path("job/ndwi.tif");
    write_test_raster(&green_path, cols, rows, green_dn.clone(), None);
    write_test_raster(&nir_path, cols, rows, nir_dn.clone(), None);

    let ndwi = NdwiJob::new(&green_path, &nir_path)
        .with_output(&output)
        .run()
        .unwrap();

    let expected = calculate_ndwi(
        &Band::widen(rows, cols, &green_dn).unwrap(),
        &Band::widen(rows, cols, &nir_dn).unwrap(),
    )
    .unwrap();
    assert_eq!(bits(&ndwi), bits(&expected));

    // Water on the left, land on the right, fill corner at the sentinel
    assert_eq!(ndwi.get(0, 0), Some(0.0));
    assert!(ndwi.get(4, 1).unwrap() > 0.0);
    assert!(ndwi.get(4, cols - 1).unwrap() < 0.0);

    let (written, profile) = read_band(&output, 1).unwrap();
    assert_eq!(bits(&written), bits(&ndwi));
    assert_eq!(profile.geo_transform, Some(GEO_TRANSFORM));
}

#[test]
fn job_without_output_writes_nothing() {
    let green_path = mem_path("memory-only/green.tif");
    let nir_path = mem_path("memory-only/nir.tif");
    write_test_raster(&green_path, 2, 1, vec![0.5f32, 0.0], None);
    write_test_raster(&nir_path, 2, 1, vec![0.1f32, 0.3], None);

    let ndwi = NdwiJob::new(&green_path, &nir_path).run().unwrap();
    assert_eq!(ndwi.shape(), (1, 2));
    assert_eq!(ndwi.get(0, 1), Some(-1.0));
}

#[test]
fn job_reports_shape_mismatch() {
    let green_path = mem_path("mismatch/green.tif");
    let nir_path = mem_path("mismatch/nir.tif");
    write_test_raster(&green_path, 3, 3, vec![1.0f32; 9], None);
    write_test_raster(&nir_path, 4, 4, vec![1.0f32; 16], None);

    let err = NdwiJob::new(&green_path, &nir_path).run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NdwiError>(),
        Some(NdwiError::ShapeMismatch { .. })
    ));
}

#[test]
fn job_renders_plot() {
    let green_path = mem_path("plot/green.tif");
    let nir_path = mem_path("plot/nir.tif");
    write_test_raster(&green_path, 4, 4, vec![0.3f32; 16], None);
    write_test_raster(&nir_path, 4, 4, vec![0.1f32; 16], None);

    let plot = std::env::temp_dir().join(format!("ndwi-calc-plot-{}.png", std::process::id()));
    NdwiJob::new(&green_path, &nir_path)
        .with_plot(&plot)
        .run()
        .unwrap();

    let image = image::open(&plot).unwrap();
    assert!(image.width() > 256 && image.height() > 256);
    std::fs::remove_file(&plot).unwrap();
}

#[test]
fn blocked_processing_matches_in_memory_result() {
    let (cols, rows) = (300, 200);
    let (green_dn, nir_dn) = scene(cols, rows);
    let green_path = mem_path("blocked/green.tif");
    let nir_path = mem_path("blocked/nir.tif");
    write_test_raster(&green_path, cols, rows, green_dn, Some(0.0));
    write_test_raster(&nir_path, cols, rows, nir_dn, Some(0.0));

    let in_memory = NdwiJob::new(&green_path, &nir_path).run().unwrap();

    let output = mem_path("blocked/ndwi.tif");
    let processor = ParallelProcessor::new(Some(3));
    let profile = processor
        .process(
            &NDWI::default(),
            &[BandSource::new(&green_path, 1), BandSource::new(&nir_path, 1)],
            &output,
            &WriterOptions::default(),
        )
        .unwrap();
    assert_eq!(profile.shape(), (rows, cols));

    let (blocked, written_profile) = read_band(&output, 1).unwrap();
    assert_eq!(bits(&blocked), bits(&in_memory));
    assert_eq!(written_profile.nodata, Some(0.0));
    assert_eq!(written_profile.geo_transform, Some(GEO_TRANSFORM));
}

#[test]
fn blocked_processing_rejects_mismatched_inputs() {
    let green_path = mem_path("blocked-mismatch/green.tif");
    let nir_path = mem_path("blocked-mismatch/nir.tif");
    write_test_raster(&green_path, 3, 3, vec![1.0f32; 9], None);
    write_test_raster(&nir_path, 4, 4, vec![1.0f32; 16], None);

    let output = mem_path("blocked-mismatch/ndwi.tif");
    let err = NdwiJob::new(&green_path, &nir_path)
        .with_output(&output)
        .run_blocked(&ParallelProcessor::new(Some(2)))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NdwiError>(),
        Some(NdwiError::ShapeMismatch { .. })
    ));
    assert!(Dataset::open(&output).is_err());
}

#[test]
fn failed_blocked_run_removes_partial_output() {
    let (cols, rows) = (300, 200);
    let (green_dn, nir_dn) = scene(cols, rows);
    let green_path = mem_path("blocked-failure/green.tif");
    let nir_path = mem_path("blocked-failure/nir.tif");
    write_test_raster(&green_path, cols, rows, green_dn, None);
    write_test_raster(&nir_path, cols, rows, nir_dn, None);

    let output = mem_path("blocked-failure/ndwi.tif");
    let err = ParallelProcessor::new(Some(2))
        .process(
            &FailingCalculator,
            &[BandSource::new(&green_path, 1), BandSource::new(&nir_path, 1)],
            &output,
            &WriterOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NdwiError>(),
        Some(NdwiError::MissingBand { .. })
    ));
    assert!(Dataset::open(&output).is_err());
}

#[test]
fn blocked_processing_checks_band_positions_before_writing() {
    let green_path = mem_path("blocked-positions/green.tif");
    let nir_path = mem_path("blocked-positions/nir.tif");
    write_test_raster(&green_path, 2, 2, vec![1.0f32; 4], None);
    write_test_raster(&nir_path, 2, 2, vec![1.0f32; 4], None);

    let output = mem_path("blocked-positions/ndwi.tif");
    let result = ParallelProcessor::new(Some(1)).process(
        &NDWI::new(0, 2, None),
        &[BandSource::new(&green_path, 1), BandSource::new(&nir_path, 1)],
        &output,
        &WriterOptions::default(),
    );

    assert!(result.is_err());
    assert!(Dataset::open(&output).is_err());
}

#[test]
fn write_ndwi_handles_grids_taller_than_one_strip() {
    let (cols, rows) = (3, 700);
    let input = mem_path("write-strips/green.tif");
    let output = mem_path("write-strips/ndwi.tif");
    write_test_raster(&input, cols, rows, vec![0.0f32; cols * rows], None);
    let (_, profile) = read_band(&input, 1).unwrap();

    let data = (0..cols * rows).map(|i| (i % 201) as f32 / 100.0 - 1.0).collect();
    let ndwi = Band::new(rows, cols, data).unwrap();
    write_ndwi(&output, &ndwi, &profile, &WriterOptions::default()).unwrap();

    let (written, _) = read_band(&output, 1).unwrap();
    assert_eq!(bits(&written), bits(&ndwi));
}

#[test]
fn blocked_job_requires_output() {
    let job = NdwiJob::new(mem_path("none/green.tif"), mem_path("none/nir.tif"));
    assert!(job.run_blocked(&ParallelProcessor::new(Some(1))).is_err());
}
