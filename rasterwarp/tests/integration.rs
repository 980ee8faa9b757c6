//! Tests d'intégration : lecture, warp et écriture de vrais fichiers GeoTIFF

use std::path::Path;

use rasterwarp::geotiff::{self, Compression, GeoTiffReader};
use rasterwarp::{Crs, ErrorKind, GeoTransform, GridHeader, RasterGrid, TargetSpec};

fn lai_tile(path: &Path, width: usize, height: usize) -> RasterGrid {
    let header = GridHeader {
        width,
        height,
        geotransform: GeoTransform::north_up(500000.0, 3600000.0, 500.0, -500.0),
        crs: Crs::from_epsg(32649).unwrap(),
        nodata: Some(255.0),
    };
    let data = (0..width * height)
        .map(|i| {
            if i % 17 == 0 {
                255.0
            } else {
                (i % 70) as f32 / 10.0
            }
        })
        .collect();
    let grid = RasterGrid::new(header, data).unwrap();
    geotiff::write_grid(path, &grid, Compression::Lzw).unwrap();
    grid
}

#[test]
fn test_identity_roundtrip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("lai.tif");
    let src = lai_tile(&src_path, 30, 20);

    let reference = geotiff::read_crs(&src_path).unwrap();
    let grid = GeoTiffReader::open(&src_path).unwrap().read_grid().unwrap();
    let out = rasterwarp::warp(
        &grid,
        &TargetSpec::Crs {
            crs: reference,
            resolution: None,
        },
    )
    .unwrap();

    assert_eq!(out.geotransform(), src.geotransform());
    for (a, b) in out.data().iter().zip(src.data()) {
        if *b == 255.0 {
            assert_eq!(*a, 0.0);
        } else {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_reproject_and_write() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("lai.tif");
    lai_tile(&src_path, 40, 40);

    let grid = GeoTiffReader::open(&src_path).unwrap().read_grid().unwrap();
    let target = Crs::parse("EPSG:4546").unwrap();
    let out = rasterwarp::reproject(&grid, target, Some(1000.0)).unwrap();

    let out_path = dir.path().join("lai_cgcs2000.tif");
    geotiff::write_grid(&out_path, &out, Compression::Deflate).unwrap();

    let back = GeoTiffReader::open(&out_path).unwrap();
    assert_eq!(back.header().crs.epsg(), 4546);
    assert_eq!(back.header().nodata, Some(0.0));
    assert_eq!(back.header().geotransform.pixel_size(), (1000.0, -1000.0));
    let back = back.read_grid().unwrap();
    assert!(back.data().iter().all(|&v| (0.0..=6.9).contains(&v)));
}

#[test]
fn test_resample_dimensions_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("lai.tif");
    lai_tile(&src_path, 12, 6);

    let reader = GeoTiffReader::open(&src_path).unwrap();
    let plan = rasterwarp::WarpPlan::new(reader.header(), &TargetSpec::Resolution(30.0)).unwrap();
    assert_eq!(plan.geometry().width, 200);
    assert_eq!(plan.geometry().height, 100);

    let grid = reader.read_grid().unwrap();
    let out = plan.execute(&grid).unwrap();
    assert_eq!(out.data().len(), 200 * 100);
}

#[test]
fn test_unsupported_target_crs() {
    // Sans la feature proj, les codes hors reproject_lite sont rejetés dès le parsing
    if rasterwarp::reproject::is_available() {
        return;
    }
    let err = Crs::parse("EPSG:27700").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCrs);
}
