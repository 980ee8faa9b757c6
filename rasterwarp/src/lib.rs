//! # rasterwarp
//!
//! Reprojection et rééchantillonnage bilinéaire de rasters GeoTIFF mono-bande.
//!
//! ## Features
//!
//! - Géométrie cible par changement de CRS (emprise des coins reprojetés) ou de résolution
//! - Noyau bilinéaire avec gestion du NoData, parallélisé par lignes avec `rayon`
//! - Reprojection pure Rust (`reproject_lite`) : UTM, Gauss-Krüger CGCS2000, Lambert 93 / CC, Web Mercator
//! - Fallback PROJ pour tout autre code EPSG (feature `proj`)
//! - Codec GeoTIFF basé sur `tiff`, écriture atomique
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rasterwarp::{geotiff, Crs, TargetSpec};
//! use std::path::Path;
//!
//! let target = geotiff::read_crs(Path::new("reference.tif"))?;
//! let grid = geotiff::GeoTiffReader::open(Path::new("lai_2020_01a.tif"))?.read_grid()?;
//! let out = rasterwarp::warp(&grid, &TargetSpec::Crs { crs: target, resolution: None })?;
//! geotiff::write_grid(Path::new("out/lai_2020_01a.tif"), &out, geotiff::Compression::Lzw)?;
//! ```

pub mod crs;
pub mod error;
pub mod geometry;
pub mod geotiff;
pub mod reproject;
pub mod reproject_lite;
pub mod resample;
pub mod transform;
pub mod types;
pub mod warp;

pub use crs::Crs;
pub use error::{ErrorKind, WarpError};
pub use geometry::TargetGeometry;
pub use geotiff::read_crs;
pub use transform::CoordinateTransform;
pub use types::{GeoTransform, GridHeader, RasterGrid, TargetSpec};
pub use warp::{reproject, resample, warp, WarpPlan};
