//! Codec GeoTIFF mono-bande
//!
//! - Lecture : entiers 8 à 64 bits signés ou non, flottants 32/64 bits,
//!   bandes ou tuiles, géoréférencement par ModelTransformation ou
//!   ModelTiepoint + ModelPixelScale, NoData GDAL
//! - Écriture : f32, GeoKeys, NoData GDAL, compression none/LZW/Deflate

mod keys;
mod reader;
mod writer;

pub use reader::{read_crs, GeoTiffReader};
pub use writer::{encode, write_encoded, write_grid, Compression};
