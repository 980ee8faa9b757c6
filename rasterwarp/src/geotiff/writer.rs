//! Écriture de GeoTIFF mono-bande f32
//!
//! Le fichier est écrit dans un temporaire du répertoire de destination puis
//! renommé, de sorte qu'un échec ne laisse jamais de sortie partielle.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::str::FromStr;

use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::{DeflateLevel, DirectoryEncoder, TiffEncoder, TiffKind};
use tracing::debug;

use super::keys;
use crate::types::RasterGrid;
use crate::WarpError;

/// Compression des fichiers écrits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    #[default]
    Lzw,
    Deflate,
}

impl Compression {
    fn to_tiff(self) -> tiff::encoder::Compression {
        match self {
            Self::None => tiff::encoder::Compression::Uncompressed,
            Self::Lzw => tiff::encoder::Compression::Lzw,
            Self::Deflate => tiff::encoder::Compression::Deflate(DeflateLevel::Balanced),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Lzw => "lzw",
            Self::Deflate => "deflate",
        };
        f.write_str(s)
    }
}

impl FromStr for Compression {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lzw" => Ok(Self::Lzw),
            "deflate" => Ok(Self::Deflate),
            other => Err(WarpError::InvalidParameter(format!(
                "unknown compression '{}' (expected none, lzw or deflate)",
                other
            ))),
        }
    }
}

/// Écrit une grille en GeoTIFF, de façon atomique
pub fn write_grid(path: &Path, grid: &RasterGrid, compression: Compression) -> Result<(), WarpError> {
    write_atomic(path, |file| {
        let mut writer = BufWriter::new(file);
        encode(&mut writer, grid, compression)?;
        writer.flush()?;
        Ok(())
    })?;

    debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        compression = %compression,
        "GeoTIFF written"
    );
    Ok(())
}

/// Écrit un GeoTIFF déjà encodé (voir [`encode`]), de façon atomique
pub fn write_encoded(path: &Path, bytes: &[u8]) -> Result<(), WarpError> {
    write_atomic(path, |file| {
        file.write_all(bytes)?;
        Ok(())
    })?;

    debug!(path = %path.display(), bytes = bytes.len(), "GeoTIFF written");
    Ok(())
}

/// Écrit dans un temporaire du répertoire cible puis renomme
fn write_atomic<F>(path: &Path, fill: F) -> Result<(), WarpError>
where
    F: FnOnce(&mut File) -> Result<(), WarpError>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".rasterwarp-")
        .suffix(".part")
        .tempfile_in(dir)?;

    fill(tmp.as_file_mut())?;

    // Les temporaires sont créés en 0600
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| WarpError::Io(e.error))?;
    Ok(())
}

/// Encode une grille en GeoTIFF dans un flux
pub fn encode<W: Write + Seek>(
    writer: W,
    grid: &RasterGrid,
    compression: Compression,
) -> Result<(), WarpError> {
    let width = u32::try_from(grid.width())
        .map_err(|_| WarpError::invalid_raster("width exceeds TIFF limits"))?;
    let height = u32::try_from(grid.height())
        .map_err(|_| WarpError::invalid_raster("height exceeds TIFF limits"))?;

    let mut encoder = TiffEncoder::new(writer)?.with_compression(compression.to_tiff());
    let mut image = encoder.new_image::<Gray32Float>(width, height)?;
    write_geotiff_tags(image.encoder(), grid)?;
    image.write_data(grid.data())?;
    Ok(())
}

fn write_geotiff_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    grid: &RasterGrid,
) -> Result<(), WarpError> {
    let gt = grid.geotransform();

    if gt.is_axis_aligned() && gt.pixel_height() < 0.0 {
        // ModelPixelScale [ScaleX, ScaleY, ScaleZ] + ModelTiepoint [I, J, K, X, Y, Z]
        let scale = [gt.pixel_width(), -gt.pixel_height(), 0.0];
        dir.write_tag(keys::MODEL_PIXEL_SCALE, &scale[..])?;
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x(), gt.origin_y(), 0.0];
        dir.write_tag(keys::MODEL_TIEPOINT, &tiepoint[..])?;
    } else {
        let g = gt.0;
        #[rustfmt::skip]
        let matrix = [
            g[1], g[2], 0.0, g[0],
            g[4], g[5], 0.0, g[3],
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(keys::MODEL_TRANSFORMATION, &matrix[..])?;
    }

    let crs = grid.crs();
    let citation = format!("{}|", crs.name());
    let directory = keys::build_directory(crs.epsg(), crs.is_geographic(), citation.len());
    dir.write_tag(keys::GEO_KEY_DIRECTORY, &directory[..])?;
    dir.write_tag(keys::GEO_ASCII_PARAMS, citation.as_str())?;

    if let Some(nodata) = grid.nodata() {
        dir.write_tag(keys::GDAL_NODATA, format_nodata(nodata).as_str())?;
    }

    Ok(())
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", value)
    }
}
