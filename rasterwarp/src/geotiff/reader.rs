//! Lecture de GeoTIFF mono-bande

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

use super::keys::{self, GeoKeys};
use crate::crs::Crs;
use crate::types::{GeoTransform, GridHeader, RasterGrid};
use crate::WarpError;

/// Lecteur GeoTIFF : l'en-tête est lu à l'ouverture, les pixels à la demande
pub struct GeoTiffReader {
    decoder: Decoder<BufReader<File>>,
    header: GridHeader,
    path: PathBuf,
}

impl GeoTiffReader {
    /// Ouvre un fichier et lit son géoréférencement
    pub fn open(path: &Path) -> Result<Self, WarpError> {
        let mut decoder = open_decoder(path)?;

        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(WarpError::invalid_raster(format!(
                    "only single-band rasters are supported, got {:?}",
                    other
                )))
            }
        }

        let (width, height) = decoder.dimensions()?;
        let geokeys = read_geokeys(&mut decoder)?;
        let crs = crs_from_geokeys(geokeys.as_ref())?;
        let geotransform = read_geotransform(&mut decoder, geokeys.as_ref())?;
        geotransform.validate()?;
        let nodata = read_nodata(&mut decoder)?;

        let header = GridHeader {
            width: width as usize,
            height: height as usize,
            geotransform,
            crs,
            nodata,
        };

        debug!(
            path = %path.display(),
            width,
            height,
            crs = %crs,
            nodata = ?nodata,
            "GeoTIFF header read"
        );

        Ok(Self {
            decoder,
            header,
            path: path.to_path_buf(),
        })
    }

    /// En-tête (dimensions, géotransformation, CRS, NoData)
    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    /// Lit les pixels et les convertit en f32
    pub fn read_grid(mut self) -> Result<RasterGrid, WarpError> {
        let data = match self.decoder.read_image()? {
            DecodingResult::U8(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::U16(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::I8(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::I16(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
            DecodingResult::F32(v) => v,
            DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(WarpError::invalid_raster(format!(
                    "unsupported sample type in {}",
                    self.path.display()
                )))
            }
        };

        RasterGrid::new(self.header, data)
    }
}

/// Lit uniquement le CRS d'un raster (sans les pixels ni la géotransformation)
pub fn read_crs(path: &Path) -> Result<Crs, WarpError> {
    let mut decoder = open_decoder(path)?;
    let geokeys = read_geokeys(&mut decoder)?;
    let crs = crs_from_geokeys(geokeys.as_ref())?;
    debug!(path = %path.display(), crs = %crs, "CRS read");
    Ok(crs)
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, WarpError> {
    let file = File::open(path)?;
    let decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());
    Ok(decoder)
}

fn read_f64s<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> Result<Option<Vec<f64>>, WarpError> {
    match decoder.find_tag(tag)? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoKeys>, WarpError> {
    match decoder.find_tag(keys::GEO_KEY_DIRECTORY)? {
        Some(value) => Ok(GeoKeys::parse(&value.into_u16_vec()?)),
        None => Ok(None),
    }
}

fn crs_from_geokeys(geokeys: Option<&GeoKeys>) -> Result<Crs, WarpError> {
    let geokeys =
        geokeys.ok_or_else(|| WarpError::InvalidCrs("no GeoKey directory".to_string()))?;
    let (epsg, geographic) = geokeys
        .epsg()
        .ok_or_else(|| WarpError::InvalidCrs("no EPSG code in GeoKeys".to_string()))?;
    Crs::from_geokeys(epsg, geographic)
}

fn read_geotransform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    geokeys: Option<&GeoKeys>,
) -> Result<GeoTransform, WarpError> {
    let mut gt = if let Some(m) = read_f64s(decoder, keys::MODEL_TRANSFORMATION)? {
        if m.len() < 8 {
            return Err(WarpError::invalid_raster("ModelTransformation tag too short"));
        }
        GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]])
    } else {
        let tiepoint = read_f64s(decoder, keys::MODEL_TIEPOINT)?;
        let scale = read_f64s(decoder, keys::MODEL_PIXEL_SCALE)?;
        match (tiepoint, scale) {
            (Some(tp), Some(sc)) if tp.len() >= 6 && sc.len() >= 2 => {
                let (i, j, x, y) = (tp[0], tp[1], tp[3], tp[4]);
                let (sx, sy) = (sc[0], sc[1]);
                GeoTransform::north_up(x - i * sx, y + j * sy, sx, -sy)
            }
            _ => return Err(WarpError::invalid_raster("missing georeferencing tags")),
        }
    };

    // PixelIsPoint: la géotransformation référence le coin du pixel
    if geokeys.is_some_and(GeoKeys::is_pixel_is_point) {
        let (x, y) = gt.apply(-0.5, -0.5);
        gt.0[0] = x;
        gt.0[3] = y;
    }

    Ok(gt)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>, WarpError> {
    let Some(value) = decoder.find_tag(keys::GDAL_NODATA)? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    let text = text.trim_matches(char::from(0)).trim();
    if text.eq_ignore_ascii_case("nan") {
        return Ok(Some(f64::NAN));
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| WarpError::invalid_raster(format!("invalid GDAL_NODATA value '{}'", text)))
}
