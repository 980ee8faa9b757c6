//! Calcul de la géométrie de la grille de sortie
//!
//! Deux modes : changement de CRS (emprise des coins reprojetés) et
//! changement de résolution (même origine, même CRS).

use geo::{BoundingRect, MultiPoint};
use tracing::debug;

use crate::crs::Crs;
use crate::transform::CoordinateTransform;
use crate::types::{GeoTransform, GridHeader};
use crate::WarpError;

/// Marge contre le bruit flottant lors de l'arrondi supérieur des dimensions
const CEIL_TOLERANCE: f64 = 1e-9;

/// Dimension maximale d'une grille écrite (offsets TIFF 32 bits)
const MAX_DIMENSION: f64 = u32::MAX as f64;

/// Géométrie d'une grille de sortie, calculée une fois avant rééchantillonnage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetGeometry {
    pub geotransform: GeoTransform,
    pub width: usize,
    pub height: usize,
    pub crs: Crs,
}

impl TargetGeometry {
    /// Mode changement de résolution : même CRS, même coin haut-gauche
    pub fn for_resolution(source: &GridHeader, resolution: f64) -> Result<Self, WarpError> {
        check_resolution(resolution)?;

        let (pw, ph) = source.geotransform.pixel_size();
        let width = to_dimension((source.width as f64 * pw.abs() / resolution).round())?;
        let height = to_dimension((source.height as f64 * ph.abs() / resolution).round())?;
        check_dimensions(width, height)?;

        let geotransform = GeoTransform::north_up(
            source.geotransform.origin_x(),
            source.geotransform.origin_y(),
            resolution.copysign(pw),
            resolution.copysign(ph),
        );

        debug!(
            width,
            height, resolution, "Target geometry computed (resolution mode)"
        );

        Ok(Self {
            geotransform,
            width,
            height,
            crs: source.crs,
        })
    }

    /// Mode changement de CRS : emprise englobante des quatre coins reprojetés
    ///
    /// `forward` transforme du CRS source vers `target`. Sans `resolution`,
    /// la taille de pixel conserve le nombre de pixels le long de la diagonale.
    pub fn for_crs(
        source: &GridHeader,
        forward: &dyn CoordinateTransform,
        target: Crs,
        resolution: Option<f64>,
    ) -> Result<Self, WarpError> {
        if let Some(res) = resolution {
            check_resolution(res)?;
        }

        if forward.is_identity() && keeps_source_pixel(source, resolution) {
            return Ok(Self {
                geotransform: source.geotransform,
                width: source.width,
                height: source.height,
                crs: target,
            });
        }

        let mut corners = Vec::with_capacity(4);
        for (x, y) in source.geotransform.corners(source.width, source.height) {
            corners.push(forward.transform_point(x, y)?);
        }

        let extent = MultiPoint::from(corners)
            .bounding_rect()
            .ok_or_else(|| WarpError::InvalidParameter("empty source extent".to_string()))?;

        let (span_x, span_y) = (extent.width(), extent.height());
        let res = match resolution {
            Some(res) => res,
            None => {
                let diag_px = ((source.width as f64).powi(2) + (source.height as f64).powi(2)).sqrt();
                let res = span_x.hypot(span_y) / diag_px;
                if !res.is_finite() || res <= 0.0 {
                    return Err(WarpError::DegenerateGrid { width: 0, height: 0 });
                }
                res
            }
        };

        let width = to_dimension((span_x / res - CEIL_TOLERANCE).ceil())?;
        let height = to_dimension((span_y / res - CEIL_TOLERANCE).ceil())?;
        check_dimensions(width, height)?;

        let geotransform = GeoTransform::north_up(extent.min().x, extent.max().y, res, -res);

        debug!(
            target = %target,
            width,
            height,
            resolution = res,
            "Target geometry computed (CRS mode)"
        );

        Ok(Self {
            geotransform,
            width,
            height,
            crs: target,
        })
    }

    /// En-tête de la grille de sortie
    pub fn header(&self, nodata: Option<f64>) -> GridHeader {
        GridHeader {
            width: self.width,
            height: self.height,
            geotransform: self.geotransform,
            crs: self.crs,
            nodata,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

/// Vrai si la taille de pixel demandée est celle de la source (pixels carrés)
fn keeps_source_pixel(source: &GridHeader, resolution: Option<f64>) -> bool {
    let Some(res) = resolution else {
        return true;
    };
    let gt = &source.geotransform;
    let (pw, ph) = (gt.pixel_width().abs(), gt.pixel_height().abs());
    gt.is_axis_aligned() && pw == ph && (res - pw).abs() <= pw * 1e-12
}

fn check_resolution(resolution: f64) -> Result<(), WarpError> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(WarpError::InvalidParameter(format!(
            "resolution must be a positive number, got {}",
            resolution
        )));
    }
    Ok(())
}

/// Convertit un nombre de pixels calculé en flottant, borné à la limite TIFF
fn to_dimension(pixels: f64) -> Result<usize, WarpError> {
    if !pixels.is_finite() || pixels > MAX_DIMENSION {
        return Err(WarpError::InvalidParameter(format!(
            "output grid of {} pixels per axis exceeds the TIFF limit of {}",
            pixels,
            u32::MAX
        )));
    }
    Ok(pixels.max(0.0) as usize)
}

fn check_dimensions(width: usize, height: usize) -> Result<(), WarpError> {
    if width == 0 || height == 0 {
        return Err(WarpError::DegenerateGrid { width, height });
    }
    let fits = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .map_or(false, |bytes| bytes <= isize::MAX as usize);
    if !fits {
        return Err(WarpError::InvalidParameter(format!(
            "output grid {}x{} is too large to allocate",
            width, height
        )));
    }
    Ok(())
}
