//! Types de données pour le crate rasterwarp

use geo::{coord, Rect};

use crate::crs::Crs;
use crate::WarpError;

/// Tolérance sur le déterminant d'une géotransformation
const DET_EPSILON: f64 = 1e-15;

/// Géotransformation affine pixel/ligne → coordonnées géoréférencées
///
/// Coefficients `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]` :
/// `x = ox + col·pw + row·rr`, `y = oy + col·cr + row·ph`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Géotransformation nord en haut (sans rotation)
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn origin_x(&self) -> f64 {
        self.0[0]
    }

    pub fn origin_y(&self) -> f64 {
        self.0[3]
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    /// Taille de pixel (largeur, hauteur) signée
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1], self.0[5])
    }

    /// Sans rotation ni cisaillement
    pub fn is_axis_aligned(&self) -> bool {
        self.0[2] == 0.0 && self.0[4] == 0.0
    }

    /// Pixel/ligne (continus) → coordonnées
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let g = &self.0;
        (
            g[0] + col * g[1] + row * g[2],
            g[3] + col * g[4] + row * g[5],
        )
    }

    /// Géotransformation inverse (coordonnées → pixel/ligne)
    pub fn invert(&self) -> Result<GeoTransform, WarpError> {
        let g = &self.0;

        // Cas courant sans rotation: inversion directe
        if self.is_axis_aligned() {
            if g[1] == 0.0 || g[5] == 0.0 {
                return Err(WarpError::InvalidParameter(
                    "geotransform has a zero pixel size".to_string(),
                ));
            }
            return Ok(GeoTransform([
                -g[0] / g[1],
                1.0 / g[1],
                0.0,
                -g[3] / g[5],
                0.0,
                1.0 / g[5],
            ]));
        }

        let det = g[1] * g[5] - g[2] * g[4];
        if det.abs() < DET_EPSILON {
            return Err(WarpError::InvalidParameter(
                "geotransform is not invertible".to_string(),
            ));
        }
        let inv_det = 1.0 / det;

        Ok(GeoTransform([
            (g[2] * g[3] - g[0] * g[5]) * inv_det,
            g[5] * inv_det,
            -g[2] * inv_det,
            (-g[1] * g[3] + g[0] * g[4]) * inv_det,
            -g[4] * inv_det,
            g[1] * inv_det,
        ]))
    }

    /// Vérifie que la géotransformation est exploitable
    pub fn validate(&self) -> Result<(), WarpError> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return Err(WarpError::invalid_raster("non-finite geotransform"));
        }
        if self.0[1] == 0.0 || self.0[5] == 0.0 {
            return Err(WarpError::invalid_raster("zero pixel size in geotransform"));
        }
        Ok(())
    }

    /// Coins de la grille (haut-gauche, haut-droit, bas-droit, bas-gauche)
    pub fn corners(&self, width: usize, height: usize) -> [(f64, f64); 4] {
        let (w, h) = (width as f64, height as f64);
        [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(w, h),
            self.apply(0.0, h),
        ]
    }

    /// Emprise englobante de la grille
    pub fn bounds(&self, width: usize, height: usize) -> Rect<f64> {
        let corners = self.corners(width, height);
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y })
    }
}

/// En-tête d'un raster : tout sauf les pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
    pub crs: Crs,
    /// Valeur sentinelle NoData
    pub nodata: Option<f64>,
}

impl GridHeader {
    /// Nombre de pixels
    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

/// Grille raster mono-bande en f32, ordre ligne par ligne
#[derive(Debug, Clone)]
pub struct RasterGrid {
    header: GridHeader,
    data: Vec<f32>,
}

impl RasterGrid {
    /// Crée une grille ; la taille des données doit valoir `width * height`
    pub fn new(header: GridHeader, data: Vec<f32>) -> Result<Self, WarpError> {
        let expected = header
            .width
            .checked_mul(header.height)
            .ok_or_else(|| WarpError::invalid_raster("grid dimensions overflow"))?;
        if data.len() != expected {
            return Err(WarpError::invalid_raster(format!(
                "expected {} samples for {}x{}, got {}",
                expected,
                header.width,
                header.height,
                data.len()
            )));
        }
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn width(&self) -> usize {
        self.header.width
    }

    pub fn height(&self) -> usize {
        self.header.height
    }

    pub fn geotransform(&self) -> &GeoTransform {
        &self.header.geotransform
    }

    pub fn crs(&self) -> &Crs {
        &self.header.crs
    }

    pub fn nodata(&self) -> Option<f64> {
        self.header.nodata
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Valeur d'un pixel, None hors de la grille
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.header.width || row >= self.header.height {
            return None;
        }
        self.data.get(row * self.header.width + col).copied()
    }

    /// Vrai pour la sentinelle NoData ou NaN
    #[inline]
    pub fn is_nodata(&self, v: f32) -> bool {
        if v.is_nan() {
            return true;
        }
        match self.header.nodata {
            Some(nd) => v == nd as f32,
            None => false,
        }
    }
}

/// Cible partagée par tous les fichiers d'un lot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSpec {
    /// Reprojection vers un CRS, taille de pixel optionnelle
    Crs { crs: Crs, resolution: Option<f64> },
    /// Rééchantillonnage dans le CRS source
    Resolution(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: usize, height: usize) -> GridHeader {
        GridHeader {
            width,
            height,
            geotransform: GeoTransform::north_up(500000.0, 3500000.0, 500.0, -500.0),
            crs: Crs::from_epsg(32649).unwrap(),
            nodata: Some(-9999.0),
        }
    }

    #[test]
    fn test_apply_and_invert() {
        let gt = GeoTransform::north_up(500000.0, 3500000.0, 500.0, -500.0);
        assert_eq!(gt.apply(2.0, 3.0), (501000.0, 3498500.0));

        let inv = gt.invert().unwrap();
        let (col, row) = inv.apply(501000.0, 3498500.0);
        assert!((col - 2.0).abs() < 1e-9);
        assert!((row - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_invert_rotated() {
        let gt = GeoTransform([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
        let inv = gt.invert().unwrap();
        let (x, y) = gt.apply(7.5, 3.25);
        let (col, row) = inv.apply(x, y);
        assert!((col - 7.5).abs() < 1e-9);
        assert!((row - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_invert_singular() {
        let gt = GeoTransform([0.0, 1.0, 2.0, 0.0, 0.5, 1.0]);
        assert!(gt.invert().is_err());
        assert!(GeoTransform::north_up(0.0, 0.0, 0.0, -1.0).invert().is_err());
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::north_up(500000.0, 3500000.0, 500.0, -500.0);
        let r = gt.bounds(4, 2);
        assert_eq!(r.min().x, 500000.0);
        assert_eq!(r.max().x, 502000.0);
        assert_eq!(r.min().y, 3499000.0);
        assert_eq!(r.max().y, 3500000.0);
    }

    #[test]
    fn test_grid_length_checked() {
        assert!(RasterGrid::new(header(3, 2), vec![0.0; 6]).is_ok());
        let err = RasterGrid::new(header(3, 2), vec![0.0; 5]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidRaster);
    }

    #[test]
    fn test_get_and_nodata() {
        let grid = RasterGrid::new(header(2, 2), vec![1.0, 2.0, -9999.0, f32::NAN]).unwrap();
        assert_eq!(grid.get(1, 0), Some(2.0));
        assert_eq!(grid.get(2, 0), None);
        assert!(grid.is_nodata(grid.get(0, 1).unwrap()));
        assert!(grid.is_nodata(grid.get(1, 1).unwrap()));
        assert!(!grid.is_nodata(1.0));
    }
}
