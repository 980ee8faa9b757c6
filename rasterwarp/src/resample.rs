//! Noyau de rééchantillonnage bilinéaire
//!
//! Les pixels de sortie sont traités par bandes de lignes : les centres d'une
//! bande sont transformés en lot, puis chaque ligne est échantillonnée en
//! parallèle dans sa propre tranche du tampon de sortie.

use rayon::prelude::*;
use tracing::trace;

use crate::geometry::TargetGeometry;
use crate::transform::CoordinateTransform;
use crate::types::RasterGrid;
use crate::WarpError;

/// Valeur NoData de la grille de sortie
pub const DST_NODATA: f32 = 0.0;

/// Lignes de sortie transformées par lot
const BAND_ROWS: usize = 64;

/// Écart en deçà duquel une position est ramenée sur le centre d'un pixel
const SNAP_EPSILON: f64 = 1e-9;

/// Décompose une position continue en (indice, poids du voisin suivant)
#[inline]
fn split(pos: f64) -> (f64, f64) {
    let base = pos.floor();
    let frac = pos - base;
    if frac < SNAP_EPSILON {
        (base, 0.0)
    } else if 1.0 - frac < SNAP_EPSILON {
        (base + 1.0, 0.0)
    } else {
        (base, frac)
    }
}

/// Interpolation bilinéaire en `(u, v)`, coordonnées pixel centrées
/// (`u = 0` au centre de la première colonne).
///
/// Retourne `None` si un des voisins utilisés est hors de la grille ou NoData.
/// Un voisin de poids nul n'est pas consulté.
#[inline]
pub fn bilinear(grid: &RasterGrid, u: f64, v: f64) -> Option<f32> {
    if !u.is_finite() || !v.is_finite() {
        return None;
    }

    let (x0, fx) = split(u);
    let (y0, fy) = split(v);

    let (width, height) = (grid.width() as f64, grid.height() as f64);
    let x_last = if fx > 0.0 { x0 + 1.0 } else { x0 };
    let y_last = if fy > 0.0 { y0 + 1.0 } else { y0 };
    if x0 < 0.0 || y0 < 0.0 || x_last >= width || y_last >= height {
        return None;
    }
    let (c0, r0) = (x0 as usize, y0 as usize);

    let mut acc = 0.0_f64;
    for (dr, wy) in [(0usize, 1.0 - fy), (1, fy)] {
        if wy == 0.0 {
            continue;
        }
        for (dc, wx) in [(0usize, 1.0 - fx), (1, fx)] {
            if wx == 0.0 {
                continue;
            }
            let value = grid.get(c0 + dc, r0 + dr)?;
            if grid.is_nodata(value) {
                return None;
            }
            acc += wx * wy * value as f64;
        }
    }

    Some(acc as f32)
}

/// Rééchantillonne `source` sur la géométrie cible.
///
/// `inverse` transforme du CRS cible vers le CRS source. Un centre de pixel
/// dont la transformation échoue donne NoData.
pub fn warp_into(
    source: &RasterGrid,
    target: &TargetGeometry,
    inverse: &dyn CoordinateTransform,
) -> Result<Vec<f32>, WarpError> {
    let src_inv = source.geotransform().invert()?;
    let dst_gt = target.geotransform;
    let width = target.width;
    let identity = inverse.is_identity();

    if target.width == 0 || target.height == 0 {
        return Err(WarpError::DegenerateGrid {
            width: target.width,
            height: target.height,
        });
    }
    let pixels = target.pixel_count();
    let mut out: Vec<f32> = Vec::new();
    out.try_reserve_exact(pixels).map_err(|e| {
        WarpError::InvalidParameter(format!(
            "cannot allocate {}x{} output grid: {}",
            target.width, target.height, e
        ))
    })?;
    out.resize(pixels, DST_NODATA);
    let mut coords: Vec<(f64, f64)> = Vec::with_capacity(BAND_ROWS * width);

    for (band, chunk) in out.chunks_mut(BAND_ROWS * width).enumerate() {
        let first_row = band * BAND_ROWS;
        let rows = chunk.len() / width;

        coords.clear();
        coords.extend((0..rows * width).map(|i| {
            let (r, c) = (first_row + i / width, i % width);
            dst_gt.apply(c as f64 + 0.5, r as f64 + 0.5)
        }));
        if !identity {
            inverse.transform_batch(&mut coords);
        }

        let coords = &coords;
        chunk
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| {
                let row_coords = &coords[i * width..(i + 1) * width];
                for (px, &(x, y)) in row.iter_mut().zip(row_coords) {
                    if x.is_nan() || y.is_nan() {
                        continue;
                    }
                    let (col, line) = src_inv.apply(x, y);
                    if let Some(value) = bilinear(source, col - 0.5, line - 0.5) {
                        *px = value;
                    }
                }
            });

        trace!(first_row, rows, "Band resampled");
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use crate::reproject_lite::SmartReprojector;
    use crate::types::{GeoTransform, GridHeader};

    fn grid(width: usize, height: usize, data: Vec<f32>, nodata: Option<f64>) -> RasterGrid {
        let header = GridHeader {
            width,
            height,
            geotransform: GeoTransform::north_up(0.0, height as f64, 1.0, -1.0),
            crs: Crs::from_epsg(32649).unwrap(),
            nodata,
        };
        RasterGrid::new(header, data).unwrap()
    }

    #[test]
    fn test_bilinear_center_and_midpoint() {
        let g = grid(2, 2, vec![1.0, 2.0, 3.0, 4.0], None);
        assert_eq!(bilinear(&g, 0.0, 0.0), Some(1.0));
        assert_eq!(bilinear(&g, 1.0, 1.0), Some(4.0));
        assert_eq!(bilinear(&g, 0.5, 0.5), Some(2.5));
        assert_eq!(bilinear(&g, 0.5, 0.0), Some(1.5));
    }

    #[test]
    fn test_bilinear_within_neighbor_bounds() {
        let g = grid(2, 2, vec![3.0, 7.0, -2.0, 11.0], None);
        for &(u, v) in &[(0.1, 0.2), (0.9, 0.3), (0.5, 0.99), (0.33, 0.66)] {
            let value = bilinear(&g, u, v).unwrap();
            assert!((-2.0..=11.0).contains(&value), "value={}", value);
        }
    }

    #[test]
    fn test_bilinear_outside() {
        let g = grid(2, 2, vec![1.0, 2.0, 3.0, 4.0], None);
        assert_eq!(bilinear(&g, -0.2, 0.0), None);
        assert_eq!(bilinear(&g, 1.2, 0.0), None);
        assert_eq!(bilinear(&g, 0.0, 1.5), None);
        assert_eq!(bilinear(&g, f64::NAN, 0.0), None);
    }

    #[test]
    fn test_bilinear_nodata_neighbor() {
        let g = grid(2, 2, vec![1.0, -9999.0, 3.0, 4.0], Some(-9999.0));
        assert_eq!(bilinear(&g, 0.5, 0.5), None);
        // Le voisin NoData a un poids nul
        assert_eq!(bilinear(&g, 0.0, 0.5), Some(2.0));

        let g = grid(2, 2, vec![1.0, f32::NAN, 3.0, 4.0], None);
        assert_eq!(bilinear(&g, 0.5, 0.5), None);
    }

    #[test]
    fn test_warp_identity_is_exact() {
        let data: Vec<f32> = (0..35).map(|v| v as f32 * 1.25 + 0.1).collect();
        let src = grid(7, 5, data.clone(), None);
        let identity = SmartReprojector::new(src.crs(), src.crs()).unwrap();
        let target = TargetGeometry::for_crs(src.header(), &identity, *src.crs(), None).unwrap();

        let out = warp_into(&src, &target, &identity).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_warp_many_bands() {
        let (w, h) = (3, BAND_ROWS * 2 + 5);
        let data: Vec<f32> = (0..w * h).map(|v| v as f32).collect();
        let src = grid(w, h, data.clone(), None);
        let identity = SmartReprojector::new(src.crs(), src.crs()).unwrap();
        let target = TargetGeometry::for_crs(src.header(), &identity, *src.crs(), None).unwrap();

        let out = warp_into(&src, &target, &identity).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_warp_nodata_propagates() {
        let src = grid(3, 3, vec![1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0], Some(-1.0));
        let identity = SmartReprojector::new(src.crs(), src.crs()).unwrap();
        let target = TargetGeometry::for_crs(src.header(), &identity, *src.crs(), None).unwrap();

        let out = warp_into(&src, &target, &identity).unwrap();
        assert_eq!(out[4], DST_NODATA);
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn test_warp_upsample() {
        // Pixels 1 m → 0.5 m: la couronne extérieure tombe hors des centres sources
        let src = grid(2, 2, vec![10.0, 20.0, 30.0, 40.0], None);
        let target = TargetGeometry::for_resolution(src.header(), 0.5).unwrap();
        let identity = SmartReprojector::new(src.crs(), src.crs()).unwrap();

        let out = warp_into(&src, &target, &identity).unwrap();
        assert_eq!((target.width, target.height), (4, 4));
        let n = DST_NODATA;
        #[rustfmt::skip]
        let expected = vec![
            n, n, n, n,
            n, 17.5, 22.5, n,
            n, 27.5, 32.5, n,
            n, n, n, n,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_warp_oversized_target_is_an_error() {
        let src = grid(2, 2, vec![1.0, 2.0, 3.0, 4.0], None);
        let identity = SmartReprojector::new(src.crs(), src.crs()).unwrap();
        let side = u32::MAX as usize;
        let target = TargetGeometry {
            geotransform: GeoTransform::north_up(0.0, 2.0, 1e-9, -1e-9),
            width: side,
            height: side,
            crs: *src.crs(),
        };

        let err = warp_into(&src, &target, &identity).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);

        let empty = TargetGeometry { width: 0, ..target };
        let err = warp_into(&src, &empty, &identity).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DegenerateGrid);
    }
}
