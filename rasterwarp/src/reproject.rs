//! Reprojection de coordonnées avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `proj`.

#[cfg(feature = "proj")]
use proj::Proj;

#[cfg(feature = "proj")]
use crate::transform::CoordinateTransform;
#[cfg(feature = "proj")]
use crate::WarpError;

/// Reprojection de coordonnées entre deux systèmes via PROJ
///
/// `Proj` n'est pas partageable entre threads : les lots sont transformés
/// séquentiellement, seul l'échantillonnage est parallélisé.
#[cfg(feature = "proj")]
pub struct Reprojector {
    proj: Proj,
}

#[cfg(feature = "proj")]
impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, WarpError> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            WarpError::InvalidCrs(format!(
                "Failed to create projection from {} to {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self { proj })
    }
}

#[cfg(feature = "proj")]
impl CoordinateTransform for Reprojector {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError> {
        let (tx, ty) = self
            .proj
            .convert((x, y))
            .map_err(|e| WarpError::transform(x, y, e.to_string()))?;
        if !tx.is_finite() || !ty.is_finite() {
            return Err(WarpError::transform(x, y, "non-finite result"));
        }
        Ok((tx, ty))
    }

    /// Conversion batch, beaucoup plus rapide que point par point.
    /// En cas d'échec du lot, repli point par point pour isoler les points invalides.
    fn transform_batch(&self, coords: &mut [(f64, f64)]) {
        let original = coords.to_vec();
        if self.proj.convert_array(coords).is_ok() {
            for c in coords.iter_mut() {
                if !c.0.is_finite() || !c.1.is_finite() {
                    *c = (f64::NAN, f64::NAN);
                }
            }
            return;
        }

        for (c, &(x, y)) in coords.iter_mut().zip(original.iter()) {
            *c = self.transform_point(x, y).unwrap_or((f64::NAN, f64::NAN));
        }
    }
}

#[cfg(feature = "proj")]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambert93_to_wgs84() {
        // Paris (environ) - Lambert-93: X=652381, Y=6862047
        let reprojector = Reprojector::new(2154, 4326).unwrap();
        let (lon, lat) = reprojector.transform_point(652381.0, 6862047.0).unwrap();

        assert!(lon > 2.0 && lon < 3.0, "Longitude should be around 2.35, got {}", lon);
        assert!(lat > 48.0 && lat < 49.0, "Latitude should be around 48.85, got {}", lat);
    }

    #[test]
    fn test_batch_transform() {
        let reprojector = Reprojector::new(2154, 4326).unwrap();
        let mut coords = vec![(652381.0, 6862047.0), (652481.0, 6862147.0)];
        reprojector.transform_batch(&mut coords);

        for (lon, lat) in coords {
            assert!(lon > 2.0 && lon < 3.0);
            assert!(lat > 48.0 && lat < 49.0);
        }
    }

    #[test]
    fn test_british_national_grid() {
        // Hors du périmètre de reproject_lite
        let reprojector = Reprojector::new(27700, 4326).unwrap();
        let (lon, lat) = reprojector.transform_point(530000.0, 180000.0).unwrap();
        assert!((lon - (-0.12)).abs() < 0.1, "lon={}", lon);
        assert!((lat - 51.5).abs() < 0.1, "lat={}", lat);
    }

    #[test]
    fn test_invalid_epsg() {
        let result = Reprojector::new(99999, 4326);
        assert!(result.is_err());
    }
}

/// Vérifie si la reprojection PROJ est disponible
pub fn is_available() -> bool {
    cfg!(feature = "proj")
}
