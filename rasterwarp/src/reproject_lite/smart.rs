//! Reprojection intelligente : reproject_lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use super::ReprojectorLite;
use crate::crs::Crs;
use crate::transform::CoordinateTransform;
use crate::WarpError;

/// Reprojection intelligente
///
/// Essaie d'abord reproject_lite (pure Rust), puis fallback sur proj si disponible.
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "proj")]
    Proj(crate::reproject::Reprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source: &Crs, target: &Crs) -> Result<Self, WarpError> {
        // Pas de reprojection nécessaire
        if source.epsg() == target.epsg() {
            return Ok(Self::Identity);
        }

        // Essayer reproject_lite d'abord
        if ReprojectorLite::is_supported(source.epsg()) && ReprojectorLite::is_supported(target.epsg())
        {
            let lite = ReprojectorLite::new(source.epsg(), target.epsg())?;
            return Ok(Self::Lite(lite));
        }

        // Fallback sur proj si disponible
        #[cfg(feature = "proj")]
        {
            let proj = crate::reproject::Reprojector::new(source.epsg(), target.epsg())?;
            return Ok(Self::Proj(proj));
        }

        // Aucune option disponible
        #[cfg(not(feature = "proj"))]
        return Err(WarpError::InvalidCrs(format!(
            "Reprojection {} -> {} requires the 'proj' feature",
            source, target
        )));
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (pas de reprojection)",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "proj")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

impl CoordinateTransform for SmartReprojector {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError> {
        match self {
            Self::Identity => Ok((x, y)),
            Self::Lite(lite) => lite.transform_point(x, y),
            #[cfg(feature = "proj")]
            Self::Proj(proj) => proj.transform_point(x, y),
        }
    }

    fn transform_batch(&self, coords: &mut [(f64, f64)]) {
        match self {
            Self::Identity => {}
            Self::Lite(lite) => lite.transform_batch(coords),
            #[cfg(feature = "proj")]
            Self::Proj(proj) => proj.transform_batch(coords),
        }
    }

    fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}
