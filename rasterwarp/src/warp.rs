//! Orchestration du warp : géométrie cible, transformation inverse, rééchantillonnage

use tracing::debug;

use crate::crs::Crs;
use crate::geometry::TargetGeometry;
use crate::reproject_lite::SmartReprojector;
use crate::resample::{self, DST_NODATA};
use crate::transform::CoordinateTransform;
use crate::types::{GridHeader, RasterGrid, TargetSpec};
use crate::WarpError;

/// Warp préparé à partir du seul en-tête source
///
/// Permet de connaître la taille de la sortie avant de lire les pixels.
pub struct WarpPlan {
    geometry: TargetGeometry,
    /// Cible → source
    inverse: SmartReprojector,
}

impl WarpPlan {
    /// Calcule la géométrie cible et prépare la transformation inverse
    pub fn new(source: &GridHeader, spec: &TargetSpec) -> Result<Self, WarpError> {
        match *spec {
            TargetSpec::Crs { crs, resolution } => {
                let forward = SmartReprojector::new(&source.crs, &crs)?;
                let geometry = TargetGeometry::for_crs(source, &forward, crs, resolution)?;
                let inverse = SmartReprojector::new(&crs, &source.crs)?;
                debug!(
                    source = %source.crs,
                    target = %crs,
                    backend = inverse.description(),
                    "Reprojection planned"
                );
                Ok(Self { geometry, inverse })
            }
            TargetSpec::Resolution(resolution) => {
                let geometry = TargetGeometry::for_resolution(source, resolution)?;
                let inverse = SmartReprojector::new(&source.crs, &source.crs)?;
                Ok(Self { geometry, inverse })
            }
        }
    }

    pub fn geometry(&self) -> &TargetGeometry {
        &self.geometry
    }

    /// Rééchantillonne la grille source sur la géométrie planifiée
    pub fn execute(&self, source: &RasterGrid) -> Result<RasterGrid, WarpError> {
        let data = resample::warp_into(source, &self.geometry, &self.inverse)?;

        let valid = data.iter().filter(|&&v| v != DST_NODATA).count();
        debug!(
            width = self.geometry.width,
            height = self.geometry.height,
            valid,
            identity = self.inverse.is_identity(),
            "Grid resampled"
        );

        RasterGrid::new(self.geometry.header(Some(DST_NODATA as f64)), data)
    }
}

/// Applique une cible de warp à une grille
pub fn warp(source: &RasterGrid, spec: &TargetSpec) -> Result<RasterGrid, WarpError> {
    WarpPlan::new(source.header(), spec)?.execute(source)
}

/// Reprojette une grille vers `target`, taille de pixel optionnelle
pub fn reproject(
    source: &RasterGrid,
    target: Crs,
    resolution: Option<f64>,
) -> Result<RasterGrid, WarpError> {
    warp(
        source,
        &TargetSpec::Crs {
            crs: target,
            resolution,
        },
    )
}

/// Rééchantillonne une grille à la résolution donnée, dans son CRS
pub fn resample(source: &RasterGrid, resolution: f64) -> Result<RasterGrid, WarpError> {
    warp(source, &TargetSpec::Resolution(resolution))
}
