//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Projections supportées (sources et cibles, pivot géographique) :
//! - Géographique WGS84 / ETRS89 / CGCS2000 (EPSG:4326, 4258, 4490)
//! - Web Mercator (EPSG:3857)
//! - UTM WGS84 (EPSG:32601 à 32660, 32701 à 32760)
//! - Gauss-Krüger 3° CGCS2000 (EPSG:4534 à 4554)
//! - Lambert 93 (EPSG:2154) et coniques conformes CC42 à CC50 (EPSG:3942 à 3950)
//!
//! Les datums sont considérés comme confondus avec WGS84 (écart sub-métrique,
//! négligeable devant la taille de pixel des séries temporelles visées).

mod ellipsoid;
mod lambert;
mod mercator;
mod smart;
mod transverse_mercator;

pub use ellipsoid::Ellipsoid;
pub use lambert::LambertConformal;
pub use smart::SmartReprojector;
pub use transverse_mercator::TransverseMercator;

use rayon::prelude::*;

use crate::transform::CoordinateTransform;
use crate::WarpError;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Définition d'un système de coordonnées connu de reproject_lite
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Definition {
    /// Longitude/latitude en degrés
    Geographic,
    /// Pseudo-Mercator sphérique
    WebMercator,
    TransverseMercator(TransverseMercator),
    LambertConformal(LambertConformal),
}

impl Definition {
    /// Vrai pour les systèmes en degrés
    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Geographic)
    }

    /// Convertit des coordonnées natives vers géographique
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<Geographic, WarpError> {
        match self {
            Self::Geographic => {
                if !x.is_finite() || !(-90.0..=90.0).contains(&y) {
                    return Err(WarpError::transform(x, y, "latitude out of range"));
                }
                Ok(Geographic::from_degrees(x, y))
            }
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Self::TransverseMercator(tm) => tm.to_geographic(x, y),
            Self::LambertConformal(lcc) => lcc.to_geographic(x, y),
        }
    }

    /// Convertit des coordonnées géographiques vers le système natif
    pub fn from_geographic(&self, geo: Geographic) -> Result<(f64, f64), WarpError> {
        match self {
            Self::Geographic => Ok(geo.to_degrees()),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
            Self::TransverseMercator(tm) => tm.from_geographic(geo),
            Self::LambertConformal(lcc) => lcc.from_geographic(geo),
        }
    }
}

/// Résout un code EPSG en définition, si reproject_lite le supporte
pub fn definition(epsg: u32) -> Option<Definition> {
    match epsg {
        4326 | 4258 | 4490 => Some(Definition::Geographic),
        3857 => Some(Definition::WebMercator),
        32601..=32660 => Some(Definition::TransverseMercator(TransverseMercator::utm(
            epsg - 32600,
            false,
        ))),
        32701..=32760 => Some(Definition::TransverseMercator(TransverseMercator::utm(
            epsg - 32700,
            true,
        ))),
        // CM 75E (4534) ... CM 135E (4554), pas de 3°
        4534..=4554 => Some(Definition::TransverseMercator(
            TransverseMercator::gauss_kruger(75.0 + 3.0 * (epsg - 4534) as f64),
        )),
        2154 => Some(Definition::LambertConformal(LambertConformal::lambert93())),
        3942..=3950 => Some(Definition::LambertConformal(LambertConformal::cc_zone(
            epsg - 3900,
        ))),
        _ => None,
    }
}

/// Nom lisible d'un code EPSG supporté (citation GeoTIFF)
pub fn name(epsg: u32) -> Option<String> {
    let name = match epsg {
        4326 => "WGS 84".to_string(),
        4258 => "ETRS89".to_string(),
        4490 => "China Geodetic Coordinate System 2000".to_string(),
        3857 => "WGS 84 / Pseudo-Mercator".to_string(),
        32601..=32660 => format!("WGS 84 / UTM zone {}N", epsg - 32600),
        32701..=32760 => format!("WGS 84 / UTM zone {}S", epsg - 32700),
        4534..=4554 => format!(
            "CGCS2000 / 3-degree Gauss-Kruger CM {}E",
            75 + 3 * (epsg - 4534)
        ),
        2154 => "RGF93 v1 / Lambert-93".to_string(),
        3942..=3950 => format!("RGF93 v1 / CC{}", epsg - 3900),
        _ => return None,
    };
    Some(name)
}

/// Reprojection légère entre deux systèmes supportés
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: Definition,
    target: Definition,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, WarpError> {
        let source = definition(source_epsg).ok_or_else(|| {
            WarpError::InvalidCrs(format!(
                "EPSG:{} non supporté par reproject_lite",
                source_epsg
            ))
        })?;
        let target = definition(target_epsg).ok_or_else(|| {
            WarpError::InvalidCrs(format!(
                "EPSG:{} non supporté par reproject_lite",
                target_epsg
            ))
        })?;

        Ok(Self { source, target })
    }

    /// Vérifie si l'EPSG est supporté
    pub fn is_supported(epsg: u32) -> bool {
        definition(epsg).is_some()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError> {
        // Étape 1: Source → Géographique
        let geo = self.source.to_geographic(x, y)?;

        // Étape 2: Géographique → Cible
        self.target.from_geographic(geo)
    }
}

impl CoordinateTransform for ReprojectorLite {
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError> {
        ReprojectorLite::transform_point(self, x, y)
    }

    fn transform_batch(&self, coords: &mut [(f64, f64)]) {
        coords.par_iter_mut().for_each(|c| {
            *c = self
                .transform_point(c.0, c.1)
                .unwrap_or((f64::NAN, f64::NAN));
        });
    }
}
