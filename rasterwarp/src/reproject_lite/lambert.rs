//! Projection Lambert conique conforme à 2 parallèles standards
//!
//! - Lambert 93 (EPSG:2154)
//! - Coniques conformes 9 zones RGF93 CC42 à CC50 (EPSG:3942 à 3950)

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use crate::WarpError;

/// Paramètres d'une projection Lambert conique conforme
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertConformal {
    /// Longitude origine
    pub lon0: f64,
    /// Latitude origine
    pub lat0: f64,
    /// Premier parallèle standard
    pub lat1: f64,
    /// Deuxième parallèle standard
    pub lat2: f64,
    /// False easting
    pub x0: f64,
    /// False northing
    pub y0: f64,
    pub ellipsoid: Ellipsoid,
}

/// Constantes dérivées (exposant, constante C, rayon à l'origine)
struct Constants {
    n: f64,
    c: f64,
    r0: f64,
}

impl LambertConformal {
    /// Lambert 93 (EPSG:2154)
    pub fn lambert93() -> Self {
        Self {
            lon0: 3.0_f64.to_radians(),  // 3°E
            lat0: 46.5_f64.to_radians(), // 46.5°N
            lat1: 44.0_f64.to_radians(), // 44°N
            lat2: 49.0_f64.to_radians(), // 49°N
            x0: 700000.0,
            y0: 6600000.0,
            ellipsoid: Ellipsoid::GRS80,
        }
    }

    /// Zone conique conforme CCxx (latitude origine = xx degrés, 42 ≤ xx ≤ 50)
    pub fn cc_zone(zone: u32) -> Self {
        let lat0 = zone as f64;
        Self {
            lon0: 3.0_f64.to_radians(),
            lat0: lat0.to_radians(),
            lat1: (lat0 - 0.75).to_radians(),
            lat2: (lat0 + 0.75).to_radians(),
            x0: 1700000.0,
            y0: (zone as f64 - 41.0) * 1000000.0 + 200000.0,
            ellipsoid: Ellipsoid::GRS80,
        }
    }

    fn constants(&self) -> Constants {
        let e = self.ellipsoid.e();
        let e2 = self.ellipsoid.e2();
        let a = self.ellipsoid.a;

        let n1 = grande_normale(self.lat1, a, e2);
        let n2 = grande_normale(self.lat2, a, e2);

        let iso_lat1 = isometric_latitude(self.lat1, e);
        let iso_lat2 = isometric_latitude(self.lat2, e);
        let iso_lat0 = isometric_latitude(self.lat0, e);

        // Exposant de la projection
        let n = ((n1 * self.lat1.cos()).ln() - (n2 * self.lat2.cos()).ln()) / (iso_lat2 - iso_lat1);

        // Constante C
        let c = (n1 * self.lat1.cos() / n) * (n * iso_lat1).exp();

        // Rayon à l'origine
        let r0 = c * (-n * iso_lat0).exp();

        Constants { n, c, r0 }
    }

    /// Convertit des coordonnées géographiques vers la projection
    pub fn from_geographic(&self, geo: Geographic) -> Result<(f64, f64), WarpError> {
        if geo.lat <= -std::f64::consts::FRAC_PI_2 {
            let (lon, lat) = geo.to_degrees();
            return Err(WarpError::transform(lon, lat, "south pole is not representable"));
        }

        let Constants { n, c, r0 } = self.constants();
        let e = self.ellipsoid.e();

        let r = c * (-n * isometric_latitude(geo.lat, e)).exp();
        let theta = n * (geo.lon - self.lon0);

        let x = self.x0 + r * theta.sin();
        let y = self.y0 + r0 - r * theta.cos();

        if !x.is_finite() || !y.is_finite() {
            let (lon, lat) = geo.to_degrees();
            return Err(WarpError::transform(lon, lat, "non-finite projected coordinate"));
        }

        Ok((x, y))
    }

    /// Convertit des coordonnées projetées vers géographiques
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<Geographic, WarpError> {
        let Constants { n, c, r0 } = self.constants();
        let e = self.ellipsoid.e();

        // Coordonnées centrées
        let dx = x - self.x0;
        let dy = y - self.y0;

        // Rayon et angle
        let r = (dx.powi(2) + (r0 - dy).powi(2)).sqrt();
        let r = if n < 0.0 { -r } else { r };

        let gamma = (dx / (r0 - dy)).atan();

        // Latitude isométrique
        let iso_lat = -(r / c).ln() / n;

        // Latitude géographique
        let lat = latitude_from_isometric(iso_lat, e);

        // Longitude
        let lon = self.lon0 + gamma / n;

        if !lat.is_finite() || !lon.is_finite() {
            return Err(WarpError::transform(x, y, "non-finite geographic coordinate"));
        }

        Ok(Geographic::new(lon, lat))
    }
}

/// Calcule la latitude isométrique
fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let term = ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0);
    ((std::f64::consts::FRAC_PI_4 + lat / 2.0).tan() * term).ln()
}

/// Calcule la latitude depuis la latitude isométrique (itératif)
fn latitude_from_isometric(iso_lat: f64, e: f64) -> f64 {
    let mut lat = 2.0 * iso_lat.exp().atan() - std::f64::consts::FRAC_PI_2;

    for _ in 0..10 {
        let sin_lat = lat.sin();
        let term = ((1.0 + e * sin_lat) / (1.0 - e * sin_lat)).powf(e / 2.0);
        let new_lat = 2.0 * (iso_lat.exp() * term).atan() - std::f64::consts::FRAC_PI_2;

        if (new_lat - lat).abs() < 1e-12 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Calcule la grande normale (rayon de courbure dans le plan vertical)
fn grande_normale(lat: f64, a: f64, e2: f64) -> f64 {
    a / (1.0 - e2 * lat.sin().powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paris() {
        // Tour Eiffel approximativement
        let geo = LambertConformal::lambert93()
            .to_geographic(648237.0, 6862107.0)
            .unwrap();
        let (lon, lat) = geo.to_degrees();

        // Tour Eiffel: 2.2945°E, 48.8584°N
        assert!((lon - 2.2945).abs() < 0.01, "lon={}", lon);
        assert!((lat - 48.8584).abs() < 0.01, "lat={}", lat);
    }

    #[test]
    fn test_origin_maps_to_false_origin() {
        // (3°E, 46.5°N) -> (700000, 6600000) par construction
        let l93 = LambertConformal::lambert93();
        let (x, y) = l93
            .from_geographic(Geographic::from_degrees(3.0, 46.5))
            .unwrap();
        assert!((x - 700000.0).abs() < 1e-6, "x={}", x);
        assert!((y - 6600000.0).abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_roundtrip_marseille() {
        let l93 = LambertConformal::lambert93();
        let (x, y) = l93
            .from_geographic(Geographic::from_degrees(5.37, 43.30))
            .unwrap();
        // Vieux-Port approximativement
        assert!((x - 893193.0).abs() < 2000.0, "x={}", x);
        assert!((y - 6245829.0).abs() < 2000.0, "y={}", y);

        let (lon, lat) = l93.to_geographic(x, y).unwrap().to_degrees();
        assert!((lon - 5.37).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 43.30).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_cc_zone_origin() {
        let cc45 = LambertConformal::cc_zone(45);
        let (x, y) = cc45
            .from_geographic(Geographic::from_degrees(3.0, 45.0))
            .unwrap();
        assert!((x - 1700000.0).abs() < 1e-6, "x={}", x);
        assert!((y - 4200000.0).abs() < 1e-6, "y={}", y);
    }
}
