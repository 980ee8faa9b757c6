//! Projection Transverse Mercator
//!
//! Couvre les zones UTM WGS84 (EPSG:326xx / 327xx) et les zones
//! Gauss-Krüger 3° CGCS2000 (EPSG:4534 à 4554, méridiens centraux 75°E à 135°E).
//! Séries de Snyder (USGS Professional Paper 1395, §8).

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use crate::WarpError;

/// Écart maximal au méridien central avant divergence des séries
const MAX_DELTA_LON: f64 = std::f64::consts::FRAC_PI_2;

/// Paramètres d'une projection Transverse Mercator (latitude d'origine = équateur)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Méridien central (radians)
    pub lon0: f64,
    /// Facteur d'échelle sur le méridien central
    pub k0: f64,
    /// False easting
    pub x0: f64,
    /// False northing
    pub y0: f64,
    pub ellipsoid: Ellipsoid,
}

impl TransverseMercator {
    /// Zone UTM sur WGS84
    pub fn utm(zone: u32, south: bool) -> Self {
        Self {
            lon0: ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians(),
            k0: 0.9996,
            x0: 500000.0,
            y0: if south { 10000000.0 } else { 0.0 },
            ellipsoid: Ellipsoid::WGS84,
        }
    }

    /// Zone Gauss-Krüger 3° CGCS2000 (sans préfixe de zone dans l'abscisse)
    pub fn gauss_kruger(central_meridian_deg: f64) -> Self {
        Self {
            lon0: central_meridian_deg.to_radians(),
            k0: 1.0,
            x0: 500000.0,
            y0: 0.0,
            ellipsoid: Ellipsoid::GRS80,
        }
    }

    /// Longueur de l'arc de méridien depuis l'équateur
    fn meridian_arc(&self, lat: f64) -> f64 {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }

    /// Convertit des coordonnées géographiques vers la projection
    pub fn from_geographic(&self, geo: Geographic) -> Result<(f64, f64), WarpError> {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        let mut dlon = geo.lon - self.lon0;
        // Ramener l'écart dans [-π, π]
        dlon = (dlon + std::f64::consts::PI).rem_euclid(std::f64::consts::TAU) - std::f64::consts::PI;
        if dlon.abs() > MAX_DELTA_LON {
            let (lon, lat) = geo.to_degrees();
            return Err(WarpError::transform(
                lon,
                lat,
                "too far from the central meridian",
            ));
        }

        let sin_lat = geo.lat.sin();
        let cos_lat = geo.lat.cos();
        let tan_lat = geo.lat.tan();

        let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
        let t = tan_lat.powi(2);
        let c = ep2 * cos_lat.powi(2);
        let aa = dlon * cos_lat;
        let m = self.meridian_arc(geo.lat);

        let x = self.x0
            + self.k0
                * n
                * (aa
                    + (1.0 - t + c) * aa.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0);

        let y = self.y0
            + self.k0
                * (m + n
                    * tan_lat
                    * (aa.powi(2) / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * aa.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * aa.powi(6)
                            / 720.0));

        if !x.is_finite() || !y.is_finite() {
            let (lon, lat) = geo.to_degrees();
            return Err(WarpError::transform(lon, lat, "non-finite projected coordinate"));
        }

        Ok((x, y))
    }

    /// Convertit des coordonnées projetées vers géographiques
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<Geographic, WarpError> {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();
        let k0 = self.k0;

        // Coordonnées réduites
        let x = x - self.x0;
        let y = y - self.y0;

        // Calcul du footprint latitude
        let m = y / k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

        // Coefficients pour la série
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        if phi1.abs() >= std::f64::consts::FRAC_PI_2 {
            return Err(WarpError::transform(x, y, "northing beyond the pole"));
        }

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = x / (n1 * k0);

        // Latitude
        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);

        // Longitude
        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        if !lat.is_finite() || !lon.is_finite() {
            return Err(WarpError::transform(x, y, "non-finite geographic coordinate"));
        }

        Ok(Geographic::new(lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_martinique() {
        // Fort-de-France approximativement
        // UTM Zone 20N: 708000, 1615000
        let tm = TransverseMercator::utm(20, false);
        let geo = tm.to_geographic(708000.0, 1615000.0).unwrap();
        let (lon, lat) = geo.to_degrees();

        // Fort-de-France: -61.07°E, 14.60°N
        assert!((lon - (-61.07)).abs() < 0.2, "lon={}", lon);
        assert!((lat - 14.60).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_reunion() {
        // Saint-Denis approximativement
        // UTM Zone 40S: 338000, 7691000
        let tm = TransverseMercator::utm(40, true);
        let geo = tm.to_geographic(338000.0, 7691000.0).unwrap();
        let (lon, lat) = geo.to_degrees();

        // Saint-Denis: 55.45°E, -20.88°S
        assert!((lon - 55.45).abs() < 0.2, "lon={}", lon);
        assert!((lat - (-20.88)).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_utm_central_meridian_origin() {
        // Sur l'équateur et le méridien central: (500000, 0)
        let tm = TransverseMercator::utm(49, false);
        let (x, y) = tm
            .from_geographic(Geographic::from_degrees(111.0, 0.0))
            .unwrap();
        assert!((x - 500000.0).abs() < 1e-6, "x={}", x);
        assert!(y.abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_utm_known_point() {
        // Danjiangkou (111.5°E, 32.5°N) en UTM 49N ≈ (546 970, 3 595 969)
        let tm = TransverseMercator::utm(49, false);
        let (x, y) = tm
            .from_geographic(Geographic::from_degrees(111.5, 32.5))
            .unwrap();
        assert!((x - 546970.0).abs() < 5.0, "x={}", x);
        assert!((y - 3595969.0).abs() < 5.0, "y={}", y);
    }

    #[test]
    fn test_roundtrip_forward_inverse() {
        let tm = TransverseMercator::gauss_kruger(111.0);
        for &(lon, lat) in &[(111.0, 32.0), (109.6, 31.2), (112.4, 33.7), (110.0, -12.0)] {
            let (x, y) = tm.from_geographic(Geographic::from_degrees(lon, lat)).unwrap();
            let back = tm.to_geographic(x, y).unwrap();
            let (lon2, lat2) = back.to_degrees();
            assert!((lon2 - lon).abs() < 1e-7, "lon {} -> {}", lon, lon2);
            assert!((lat2 - lat).abs() < 1e-7, "lat {} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_far_from_meridian_rejected() {
        let tm = TransverseMercator::utm(31, false);
        assert!(tm
            .from_geographic(Geographic::from_degrees(120.0, 10.0))
            .is_err());
    }
}
