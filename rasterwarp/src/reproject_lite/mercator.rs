//! Projection Web Mercator (EPSG:3857)
//!
//! Aussi connu sous le nom de Pseudo-Mercator ou Spherical Mercator.
//! Utilisé par Google Maps, OpenStreetMap, etc.

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use crate::WarpError;

/// Latitude maximale représentable (carré du monde en Web Mercator)
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Convertit coordonnées géographiques vers Web Mercator (EPSG:3857)
pub fn geographic_to_web_mercator(geo: Geographic) -> Result<(f64, f64), WarpError> {
    // Web Mercator utilise un modèle sphérique avec le rayon équatorial
    let r = Ellipsoid::WGS84.a;

    let (lon_deg, lat_deg) = geo.to_degrees();
    if lat_deg.abs() > MAX_LATITUDE {
        return Err(WarpError::transform(
            lon_deg,
            lat_deg,
            "latitude outside the Web Mercator domain",
        ));
    }

    // X = R * longitude
    let x = r * geo.lon;

    // Y = R * ln(tan(π/4 + lat/2))
    let y = r * (std::f64::consts::FRAC_PI_4 + geo.lat / 2.0).tan().ln();

    Ok((x, y))
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Result<Geographic, WarpError> {
    let r = Ellipsoid::WGS84.a;

    // Longitude = x / R
    let lon = x / r;

    // Latitude = 2 * atan(exp(y/R)) - π/2
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Ok(Geographic::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paris_to_web_mercator() {
        // Paris: 2.35°E, 48.85°N
        let geo = Geographic::from_degrees(2.35, 48.85);
        let (x, y) = geographic_to_web_mercator(geo).unwrap();

        // X ≈ 261600, Y ≈ 6250000
        assert!((x - 261600.0).abs() < 1000.0, "x={}", x);
        assert!((y - 6250000.0).abs() < 10000.0, "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let geo = Geographic::from_degrees(2.35, 48.85);
        let (x, y) = geographic_to_web_mercator(geo).unwrap();
        let geo2 = web_mercator_to_geographic(x, y).unwrap();
        let (lon, lat) = geo2.to_degrees();

        assert!((lon - 2.35).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 48.85).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_polar_latitude_rejected() {
        let geo = Geographic::from_degrees(0.0, 89.0);
        assert!(geographic_to_web_mercator(geo).is_err());
    }
}
