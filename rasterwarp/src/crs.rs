//! Descripteur de système de coordonnées (CRS) identifié par un code EPSG

use std::fmt;
use std::str::FromStr;

use crate::reproject_lite::{self, Definition};
use crate::WarpError;

/// Système de coordonnées de référence
///
/// Immuable et `Copy` : partagé par valeur entre les grilles d'un même lot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crs {
    epsg: u32,
    /// Définition connue de reproject_lite (None = PROJ uniquement)
    definition: Option<Definition>,
    geographic: bool,
}

impl Crs {
    /// Résout un code EPSG
    ///
    /// Les codes inconnus de reproject_lite ne sont acceptés qu'avec la feature `proj`.
    pub fn from_epsg(epsg: u32) -> Result<Self, WarpError> {
        if let Some(definition) = reproject_lite::definition(epsg) {
            return Ok(Self {
                epsg,
                definition: Some(definition),
                geographic: definition.is_geographic(),
            });
        }

        if crate::reproject::is_available() && epsg > 0 && epsg < 32767 {
            return Ok(Self {
                epsg,
                definition: None,
                geographic: guess_geographic(epsg),
            });
        }

        Err(WarpError::InvalidCrs(format!("EPSG:{} is not supported", epsg)))
    }

    /// Résout un code EPSG lu dans un GeoTIFF, le type de modèle étant connu
    pub(crate) fn from_geokeys(epsg: u32, geographic: bool) -> Result<Self, WarpError> {
        let crs = Self::from_epsg(epsg)?;
        if crs.definition.is_some() {
            Ok(crs)
        } else {
            Ok(Self { geographic, ..crs })
        }
    }

    /// Parse "EPSG:32649", "epsg:4326" ou "2154"
    pub fn parse(s: &str) -> Result<Self, WarpError> {
        let s = s.trim();
        let code = match s.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("EPSG:") => &s[5..],
            _ => s,
        };
        let epsg: u32 = code
            .trim()
            .parse()
            .map_err(|_| WarpError::InvalidCrs(format!("cannot parse CRS '{}'", s)))?;
        Self::from_epsg(epsg)
    }

    /// Code EPSG
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Définition pure Rust, si disponible
    pub fn definition(&self) -> Option<Definition> {
        self.definition
    }

    /// Vrai si les coordonnées sont en degrés
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// Nom lisible, utilisé comme citation GeoTIFF
    pub fn name(&self) -> String {
        reproject_lite::name(self.epsg).unwrap_or_else(|| self.to_string())
    }
}

/// Plage EPSG des CRS géographiques 2D (hors codes projetés connus)
fn guess_geographic(epsg: u32) -> bool {
    (4000..5000).contains(&epsg)
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = WarpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_variants() {
        assert_eq!(Crs::parse("EPSG:32649").unwrap().epsg(), 32649);
        assert_eq!(Crs::parse("epsg:4326").unwrap().epsg(), 4326);
        assert_eq!(Crs::parse(" 2154 ").unwrap().epsg(), 2154);
        assert_eq!("EPSG:3857".parse::<Crs>().unwrap().epsg(), 3857);
    }

    #[test]
    fn test_parse_garbage() {
        let err = Crs::parse("WGS84").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCrs);
        assert!(Crs::parse("EPSG:").is_err());
    }

    #[test]
    fn test_geographic_flag() {
        assert!(Crs::from_epsg(4326).unwrap().is_geographic());
        assert!(!Crs::from_epsg(32649).unwrap().is_geographic());
        assert!(!Crs::from_epsg(4546).unwrap().is_geographic());
    }

    #[test]
    fn test_display_and_name() {
        let crs = Crs::from_epsg(32649).unwrap();
        assert_eq!(crs.to_string(), "EPSG:32649");
        assert_eq!(crs.name(), "WGS 84 / UTM zone 49N");
    }

    #[cfg(not(feature = "proj"))]
    #[test]
    fn test_unknown_without_proj() {
        let err = Crs::from_epsg(27700).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCrs);
    }

    #[cfg(feature = "proj")]
    #[test]
    fn test_unknown_with_proj() {
        let crs = Crs::from_epsg(27700).unwrap();
        assert!(crs.definition().is_none());
        assert!(!crs.is_geographic());
        assert_eq!(crs.name(), "EPSG:27700");
    }
}
