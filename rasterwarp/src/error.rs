//! Types d'erreurs pour le crate rasterwarp

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture, du warp ou de l'écriture d'un raster
#[derive(Debug, Error)]
pub enum WarpError {
    /// Fichier impossible à ouvrir, lire ou créer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Définition de CRS absente ou non reconnue
    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    /// La grille de sortie calculée est vide
    #[error("Degenerate output grid: {width}x{height}")]
    DegenerateGrid { width: usize, height: usize },

    /// Coordonnée hors du domaine de validité d'une projection
    #[error("Transform failed for ({x}, {y}): {reason}")]
    Transform { x: f64, y: f64, reason: String },

    /// Conteneur raster invalide ou non supporté (multi-bandes, sans géoréférencement...)
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    /// Paramètre de warp invalide (résolution négative, géotransformation non inversible...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Catégorie d'erreur, inspectable sans passer par le message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    InvalidCrs,
    DegenerateGrid,
    Transform,
    InvalidRaster,
    InvalidParameter,
}

impl WarpError {
    /// Crée une erreur de transformation de coordonnées avec contexte
    pub fn transform(x: f64, y: f64, reason: impl Into<String>) -> Self {
        Self::Transform {
            x,
            y,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de raster invalide
    pub fn invalid_raster(reason: impl Into<String>) -> Self {
        Self::InvalidRaster(reason.into())
    }

    /// Retourne la catégorie de l'erreur
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidCrs(_) => ErrorKind::InvalidCrs,
            Self::DegenerateGrid { .. } => ErrorKind::DegenerateGrid,
            Self::Transform { .. } => ErrorKind::Transform,
            Self::InvalidRaster(_) => ErrorKind::InvalidRaster,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }
}

impl From<tiff::TiffError> for WarpError {
    fn from(e: tiff::TiffError) -> Self {
        match e {
            tiff::TiffError::IoError(io) => Self::Io(io),
            other => Self::InvalidRaster(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        let err = WarpError::DegenerateGrid {
            width: 0,
            height: 12,
        };
        assert_eq!(err.kind(), ErrorKind::DegenerateGrid);
        assert_eq!(err.to_string(), "Degenerate output grid: 0x12");

        let err = WarpError::transform(1.0, 2.0, "latitude out of range");
        assert_eq!(err.kind(), ErrorKind::Transform);
    }

    #[test]
    fn test_io_from_tiff() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: WarpError = tiff::TiffError::IoError(io).into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
