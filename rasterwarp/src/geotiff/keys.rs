//! Tags et GeoKeys GeoTIFF (OGC 19-008r4)

use tiff::tags::Tag;

pub const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
pub const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
pub const MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
pub const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
pub const GEO_ASCII_PARAMS: Tag = Tag::GeoAsciiParamsTag;
pub const GDAL_NODATA: Tag = Tag::GdalNodata;

pub const GT_MODEL_TYPE: u16 = 1024;
pub const GT_RASTER_TYPE: u16 = 1025;
pub const GT_CITATION: u16 = 1026;
pub const GEOGRAPHIC_TYPE: u16 = 2048;
pub const PROJECTED_CS_TYPE: u16 = 3072;

pub const MODEL_TYPE_PROJECTED: u16 = 1;
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
pub const RASTER_PIXEL_IS_AREA: u16 = 1;
pub const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Code "défini par l'utilisateur" : aucun EPSG exploitable
pub const USER_DEFINED: u16 = 32767;

/// GeoKeys à valeur courte (TIFFTagLocation = 0) d'un répertoire
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeoKeys {
    pub model_type: Option<u16>,
    pub raster_type: Option<u16>,
    pub geographic_type: Option<u16>,
    pub projected_type: Option<u16>,
}

impl GeoKeys {
    /// Parse `[version, revision, minor, count, (id, location, count, value)*]`
    pub fn parse(directory: &[u16]) -> Option<Self> {
        if directory.len() < 4 {
            return None;
        }
        let count = directory[3] as usize;
        let mut keys = Self::default();

        for entry in directory[4..].chunks_exact(4).take(count) {
            let (id, location, value) = (entry[0], entry[1], entry[3]);
            // Valeurs stockées dans un autre tag (doubles, ASCII): ignorées
            if location != 0 {
                continue;
            }
            match id {
                GT_MODEL_TYPE => keys.model_type = Some(value),
                GT_RASTER_TYPE => keys.raster_type = Some(value),
                GEOGRAPHIC_TYPE => keys.geographic_type = Some(value),
                PROJECTED_CS_TYPE => keys.projected_type = Some(value),
                _ => {}
            }
        }

        Some(keys)
    }

    /// Vrai si l'ancrage des pixels est au centre (PixelIsPoint)
    pub fn is_pixel_is_point(&self) -> bool {
        self.raster_type == Some(RASTER_PIXEL_IS_POINT)
    }

    /// Code EPSG et caractère géographique, si exploitable
    pub fn epsg(&self) -> Option<(u32, bool)> {
        let geographic_model = self.model_type == Some(MODEL_TYPE_GEOGRAPHIC);

        if !geographic_model {
            if let Some(code) = self.projected_type.filter(|&c| c != 0 && c != USER_DEFINED) {
                return Some((code as u32, false));
            }
        }

        if geographic_model || (self.model_type.is_none() && self.projected_type.is_none()) {
            if let Some(code) = self.geographic_type.filter(|&c| c != 0 && c != USER_DEFINED) {
                return Some((code as u32, true));
            }
        }

        None
    }
}

/// Construit le répertoire de GeoKeys d'une grille en écriture
///
/// `citation_len` est la longueur (séparateur `|` inclus) de la citation
/// placée en tête de GeoAsciiParams.
pub fn build_directory(epsg: u32, geographic: bool, citation_len: usize) -> Vec<u16> {
    let crs_key = if geographic {
        GEOGRAPHIC_TYPE
    } else {
        PROJECTED_CS_TYPE
    };
    let model = if geographic {
        MODEL_TYPE_GEOGRAPHIC
    } else {
        MODEL_TYPE_PROJECTED
    };

    // Clés triées par identifiant
    #[rustfmt::skip]
    let directory = vec![
        1, 1, 0, 4,
        GT_MODEL_TYPE, 0, 1, model,
        GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA,
        GT_CITATION, 34737, citation_len as u16, 0,
        crs_key, 0, 1, epsg as u16,
    ];
    directory
}
