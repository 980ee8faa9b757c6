//! # raster-align
//!
//! Alignement de séries temporelles de rasters GeoTIFF sur une grille commune.
//!
//! ## Features
//!
//! - Reprojection d'un répertoire vers le CRS d'un raster de référence
//! - Rééchantillonnage bilinéaire à une taille de pixel commune
//! - Traitement parallèle sous budget mémoire, sans arrêt sur erreur
//! - Rapport JSON avec empreintes blake3 des sorties
//!
//! ## Usage CLI
//!
//! ```bash
//! # Reprojection vers le CRS de la référence
//! raster-align reproject --input ./lai/ --output ./lai_utm/ --reference ./ref.tif
//!
//! # Rééchantillonnage à 30 m
//! raster-align resample --input ./lai_utm/ --output ./lai_30m/ --resolution 30
//! ```

pub mod batch;
pub mod budget;
pub mod config;
pub mod report;

pub use batch::{run_batch, BatchJob, BatchOptions, TargetCrs};
pub use config::Config;
pub use report::{BatchReport, BatchStatus, FailureKind};
