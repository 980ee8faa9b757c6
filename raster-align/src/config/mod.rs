//! Configuration du traitement par lot
//!
//! Ordre de priorité : option CLI > variable d'environnement > fichier JSON > défaut.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{bail, Context, Result};
use rasterwarp::geotiff::Compression;

use crate::batch::BatchOptions;

/// Variable d'environnement : nombre de fichiers traités en parallèle
pub const ENV_JOBS: &str = "RASTER_ALIGN_JOBS";
/// Variable d'environnement : budget mémoire des tampons pixels (Mo)
pub const ENV_WARP_MEMORY_MB: &str = "RASTER_ALIGN_WARP_MEMORY_MB";

/// Budget mémoire par défaut (Mo)
pub const DEFAULT_WARP_MEMORY_MB: u64 = 1024;
/// Extension des fichiers traités par défaut
pub const DEFAULT_EXTENSION: &str = "tif";

/// Configuration partielle : chaque source ne renseigne que ce qu'elle connaît
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extension des fichiers à traiter (sans le point)
    pub extension: Option<String>,

    /// Préfixe ajouté au nom des fichiers de sortie
    pub prefix: Option<String>,

    /// Compression des sorties : none, lzw, deflate
    pub compression: Option<String>,

    /// Nombre de fichiers traités en parallèle
    pub jobs: Option<usize>,

    /// Budget mémoire des tampons pixels (Mo)
    pub warp_memory_mb: Option<u64>,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge les surcharges depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Charge les surcharges depuis une source de variables
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            jobs: var(ENV_JOBS).and_then(|s| s.trim().parse().ok()),
            warp_memory_mb: var(ENV_WARP_MEMORY_MB).and_then(|s| s.trim().parse().ok()),
            ..Default::default()
        }
    }

    /// Complète les champs absents avec ceux d'une source moins prioritaire
    pub fn or(self, fallback: Config) -> Config {
        Config {
            extension: self.extension.or(fallback.extension),
            prefix: self.prefix.or(fallback.prefix),
            compression: self.compression.or(fallback.compression),
            jobs: self.jobs.or(fallback.jobs),
            warp_memory_mb: self.warp_memory_mb.or(fallback.warp_memory_mb),
        }
    }

    /// Applique les valeurs par défaut et valide
    pub fn into_options(self) -> Result<BatchOptions> {
        let compression: Compression = match self.compression.as_deref() {
            Some(s) => s.parse()?,
            None => Compression::default(),
        };

        let jobs = self.jobs.unwrap_or_else(default_jobs);
        if jobs == 0 {
            bail!("jobs must be at least 1");
        }

        let warp_memory_mb = self.warp_memory_mb.unwrap_or(DEFAULT_WARP_MEMORY_MB);
        if warp_memory_mb == 0 {
            bail!("warp_memory_mb must be at least 1");
        }

        let extension = self
            .extension
            .map(|e| e.trim_start_matches('.').to_string())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        Ok(BatchOptions {
            extension,
            prefix: self.prefix,
            compression,
            jobs,
            warp_memory_mb,
            ..Default::default()
        })
    }
}

/// Nombre de cœurs disponibles
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let options = Config::default().into_options().unwrap();
        assert_eq!(options.extension, "tif");
        assert_eq!(options.compression, Compression::Lzw);
        assert_eq!(options.warp_memory_mb, 1024);
        assert!(options.jobs >= 1);
        assert!(options.prefix.is_none());
    }

    #[test]
    fn test_precedence() {
        let cli = Config {
            jobs: Some(2),
            ..Default::default()
        };
        let env = Config::from_vars(|key| {
            let vars: HashMap<&str, &str> =
                [(ENV_JOBS, "8"), (ENV_WARP_MEMORY_MB, "256")].into();
            vars.get(key).map(|v| v.to_string())
        });
        let file: Config = serde_json::from_str(
            r#"{"jobs": 16, "warp_memory_mb": 4096, "compression": "deflate", "extension": ".TIF"}"#,
        )
        .unwrap();

        let options = cli.or(env).or(file).into_options().unwrap();
        assert_eq!(options.jobs, 2);
        assert_eq!(options.warp_memory_mb, 256);
        assert_eq!(options.compression, Compression::Deflate);
        assert_eq!(options.extension, "TIF");
    }

    #[test]
    fn test_invalid_env_ignored() {
        let env = Config::from_vars(|key| (key == ENV_JOBS).then(|| "many".to_string()));
        assert_eq!(env.jobs, None);
    }

    #[test]
    fn test_invalid_values() {
        let zero_jobs = Config {
            jobs: Some(0),
            ..Default::default()
        };
        assert!(zero_jobs.into_options().is_err());

        let bad_compression = Config {
            compression: Some("zstd".to_string()),
            ..Default::default()
        };
        assert!(bad_compression.into_options().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{"threads": 4}"#).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raster-align.json");
        std::fs::write(&path, r#"{"prefix": "lai_", "jobs": 3}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.prefix.as_deref(), Some("lai_"));
        assert_eq!(config.jobs, Some(3));
        assert!(Config::load(&dir.path().join("missing.json")).is_err());
    }
}
