//! Rapport de traitement par lot avec dégradation gracieuse
//!
//! Un fichier en échec est consigné avec sa catégorie d'erreur, sans
//! interrompre le lot.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rasterwarp::ErrorKind;
use serde::Serialize;

/// Statut global du lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchStatus {
    /// Tous les fichiers traités
    Success,
    /// Certains fichiers en échec
    PartialSuccess,
    /// Aucun fichier traité avec succès
    Failed,
    /// Lot interrompu avant la fin
    Cancelled,
}

/// Catégorie d'échec d'un fichier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Io,
    InvalidCrs,
    DegenerateGrid,
    Transform,
    InvalidRaster,
    InvalidParameter,
}

impl From<ErrorKind> for FailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Io => Self::Io,
            ErrorKind::InvalidCrs => Self::InvalidCrs,
            ErrorKind::DegenerateGrid => Self::DegenerateGrid,
            ErrorKind::Transform => Self::Transform,
            ErrorKind::InvalidRaster => Self::InvalidRaster,
            ErrorKind::InvalidParameter => Self::InvalidParameter,
        }
    }
}

/// Fichier écrit avec succès
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Nom du fichier source
    pub file: String,
    /// Chemin du fichier écrit
    pub output: String,
    pub width: usize,
    pub height: usize,
    /// Empreinte blake3 du fichier écrit (hex)
    pub blake3: String,
}

/// Fichier en échec
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Rapport complet d'un lot
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Opération (reproject / resample)
    pub operation: String,
    /// Cible partagée (CRS ou résolution)
    pub target: String,
    pub duration_secs: f64,
    pub status: BatchStatus,

    pub discovered: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    pub files: Vec<FileRecord>,
    pub errors: Vec<FileError>,
}

impl BatchReport {
    pub fn new(operation: &str, target: &str) -> Self {
        Self {
            operation: operation.to_string(),
            target: target.to_string(),
            duration_secs: 0.0,
            status: BatchStatus::Success,
            discovered: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            files: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Enregistre un fichier écrit
    pub fn record_success(&mut self, record: FileRecord) {
        self.succeeded += 1;
        self.files.push(record);
    }

    /// Enregistre un fichier en échec
    pub fn record_failure(&mut self, file: &str, kind: FailureKind, message: &str) {
        self.failed += 1;
        self.errors.push(FileError {
            file: file.to_string(),
            kind,
            message: message.to_string(),
        });
    }

    /// Enregistre un fichier non démarré (annulation)
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final à partir des compteurs
    pub fn finalize(&mut self) {
        self.status = if self.skipped > 0 {
            BatchStatus::Cancelled
        } else if self.failed == 0 {
            BatchStatus::Success
        } else if self.succeeded > 0 {
            BatchStatus::PartialSuccess
        } else {
            BatchStatus::Failed
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("BATCH REPORT - {} ({})", self.operation, self.target);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Files: {} discovered, {} succeeded, {} failed, {} skipped",
            self.discovered, self.succeeded, self.failed, self.skipped
        );

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                println!("  {:?} [{}] {}", e.kind, e.file, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} {}: {}/{} files succeeded, {} failed, {} skipped",
            self.operation,
            self.target,
            self.succeeded,
            self.discovered,
            self.failed,
            self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            file: name.to_string(),
            output: format!("out/{}", name),
            width: 10,
            height: 10,
            blake3: "00".repeat(32),
        }
    }

    #[test]
    fn test_batch_report_new() {
        let report = BatchReport::new("reproject", "EPSG:32649");
        assert_eq!(report.status, BatchStatus::Success);
        assert_eq!(report.succeeded, 0);
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_finalize_success() {
        let mut report = BatchReport::new("resample", "30m");
        report.discovered = 1;
        report.record_success(record("a.tif"));
        report.finalize();
        assert_eq!(report.status, BatchStatus::Success);
    }

    #[test]
    fn test_finalize_partial_success() {
        let mut report = BatchReport::new("resample", "30m");
        report.discovered = 2;
        report.record_success(record("a.tif"));
        report.record_failure("b.tif", FailureKind::InvalidRaster, "not a TIFF");
        report.finalize();

        assert_eq!(report.status, BatchStatus::PartialSuccess);
        assert_eq!(report.errors[0].kind, FailureKind::InvalidRaster);
    }

    #[test]
    fn test_finalize_failed() {
        let mut report = BatchReport::new("reproject", "EPSG:4326");
        report.record_failure("b.tif", FailureKind::Io, "permission denied");
        report.finalize();
        assert_eq!(report.status, BatchStatus::Failed);
    }

    #[test]
    fn test_finalize_cancelled() {
        let mut report = BatchReport::new("reproject", "EPSG:4326");
        report.record_success(record("a.tif"));
        report.record_skipped();
        report.finalize();
        assert_eq!(report.status, BatchStatus::Cancelled);
    }

    #[test]
    fn test_failure_kind_from_error_kind() {
        assert_eq!(
            FailureKind::from(ErrorKind::DegenerateGrid),
            FailureKind::DegenerateGrid
        );
        assert_eq!(FailureKind::from(ErrorKind::Transform), FailureKind::Transform);
    }

    #[test]
    fn test_summary_and_json() {
        let mut report = BatchReport::new("resample", "30m");
        report.discovered = 2;
        report.record_success(record("a.tif"));
        report.record_failure("b.tif", FailureKind::InvalidRaster, "corrupt");
        assert!(report.summary().contains("1/2 files succeeded"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save_to_file(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["errors"][0]["kind"], "InvalidRaster");
    }
}
