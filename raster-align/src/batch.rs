//! Traitement par lot d'un répertoire de rasters
//!
//! La cible (CRS de référence ou résolution) est résolue une seule fois ;
//! un fichier en échec est consigné et n'interrompt pas le lot.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use rasterwarp::geotiff::{self, Compression, GeoTiffReader};
use rasterwarp::{Crs, TargetSpec, WarpError, WarpPlan};
use tracing::{debug, info, warn};

use crate::budget::MemoryBudget;
use crate::config::{DEFAULT_EXTENSION, DEFAULT_WARP_MEMORY_MB};
use crate::report::{BatchReport, FileRecord};

/// Origine du CRS cible d'une reprojection
#[derive(Debug, Clone)]
pub enum TargetCrs {
    /// CRS lu dans un raster de référence
    Reference(PathBuf),
    /// CRS donné explicitement
    Crs(Crs),
}

/// Opération appliquée à chaque fichier du lot
#[derive(Debug, Clone)]
pub enum BatchJob {
    /// Reprojection vers un CRS commun, taille de pixel optionnelle
    Reproject {
        target: TargetCrs,
        resolution: Option<f64>,
    },
    /// Rééchantillonnage à une taille de pixel commune, CRS inchangé
    Resample { resolution: f64 },
}

impl BatchJob {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Reproject { .. } => "reproject",
            Self::Resample { .. } => "resample",
        }
    }

    /// Répertoire effectif des sorties
    pub fn output_dir(&self, output_dir: &Path) -> PathBuf {
        match self {
            Self::Reproject { .. } => output_dir.to_path_buf(),
            Self::Resample { resolution } => output_dir.join(format!("resampled_{}m", resolution)),
        }
    }

    /// Préfixe par défaut des fichiers de sortie
    pub fn default_prefix(&self) -> Option<String> {
        match self {
            Self::Reproject { .. } => None,
            Self::Resample { resolution } => Some(format!("{}m_", resolution)),
        }
    }

    /// Résout la cible partagée ; un échec ici est fatal pour le lot
    pub fn resolve_target(&self) -> Result<TargetSpec> {
        match self {
            Self::Reproject { target, resolution } => {
                let crs = match target {
                    TargetCrs::Crs(crs) => *crs,
                    TargetCrs::Reference(path) => geotiff::read_crs(path).with_context(|| {
                        format!("Failed to read reference CRS from {}", path.display())
                    })?,
                };
                Ok(TargetSpec::Crs {
                    crs,
                    resolution: *resolution,
                })
            }
            Self::Resample { resolution } => {
                if !resolution.is_finite() || *resolution <= 0.0 {
                    anyhow::bail!("Resolution must be a positive number, got {}", resolution);
                }
                Ok(TargetSpec::Resolution(*resolution))
            }
        }
    }
}

/// Options d'exécution d'un lot
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Extension des fichiers à traiter (insensible à la casse)
    pub extension: String,
    /// Préfixe des fichiers de sortie (défaut dépendant de l'opération)
    pub prefix: Option<String>,
    pub compression: Compression,
    /// Nombre de fichiers traités en parallèle
    pub jobs: usize,
    /// Budget mémoire des tampons pixels (Mo)
    pub warp_memory_mb: u64,
    /// Annulation : les fichiers non démarrés sont comptés comme ignorés
    pub cancel: Arc<AtomicBool>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            prefix: None,
            compression: Compression::default(),
            jobs: crate::config::default_jobs(),
            warp_memory_mb: DEFAULT_WARP_MEMORY_MB,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Résultat du traitement d'un fichier
enum Outcome {
    Written(FileRecord),
    Failed(WarpError),
    Skipped,
}

/// Liste les fichiers d'un répertoire ayant l'extension voulue (non récursif, triés par nom)
pub fn collect_rasters(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut rasters = Vec::new();

    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Cannot read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let entry_path = entry.path();

        if entry_path.is_file()
            && entry_path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
        {
            rasters.push(entry_path);
        }
    }

    rasters.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(rasters)
}

/// Traite un fichier : en-tête, réservation mémoire, pixels, warp, écriture
fn process_file(
    path: &Path,
    output: &Path,
    spec: &TargetSpec,
    compression: Compression,
    budget: &MemoryBudget,
) -> Result<FileRecord, WarpError> {
    let reader = GeoTiffReader::open(path)?;
    let plan = WarpPlan::new(reader.header(), spec)?;

    let bytes = (reader.header().pixel_count() as u64)
        .saturating_add(plan.geometry().pixel_count() as u64)
        .saturating_mul(std::mem::size_of::<f32>() as u64);
    let _reservation = budget.acquire(bytes);

    let grid = reader.read_grid()?;
    let warped = plan.execute(&grid)?;
    drop(grid);

    // Empreinte calculée avant publication : aucune sortie sans checksum
    let mut encoded = Cursor::new(Vec::new());
    geotiff::encode(&mut encoded, &warped, compression)?;
    let encoded = encoded.into_inner();
    let blake3 = blake3::hash(&encoded).to_hex().to_string();
    geotiff::write_encoded(output, &encoded)?;

    Ok(FileRecord {
        file: file_name(path),
        output: output.display().to_string(),
        width: warped.width(),
        height: warped.height(),
        blake3,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Exécute un lot : chaque fichier de `input_dir` est transformé vers `output_dir`
///
/// Les erreurs de résolution de la cible, de lecture du répertoire d'entrée et
/// de création du répertoire de sortie sont fatales ; les erreurs par fichier
/// sont consignées dans le rapport.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    job: &BatchJob,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let started_at = Instant::now();

    let spec = job.resolve_target()?;
    let target_label = match spec {
        TargetSpec::Crs { crs, .. } => crs.to_string(),
        TargetSpec::Resolution(res) => format!("{}m", res),
    };

    let out_dir = job.output_dir(output_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Cannot create output directory {}", out_dir.display()))?;

    let rasters = collect_rasters(input_dir, &options.extension)?;
    let prefix = options
        .prefix
        .clone()
        .or_else(|| job.default_prefix())
        .unwrap_or_default();

    info!(
        operation = job.operation(),
        target = %target_label,
        input = %input_dir.display(),
        output = %out_dir.display(),
        files = rasters.len(),
        jobs = options.jobs,
        "Starting batch"
    );

    let mut report = BatchReport::new(job.operation(), &target_label);
    report.discovered = rasters.len();

    let budget = MemoryBudget::from_mb(options.warp_memory_mb);

    // Fichiers sur des threads dédiés, lignes sur le pool rayon global :
    // l'attente du budget mémoire ne bloque jamais un worker rayon.
    let next = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<(usize, Outcome)>> = Mutex::new(Vec::with_capacity(rasters.len()));
    let workers = options.jobs.max(1).min(rasters.len());

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(path) = rasters.get(index) else {
                    break;
                };

                let outcome = if options.cancel.load(Ordering::Relaxed) {
                    Outcome::Skipped
                } else {
                    let output = out_dir.join(format!("{}{}", prefix, file_name(path)));
                    match process_file(path, &output, &spec, options.compression, &budget) {
                        Ok(record) => {
                            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                            info!(
                                "[{}/{}] {} -> {} ({}x{})",
                                n,
                                rasters.len(),
                                record.file,
                                output.display(),
                                record.width,
                                record.height
                            );
                            Outcome::Written(record)
                        }
                        Err(e) => {
                            done.fetch_add(1, Ordering::Relaxed);
                            warn!("Failed to process {}: {}", path.display(), e);
                            Outcome::Failed(e)
                        }
                    }
                };

                outcomes
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((index, outcome));
            });
        }
    });

    let mut outcomes = outcomes.into_inner().unwrap_or_else(|e| e.into_inner());
    outcomes.sort_by_key(|(index, _)| *index);

    for (index, outcome) in outcomes {
        match outcome {
            Outcome::Written(record) => report.record_success(record),
            Outcome::Failed(e) => {
                report.record_failure(&file_name(&rasters[index]), e.kind().into(), &e.to_string())
            }
            Outcome::Skipped => report.record_skipped(),
        }
    }

    if report.skipped > 0 {
        warn!(skipped = report.skipped, "Batch cancelled before completion");
    }

    report.set_duration(started_at.elapsed());
    report.finalize();
    debug!(summary = %report.summary(), "Batch finished");

    Ok(report)
}
