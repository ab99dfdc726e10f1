//! Batch persistence: dated, timestamped CSVs written via temp-then-rename.

use crate::result::ScanResult;
use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Asia::Kolkata;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

const TOP_CANDIDATES: usize = 25;

/// Paths of the three files one scan run produces.
#[derive(Debug, Clone)]
pub struct BatchPaths {
    pub all: PathBuf,
    pub long: PathBuf,
    pub short: PathBuf,
}

pub struct BatchWriter {
    output_dir: PathBuf,
}

impl BatchWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Deletes leftover CSVs from earlier runs. Per-file failures are
    /// logged and skipped so a locked file cannot block the cleanup.
    pub fn clean_old_files(&self) {
        let entries = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        let mut deleted = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        info!("Deleted old file: {}", path.display());
                        deleted += 1;
                    }
                    Err(e) => warn!("Could not delete {}: {}", path.display(), e),
                }
            }
        }
        info!("Cleaned up {} old CSV files", deleted);
    }

    /// Persists the full batch plus the top long and short candidate lists.
    ///
    /// Filenames embed the category, the IST calendar date and an HHMM tag,
    /// so a later run on the same day never overwrites an earlier one. Each
    /// file is staged to a temp name and renamed into place; a failed rename
    /// leaves the temp artifact and logs a warning without failing the run.
    pub fn write_batch(&self, results: &[ScanResult]) -> Result<BatchPaths> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let now = Utc::now().with_timezone(&Kolkata);
        let date_tag = now.format("%Y-%m-%d");
        let time_tag = now.format("%H%M");

        let paths = BatchPaths {
            all: self
                .output_dir
                .join(format!("all_signals_{}_{}.csv", date_tag, time_tag)),
            long: self
                .output_dir
                .join(format!("long_candidates_{}_{}.csv", date_tag, time_tag)),
            short: self
                .output_dir
                .join(format!("short_candidates_{}_{}.csv", date_tag, time_tag)),
        };

        let long = top_candidates(results, |r| r.score_long);
        let short = top_candidates(results, |r| r.score_short);

        self.safe_save(results.iter(), &paths.all);
        self.safe_save(long.into_iter(), &paths.long);
        self.safe_save(short.into_iter(), &paths.short);

        Ok(paths)
    }

    fn safe_save<'a>(&self, rows: impl Iterator<Item = &'a ScanResult>, target: &Path) {
        let temp_name = format!(
            "{}.tmp-{}",
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Uuid::new_v4().simple()
        );
        let temp_path = self.output_dir.join(temp_name);

        if let Err(e) = write_csv(rows, &temp_path) {
            warn!("Failed to write temp file {}: {:#}", temp_path.display(), e);
            return;
        }

        match fs::rename(&temp_path, target) {
            Ok(()) => info!("Saved file: {}", target.display()),
            Err(e) => warn!(
                "Could not move {} to {}: {}. Leaving temp file in place",
                temp_path.display(),
                target.display(),
                e
            ),
        }
    }
}

/// Top candidates by (score, volume ratio), both descending.
pub fn top_candidates(results: &[ScanResult], score: impl Fn(&ScanResult) -> i32) -> Vec<&ScanResult> {
    let mut ranked: Vec<&ScanResult> = results.iter().collect();
    ranked.sort_by(|a, b| {
        score(b).cmp(&score(a)).then_with(|| {
            b.vol_ratio
                .partial_cmp(&a.vol_ratio)
                .unwrap_or(Ordering::Equal)
        })
    });
    ranked.truncate(TOP_CANDIDATES);
    ranked
}

fn write_csv<'a>(rows: impl Iterator<Item = &'a ScanResult>, path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a persisted batch CSV back into records.
pub fn read_batch(path: &Path) -> Result<Vec<ScanResult>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: ScanResult = row.with_context(|| format!("parsing {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}
