//! Writes a snapshot series to disk as GeoTIFFs plus a JSON manifest.
//!
//! File names carry the zero-padded step index, so sorting them lexically
//! gives elapsed-time order. Indices are padded to at least eight digits and
//! to the width of the last step when that is longer. Frames left in the
//! directory by an earlier export with the same prefix are removed first.
//!
//! ```text
//! output/
//! ├── elevation_00000000.tif
//! ├── elevation_00000100.tif
//! ├── elevation_00000200.tif
//! └── manifest.json
//! ```

use crate::snapshot::{SnapshotKind, SnapshotSeries};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thawslope_dem::{write_geotiff, Origin};
use tracing::{info, warn};

/// Name of the manifest written next to the rasters.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One exported snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the manifest.
    pub file: String,
    pub step: u64,
    pub elapsed_years: f64,
    pub kind: SnapshotKind,
    pub min: f64,
    pub max: f64,
}

/// Index of an exported snapshot directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub run: String,
    pub rows: usize,
    pub cols: usize,
    pub spacing_m: f64,
    /// Snapshots in elapsed-time order.
    pub snapshots: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read a manifest written by [`export_snapshots`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Where and how to write snapshots.
#[derive(Debug, Clone)]
pub struct ExportTarget {
    pub dir: PathBuf,
    pub prefix: String,
    pub spacing: f64,
    pub origin: Origin,
}

const MIN_STEP_DIGITS: usize = 8;

/// Zero-padding width that keeps every index up to `last_step` sortable.
pub fn step_digits(last_step: u64) -> usize {
    last_step.to_string().len().max(MIN_STEP_DIGITS)
}

/// `<prefix>_<step>.tif`, with `step` zero-padded to `digits`.
pub fn snapshot_file_name(prefix: &str, step: u64, digits: usize) -> String {
    format!("{}_{:0width$}.tif", prefix, step, width = digits)
}

fn is_snapshot_file(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".tif"))
        .is_some_and(|step| !step.is_empty() && step.bytes().all(|b| b.is_ascii_digit()))
}

/// Delete `<prefix>_<digits>.tif` files in `dir`; returns how many were removed.
fn remove_stale_frames(dir: &Path, prefix: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_frame = entry
            .file_name()
            .to_str()
            .is_some_and(|name| is_snapshot_file(name, prefix));
        if is_frame && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Write every snapshot and the manifest, creating `target.dir` if needed.
///
/// Afterwards the directory holds exactly the frames of `series` for
/// `target.prefix`.
pub fn export_snapshots(run: &str, series: &SnapshotSeries, target: &ExportTarget) -> Result<Manifest> {
    fs::create_dir_all(&target.dir)?;
    let removed = remove_stale_frames(&target.dir, &target.prefix)?;
    if removed > 0 {
        warn!(
            "Removed {} frames of an earlier export from {}",
            removed,
            target.dir.display()
        );
    }

    let digits = step_digits(series.last().map_or(0, |s| s.step()));
    let mut entries = Vec::with_capacity(series.len());
    for snapshot in series {
        let file = snapshot_file_name(&target.prefix, snapshot.step(), digits);
        write_geotiff(target.dir.join(&file), snapshot.field(), target.spacing, target.origin)?;
        let (min, max) = snapshot.range();
        entries.push(ManifestEntry {
            file,
            step: snapshot.step(),
            elapsed_years: snapshot.elapsed_years(),
            kind: snapshot.kind(),
            min,
            max,
        });
    }

    let (rows, cols) = series.first().map(|s| s.field().dim()).unwrap_or((0, 0));
    let manifest = Manifest {
        run: run.to_string(),
        rows,
        cols,
        spacing_m: target.spacing,
        snapshots: entries,
    };
    let writer = BufWriter::new(File::create(target.dir.join(MANIFEST_FILE))?);
    serde_json::to_writer_pretty(writer, &manifest)?;

    info!(
        "Exported {} snapshots to {}",
        manifest.snapshots.len(),
        target.dir.display()
    );
    Ok(manifest)
}
