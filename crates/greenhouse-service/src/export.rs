//! JSON snapshots of every sensor's history.

use std::path::{Path, PathBuf};

use greenhouse_core::{Reading, SensorKind, SensorRegistry};
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

/// Export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to format export timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Full histories of all sensors at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub temperatura: Vec<Reading>,
    pub humedad: Vec<Reading>,
    pub ph: Vec<Reading>,
}

impl Snapshot {
    /// Copy every sensor's history.
    pub fn capture(registry: &SensorRegistry) -> Self {
        Self {
            temperatura: registry.get(SensorKind::Temperature).all(),
            humedad: registry.get(SensorKind::Humidity).all(),
            ph: registry.get(SensorKind::Ph).all(),
        }
    }
}

/// File name for a snapshot taken at `at`: `datos_sensores_YYYYMMDD_HHMMSS.json`.
pub fn file_name(at: OffsetDateTime) -> Result<String, ExportError> {
    let stamp = at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))?;
    Ok(format!("datos_sensores_{}.json", stamp))
}

/// Write `snapshot` as pretty JSON into `directory`, naming the file after `at`.
///
/// Returns the path written. The directory is created if missing.
pub fn write_snapshot(
    snapshot: &Snapshot,
    directory: &Path,
    at: OffsetDateTime,
) -> Result<PathBuf, ExportError> {
    let path = directory.join(file_name(at)?);
    let content = serde_json::to_string_pretty(snapshot)?;

    std::fs::create_dir_all(directory).map_err(|e| ExportError::Write {
        path: directory.to_path_buf(),
        source: e,
    })?;
    std::fs::write(&path, content).map_err(|e| ExportError::Write {
        path: path.clone(),
        source: e,
    })?;

    info!(
        "Saved {} reading(s) to {}",
        snapshot.temperatura.len() + snapshot.humedad.len() + snapshot.ph.len(),
        path.display()
    );
    Ok(path)
}
