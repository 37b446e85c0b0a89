use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use podreport_types::PodRecord;

/// Default report file name
pub const DEFAULT_REPORT_PATH: &str = "pods_report.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write report {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode report {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to move report into place at {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// What an export run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No records were given, nothing was written
    Empty,
    Written { rows: usize, path: PathBuf },
}

/// Write the header and one row per record. Returns the data-row count.
pub fn write_report<W: io::Write>(writer: W, records: &[PodRecord]) -> csv::Result<usize> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(PodRecord::COLUMNS)?;
    for record in records {
        csv.write_record(record.row())?;
    }
    csv.flush()?;

    Ok(records.len())
}

/// Writes pod reports to a fixed destination
#[derive(Debug, Clone)]
pub struct ReportExporter {
    path: PathBuf,
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_PATH)
    }
}

impl ReportExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Export `records` to the destination.
    ///
    /// An empty slice is reported as [`ExportOutcome::Empty`] and leaves the
    /// filesystem untouched. Otherwise the report is written to a temporary
    /// file next to the destination and renamed over it.
    pub fn export(&self, records: &[PodRecord]) -> Result<ExportOutcome, ExportError> {
        if records.is_empty() {
            tracing::debug!("No records given, skipping {}", self.path.display());
            return Ok(ExportOutcome::Empty);
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = self.temp_file_in(dir)?;

        let rows = write_report(tmp.as_file_mut(), records).map_err(|source| {
            ExportError::Csv {
                path: self.path.clone(),
                source,
            }
        })?;
        tmp.as_file().sync_all().map_err(|source| self.io_error(source))?;

        tmp.persist(&self.path)
            .map_err(|source| ExportError::Persist {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Wrote {} rows to {}", rows, self.path.display());
        Ok(ExportOutcome::Written {
            rows,
            path: self.path.clone(),
        })
    }

    /// Temp file that will end up with the permissions `File::create` would
    /// give the report: the existing report's mode, or 0666 minus the umask.
    #[cfg(unix)]
    fn temp_file_in(&self, dir: &Path) -> Result<NamedTempFile, ExportError> {
        use std::os::unix::fs::PermissionsExt;

        let permissions = match fs::metadata(&self.path) {
            Ok(meta) => meta.permissions(),
            Err(_) => fs::Permissions::from_mode(0o666),
        };
        tempfile::Builder::new()
            .prefix(".podreport")
            .permissions(permissions)
            .tempfile_in(dir)
            .map_err(|source| self.io_error(source))
    }

    #[cfg(not(unix))]
    fn temp_file_in(&self, dir: &Path) -> Result<NamedTempFile, ExportError> {
        NamedTempFile::new_in(dir).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> ExportError {
        ExportError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
