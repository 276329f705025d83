//! Signal export to CSV or JSON.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tgsignal_api::service::Signal;

/// CSV column order (the `Signal` field order).
const CSV_HEADER: [&str; 9] = [
    "id",
    "ticker",
    "signal_type",
    "entry_price",
    "target_price",
    "stop_loss",
    "channel_username",
    "message_text",
    "created_at",
];

/// Highest numeric suffix tried before giving up on a free file name.
const MAX_NAME_SUFFIX: u32 = 999;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Header row plus one row per signal.
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
        }
    }
}

/// A completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Output format.
    pub format: ExportFormat,
    /// Written file.
    pub path: PathBuf,
    /// Number of signals written.
    pub records: usize,
    /// Local time of the export.
    pub at: DateTime<Local>,
}

/// Returns `signals-<YYYYmmdd-HHMMSS>.<ext>`.
#[must_use]
pub fn export_file_name(format: ExportFormat, at: &DateTime<Local>) -> String {
    format!(
        "signals-{}.{}",
        at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Returns `signals-<YYYYmmdd-HHMMSS>-<n>.<ext>`, or the plain name for
/// `n == 1`.
fn numbered_file_name(format: ExportFormat, at: &DateTime<Local>, n: u32) -> String {
    if n == 1 {
        return export_file_name(format, at);
    }
    format!(
        "signals-{}-{n}.{}",
        at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Creates a new export file in `dir`, adding a numeric suffix while the
/// name is taken. Existing files are never opened.
fn create_unique(
    dir: &Path,
    format: ExportFormat,
    at: &DateTime<Local>,
) -> Result<(File, PathBuf)> {
    for n in 1..=MAX_NAME_SUFFIX {
        let path = dir.join(numbered_file_name(format, at, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to create {}", path.display()));
            }
        }
    }
    anyhow::bail!(
        "no free export file name for {} in {}",
        export_file_name(format, at),
        dir.display()
    )
}

/// Writes signals to `writer`. Returns the number of records.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_signals<W: Write>(
    format: ExportFormat,
    signals: &[&Signal],
    writer: W,
) -> Result<usize> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);
            wtr.write_record(CSV_HEADER)
                .context("failed to write CSV header")?;
            for s in signals {
                wtr.serialize(s)
                    .with_context(|| format!("failed to write signal {} as CSV", s.id))?;
            }
            wtr.flush().context("failed to flush CSV output")?;
        }
        ExportFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, signals)
                .context("failed to write signals as JSON")?;
            writer
                .write_all(b"\n")
                .context("failed to write JSON output")?;
            writer.flush().context("failed to flush JSON output")?;
        }
    }
    Ok(signals.len())
}

/// Creates the parent directories of `path`.
fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Writes signals into an opened export file.
fn write_file(
    format: ExportFormat,
    signals: &[&Signal],
    file: File,
    path: &Path,
) -> Result<usize> {
    let records = write_signals(format, signals, BufWriter::new(file))
        .with_context(|| format!("failed to export to {}", path.display()))?;
    tracing::debug!(path = %path.display(), records, "Exported signals");
    Ok(records)
}

/// Writes signals to `path`, creating parent directories if needed.
///
/// An existing file at `path` is replaced.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written.
pub fn export_to_path(format: ExportFormat, signals: &[&Signal], path: &Path) -> Result<usize> {
    create_parent(path)?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_file(format, signals, file, path)
}

/// Writes a timestamped export file into `dir`.
///
/// Two exports within the same second get distinct files: the second one is
/// named `signals-<stamp>-2.<ext>`, and so on.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_to_dir(format: ExportFormat, signals: &[&Signal], dir: &Path) -> Result<ExportRecord> {
    let at = Local::now();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let (file, path) = create_unique(dir, format, &at)?;
    let records = write_file(format, signals, file, &path)?;
    Ok(ExportRecord {
        format,
        path,
        records,
        at,
    })
}
