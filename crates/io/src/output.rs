// Per-part weather files and timeline dumps

use std::fs;
use std::path::{Path, PathBuf};

use skylog_recon::model::{PartRecord, ReconResult};

use crate::error::IoError;
use crate::naming::LogName;

/// One rendered output file, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFile {
    pub part: usize,
    pub path: PathBuf,
    pub contents: String,
}

/// `<start>   <previous>   <current>   <next>` plus newline.
pub fn render_record(record: &PartRecord) -> String {
    format!(
        "{}   {}   {}   {}\n",
        record.start, record.previous, record.current, record.next
    )
}

/// Render one line per data part (segment 0 excluded).
pub fn render_part_records(result: &ReconResult) -> Vec<(usize, String)> {
    result
        .part_records()
        .iter()
        .map(|r| (r.part, render_record(r)))
        .collect()
}

pub fn part_path(base: &Path, detector: &str, name: &LogName, part: usize) -> PathBuf {
    base.join(detector)
        .join(name.date_dir())
        .join(name.part_file_name(part, detector))
}

/// Render every part file in memory without touching the filesystem.
pub fn plan_part_files(base: &Path, name: &LogName, result: &ReconResult) -> Vec<PartFile> {
    let detector = &result.meta.detector;
    render_part_records(result)
        .into_iter()
        .map(|(part, contents)| PartFile {
            part,
            path: part_path(base, detector, name, part),
            contents,
        })
        .collect()
}

/// Write one file per data part. Everything is rendered before the first
/// write, so a rendering problem never leaves a partial night on disk.
pub fn write_part_files(
    base: &Path,
    name: &LogName,
    result: &ReconResult,
) -> Result<Vec<PathBuf>, IoError> {
    let files = plan_part_files(base, name, result);

    for file in &files {
        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&file.path, &file.contents).map_err(|e| io_error(&file.path, e))?;
    }

    log::info!("wrote {} part file(s) under {}", files.len(), base.display());
    Ok(files.into_iter().map(|f| f.path).collect())
}

/// Pretty JSON of the night's timeline: part boundaries, midpoints and the
/// accepted local/remote observation times.
pub fn timeline_json(result: &ReconResult) -> Result<String, IoError> {
    serde_json::to_string_pretty(&result.timeline).map_err(|e| IoError::Json(e.to_string()))
}

pub fn write_timeline(path: &Path, result: &ReconResult) -> Result<(), IoError> {
    let json = timeline_json(result)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(path, json).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> IoError {
    IoError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
