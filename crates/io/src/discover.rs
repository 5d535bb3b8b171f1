use std::path::{Path, PathBuf};

use meterroute_recon::Period;

use crate::error::IoError;

/// Period implied by an export's file name: leading `1` is the current
/// period, leading `2` the previous one.
pub fn classify_file_name(name: &str) -> Option<Period> {
    match name.chars().next()? {
        '1' => Some(Period::Current),
        '2' => Some(Period::Previous),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodFiles {
    pub current: PathBuf,
    pub previous: PathBuf,
}

/// Pick the current and previous exports out of a folder. Entries are
/// visited in file-name order and a later match replaces an earlier one.
/// Subdirectories are ignored.
pub fn discover_period_files(dir: &Path) -> Result<PeriodFiles, IoError> {
    if !dir.is_dir() {
        return Err(IoError::NotADirectory(dir.to_path_buf()));
    }
    let read_err = |e: std::io::Error| IoError::Read {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        entries.push((entry.file_name().to_string_lossy().into_owned(), path));
    }
    entries.sort();

    let mut current = None;
    let mut previous = None;
    for (name, path) in entries {
        match classify_file_name(&name) {
            Some(Period::Current) => current = Some(path),
            Some(Period::Previous) => previous = Some(path),
            None => log::debug!("skipping {name}: not a period export"),
        }
    }

    let current = current.ok_or(IoError::MissingPeriod { period: Period::Current })?;
    let previous = previous.ok_or(IoError::MissingPeriod { period: Period::Previous })?;
    log::debug!("period files: current={} previous={}", current.display(), previous.display());
    Ok(PeriodFiles { current, previous })
}
