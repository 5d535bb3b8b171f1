use std::fmt;
use std::path::PathBuf;

use meterroute_recon::Period;

#[derive(Debug)]
pub enum IoError {
    Read { path: PathBuf, message: String },
    /// Folder scan found no file for this period.
    MissingPeriod { period: Period },
    NotADirectory(PathBuf),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::MissingPeriod { period } => {
                let prefix = match period {
                    Period::Current => '1',
                    Period::Previous => '2',
                };
                write!(f, "no {period} period file (name starting with '{prefix}') found")
            }
            Self::NotADirectory(path) => write!(f, "not a directory: {}", path.display()),
        }
    }
}

impl std::error::Error for IoError {}
