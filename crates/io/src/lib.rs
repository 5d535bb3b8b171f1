//! Reading billing-route exports from disk.
//!
//! The engine never touches the file system; this crate turns paths (or a
//! folder holding both exports) into the two texts it consumes.

pub mod discover;
pub mod error;
pub mod read;

pub use discover::{classify_file_name, discover_period_files, PeriodFiles};
pub use error::IoError;
pub use read::{read_file_as_utf8, read_period_pair};
