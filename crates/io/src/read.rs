use std::io::Read;
use std::path::Path;
use std::thread;

use crate::error::IoError;

/// Read a file as text. Exports saved by spreadsheet tools are often
/// Windows-1252, so invalid UTF-8 is decoded as that instead of failing.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |e: std::io::Error| IoError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Read both period files to completion. The reads run side by side; the
/// current-period error is reported first when both fail.
pub fn read_period_pair(current: &Path, previous: &Path) -> Result<(String, String), IoError> {
    let (current_text, previous_text) = thread::scope(|s| {
        let prev = s.spawn(|| read_file_as_utf8(previous));
        let curr = read_file_as_utf8(current);
        let prev = prev.join().unwrap_or_else(|_| {
            Err(IoError::Read {
                path: previous.to_path_buf(),
                message: "reader thread panicked".into(),
            })
        });
        (curr, prev)
    });
    Ok((current_text?, previous_text?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn utf8_passes_through() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "1.csv", "Rota;Situação\n".as_bytes());
        assert_eq!(read_file_as_utf8(&path).unwrap(), "Rota;Situação\n");
    }

    #[test]
    fn windows_1252_fallback() {
        let dir = TempDir::new().unwrap();
        // "Não" with ã as 0xE3
        let path = write(&dir, "2.csv", b"N\xe3o Informada\n");
        assert_eq!(read_file_as_utf8(&path).unwrap(), "Não Informada\n");
    }

    #[test]
    fn missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");
        let err = read_file_as_utf8(&path).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn pair_reads_both() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "1_a.csv", b"current");
        let b = write(&dir, "2_b.csv", b"previous");
        assert_eq!(
            read_period_pair(&a, &b).unwrap(),
            ("current".to_string(), "previous".to_string())
        );

        let missing = dir.path().join("nope.csv");
        let err = read_period_pair(&a, &missing).unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
