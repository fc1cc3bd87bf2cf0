//src/reader.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{ProfileError, Result};

/// Opens a text input, transparently decompressing it when the name ends in `.gz`.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let f = File::open(path).map_err(|e| ProfileError::read(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead + Send> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

/// Reads every line of `path`, numbered from 1, with the trailing newline
/// (and a `\r` before it) removed.
pub fn read_numbered_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let reader = open_text(path)?;
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let mut line = line.map_err(|e| ProfileError::read(path, e))?;
        if line.ends_with('\r') {
            line.pop();
        }
        lines.push((idx + 1, line));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_reads_plain_and_gzip_alike() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("a.txt");
        std::fs::write(&plain, "one\r\ntwo\n").unwrap();

        let gz = dir.path().join("a.txt.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(b"one\r\ntwo\n").unwrap();
        enc.finish().unwrap();

        let expected = vec![(1, "one".to_string()), (2, "two".to_string())];
        assert_eq!(read_numbered_lines(&plain).unwrap(), expected);
        assert_eq!(read_numbered_lines(&gz).unwrap(), expected);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_numbered_lines(Path::new("/tmp/non/existent.txt")).unwrap_err();
        assert!(matches!(err, ProfileError::Read { .. }));
        assert!(err.to_string().contains("/tmp/non/existent.txt"));
    }
}
