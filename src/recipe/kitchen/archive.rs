// src/recipe/kitchen/archive.rs

//! Archive and source file utilities for the Kitchen

use crate::error::{Error, Result};
use crate::hash::{Checksum, sha256_file};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use xz2::read::XzDecoder;

/// Verify a downloaded file against the checksum declared for `url`
pub fn verify_file_checksum(path: &Path, expected: &Checksum, url: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !expected.matches(&actual) {
        return Err(Error::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Extract an archive to a destination directory
///
/// Supports: .tar.gz, .tgz, .tar.xz, .txz, .tar
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let filename = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let reader: Box<dyn Read> = if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
        Box::new(GzDecoder::new(open(archive)?))
    } else if filename.ends_with(".tar.xz") || filename.ends_with(".txz") {
        Box::new(XzDecoder::new(open(archive)?))
    } else if filename.ends_with(".tar") {
        Box::new(open(archive)?)
    } else {
        return Err(Error::ParseError(format!(
            "Unknown archive format: {}",
            filename
        )));
    };

    fs::create_dir_all(dest)?;
    tar::Archive::new(reader).unpack(dest).map_err(|e| {
        Error::IoError(format!("Failed to extract {}: {}", archive.display(), e))
    })?;

    debug!("Extracted {} to {}", archive.display(), dest.display());
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
    Ok(BufReader::new(file))
}

/// Find the actual source directory after extraction
///
/// Archives usually wrap everything in one top-level directory; if so, that
/// directory is the source root.
pub fn source_root(extract_dir: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extract_dir)?
        .filter_map(|e| e.ok())
        .collect();

    if entries.len() == 1 && entries[0].file_type().map(|t| t.is_dir()).unwrap_or(false) {
        return Ok(entries[0].path());
    }
    Ok(extract_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::kitchen::testutil::make_tarball;

    #[test]
    fn test_extract_and_find_source_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = make_tarball(dir.path(), "ply-3.11.tar.gz", "ply-3.11", &[("setup.py", "print()")]);
        let dest = dir.path().join("out");

        extract_archive(&archive, &dest).unwrap();
        let root = source_root(&dest).unwrap();
        assert_eq!(root, dest.join("ply-3.11"));
        assert!(root.join("setup.py").exists());
    }

    #[test]
    fn test_verify_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, b"hello world").unwrap();

        let good: Checksum = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
            .parse()
            .unwrap();
        assert!(verify_file_checksum(&path, &good, "file:///data").is_ok());

        let bad: Checksum = "0".repeat(64).parse().unwrap();
        match verify_file_checksum(&path, &bad, "file:///data") {
            Err(Error::ChecksumMismatch { url, actual, .. }) => {
                assert_eq!(url, "file:///data");
                assert_eq!(actual, good.as_hex());
            }
            other => panic!("expected ChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_archive_unknown_format() {
        let result = extract_archive(Path::new("file.unknown"), Path::new("/tmp"));
        assert!(result.is_err());
    }
}
