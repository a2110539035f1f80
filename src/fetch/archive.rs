use crate::error::Result;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Unpack a tar or gzip-compressed tar archive into `destination`.
pub fn unpack(bytes: &[u8], destination: &Path) -> Result<()> {
    let reader: Box<dyn Read + '_> = if bytes.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(bytes))
    } else {
        Box::new(bytes)
    };

    Archive::new(reader).unpack(destination)?;
    Ok(())
}

/// Unpack an archive into a fresh temporary directory
pub fn unpack_to_temp(bytes: &[u8]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    unpack(bytes, dir.path())?;
    Ok(dir)
}

/// `dir` itself, or its only entry when that entry is a directory.
///
/// Release tarballs usually wrap their content in a single top-level
/// directory such as `foo-1.0/`.
pub fn this_or_only_subdir(dir: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    if entries.len() == 1 {
        let entry = entries.remove(0);
        if entry.file_type()?.is_dir() {
            return Ok(entry.path());
        }
    }
    Ok(dir.to_path_buf())
}
