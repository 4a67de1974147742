use std::{io::Write, path::Path};

use tempfile::{NamedTempFile, TempDir};

use crate::result::Result;

/// Prefix of the hidden directory where raw tracks are fetched before being moved in place
pub const STAGING_PREFIX: &str = ".staging-";

/// Replace the file content so that a crash never leaves a half-written file.
///
/// The data is written in a temporary file next to the target, then renamed over it.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Create a hidden staging directory inside `out_dir`.
///
/// The directory and whatever remains in it are deleted when the handle is dropped.
/// Being in the same directory tree makes the final move a simple rename.
pub fn staging_dir(out_dir: &Path) -> Result<TempDir> {
    Ok(tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(out_dir)?)
}

/// Move a file, falling back to copy + delete across filesystems
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_err() {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}
