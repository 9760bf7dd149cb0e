//! Filesystem helpers shared by the cache, keyring and settings files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{RegistryError, RegistryResult};

/// `<path>.tmp` in the same directory as `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("file"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `content` to `path` via a temp file and rename.
///
/// Parent directories are created. The temp file is removed on failure, so
/// readers see either the old file or the new one.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> RegistryResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RegistryError::io("failed to create directory", e))?;
    }

    let tmp = temp_path(path);

    if let Err(e) = fs::write(&tmp, content).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(RegistryError::io("failed to write temp file", e));
    }

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(RegistryError::io("failed to rename temp file", e));
    }

    Ok(())
}

/// Read a file, mapping a missing file to `Ok(None)`.
pub(crate) async fn read_optional(path: &Path) -> RegistryResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RegistryError::io(
            &format!("failed to read {}", path.display()),
            e,
        )),
    }
}
