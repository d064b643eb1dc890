use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{self, AsyncReadExt, AsyncWriteExt},
};

/// Reads the whole file under a shared lock. A missing file is not an error, it's [None].
pub async fn read_locked(path: &Path) -> Result<Option<Vec<u8>>, io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    file.lock_shared()?;
    let mut contents = Vec::new();
    let result = file.read_to_end(&mut contents).await;
    file.unlock_async().await?;
    result?;

    Ok(Some(contents))
}

/// Replaces the file contents as a whole. Data is written into a sibling temp file under an
/// exclusive lock, synced, and then renamed over `path`, so readers only ever see the previous
/// or the new contents.
pub async fn replace_locked(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temp_path = sibling_path(path, ".tmp");
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .await?;

    file.lock_exclusive()?;
    let result = write_synced(&mut file, contents).await;
    file.unlock_async().await?;
    drop(file);

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await
}

/// Renames `path` to `<path><suffix>` and returns the new location.
pub async fn move_aside(path: &Path, suffix: &str) -> Result<PathBuf, io::Error> {
    let target = sibling_path(path, suffix);
    tokio::fs::rename(path, &target).await?;
    Ok(target)
}

async fn write_synced(file: &mut File, contents: &[u8]) -> Result<(), io::Error> {
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(suffix);
    path.with_file_name(name)
}
