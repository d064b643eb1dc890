use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::fs::operations::{move_aside, read_locked, replace_locked};

/// A single named place holding the serialized record sequence. It is read wholesale at startup
/// and overwritten wholesale on every change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotStorage: Send + Sync {
    /// Returns the current contents, or [None] if nothing was ever saved.
    async fn load(&self) -> Result<Option<Vec<u8>>>;

    async fn save(&self, contents: Vec<u8>) -> Result<()>;

    /// Called when the contents couldn't be parsed. Implementations should make sure the next
    /// [SlotStorage::save] doesn't silently destroy them.
    async fn discard_corrupt(&self) -> Result<()>;
}

#[async_trait]
impl<T> SlotStorage for T
where
    T: Deref + Send + Sync,
    T::Target: SlotStorage,
{
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        self.deref().load().await
    }

    async fn save(&self, contents: Vec<u8>) -> Result<()> {
        self.deref().save(contents).await
    }

    async fn discard_corrupt(&self) -> Result<()> {
        self.deref().discard_corrupt().await
    }
}

/// Slot backed by a JSON file on disk.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub const DEFAULT_FILE_NAME: &'static str = "records.json";

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SlotStorage for FileSlot {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        debug!("Reading slot {:?}", self.path);
        read_locked(&self.path)
            .await
            .with_context(|| format!("Couldn't read {:?}", self.path))
    }

    async fn save(&self, contents: Vec<u8>) -> Result<()> {
        debug!("Writing {} bytes into {:?}", contents.len(), self.path);
        replace_locked(&self.path, &contents)
            .await
            .with_context(|| format!("Couldn't write {:?}", self.path))
    }

    async fn discard_corrupt(&self) -> Result<()> {
        let suffix = format!(".corrupt-{}", chrono::Utc::now().timestamp());
        let moved = move_aside(&self.path, &suffix)
            .await
            .with_context(|| format!("Couldn't move corrupt {:?} aside", self.path))?;
        warn!("Moved unreadable records to {moved:?}");
        Ok(())
    }
}

/// Slot that only lives as long as the process. Used for throwaway sessions and tests.
#[derive(Default)]
pub struct MemorySlot {
    contents: Mutex<Option<Vec<u8>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl SlotStorage for MemorySlot {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.contents())
    }

    async fn save(&self, contents: Vec<u8>) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(contents);
        Ok(())
    }

    async fn discard_corrupt(&self) -> Result<()> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
