use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::models::Result;

/// Narrow filesystem seam for the output directory, so export and digest
/// logic can be exercised without touching a real disk.
#[async_trait]
pub trait ExportStore: Send + Sync {
    /// Idempotent create of the output directory.
    async fn ensure_dir(&self) -> Result<()>;

    /// File names (not paths) in the directory ending with `suffix`.
    async fn list_files(&self, suffix: &str) -> Result<Vec<String>>;

    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    async fn write_file(&self, name: &str, contents: &[u8]) -> Result<()>;
}

pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

#[async_trait]
impl ExportStore for DiskStore {
    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn list_files(&self, suffix: &str) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(suffix) && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }

        // Directory iteration order is platform-defined; sort for stable
        // attachment ordering.
        names.sort();
        Ok(names)
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path_for(name)).await?)
    }

    async fn write_file(&self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        debug!("Writing {} bytes to {:?}", contents.len(), path);
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}
