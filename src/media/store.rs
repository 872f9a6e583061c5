use anyhow::{anyhow, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

static STAGING_DIR: &str = ".staging";

/// Directory of completed video files, addressed by bare file name.
///
/// Downloads land in a staging area and are renamed into place on commit,
/// so a resolvable name never points at a truncated file.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the store root and its staging area exist
    pub async fn ensure_dirs(&self) -> Result<()> {
        let staging = self.root.join(STAGING_DIR);
        if !fs::try_exists(&staging).await? {
            debug!("store: creating {:?}", staging);
            fs::create_dir_all(&staging).await?;
        }
        Ok(())
    }

    /// Clear leftovers from interrupted downloads. Must run before any
    /// staged write is in flight, so only at startup.
    pub async fn sweep_staging(&self) -> Result<usize> {
        let staging = self.root.join(STAGING_DIR);
        if !fs::try_exists(&staging).await? {
            return Ok(0);
        }
        let mut removed = 0;
        let mut entries = fs::read_dir(&staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Err(e) = fs::remove_file(entry.path()).await {
                warn!("store: failed to sweep {:?}: {}", entry.path(), e);
            } else {
                removed += 1;
            }
        }
        if removed > 0 {
            info!("store: swept {} stale staging file(s)", removed);
        }
        Ok(removed)
    }

    /// A name is addressable when it is a bare file name: no separators,
    /// no leading dot. Keeps `.staging` and parent directories out of reach.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
    }

    /// Resolve a client-supplied name to its path under the root.
    /// Returns `None` for names that are not addressable.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if Self::is_valid_name(name) {
            Some(self.root.join(name))
        } else {
            None
        }
    }

    /// Open a committed file for reading, along with its byte length.
    /// `Ok(None)` means the name does not resolve to a committed file.
    pub async fn open(&self, name: &str) -> Result<Option<(File, u64)>> {
        let Some(path) = self.resolve(name) else {
            debug!("store: rejected name {:?}", name);
            return Ok(None);
        };
        match File::open(&path).await {
            Ok(file) => {
                let size = file.metadata().await?.len();
                Ok(Some((file, size)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Start a staged write for `name`. Nothing is visible under `name`
    /// until [`StagedMedia::commit`] runs.
    pub async fn create(&self, name: &str) -> Result<StagedMedia> {
        let target = self
            .resolve(name)
            .ok_or_else(|| anyhow!("invalid media name: {:?}", name))?;
        self.ensure_dirs().await?;
        let staged = self
            .root
            .join(STAGING_DIR)
            .join(format!("{}_{}", Uuid::new_v4(), name));
        let file = File::create(&staged).await?;
        Ok(StagedMedia {
            file,
            staged,
            target,
            written: 0,
        })
    }
}

/// An in-progress download. Commit renames it into the store root;
/// drop or discard leaves the store unchanged.
pub struct StagedMedia {
    file: File,
    staged: PathBuf,
    target: PathBuf,
    written: u64,
}

impl StagedMedia {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Finish the write and rename the file into place atomically.
    /// A failed rename removes the staged file rather than stranding it.
    pub async fn commit(mut self) -> Result<(PathBuf, u64)> {
        self.file.flush().await?;
        drop(self.file);
        if let Err(e) = fs::rename(&self.staged, &self.target).await {
            let _ = fs::remove_file(&self.staged).await;
            return Err(e.into());
        }
        info!(
            "store: committed {:?} -> {} bytes",
            self.target.file_name().unwrap_or_default(),
            self.written
        );
        Ok((self.target, self.written))
    }

    /// Drop the staged bytes without publishing anything.
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = fs::remove_file(&self.staged).await {
            warn!("store: failed to discard {:?}: {}", self.staged, e);
        }
    }
}
