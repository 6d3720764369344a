//! Scoped temporary files
//!
//! Every file the pipeline writes to local disk is a [`TempArtifact`]. It is removed either by
//! an explicit [`TempArtifact::release`], whose failure the caller can log, or by `Drop` on any
//! other exit path (error return, panic, or the owning future being cancelled).

use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;

#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    label: &'static str,
    released: bool,
}

impl TempArtifact {
    /// Create an empty, uniquely named file in `dir`.
    ///
    /// `suffix` should include the dot (".wav"); ffmpeg picks the muxer from it in some cases.
    pub async fn create_in(dir: &Path, suffix: &str, label: &'static str) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;

        let named = tempfile::Builder::new()
            .prefix("clipvault-")
            .suffix(suffix)
            .tempfile_in(dir)?;
        let (_file, path) = named.keep().map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), label = label, "Temporary artifact created");

        Ok(Self {
            path,
            label,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Open for writing, truncating existing contents.
    pub async fn writer(&self) -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .await
    }

    pub async fn write_all(&self, data: &[u8]) -> io::Result<()> {
        fs::write(&self.path, data).await
    }

    pub async fn size(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path).await?.len())
    }

    /// Up to `len` leading bytes, for format sniffing.
    pub async fn read_header(&self, len: usize) -> io::Result<Vec<u8>> {
        let file = fs::File::open(&self.path).await?;
        let mut header = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut header).await?;
        Ok(header)
    }

    pub async fn read_all(&self) -> io::Result<Bytes> {
        Ok(Bytes::from(fs::read(&self.path).await?))
    }

    /// Delete the file now. An already missing file counts as released.
    pub async fn release(mut self) -> io::Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        self.released = true;
        tracing::debug!(path = %self.path.display(), label = self.label, "Temporary artifact released");
        Ok(())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(
                    path = %self.path.display(),
                    label = self.label,
                    "Temporary artifact removed on drop"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    label = self.label,
                    error = %e,
                    "Failed to remove temporary artifact"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn release_removes_file() {
        let dir = tempdir().unwrap();
        let artifact = TempArtifact::create_in(dir.path(), ".wav", "upload")
            .await
            .unwrap();
        artifact.write_all(b"RIFF").await.unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with(".wav"));

        artifact.release().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_removes_file() {
        let dir = tempdir().unwrap();
        let path = {
            let artifact = TempArtifact::create_in(dir.path(), ".mp3", "transcoded")
                .await
                .unwrap();
            artifact.write_all(b"ID3").await.unwrap();
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn release_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let artifact = TempArtifact::create_in(dir.path(), ".wav", "upload")
            .await
            .unwrap();
        std::fs::remove_file(artifact.path()).unwrap();
        assert!(artifact.release().await.is_ok());
    }

    #[tokio::test]
    async fn cancelled_task_still_removes_file() {
        let dir = tempdir().unwrap();
        let upload_dir = dir.path().to_path_buf();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            let artifact = TempArtifact::create_in(&upload_dir, ".wav", "upload")
                .await
                .unwrap();
            let _ = tx.send(artifact.path().to_path_buf());
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            drop(artifact);
        });

        let path = rx.await.unwrap();
        assert!(path.exists());
        handle.abort();
        let _ = handle.await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reads_header_and_size() {
        let dir = tempdir().unwrap();
        let artifact = TempArtifact::create_in(dir.path(), ".bin", "upload")
            .await
            .unwrap();
        artifact.write_all(b"fLaC and more").await.unwrap();
        assert_eq!(artifact.read_header(4).await.unwrap(), b"fLaC");
        assert_eq!(artifact.size().await.unwrap(), 13);
        assert_eq!(&artifact.read_all().await.unwrap()[..], b"fLaC and more");
    }
}
