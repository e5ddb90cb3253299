use std::path::Path;

use futures_util::future::BoxFuture;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWrite;

use crate::{Error, Result, SinkOptions};

/// A writable byte destination handed out by a [`FileSink`].
pub type SinkWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// The capability download handlers need from a file system.
///
/// Implementations decide where bytes land; callers only open, write and
/// shut the returned writer down.
pub trait FileSink: Send + Sync {
    /// Create `path` (or truncate it) and return a writer positioned at its start.
    fn open_write<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<SinkWriter>>;

    /// Open `path` for appending, creating it when missing.
    fn open_append<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<SinkWriter>>;

    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<bool>>;
}

/// [`FileSink`] backed by the local file system through `tokio::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs {
    options: SinkOptions,
}

impl LocalFs {
    pub fn new() -> Self { Self::default() }

    pub fn with_options(options: SinkOptions) -> Self { Self { options } }

    pub fn options(&self) -> SinkOptions { self.options }

    async fn prepare(&self, path: &Path) -> Result<()> {
        if let Ok(meta) = fs::metadata(path).await
            && meta.is_dir()
        {
            return Err(Error::IsDirectory {
                path: path.to_path_buf(),
            });
        }

        if !self.options.get_create_parents() {
            return Ok(());
        }

        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| Error::CreateParent {
                        path: parent.to_path_buf(),
                        source,
                    })
            }
            _ => Ok(()),
        }
    }

    fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.create(true);
        #[cfg(unix)]
        options.mode(self.options.get_permissions());
        options
    }
}

impl FileSink for LocalFs {
    fn open_write<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<SinkWriter>> {
        Box::pin(async move {
            self.prepare(path).await?;
            let file = self
                .open_options()
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(|source| Error::OpenWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
            tracing::trace!(path = %path.display(), "opened file for writing");
            Ok(Box::new(file) as SinkWriter)
        })
    }

    fn open_append<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<SinkWriter>> {
        Box::pin(async move {
            self.prepare(path).await?;
            let file = self
                .open_options()
                .append(true)
                .open(path)
                .await
                .map_err(|source| Error::OpenAppend {
                    path: path.to_path_buf(),
                    source,
                })?;
            tracing::trace!(path = %path.display(), "opened file for appending");
            Ok(Box::new(file) as SinkWriter)
        })
    }

    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            fs::try_exists(path).await.map_err(|source| Error::Metadata {
                path: path.to_path_buf(),
                source,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_open_write_rejects_directory() {
        let dir = tempdir().unwrap();
        let sink = LocalFs::new();

        let err = sink.open_write(dir.path()).await.err().unwrap();
        assert!(matches!(err, Error::IsDirectory { .. }));
        assert_eq!(err.path(), dir.path());
    }

    #[tokio::test]
    async fn test_open_write_without_parent_creation() {
        let dir = tempdir().unwrap();
        let sink = LocalFs::with_options(SinkOptions::new().create_parents(false));
        let path = dir.path().join("missing").join("out.bin");

        let err = sink.open_write(&path).await.err().unwrap();
        assert!(matches!(err, Error::OpenWrite { .. }));
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_open_write_applies_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let sink = LocalFs::with_options(SinkOptions::new().permissions(0o600));
        let path = dir.path().join("secret.bin");

        let mut writer = sink.open_write(&path).await.unwrap();
        writer.write_all(b"x").await.unwrap();
        writer.shutdown().await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
