use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek};

/// Readable, seekable media stream. Blanket-implemented for anything that fits.
pub trait MediaReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> MediaReader for T {}

pub struct OpenedFile {
    pub reader: Box<dyn MediaReader>,
    /// Total length in bytes.
    pub size: u64,
}

/// Source of the bytes behind a song path.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Open `path`, given relative to the music directory.
    async fn open(&self, path: &Path) -> io::Result<OpenedFile>;
}

/// Filesystem rooted at MPD's music directory on local disk.
#[derive(Debug, Clone)]
pub struct OsFilesystem {
    root: PathBuf,
}

impl OsFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Join `relative` onto the root, refusing anything that could escape it.
    pub fn resolve(&self, relative: &Path) -> io::Result<PathBuf> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("path outside music directory: {}", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Filesystem for OsFilesystem {
    async fn open(&self, path: &Path) -> io::Result<OpenedFile> {
        let full = self.resolve(path)?;
        let file = tokio::fs::File::open(&full).await?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", full.display()),
            ));
        }
        Ok(OpenedFile {
            reader: Box::new(file),
            size: meta.len(),
        })
    }
}
