use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open {} for writing", path.display())]
    OpenWrite {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {} for appending", path.display())]
    OpenAppend {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create parent directory {}", path.display())]
    CreateParent {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to inspect {}", path.display())]
    Metadata {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path is a directory: {}", path.display())]
    IsDirectory { path: PathBuf },
}

impl Error {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::OpenWrite { path, .. }
            | Error::OpenAppend { path, .. }
            | Error::CreateParent { path, .. }
            | Error::Metadata { path, .. }
            | Error::IsDirectory { path } => path,
        }
    }

    /// The underlying I/O error kind, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::OpenWrite { source, .. }
            | Error::OpenAppend { source, .. }
            | Error::CreateParent { source, .. }
            | Error::Metadata { source, .. } => Some(source.kind()),
            Error::IsDirectory { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
