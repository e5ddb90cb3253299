use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{BodyProvider, BodyReader, BodySource, ProgressHooks};
use crate::core::{closing_boundary, field_part, file_part_head, flatten, generate_boundary};
use crate::error::{Error, Result};

/// One file part of a multipart upload.
///
/// The multipart body takes ownership of the reader and drops it once the
/// part has been streamed.
pub struct NamedFileStream {
    field:        String,
    file_name:    String,
    content_type: String,
    reader:       BodyReader,
    len:          Option<u64>,
}

impl NamedFileStream {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            field:        field.into(),
            file_name:    file_name.into(),
            content_type: content_type.into(),
            reader:       Box::new(reader),
            len:          None,
        }
    }

    /// Declare the exact byte length of the reader.
    #[must_use]
    pub fn with_len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    /// Open a file from disk; the file name is taken from `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or inspected.
    pub async fn open(field: impl Into<String>, path: impl AsRef<Path>, content_type: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(field, file_name, content_type, file).with_len(len))
    }

    pub fn field(&self) -> &str { &self.field }

    pub fn file_name(&self) -> &str { &self.file_name }
}

impl fmt::Debug for NamedFileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFileStream")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// A `multipart/form-data` body of form fields followed by file parts.
///
/// Layout: a leading CRLF, every field part, every file part (each file's
/// bytes followed by CRLF), then a single closing delimiter.
pub struct MultipartBody {
    boundary:     String,
    content_type: String,
    params:       Vec<(String, String)>,
    files:        Mutex<Option<Vec<NamedFileStream>>>,
    file_count:   usize,
    hooks:        ProgressHooks,
}

impl Default for MultipartBody {
    fn default() -> Self { Self::new() }
}

impl MultipartBody {
    /// An empty body with a freshly generated boundary.
    pub fn new() -> Self {
        let boundary = generate_boundary();
        Self {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            boundary,
            params: Vec::new(),
            files: Mutex::new(Some(Vec::new())),
            file_count: 0,
            hooks: ProgressHooks::default(),
        }
    }

    pub fn boundary(&self) -> &str { &self.boundary }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add the fields of a serializable struct or map as form parameters.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Serialize`] if `value` is not a struct or map.
    pub fn params_from<S: Serialize + ?Sized>(self, value: &S) -> Result<Self> { Ok(self.params(flatten(value)?)) }

    #[must_use]
    pub fn file(mut self, file: NamedFileStream) -> Self {
        self.files
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(Vec::new)
            .push(file);
        self.file_count += 1;
        self
    }

    #[must_use]
    pub fn files(self, files: impl IntoIterator<Item = NamedFileStream>) -> Self {
        files.into_iter().fold(self, Self::file)
    }

    #[must_use]
    pub fn hooks(mut self, hooks: ProgressHooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn take_files(&self) -> Result<Vec<NamedFileStream>> {
        let mut guard = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if self.file_count == 0 {
            return Ok(Vec::new());
        }
        guard.take().ok_or(Error::BodyConsumed)
    }

    fn assemble(&self, files: Vec<NamedFileStream>) -> BodySource {
        let mut prefix = String::from("\r\n");
        for (name, value) in &self.params {
            prefix.push_str(&field_part(&self.boundary, name, value));
        }

        let mut len = Some(prefix.len() as u64);
        let mut reader: BodyReader = Box::new(Cursor::new(prefix.into_bytes()));

        for file in files {
            let head = file_part_head(&self.boundary, &file.field, &file.file_name, &file.content_type);
            len = len
                .zip(file.len)
                .map(|(so_far, file_len)| so_far + head.len() as u64 + file_len + 2);
            reader = Box::new(
                reader
                    .chain(Cursor::new(head.into_bytes()))
                    .chain(file.reader)
                    .chain(Cursor::new(b"\r\n".to_vec())),
            );
        }

        let closing = closing_boundary(&self.boundary);
        len = len.map(|so_far| so_far + closing.len() as u64);
        reader = Box::new(reader.chain(Cursor::new(closing.into_bytes())));

        BodySource::new(reader, len)
    }
}

impl fmt::Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("boundary", &self.boundary)
            .field("params", &self.params)
            .field("file_count", &self.file_count)
            .finish_non_exhaustive()
    }
}

impl BodyProvider for MultipartBody {
    fn content_type(&self) -> &str { &self.content_type }

    fn open(&self) -> BoxFuture<'_, Result<BodySource>> {
        let files = self.take_files();
        Box::pin(async move { Ok(self.assemble(files?)) })
    }

    fn on_progress(&self, sent: u64, total: Option<u64>) { self.hooks.progress(sent, total); }

    fn on_completed(&self, total: u64) { self.hooks.completed(total); }
}
