use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use courier_fs::{FileSink, LocalFs};
use futures_util::future::BoxFuture;
use tokio::io::AsyncWriteExt;

use crate::data::{CompletedFn, ProgressFn, ResponseBody, ResponseHead, SuccessFn};
use crate::effects::copy::{PROGRESS_INTERVAL, ProgressCopy};
use crate::error::Result;

type HeadFn = Arc<dyn Fn(ResponseHead) + Send + Sync>;

/// Streams a successful response body into a file.
///
/// The destination is created (or truncated), the body is copied with
/// time-gated progress, the file is shut down and then the completion and
/// success callbacks run in that order. Progress totals come from the
/// response's `Content-Length`.
///
/// # Examples
///
/// ```no_run
/// use courier::Download;
///
/// let download = Download::to("/tmp/archive.tar.gz")
///     .on_progress(|written, total| println!("{written}/{total:?}"))
///     .on_completed(|total| println!("done, {total} bytes"));
/// # let _ = download;
/// ```
#[derive(Clone)]
pub struct Download {
    path:      PathBuf,
    sink:      Arc<dyn FileSink>,
    interval:  Duration,
    progress:  Option<ProgressFn>,
    completed: Option<CompletedFn>,
    success:   Option<HeadFn>,
}

impl Download {
    /// Download into `path` on the local file system.
    pub fn to(path: impl Into<PathBuf>) -> Self {
        Self {
            path:      path.into(),
            sink:      Arc::new(LocalFs::new()),
            interval:  PROGRESS_INTERVAL,
            progress:  None,
            completed: None,
            success:   None,
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Write through a different [`FileSink`].
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn FileSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Minimum spacing between progress events.
    ///
    /// Default: 1s
    #[must_use]
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, f: impl Fn(u64, Option<u64>) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn on_completed(mut self, f: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.completed = Some(Arc::new(f));
        self
    }

    /// Called with the response head once the file is fully written.
    #[must_use]
    pub fn on_success(mut self, f: impl Fn(ResponseHead) + Send + Sync + 'static) -> Self {
        self.success = Some(Arc::new(f));
        self
    }

    async fn write(&self, head: ResponseHead, body: ResponseBody) -> Result<()> {
        let writer = self.sink.open_write(&self.path).await?;

        let mut copy = ProgressCopy::new(body, writer)
            .total(head.content_length())
            .interval(self.interval);
        if let Some(ref progress) = self.progress {
            copy = copy.on_progress(move |written, total| progress(written, total));
        }
        if let Some(ref completed) = self.completed {
            copy = copy.on_completed(move |total| completed(total));
        }

        let written = copy.run().await?;
        tracing::debug!(path = %self.path.display(), bytes = written, "download written");

        if let Some(ref success) = self.success {
            success(head);
        }
        Ok(())
    }

    pub(crate) fn into_handler(self) -> SuccessFn {
        let download = Arc::new(self);
        Arc::new(move |head: ResponseHead, body: ResponseBody| -> BoxFuture<'static, Result<()>> {
            let download = Arc::clone(&download);
            Box::pin(async move { download.write(head, body).await })
        })
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("path", &self.path)
            .field("interval", &self.interval)
            .field("progress", &self.progress.is_some())
            .field("completed", &self.completed.is_some())
            .field("success", &self.success.is_some())
            .finish_non_exhaustive()
    }
}

/// Success handler appending the whole body to `path`.
pub(crate) fn append_handler(path: PathBuf, sink: Arc<dyn FileSink>) -> SuccessFn {
    Arc::new(move |_head: ResponseHead, mut body: ResponseBody| -> BoxFuture<'static, Result<()>> {
        let path = path.clone();
        let sink = Arc::clone(&sink);
        Box::pin(async move {
            let created = !sink.exists(&path).await?;
            let mut writer = sink.open_append(&path).await?;
            let appended = tokio::io::copy(&mut body, &mut writer).await?;
            writer.shutdown().await?;
            tracing::debug!(path = %path.display(), bytes = appended, created, "response appended");
            Ok(())
        })
    })
}
