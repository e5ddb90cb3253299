use std::io::{self, SeekFrom};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

/// Buffer size of a single read/write round.
pub const COPY_BUFFER_SIZE: usize = 4096;

/// Default minimum spacing between two progress events.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

type ProgressObserver<'a> = Box<dyn FnMut(u64, Option<u64>) + Send + 'a>;
type CompletedObserver<'a> = Box<dyn FnMut(u64) + Send + 'a>;

/// Copies a reader into a writer, reporting progress along the way.
///
/// Progress is time-gated: an event fires after a chunk is written once at
/// least `interval` has passed since the previous event (or since the copy
/// started). After the source is exhausted the destination is flushed and
/// shut down, then exactly one completion event carries the byte count.
///
/// # Examples
///
/// ```
/// use courier::effects::ProgressCopy;
///
/// # tokio_test_block(async {
/// let mut out = Vec::new();
/// let copied = ProgressCopy::new(&b"hello"[..], &mut out)
///     .on_completed(|total| assert_eq!(total, 5))
///     .run()
///     .await
///     .unwrap();
/// assert_eq!(copied, 5);
/// assert_eq!(out, b"hello");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
pub struct ProgressCopy<'a, R, W> {
    reader:       R,
    writer:       W,
    total:        Option<u64>,
    interval:     Duration,
    on_progress:  Option<ProgressObserver<'a>>,
    on_completed: Option<CompletedObserver<'a>>,
}

impl<'a, R, W> ProgressCopy<'a, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            total: None,
            interval: PROGRESS_INTERVAL,
            on_progress: None,
            on_completed: None,
        }
    }

    /// Expected number of bytes, forwarded with every progress event.
    #[must_use]
    pub fn total(mut self, total: Option<u64>) -> Self {
        self.total = total;
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, f: impl FnMut(u64, Option<u64>) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_completed(mut self, f: impl FnMut(u64) + Send + 'a) -> Self {
        self.on_completed = Some(Box::new(f));
        self
    }

    /// Run the copy to completion and return the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Any read, write, flush or shutdown error aborts the copy; no
    /// completion event is emitted in that case.
    pub async fn run(mut self) -> io::Result<u64> {
        let mut buf = [0u8; COPY_BUFFER_SIZE];
        let mut copied = 0u64;
        let mut last_report = Instant::now();

        loop {
            let n = self.reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.writer.write_all(&buf[..n]).await?;
            copied += n as u64;

            if last_report.elapsed() >= self.interval {
                last_report = Instant::now();
                if let Some(ref mut f) = self.on_progress {
                    f(copied, self.total);
                }
            }
        }

        self.writer.flush().await?;
        self.writer.shutdown().await?;

        if let Some(ref mut f) = self.on_completed {
            f(copied);
        }
        Ok(copied)
    }
}

/// Total length of a seekable stream; the stream position is preserved.
pub async fn stream_len<S: AsyncSeek + Unpin + ?Sized>(stream: &mut S) -> io::Result<u64> {
    let position = stream.seek(SeekFrom::Current(0)).await?;
    let len = stream.seek(SeekFrom::End(0)).await?;
    if position != len {
        stream.seek(SeekFrom::Start(position)).await?;
    }
    Ok(len)
}
