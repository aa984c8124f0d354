//! Cancellation and deadline plumbing shared by every collector.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, ReadBuf};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::CollectStream;

/// Why a context stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl From<ContextError> for io::Error {
    fn from(reason: ContextError) -> Self {
        let kind = match reason {
            ContextError::Cancelled => io::ErrorKind::Other,
            ContextError::DeadlineExceeded => io::ErrorKind::TimedOut,
        };
        io::Error::new(kind, reason)
    }
}

/// Execution context handed to every collection: a cancellation token and
/// an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CollectContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CollectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    /// Keeps the earlier of the existing and the new deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// A context cancelled together with this one but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The reason this context has already stopped, if it has.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            Some(ContextError::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(ContextError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub fn done(&self) -> impl Future<Output = ContextError> + Send + 'static {
        let token = self.token.clone();
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(deadline) => tokio::select! {
                    biased;
                    _ = token.cancelled() => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                },
                None => {
                    token.cancelled().await;
                    ContextError::Cancelled
                }
            }
        }
    }

    /// Drive `future` unless the context stops first.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, ContextError> {
        if let Some(reason) = self.err() {
            return Err(reason);
        }
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            output = future => Ok(output),
        }
    }
}

/// Stream wrapper whose reads fail once the context stops.
pub struct ContextReader {
    inner: CollectStream,
    done: Pin<Box<dyn Future<Output = ContextError> + Send>>,
    stopped: Option<ContextError>,
}

impl ContextReader {
    pub fn new(inner: CollectStream, context: &CollectContext) -> Self {
        Self {
            inner,
            done: Box::pin(context.done()),
            stopped: context.err(),
        }
    }
}

impl AsyncRead for ContextReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.stopped.is_none() {
            if let Poll::Ready(reason) = this.done.as_mut().poll(cx) {
                this.stopped = Some(reason);
            }
        }
        if let Some(reason) = this.stopped {
            return Poll::Ready(Err(reason.into()));
        }
        this.inner.as_mut().poll_read(cx, buf)
    }
}

/// The context reason behind an io error produced by [`ContextReader`].
pub fn context_error(err: &io::Error) -> Option<ContextError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<ContextError>())
        .copied()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn run_completes_when_context_is_live() {
        let ctx = CollectContext::new();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn run_returns_cancelled() {
        let ctx = CollectContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn run_returns_deadline_exceeded() {
        let ctx = CollectContext::with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn already_cancelled_context_skips_future() {
        let ctx = CollectContext::new();
        ctx.cancel();
        assert_eq!(ctx.run(async { 1 }).await, Err(ContextError::Cancelled));
    }

    #[test]
    fn child_follows_parent_cancellation() {
        let parent = CollectContext::new();
        let child = parent.child();
        child.cancel();
        assert!(parent.err().is_none());
        let child = parent.child();
        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn with_deadline_keeps_earliest() {
        let now = Instant::now();
        let ctx = CollectContext::new()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(ctx.deadline, Some(now + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn reader_passes_data_through() {
        let ctx = CollectContext::new();
        let mut reader = ContextReader::new(Box::pin(Cursor::new(b"hello".to_vec())), &ctx);
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn reader_fails_after_cancel() {
        let ctx = CollectContext::new();
        let mut reader = ContextReader::new(Box::pin(Cursor::new(b"hello".to_vec())), &ctx);
        ctx.cancel();
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(context_error(&err), Some(ContextError::Cancelled));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn reader_wakes_pending_read_on_cancel() {
        let ctx = CollectContext::new();
        let (_writer, pipe) = tokio::io::duplex(64);
        let mut reader = ContextReader::new(Box::pin(pipe), &ctx);
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let mut buf = [0u8; 8];
        let err = reader.read(&mut buf).await.unwrap_err();
        assert_eq!(context_error(&err), Some(ContextError::Cancelled));
    }
}
