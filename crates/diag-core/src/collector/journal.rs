use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::task::{ready, Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::{CollectContext, CollectError, CollectStream, ContextReader};

const JOURNALCTL: &str = "journalctl";

/// Streams journal entries of one unit written within a trailing window.
#[derive(Debug, Clone)]
pub struct JournalCollector {
    name: String,
    optional: bool,
    unit: String,
    window: Duration,
    program: String,
}

impl JournalCollector {
    pub fn new(
        name: impl Into<String>,
        optional: bool,
        unit: impl Into<String>,
        window: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            optional,
            unit: unit.into(),
            window,
            program: JOURNALCTL.to_string(),
        }
    }

    /// Use a different journal reader binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    fn args(&self, now: DateTime<Utc>) -> Vec<String> {
        let since = chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        vec![
            "--no-pager".to_string(),
            "--utc".to_string(),
            "-u".to_string(),
            self.unit.clone(),
            "--since".to_string(),
            since.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]
    }

    /// The stream fails at end of output if the reader exits non-zero, so a
    /// journal that cannot be opened never looks like an empty one.
    pub async fn collect(&self, ctx: &CollectContext) -> Result<CollectStream, CollectError> {
        if let Some(reason) = ctx.err() {
            return Err(CollectError::Context {
                name: self.name.clone(),
                reason,
            });
        }

        let mut child = Command::new(&self.program)
            .args(self.args(Utc::now()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CollectError::Journal {
                unit: self.unit.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| CollectError::Journal {
            unit: self.unit.clone(),
            source: io::Error::other("journal output is not captured"),
        })?;
        let stderr = child.stderr.take();

        let output = JournalOutput {
            unit: self.unit.clone(),
            program: self.program.clone(),
            stdout,
            exit: tokio::spawn(wait_for_exit(child, stderr)),
            finished: false,
        };
        Ok(Box::pin(ContextReader::new(Box::pin(output), ctx)))
    }
}

async fn wait_for_exit(
    mut child: Child,
    stderr: Option<ChildStderr>,
) -> io::Result<(ExitStatus, String)> {
    let mut message = Vec::new();
    if let Some(mut stderr) = stderr {
        stderr.read_to_end(&mut message).await?;
    }
    let status = child.wait().await?;
    Ok((status, String::from_utf8_lossy(&message).trim().to_string()))
}

/// Journal reader output. The process is owned by the exit task, which is
/// aborted (killing the process) when the stream is dropped.
struct JournalOutput {
    unit: String,
    program: String,
    stdout: ChildStdout,
    exit: JoinHandle<io::Result<(ExitStatus, String)>>,
    finished: bool,
}

impl JournalOutput {
    fn failure(&self, source: io::Error) -> io::Error {
        io::Error::other(CollectError::Journal {
            unit: self.unit.clone(),
            source,
        })
    }
}

impl AsyncRead for JournalOutput {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(Ok(()));
        }
        let before = buf.filled().len();
        ready!(Pin::new(&mut this.stdout).poll_read(cx, buf))?;
        if buf.filled().len() > before || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        // stdout is at EOF; the exit status decides whether that is the end.
        let exit = ready!(Pin::new(&mut this.exit).poll(cx));
        this.finished = true;
        let result = match exit {
            Ok(Ok((status, _))) if status.success() => Ok(()),
            Ok(Ok((status, stderr))) => Err(this.failure(io::Error::other(format!(
                "{} exited with {status}: {stderr}",
                this.program
            )))),
            Ok(Err(e)) => Err(this.failure(e)),
            Err(e) => Err(this.failure(io::Error::other(e))),
        };
        Poll::Ready(result)
    }
}

impl Drop for JournalOutput {
    fn drop(&mut self) {
        self.exit.abort();
    }
}
