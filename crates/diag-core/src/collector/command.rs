use std::io::Cursor;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{CollectContext, CollectError, CollectStream};

/// Runs a local command and captures stdout and stderr together.
#[derive(Debug, Clone)]
pub struct CommandCollector {
    name: String,
    optional: bool,
    argv: Vec<String>,
}

impl CommandCollector {
    pub fn new(name: impl Into<String>, optional: bool, argv: Vec<String>) -> Self {
        Self {
            name: name.into(),
            optional,
            argv,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Output is returned even when the process fails: a non-zero exit comes
    /// back as [`CollectError::NonZeroExit`] carrying the captured bytes.
    pub async fn collect(&self, ctx: &CollectContext) -> Result<CollectStream, CollectError> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| CollectError::EmptyCommand {
                name: self.name.clone(),
            })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CollectError::Spawn {
                name: self.name.clone(),
                source,
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_chunks(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_chunks(stderr, tx.clone()));
        }
        drop(tx);

        let completed = ctx
            .run(async {
                let mut output = Vec::new();
                while let Some(chunk) = rx.recv().await {
                    output.extend_from_slice(&chunk);
                }
                let status = child.wait().await;
                (output, status)
            })
            .await;

        let (output, status) = match completed {
            Ok(completed) => completed,
            Err(reason) => {
                if let Err(e) = child.start_kill() {
                    tracing::warn!("could not kill {}: {e}", self.name);
                }
                return Err(CollectError::Context {
                    name: self.name.clone(),
                    reason,
                });
            }
        };

        let status = status.map_err(|source| CollectError::Io {
            name: self.name.clone(),
            source,
        })?;
        if !status.success() {
            tracing::debug!(name = %self.name, %status, "command_failed");
            return Err(CollectError::NonZeroExit {
                name: self.name.clone(),
                status,
                output,
            });
        }
        Ok(Box::pin(Cursor::new(output)))
    }
}

/// Forward output line by line so stdout and stderr interleave in arrival order.
async fn forward_chunks<R>(reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    loop {
        let mut chunk = Vec::new();
        match reader.read_until(b'\n', &mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if tx.send(chunk).is_err() {
                    break;
                }
            }
        }
    }
}
