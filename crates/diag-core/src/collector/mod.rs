//! Uniform collection over commands, the system journal, HTTP endpoints and
//! local files.
//!
//! Every realization follows the same ownership rule: on success the caller
//! owns the returned stream and releases it by dropping it; on failure no
//! stream is returned and anything opened along the way is already closed.

mod command;
mod context;
mod endpoint;
mod file;
mod journal;
mod loader;

use std::io::Cursor;
use std::pin::Pin;
use std::process::ExitStatus;

use tokio::io::AsyncRead;

pub use command::CommandCollector;
pub use context::{context_error, CollectContext, ContextError, ContextReader};
pub use endpoint::EndpointCollector;
pub use file::FileCollector;
pub use journal::JournalCollector;
pub use loader::{ensure_unique_names, load_collectors};

/// Bytes produced by one collection.
pub type CollectStream = Pin<Box<dyn AsyncRead + Send>>;

/// Failure of a single collector. Scoped to that collector; whether it
/// matters for the bundle depends on [`Collector::optional`].
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("{name}: command is empty")]
    EmptyCommand { name: String },

    #[error("could not start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but failed; whatever it printed is kept.
    #[error("{name} exited with {status}")]
    NonZeroExit {
        name: String,
        status: ExitStatus,
        output: Vec<u8>,
    },

    #[error("could not read {unit} logs from journal: {source}")]
    Journal {
        unit: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not fetch url {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unable to fetch {url}. Return code {status}. Body: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not open {name}: {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: {reason}")]
    Context { name: String, reason: ContextError },
}

impl CollectError {
    /// Captured output of a failed command, as a stream.
    pub fn into_partial_output(self) -> Option<CollectStream> {
        match self {
            Self::NonZeroExit { output, .. } => Some(Box::pin(Cursor::new(output))),
            _ => None,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Self::Context { .. })
    }
}

/// An executable, bound form of one provider descriptor.
#[derive(Debug, Clone)]
pub enum Collector {
    Command(CommandCollector),
    Journal(JournalCollector),
    Endpoint(EndpointCollector),
    File(FileCollector),
}

impl Collector {
    pub fn name(&self) -> &str {
        match self {
            Self::Command(c) => c.name(),
            Self::Journal(c) => c.name(),
            Self::Endpoint(c) => c.name(),
            Self::File(c) => c.name(),
        }
    }

    /// Failures of optional collectors should be ignored by the caller.
    pub fn optional(&self) -> bool {
        match self {
            Self::Command(c) => c.optional(),
            Self::Journal(c) => c.optional(),
            Self::Endpoint(c) => c.optional(),
            Self::File(c) => c.optional(),
        }
    }

    pub async fn collect(&self, ctx: &CollectContext) -> Result<CollectStream, CollectError> {
        match self {
            Self::Command(c) => c.collect(ctx).await,
            Self::Journal(c) => c.collect(ctx).await,
            Self::Endpoint(c) => c.collect(ctx).await,
            Self::File(c) => c.collect(ctx).await,
        }
    }
}

impl From<CommandCollector> for Collector {
    fn from(collector: CommandCollector) -> Self {
        Self::Command(collector)
    }
}

impl From<JournalCollector> for Collector {
    fn from(collector: JournalCollector) -> Self {
        Self::Journal(collector)
    }
}

impl From<EndpointCollector> for Collector {
    fn from(collector: EndpointCollector) -> Self {
        Self::Endpoint(collector)
    }
}

impl From<FileCollector> for Collector {
    fn from(collector: FileCollector) -> Self {
        Self::File(collector)
    }
}
