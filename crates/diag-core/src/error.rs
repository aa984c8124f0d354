use std::path::PathBuf;

use crate::models::Role;

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("incorrect role {0}, must be: master, agent or agent_public")]
    InvalidRole(String),

    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("node finder chain has no strategies configured")]
    EmptyFinderChain,

    #[error("could not find {role} nodes via {target}: {reason}")]
    Discovery {
        role: Role,
        target: String,
        reason: String,
    },

    #[error("could not get unit names: {0}")]
    UnitNames(#[source] Box<DiagnosticsError>),

    #[error("could not get role: {0}")]
    NodeRole(#[source] Box<DiagnosticsError>),

    #[error("could not read {path}: {source}")]
    ReadProviders {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    ParseProviders {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed command descriptor: {0}")]
    MalformedCommand(String),

    #[error("collector '{0}' is defined more than once")]
    DuplicateCollector(String),

    #[error("cluster tooling failed: {0}")]
    Tooling(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DiagnosticsError {
    pub(crate) fn discovery(role: Role, target: &str, reason: impl std::fmt::Display) -> Self {
        Self::Discovery {
            role,
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiagnosticsError>;
