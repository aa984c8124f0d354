pub mod config;
pub mod node;
pub mod provider;

pub use config::DiagnosticsConfig;
pub use node::{Node, Role};
pub use provider::{CommandProvider, FileProvider, HttpProvider, ProviderSet};
