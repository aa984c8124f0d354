//! Node discovery, provider descriptors and data collection for cluster
//! diagnostics bundles.

pub mod collector;
pub mod error;
pub mod models;
pub mod services;

pub use error::{DiagnosticsError, Result};
