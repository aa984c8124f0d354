//! Node discovery strategies and the fallback chain that runs them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{DiagnosticsError, Result};
use crate::models::{DiagnosticsConfig, Node, Role};

use super::dns::DnsFinder;
use super::exhibitor::ExhibitorFinder;

/// Calls to the cluster manager and the consensus service can be slow,
/// so discovery requests get a generous timeout.
pub const DISCOVERY_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A single way of finding the nodes that play a given role.
#[async_trait]
pub trait NodeFinder: Send + Sync {
    /// Short label used in log lines.
    fn describe(&self) -> String;

    async fn find(&self, role: Role) -> Result<Vec<Node>>;
}

/// Ordered fallback over several [`NodeFinder`]s.
///
/// The first strategy that succeeds wins. Failures of all but the last
/// strategy are logged and swallowed; the last failure is returned.
#[derive(Default)]
pub struct FinderChain {
    finders: Vec<Box<dyn NodeFinder>>,
}

impl FinderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exhibitor first, DNS as the fallback.
    pub fn from_config(config: &DiagnosticsConfig, client: Client) -> Self {
        Self::new()
            .with(ExhibitorFinder::new(&config.exhibitor_url, client.clone()))
            .with(DnsFinder::new(&config.dns_record, config.force_tls, client))
    }

    pub fn with(mut self, finder: impl NodeFinder + 'static) -> Self {
        self.finders.push(Box::new(finder));
        self
    }

    pub fn push(&mut self, finder: Box<dyn NodeFinder>) {
        self.finders.push(finder);
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }

    pub async fn find(&self, role: Role) -> Result<Vec<Node>> {
        if self.finders.is_empty() {
            return Err(DiagnosticsError::EmptyFinderChain);
        }
        let last = self.finders.len() - 1;
        for (index, finder) in self.finders.iter().enumerate() {
            match finder.find(role).await {
                Ok(nodes) => {
                    tracing::debug!(
                        %role,
                        finder = %finder.describe(),
                        count = nodes.len(),
                        "nodes_found"
                    );
                    return Ok(nodes);
                }
                Err(e) if index < last => {
                    tracing::warn!("{} failed, trying next finder: {e}", finder.describe());
                }
                Err(e) => return Err(e),
            }
        }
        Err(DiagnosticsError::EmptyFinderChain)
    }

    /// The node currently marked as leader among the masters, if any
    /// strategy can tell.
    pub async fn find_leader(&self) -> Result<Option<Node>> {
        let masters = self.find(Role::Master).await?;
        Ok(masters.into_iter().find(|n| n.is_leader))
    }
}

/// GET `url` with a per-request timeout and read the whole body.
pub(crate) async fn fetch(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> std::result::Result<(StatusCode, String), reqwest::Error> {
    let response = client.get(url).timeout(timeout).send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok((status, body))
}
