use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{DiagnosticsError, Result};
use crate::models::{Node, Role};

use super::finder::{fetch, NodeFinder, DISCOVERY_HTTP_TIMEOUT};

/// One member of the ensemble as reported by the Exhibitor status endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExhibitorMember {
    hostname: String,
    #[serde(default)]
    is_leader: bool,
}

/// Finds masters through the consensus service's cluster status endpoint.
pub struct ExhibitorFinder {
    url: String,
    client: Client,
    timeout: Duration,
}

impl ExhibitorFinder {
    pub fn new(url: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            client,
            timeout: DISCOVERY_HTTP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn error(&self, reason: impl std::fmt::Display) -> DiagnosticsError {
        DiagnosticsError::discovery(Role::Master, &self.url, reason)
    }
}

#[async_trait]
impl NodeFinder for ExhibitorFinder {
    fn describe(&self) -> String {
        format!("exhibitor at {}", self.url)
    }

    async fn find(&self, role: Role) -> Result<Vec<Node>> {
        if role != Role::Master {
            return Err(DiagnosticsError::discovery(
                role,
                &self.url,
                "exhibitor only knows about master nodes",
            ));
        }

        let (status, body) = fetch(&self.client, &self.url, self.timeout)
            .await
            .map_err(|e| self.error(e))?;
        if status != StatusCode::OK {
            return Err(self.error(format!(
                "GET {} failed, status code: {}, body: {body}",
                self.url,
                status.as_u16()
            )));
        }

        let members: Vec<ExhibitorMember> =
            serde_json::from_str(&body).map_err(|e| self.error(e))?;
        if members.is_empty() {
            return Err(self.error("master nodes not found in exhibitor"));
        }

        Ok(members
            .into_iter()
            .map(|m| Node::new(Role::Master, m.hostname, m.is_leader))
            .collect())
    }
}
