use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{DiagnosticsError, Result};
use crate::models::{Node, Role};

use super::finder::{fetch, NodeFinder, DISCOVERY_HTTP_TIMEOUT};

/// Port the cluster manager serves its agent roster on.
pub const CLUSTER_MANAGER_PORT: u16 = 5050;

#[derive(Debug, Deserialize)]
struct AgentRoster {
    #[serde(rename = "slaves", default)]
    agents: Vec<AgentEntry>,
}

#[derive(Debug, Deserialize)]
struct AgentEntry {
    hostname: String,
    #[serde(default)]
    attributes: HashMap<String, serde_json::Value>,
}

impl AgentEntry {
    /// Only the exact string `"true"` marks an agent as public.
    fn role(&self) -> Role {
        match self.attributes.get("public_ip") {
            Some(serde_json::Value::String(value)) if value == "true" => Role::AgentPublic,
            _ => Role::Agent,
        }
    }
}

/// Finds nodes by resolving a well-known domain name to the leading masters
/// and, for agents, asking the first of them for the agent roster.
pub struct DnsFinder {
    domain: String,
    force_tls: bool,
    roster_port: u16,
    client: Client,
    timeout: Duration,
}

impl DnsFinder {
    pub fn new(domain: &str, force_tls: bool, client: Client) -> Self {
        Self {
            domain: domain.to_string(),
            force_tls,
            roster_port: CLUSTER_MANAGER_PORT,
            client,
            timeout: DISCOVERY_HTTP_TIMEOUT,
        }
    }

    pub fn with_roster_port(mut self, port: u16) -> Self {
        self.roster_port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the domain, keeping resolver order and dropping duplicates.
    async fn resolve(&self, role: Role) -> Result<Vec<IpAddr>> {
        let resolved = tokio::net::lookup_host((self.domain.as_str(), 0))
            .await
            .map_err(|e| DiagnosticsError::discovery(role, &self.domain, e))?;

        let mut addresses: Vec<IpAddr> = Vec::new();
        for socket_addr in resolved {
            let ip = socket_addr.ip();
            if !addresses.contains(&ip) {
                addresses.push(ip);
            }
        }
        if addresses.is_empty() {
            return Err(DiagnosticsError::discovery(
                role,
                &self.domain,
                format!("could not resolve {}", self.domain),
            ));
        }
        Ok(addresses)
    }

    fn roster_url(&self, leader: IpAddr) -> String {
        let scheme = if self.force_tls { "https" } else { "http" };
        let host = match leader {
            IpAddr::V4(ip) => ip.to_string(),
            IpAddr::V6(ip) => format!("[{ip}]"),
        };
        format!("{scheme}://{host}:{}/slaves", self.roster_port)
    }

    async fn find_masters(&self) -> Result<Vec<Node>> {
        let addresses = self.resolve(Role::Master).await?;
        Ok(addresses
            .into_iter()
            .map(|ip| Node::new(Role::Master, ip.to_string(), false))
            .collect())
    }

    async fn find_agents(&self, role: Role) -> Result<Vec<Node>> {
        let leaders = self.resolve(role).await?;
        let url = self.roster_url(leaders[0]);

        let (status, body) = fetch(&self.client, &url, self.timeout)
            .await
            .map_err(|e| DiagnosticsError::discovery(role, &url, e))?;
        if status != StatusCode::OK {
            return Err(DiagnosticsError::discovery(
                role,
                &url,
                format!(
                    "GET {url} failed, status code {}, body: {body}",
                    status.as_u16()
                ),
            ));
        }

        let roster: AgentRoster =
            serde_json::from_str(&body).map_err(|e| DiagnosticsError::discovery(role, &url, e))?;
        Ok(roster
            .agents
            .into_iter()
            .map(|agent| Node::new(agent.role(), agent.hostname, false))
            .collect())
    }
}

#[async_trait]
impl NodeFinder for DnsFinder {
    fn describe(&self) -> String {
        format!("dns record {}", self.domain)
    }

    async fn find(&self, role: Role) -> Result<Vec<Node>> {
        match role {
            Role::Master => self.find_masters().await,
            Role::Agent | Role::AgentPublic => self.find_agents(role).await,
        }
    }
}
