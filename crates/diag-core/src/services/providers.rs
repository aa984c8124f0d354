//! Building the set of provider descriptors a node should collect.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{DiagnosticsError, Result};
use crate::models::{DiagnosticsConfig, HttpProvider, ProviderSet, Role};

/// Route the diagnostics service is served under.
pub const BASE_ROUTE: &str = "/system/health/v1";

/// Output name of the node's own health report.
pub const HEALTH_REPORT_NAME: &str = "diagnostics-health.json";

/// Node-local facts supplied by the surrounding system.
#[async_trait]
pub trait ClusterTools: Send + Sync {
    /// System units configured on this node.
    async fn unit_names(&self) -> Result<Vec<String>>;

    /// This node's role as reported by the node itself.
    async fn node_role(&self) -> Result<String>;
}

/// Port the diagnostics service of a node with `role` is reachable on.
pub fn pull_port(config: &DiagnosticsConfig, role: Role) -> u16 {
    match role {
        Role::Master => config.master_port,
        Role::Agent | Role::AgentPublic => config.agent_port,
    }
}

/// Per-unit log route served by the diagnostics service.
pub fn unit_logs_route(unit: &str) -> String {
    format!("{BASE_ROUTE}/logs/units/{unit}")
}

/// Look up unit names and the parsed role, unit names first.
pub(crate) async fn node_facts(
    config: &DiagnosticsConfig,
    tools: &dyn ClusterTools,
) -> Result<(Vec<String>, Role)> {
    let mut units = tools
        .unit_names()
        .await
        .map_err(|e| DiagnosticsError::UnitNames(Box::new(e)))?;
    units.extend(config.systemd_units.iter().cloned());

    let role = tools
        .node_role()
        .await
        .map_err(|e| DiagnosticsError::NodeRole(Box::new(e)))?;
    let role: Role = role.parse()?;
    Ok((units, role))
}

/// Internal descriptors followed by every external document, in order.
pub async fn load_providers(
    config: &DiagnosticsConfig,
    tools: &dyn ClusterTools,
) -> Result<ProviderSet> {
    let mut providers = load_internal_providers(config, tools).await?;
    let external = load_external_providers(&config.endpoint_config_files)?;
    tracing::debug!(
        internal = providers.len(),
        external = external.len(),
        "providers_loaded"
    );
    providers.append(external);
    Ok(providers)
}

/// One log endpoint per unit plus the trailing health report.
pub async fn load_internal_providers(
    config: &DiagnosticsConfig,
    tools: &dyn ClusterTools,
) -> Result<ProviderSet> {
    let (units, role) = node_facts(config, tools).await?;
    let port = pull_port(config, role);

    let mut http_endpoints: Vec<HttpProvider> = units
        .into_iter()
        .map(|unit| HttpProvider {
            port,
            uri: unit_logs_route(&unit),
            file_name: unit,
            roles: Vec::new(),
            optional: false,
        })
        .collect();

    http_endpoints.push(HttpProvider {
        port,
        uri: BASE_ROUTE.to_string(),
        file_name: HEALTH_REPORT_NAME.to_string(),
        roles: Vec::new(),
        optional: false,
    });

    Ok(ProviderSet {
        http_endpoints,
        ..Default::default()
    })
}

/// Parse every file as a provider document and concatenate them in order.
/// A single unreadable or malformed file fails the whole load.
pub fn load_external_providers(files: &[PathBuf]) -> Result<ProviderSet> {
    let mut providers = ProviderSet::default();
    for path in files {
        let contents = std::fs::read(path).map_err(|source| DiagnosticsError::ReadProviders {
            path: path.clone(),
            source,
        })?;
        let document: ProviderSet =
            serde_json::from_slice(&contents).map_err(|source| DiagnosticsError::ParseProviders {
                path: path.clone(),
                source,
            })?;
        providers.append(document);
    }
    Ok(providers)
}
