use std::collections::HashSet;

use reqwest::Client;

use crate::error::{DiagnosticsError, Result};
use crate::models::DiagnosticsConfig;
use crate::services::providers::{
    load_external_providers, node_facts, pull_port, BASE_ROUTE, HEALTH_REPORT_NAME,
};
use crate::services::ClusterTools;

use super::{Collector, CommandCollector, EndpointCollector, FileCollector, JournalCollector};

/// Materialize this node's collectors.
///
/// Order: one journal collector per unit (reported units, then configured
/// extras), the node's health report, then the external HTTP endpoints,
/// files and commands that apply to the node's role, each in source order.
pub async fn load_collectors(
    config: &DiagnosticsConfig,
    tools: &dyn ClusterTools,
    client: &Client,
) -> Result<Vec<Collector>> {
    let (units, role) = node_facts(config, tools).await?;
    let external = load_external_providers(&config.endpoint_config_files)?;

    let window = config.journal_window()?;
    let scheme = config.scheme();
    let mut collectors: Vec<Collector> = units
        .into_iter()
        .map(|unit| Collector::from(JournalCollector::new(unit.clone(), false, unit, window)))
        .collect();

    collectors.push(
        EndpointCollector::new(
            HEALTH_REPORT_NAME,
            false,
            format!(
                "{scheme}://localhost:{}{BASE_ROUTE}",
                pull_port(config, role)
            ),
            client.clone(),
        )
        .into(),
    );

    for endpoint in external.http_endpoints.iter().filter(|p| p.applies_to(role)) {
        collectors.push(
            EndpointCollector::new(
                endpoint.output_name(),
                endpoint.optional,
                format!("{scheme}://localhost:{}{}", endpoint.port, endpoint.uri),
                client.clone(),
            )
            .into(),
        );
    }

    for file in external.local_files.iter().filter(|p| p.applies_to(role)) {
        collectors.push(
            FileCollector::new(file.output_name(), file.optional, &file.location).into(),
        );
    }

    for command in external.local_commands.iter().filter(|p| p.applies_to(role)) {
        if command.command.is_empty() {
            return Err(DiagnosticsError::MalformedCommand(
                "command must have at least one element".into(),
            ));
        }
        collectors.push(
            CommandCollector::new(command.output_name(), false, command.command.clone()).into(),
        );
    }

    ensure_unique_names(&collectors)?;
    tracing::debug!(%role, count = collectors.len(), "collectors_loaded");
    Ok(collectors)
}

/// Reject collector lists in which two collectors would write the same name.
pub fn ensure_unique_names(collectors: &[Collector]) -> Result<()> {
    let mut seen = HashSet::new();
    for collector in collectors {
        if !seen.insert(collector.name()) {
            return Err(DiagnosticsError::DuplicateCollector(
                collector.name().to_string(),
            ));
        }
    }
    Ok(())
}
