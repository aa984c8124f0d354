use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DiagnosticsError, Result};

pub const DEFAULT_MASTER_PORT: u16 = 1050;
pub const DEFAULT_AGENT_PORT: u16 = 61001;
pub const DEFAULT_EXHIBITOR_URL: &str = "http://127.0.0.1:8181/exhibitor/v1/cluster/status";
pub const DEFAULT_DNS_RECORD: &str = "leader.mesos";
pub const DEFAULT_JOURNAL_WINDOW_HOURS: u64 = 24;
/// One year.
pub const MAX_JOURNAL_WINDOW_HOURS: u64 = 24 * 366;

fn default_master_port() -> u16 {
    DEFAULT_MASTER_PORT
}

fn default_agent_port() -> u16 {
    DEFAULT_AGENT_PORT
}

fn default_exhibitor_url() -> String {
    DEFAULT_EXHIBITOR_URL.to_string()
}

fn default_dns_record() -> String {
    DEFAULT_DNS_RECORD.to_string()
}

fn default_journal_window_hours() -> u64 {
    DEFAULT_JOURNAL_WINDOW_HOURS
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    /// Port the diagnostics service listens on for master nodes.
    #[serde(default = "default_master_port")]
    pub master_port: u16,
    /// Port the diagnostics service listens on for agent nodes.
    #[serde(default = "default_agent_port")]
    pub agent_port: u16,
    #[serde(default)]
    pub force_tls: bool,
    /// Extra system units collected in addition to the ones reported by the node.
    #[serde(default)]
    pub systemd_units: Vec<String>,
    /// External provider documents, merged in listed order.
    #[serde(default)]
    pub endpoint_config_files: Vec<PathBuf>,
    #[serde(default = "default_exhibitor_url")]
    pub exhibitor_url: String,
    #[serde(default = "default_dns_record")]
    pub dns_record: String,
    #[serde(default = "default_journal_window_hours")]
    pub journal_window_hours: u64,
}

impl DiagnosticsConfig {
    pub fn scheme(&self) -> &'static str {
        if self.force_tls {
            "https"
        } else {
            "http"
        }
    }

    /// Trailing window of journal entries to collect.
    pub fn journal_window(&self) -> Result<Duration> {
        self.journal_window_hours
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                DiagnosticsError::InvalidConfig(format!(
                    "journal_window_hours {} is out of range",
                    self.journal_window_hours
                ))
            })
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            master_port: DEFAULT_MASTER_PORT,
            agent_port: DEFAULT_AGENT_PORT,
            force_tls: false,
            systemd_units: Vec::new(),
            endpoint_config_files: Vec::new(),
            exhibitor_url: default_exhibitor_url(),
            dns_record: default_dns_record(),
            journal_window_hours: DEFAULT_JOURNAL_WINDOW_HOURS,
        }
    }
}
