use std::path::Path;

use crate::error::{DiagnosticsError, Result};
use crate::models::config::MAX_JOURNAL_WINDOW_HOURS;
use crate::models::DiagnosticsConfig;

pub fn load(config_path: &Path) -> Result<DiagnosticsConfig> {
    if !config_path.exists() {
        return Err(DiagnosticsError::ConfigNotFound(config_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(config_path)?;
    let config: DiagnosticsConfig = serde_yaml::from_str(&contents)
        .map_err(|e| DiagnosticsError::InvalidConfig(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &DiagnosticsConfig) -> Result<()> {
    if config.master_port == 0 || config.agent_port == 0 {
        return Err(DiagnosticsError::InvalidConfig(
            "master_port and agent_port must be non-zero".into(),
        ));
    }
    if config.exhibitor_url.is_empty() {
        return Err(DiagnosticsError::InvalidConfig(
            "exhibitor_url field is required".into(),
        ));
    }
    if config.dns_record.is_empty() {
        return Err(DiagnosticsError::InvalidConfig(
            "dns_record field is required".into(),
        ));
    }
    if config.journal_window_hours == 0 {
        return Err(DiagnosticsError::InvalidConfig(
            "journal_window_hours must be at least 1".into(),
        ));
    }
    if config.journal_window_hours > MAX_JOURNAL_WINDOW_HOURS {
        return Err(DiagnosticsError::InvalidConfig(format!(
            "journal_window_hours must be at most {MAX_JOURNAL_WINDOW_HOURS}"
        )));
    }
    Ok(())
}
