use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::node::Role;

static UNSAFE_NAME_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());

/// An empty role list means the descriptor applies to every role.
fn applies_to(roles: &[Role], role: Role) -> bool {
    roles.is_empty() || roles.contains(&role)
}

/// An HTTP endpoint to fetch, relative to a node address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpProvider {
    #[serde(rename = "Port", alias = "port")]
    pub port: u16,
    #[serde(rename = "URI", alias = "Uri", alias = "uri")]
    pub uri: String,
    #[serde(rename = "FileName", alias = "fileName", default)]
    pub file_name: String,
    #[serde(rename = "Role", alias = "role", default)]
    pub roles: Vec<Role>,
    #[serde(rename = "Optional", alias = "optional", default)]
    pub optional: bool,
}

impl HttpProvider {
    pub fn applies_to(&self, role: Role) -> bool {
        applies_to(&self.roles, role)
    }

    /// Explicit file name, or `<port>-<sanitized uri>.json`.
    pub fn output_name(&self) -> String {
        if !self.file_name.is_empty() {
            return self.file_name.clone();
        }
        let path = self.uri.trim_start_matches('/');
        format!(
            "{}-{}.json",
            self.port,
            UNSAFE_NAME_CHARS_RE.replace_all(path, "_")
        )
    }
}

/// A file on the local filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProvider {
    #[serde(rename = "Location", alias = "location")]
    pub location: String,
    #[serde(rename = "Role", alias = "role", default)]
    pub roles: Vec<Role>,
    #[serde(rename = "Optional", alias = "optional", default)]
    pub optional: bool,
}

impl FileProvider {
    pub fn applies_to(&self, role: Role) -> bool {
        applies_to(&self.roles, role)
    }

    pub fn output_name(&self) -> String {
        self.location.trim_start_matches('/').to_string()
    }
}

/// A local command. Commands are always mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandProvider {
    #[serde(rename = "Command", alias = "command")]
    pub command: Vec<String>,
    #[serde(rename = "Role", alias = "role", default)]
    pub roles: Vec<Role>,
}

impl CommandProvider {
    pub fn applies_to(&self, role: Role) -> bool {
        applies_to(&self.roles, role)
    }

    pub fn output_name(&self) -> String {
        format!("{}.output", self.command.join("_").replace('/', ""))
    }
}

/// The three descriptor lists that make up one provider document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSet {
    #[serde(rename = "HTTPEndpoints", alias = "httpEndpoints", default)]
    pub http_endpoints: Vec<HttpProvider>,
    #[serde(rename = "LocalFiles", alias = "localFiles", default)]
    pub local_files: Vec<FileProvider>,
    #[serde(rename = "LocalCommands", alias = "localCommands", default)]
    pub local_commands: Vec<CommandProvider>,
}

impl ProviderSet {
    /// Append every list of `other` after the corresponding list of `self`.
    pub fn append(&mut self, other: ProviderSet) {
        self.http_endpoints.extend(other.http_endpoints);
        self.local_files.extend(other.local_files);
        self.local_commands.extend(other.local_commands);
    }

    pub fn len(&self) -> usize {
        self.http_endpoints.len() + self.local_files.len() + self.local_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_output_name_prefers_file_name() {
        let provider = HttpProvider {
            port: 5050,
            uri: "/master/state".into(),
            file_name: "state.txt".into(),
            ..Default::default()
        };
        assert_eq!(provider.output_name(), "state.txt");
    }

    #[test]
    fn http_output_name_sanitizes_uri() {
        let provider = HttpProvider {
            port: 5050,
            uri: "/registrar(1)/registry".into(),
            ..Default::default()
        };
        assert_eq!(provider.output_name(), "5050-registrar_1__registry.json");

        let provider = HttpProvider {
            port: 5050,
            uri: "/system/stats.json".into(),
            ..Default::default()
        };
        assert_eq!(provider.output_name(), "5050-system_stats_json.json");
    }

    #[test]
    fn file_output_name_strips_root() {
        let provider = FileProvider {
            location: "/var/lib/dcos/exhibitor/conf/zoo.cfg".into(),
            ..Default::default()
        };
        assert_eq!(provider.output_name(), "var/lib/dcos/exhibitor/conf/zoo.cfg");
    }

    #[test]
    fn command_output_name_joins_arguments() {
        let provider = CommandProvider {
            command: vec!["/bin/sh".into(), "-c".into(), "cat /etc/*-release".into()],
            roles: vec![],
        };
        assert_eq!(provider.output_name(), "binsh_-c_cat etc*-release.output");
    }

    #[test]
    fn empty_roles_apply_everywhere() {
        let provider = FileProvider::default();
        for role in Role::ALL {
            assert!(provider.applies_to(role));
        }
        let provider = FileProvider {
            roles: vec![Role::Agent],
            ..Default::default()
        };
        assert!(provider.applies_to(Role::Agent));
        assert!(!provider.applies_to(Role::AgentPublic));
    }

    #[test]
    fn parse_upstream_document() {
        let json = r#"{
            "HTTPEndpoints": [
                {"Port": 5050, "Uri": "/master/state-summary", "Role": ["master"]},
                {"Port": 61001, "URI": "/system/health/v1", "FileName": "health.json", "Optional": true}
            ],
            "LocalFiles": [{"Location": "/opt/mesosphere/active.buildinfo.full.json"}],
            "LocalCommands": [{"Command": ["dmesg", "-T"], "Role": ["agent", "agent_public"]}]
        }"#;
        let set: ProviderSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.http_endpoints[0].roles, vec![Role::Master]);
        assert!(!set.http_endpoints[0].optional);
        assert!(set.http_endpoints[1].optional);
        assert!(set.local_files[0].roles.is_empty());
        assert_eq!(set.local_commands[0].command, vec!["dmesg", "-T"]);
    }

    #[test]
    fn parse_camel_case_document() {
        let json = r#"{"localFiles": [{"location": "/etc/hosts", "role": ["agent"], "optional": true}]}"#;
        let set: ProviderSet = serde_json::from_str(json).unwrap();
        assert!(set.http_endpoints.is_empty());
        assert_eq!(set.local_files[0].location, "/etc/hosts");
        assert!(set.local_files[0].optional);
    }

    #[test]
    fn parse_rejects_unknown_role() {
        let json = r#"{"LocalFiles": [{"Location": "/etc/hosts", "Role": ["worker"]}]}"#;
        assert!(serde_json::from_str::<ProviderSet>(json).is_err());
    }

    #[test]
    fn append_keeps_order_per_list() {
        let mut first = ProviderSet {
            local_files: vec![FileProvider {
                location: "a".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let second = ProviderSet {
            local_files: vec![FileProvider {
                location: "b".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        first.append(second);
        let names: Vec<_> = first.local_files.iter().map(|f| f.location.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
