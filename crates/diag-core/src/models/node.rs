use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiagnosticsError;

/// A node's function in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Master,
    Agent,
    AgentPublic,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Master, Role::Agent, Role::AgentPublic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Agent => "agent",
            Self::AgentPublic => "agent_public",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DiagnosticsError::InvalidRole(s.to_string()))
    }
}

/// One cluster member as reported by a discovery strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub role: Role,
    pub address: String,
    pub is_leader: bool,
}

impl Node {
    pub fn new(role: Role, address: impl Into<String>, is_leader: bool) -> Self {
        Self {
            role,
            address: address.into(),
            is_leader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_roles() {
        assert_eq!("master".parse::<Role>().unwrap(), Role::Master);
        assert_eq!("agent".parse::<Role>().unwrap(), Role::Agent);
        assert_eq!("agent_public".parse::<Role>().unwrap(), Role::AgentPublic);
    }

    #[test]
    fn parse_invalid_role_names_valid_roles() {
        let err = "invalid".parse::<Role>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "incorrect role invalid, must be: master, agent or agent_public"
        );
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Master".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::AgentPublic).unwrap();
        assert_eq!(json, "\"agent_public\"");
        let role: Role = serde_json::from_str("\"master\"").unwrap();
        assert_eq!(role, Role::Master);
    }
}
