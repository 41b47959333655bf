//! Permission levels, actions, and tag-derived access rules.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level granted on a resource, totally ordered.
///
/// Deserializes through [`FromStr`], so config values are case-insensitive
/// and `execute` is accepted as an alias for `write`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// No access.
    #[default]
    None = 0,
    /// Read-only access.
    Read = 1,
    /// Write access; also covers execution.
    Write = 2,
    /// Full access.
    Admin = 3,
}

impl PermissionLevel {
    /// Every level, lowest first.
    pub const ALL: [PermissionLevel; 4] = [
        PermissionLevel::None,
        PermissionLevel::Read,
        PermissionLevel::Write,
        PermissionLevel::Admin,
    ];
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::None => write!(f, "none"),
            PermissionLevel::Read => write!(f, "read"),
            PermissionLevel::Write => write!(f, "write"),
            PermissionLevel::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PermissionLevel::None),
            "read" => Ok(PermissionLevel::Read),
            "write" | "execute" => Ok(PermissionLevel::Write),
            "admin" => Ok(PermissionLevel::Admin),
            other => Err(format!("unknown permission level '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for PermissionLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// An action requested against a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read the resource.
    Read,
    /// Modify the resource.
    Write,
    /// Execute the resource (same requirement as write).
    Execute,
    /// Administer the resource.
    Admin,
    /// Any other verb; requires no permission.
    Other(String),
}

impl Action {
    /// Parse an action verb. Unknown verbs become [`Action::Other`].
    pub fn parse(s: &str) -> Self {
        match s {
            "read" => Action::Read,
            "write" => Action::Write,
            "execute" => Action::Execute,
            "admin" => Action::Admin,
            other => Action::Other(other.to_string()),
        }
    }

    /// Minimum permission level required for this action.
    pub fn required_level(&self) -> PermissionLevel {
        match self {
            Action::Read => PermissionLevel::Read,
            Action::Write | Action::Execute => PermissionLevel::Write,
            Action::Admin => PermissionLevel::Admin,
            Action::Other(_) => PermissionLevel::None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Write => write!(f, "write"),
            Action::Execute => write!(f, "execute"),
            Action::Admin => write!(f, "admin"),
            Action::Other(verb) => write!(f, "{verb}"),
        }
    }
}

/// A rule granting `permission` on `resources` to every node carrying `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPermissionMapping {
    /// Mesh tag, e.g. `tag:aoi-agent`.
    pub tag: String,
    /// Resource patterns (`*`, `prefix/*`, `prefix/**`, or literal).
    pub resources: Vec<String>,
    /// Level granted on each pattern.
    pub permission: PermissionLevel,
}

/// A resolved (resource pattern, permission) pair, optionally attributed to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    /// Agent the rule applies to, once attributed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Resource pattern.
    pub resource: String,
    /// Granted level.
    pub permission: PermissionLevel,
}

impl AccessRule {
    /// Create an unattributed rule.
    pub fn new(resource: impl Into<String>, permission: PermissionLevel) -> Self {
        Self {
            agent_id: None,
            resource: resource.into(),
            permission,
        }
    }

    /// Attribute this rule to an agent.
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Outcome of a point-in-time authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionCheckResult {
    /// Whether the action is allowed.
    pub allowed: bool,
    /// Human-readable explanation.
    pub reason: String,
}

impl PermissionCheckResult {
    /// An allowing result.
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    /// A denying result.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_order() {
        assert!(PermissionLevel::None < PermissionLevel::Read);
        assert!(PermissionLevel::Read < PermissionLevel::Write);
        assert!(PermissionLevel::Write < PermissionLevel::Admin);
    }

    #[test]
    fn test_level_deserialize_case_insensitive() {
        #[derive(Deserialize)]
        struct Levels {
            levels: Vec<PermissionLevel>,
        }
        let parsed: Levels =
            toml::from_str(r#"levels = ["Write", "READ", "admin", "Execute", "None"]"#).unwrap();
        assert_eq!(
            parsed.levels,
            vec![
                PermissionLevel::Write,
                PermissionLevel::Read,
                PermissionLevel::Admin,
                PermissionLevel::Write,
                PermissionLevel::None,
            ]
        );
        assert!(toml::from_str::<Levels>(r#"levels = ["owner"]"#).is_err());
        assert_eq!(
            serde_json::to_string(&PermissionLevel::Write).unwrap(),
            "\"write\""
        );
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("read".parse::<PermissionLevel>(), Ok(PermissionLevel::Read));
        assert_eq!("WRITE".parse::<PermissionLevel>(), Ok(PermissionLevel::Write));
        assert_eq!(
            "execute".parse::<PermissionLevel>(),
            Ok(PermissionLevel::Write)
        );
        assert_eq!("Admin".parse::<PermissionLevel>(), Ok(PermissionLevel::Admin));
        assert_eq!("none".parse::<PermissionLevel>(), Ok(PermissionLevel::None));
        assert!("owner".parse::<PermissionLevel>().is_err());
    }

    #[test]
    fn test_level_serde() {
        let json = serde_json::to_string(&PermissionLevel::Write).unwrap();
        assert_eq!(json, "\"write\"");
        let level: PermissionLevel = serde_json::from_str("\"execute\"").unwrap();
        assert_eq!(level, PermissionLevel::Write);
        assert!(serde_json::from_str::<PermissionLevel>("\"root\"").is_err());
    }

    #[test]
    fn test_action_required_level() {
        assert_eq!(Action::parse("read").required_level(), PermissionLevel::Read);
        assert_eq!(Action::parse("write").required_level(), PermissionLevel::Write);
        assert_eq!(
            Action::parse("execute").required_level(),
            PermissionLevel::Write
        );
        assert_eq!(Action::parse("admin").required_level(), PermissionLevel::Admin);
        assert_eq!(Action::parse("list").required_level(), PermissionLevel::None);
        assert_eq!(Action::parse("list"), Action::Other("list".into()));
    }

    #[test]
    fn test_mapping_from_toml() {
        let mapping: TagPermissionMapping = toml::from_str(
            r#"
            tag = "tag:aoi-agent"
            resources = ["agents/*", "tasks/**"]
            permission = "execute"
            "#,
        )
        .unwrap();
        assert_eq!(mapping.tag, "tag:aoi-agent");
        assert_eq!(mapping.resources.len(), 2);
        assert_eq!(mapping.permission, PermissionLevel::Write);
    }

    #[test]
    fn test_access_rule_attribution() {
        let rule = AccessRule::new("agents/*", PermissionLevel::Read).with_agent("agent-n1");
        assert_eq!(rule.agent_id.as_deref(), Some("agent-n1"));
    }

    fn any_level() -> impl Strategy<Value = PermissionLevel> {
        prop::sample::select(PermissionLevel::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn levels_are_bounded(p in any_level()) {
            prop_assert!(PermissionLevel::None <= p);
            prop_assert!(p <= PermissionLevel::Admin);
        }

        #[test]
        fn order_is_total(a in any_level(), b in any_level()) {
            prop_assert!(a <= b || b <= a);
            prop_assert_eq!(a == b, a <= b && b <= a);
        }

        #[test]
        fn display_roundtrips(p in any_level()) {
            prop_assert_eq!(p.to_string().parse::<PermissionLevel>(), Ok(p));
        }
    }
}
