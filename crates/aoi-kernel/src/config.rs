//! Configuration loading.

use aoi_types::config::AoiConfig;
use aoi_types::{AoiError, AoiResult};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load configuration from `path` (or the default location).
///
/// A missing, unreadable, or malformed file yields the defaults.
pub fn load_config(path: Option<&Path>) -> AoiConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return AoiConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match parse_config(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                AoiConfig::default()
            }
        },
        Err(e) => {
            warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            AoiConfig::default()
        }
    }
}

/// Parse a TOML document, failing on any error.
pub fn parse_config(contents: &str) -> AoiResult<AoiConfig> {
    toml::from_str(contents).map_err(|e| AoiError::Config(e.to_string()))
}

/// `~/.aoi/config.toml`.
pub fn default_config_path() -> PathBuf {
    aoi_home().join("config.toml")
}

/// `~/.aoi`, or a temp-dir fallback when there is no home directory.
pub fn aoi_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".aoi")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoi_types::config::FallbackMode;
    use aoi_types::PermissionLevel;
    use std::io::Write;

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("nope.toml")));
        assert_eq!(config, AoiConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
listen_addr = "127.0.0.1:9000"

[auth]
fallback_mode = "development"
allowed_tags = ["tag:aoi-agent"]

[acl]
default_permission = "read"

[[acl.tag_mappings]]
tag = "tag:aoi-agent"
resources = ["agents/*", "tasks/**"]
permission = "write"

[tailnet]
status_ttl_ms = 0
"#
        )
        .unwrap();

        let config = load_config(Some(&path));
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.auth.fallback_mode, FallbackMode::Development);
        assert!(config.auth.require_auth);
        assert_eq!(config.acl.default_permission, PermissionLevel::Read);
        assert_eq!(config.acl.tag_mappings.len(), 1);
        assert_eq!(config.acl.tag_mappings[0].permission, PermissionLevel::Write);
        assert_eq!(config.tailnet.status_ttl_ms, 0);
        assert_eq!(config.tailnet.request_timeout_ms, 3_000);
    }

    #[test]
    fn test_load_config_malformed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "listen_addr = [not valid").unwrap();
        assert_eq!(load_config(Some(&path)), AoiConfig::default());
    }

    #[test]
    fn test_permission_levels_case_insensitive() {
        let config = parse_config(
            r#"
[acl]
default_permission = "Read"

[[acl.tag_mappings]]
tag = "tag:aoi-agent"
resources = ["agents/*"]
permission = "Write"
"#,
        )
        .unwrap();
        assert_eq!(config.acl.default_permission, PermissionLevel::Read);
        assert_eq!(config.acl.tag_mappings[0].permission, PermissionLevel::Write);
    }

    #[test]
    fn test_parse_config_is_strict() {
        assert!(matches!(
            parse_config("[acl]\ndefault_permission = \"owner\""),
            Err(AoiError::Config(_))
        ));
        assert_eq!(parse_config("").unwrap(), AoiConfig::default());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with(".aoi/config.toml"));
    }
}
