//! Clap CLI definitions for AOI.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  aoi serve                                   Start the API server
  aoi status                                  Show the local daemon's state
  aoi peers                                   List mesh peers and their tags
  aoi check --tag tag:aoi-agent agents/a1 write
                                              Evaluate a permission offline";

/// AOI: mesh-identity authentication for agents.
#[derive(Parser)]
#[command(name = "aoi", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file (default: ~/.aoi/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the authenticated HTTP API.
    Serve {
        /// Override `listen_addr` from the config.
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Print the mesh daemon's status.
    Status {
        /// Print the raw status as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List mesh peers with their tags.
    Peers,
    /// Check whether a tag set may perform an action on a resource.
    Check {
        /// Tag held by the caller (repeatable).
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Resource path, e.g. `agents/a1`.
        resource: String,
        /// Action: read, write, execute, admin, or any other verb.
        action: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from([
            "aoi",
            "--config",
            "/tmp/aoi.toml",
            "check",
            "--tag",
            "tag:a",
            "--tag",
            "tag:b",
            "agents/a1",
            "write",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/aoi.toml")));
        match cli.command {
            Commands::Check {
                tags,
                resource,
                action,
            } => {
                assert_eq!(tags, vec!["tag:a", "tag:b"]);
                assert_eq!(resource, "agents/a1");
                assert_eq!(action, "write");
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_parse_serve_listen() {
        let cli = Cli::parse_from(["aoi", "serve", "--listen", "127.0.0.1:9000"]);
        match cli.command {
            Commands::Serve { listen } => {
                assert_eq!(listen, Some("127.0.0.1:9000".parse().unwrap()))
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["aoi", "peers", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
