//! Subcommand implementations.

use crate::table::Table;
use anyhow::Context;
use aoi_api::{router, AppState};
use aoi_kernel::{
    AgentBindingStore, Authenticator, InMemoryAclRuleStore, InMemoryAgentRegistry,
    PermissionEngine, TagSnapshotStore,
};
use aoi_tailnet::NetworkIdentityClient;
use aoi_types::config::{AoiConfig, TailnetConfig};
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[cfg(unix)]
fn identity_client(config: &TailnetConfig) -> anyhow::Result<Arc<dyn NetworkIdentityClient>> {
    Ok(Arc::new(aoi_tailnet::LocalClient::from_config(config)))
}

#[cfg(not(unix))]
fn identity_client(_config: &TailnetConfig) -> anyhow::Result<Arc<dyn NetworkIdentityClient>> {
    anyhow::bail!("the mesh daemon control socket is only supported on unix platforms")
}

fn permission_engine(
    config: &AoiConfig,
    client: Arc<dyn NetworkIdentityClient>,
) -> anyhow::Result<PermissionEngine> {
    PermissionEngine::from_config(
        &config.acl,
        client,
        Arc::new(InMemoryAclRuleStore::new()),
        Arc::new(TagSnapshotStore::new()),
    )
    .context("invalid [acl] configuration")
}

pub async fn serve(config: AoiConfig, listen: Option<SocketAddr>) -> anyhow::Result<()> {
    let client = identity_client(&config.tailnet)?;
    let engine = Arc::new(permission_engine(&config, client.clone())?);
    let authenticator = Arc::new(Authenticator::new(
        config.auth.clone(),
        client.clone(),
        Arc::new(InMemoryAgentRegistry::new()),
        Arc::new(AgentBindingStore::new()),
    ));

    if !client.is_connected().await {
        tracing::warn!(
            socket = %config.tailnet.socket_path.display(),
            "Mesh daemon not reachable or not running; mesh callers will be rejected until it is"
        );
    }

    let app = router(AppState {
        authenticator,
        engine,
    });
    let addr = listen.unwrap_or(config.listen_addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "AOI API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("AOI API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

pub async fn status(config: &AoiConfig, json: bool) -> anyhow::Result<()> {
    let client = identity_client(&config.tailnet)?;
    let status = client
        .get_status()
        .await
        .context("failed to query the mesh daemon")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*status)?);
        return Ok(());
    }

    let state = if status.is_running() {
        status.backend_state.green()
    } else {
        status.backend_state.yellow()
    };
    println!("{:<10} {state}", "State:".bold());
    match &status.self_node {
        Some(node) => {
            println!("{:<10} {} ({})", "Node:".bold(), node.name, node.id);
            println!("{:<10} {}", "Tags:".bold(), join_or_dash(&node.tags));
        }
        None => println!("{:<10} -", "Node:".bold()),
    }
    let ips: Vec<String> = status.ips.iter().map(|ip| ip.to_string()).collect();
    println!("{:<10} {}", "IPs:".bold(), join_or_dash(&ips));
    println!("{:<10} {}", "Peers:".bold(), status.peers.len());
    for warning in &status.health {
        println!("{} {warning}", "warning:".yellow());
    }
    Ok(())
}

pub async fn peers(config: &AoiConfig) -> anyhow::Result<()> {
    let client = identity_client(&config.tailnet)?;
    let peers = client
        .get_peers()
        .await
        .context("failed to query the mesh daemon")?;

    if peers.is_empty() {
        println!("No peers.");
        return Ok(());
    }

    let mut table = Table::new(&["ID", "Host", "IPs", "OS", "Online", "Tags"]);
    for peer in &peers {
        let ips: Vec<String> = peer.ips.iter().map(|ip| ip.to_string()).collect();
        table.add_row(&[
            peer.id.clone(),
            peer.hostname.clone(),
            ips.join(", "),
            peer.os.clone(),
            if peer.online { "yes" } else { "no" }.to_string(),
            join_or_dash(&peer.tags),
        ]);
    }
    table.print();
    Ok(())
}

pub fn check(
    config: &AoiConfig,
    tags: &[String],
    resource: &str,
    action: &str,
) -> anyhow::Result<()> {
    let client = identity_client(&config.tailnet)?;
    let engine = permission_engine(config, client)?;
    let result = engine.check_str(tags, resource, action);

    if result.allowed {
        println!("{} {}", "allowed:".green().bold(), result.reason);
        Ok(())
    } else {
        println!("{} {}", "denied:".red().bold(), result.reason);
        std::process::exit(1);
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
