use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::context::CliContext;
use super::runtime::build_adapter;
use crate::metrics;

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Address to bind (defaults to the configured `bind`)
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Port for the webhook listener (defaults to the configured `port`)
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let router = build_adapter(config, false)?.build_http();
    let _metrics_server = metrics::spawn_metrics_server(ctx.metrics_port()).await?;

    let addr = SocketAddr::new(
        args.bind.unwrap_or(config.bind),
        args.port.unwrap_or(config.port),
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind webhook adapter on {}", addr))?;
    info!(
        %addr,
        context_zone = %config.date_context_zone,
        "Webhook adapter listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook adapter exited unexpectedly")?;
    info!("Webhook adapter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
