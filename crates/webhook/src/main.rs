use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use extended_resource_toleration_webhook::config::Cli;
use extended_resource_toleration_webhook::logging;
use extended_resource_toleration_webhook::registry::TargetResources;
use extended_resource_toleration_webhook::webhook::server::WebhookServer;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::oneshot;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    logging::init();

    let targets = Arc::new(TargetResources::new(&cli.target_resource));
    if targets.is_empty() {
        tracing::warn!(
            "No target resources configured, the webhook will never mutate or deny a pod"
        );
    } else {
        tracing::info!(targets = %targets, "Target resources configured");
    }

    let server = WebhookServer::new(
        format!("0.0.0.0:{}", cli.port),
        cli.tls_cert_file,
        cli.tls_key_file,
        targets,
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        tracing::info!("OS shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    server
        .run(shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!("webhook server failed: {e:?}"))
}
