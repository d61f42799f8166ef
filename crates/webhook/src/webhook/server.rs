use std::path::PathBuf;
use std::sync::Arc;

use error_stack::Report;
use error_stack::ResultExt;
use poem::listener::Listener;
use poem::listener::RustlsCertificate;
use poem::listener::RustlsConfig;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::post;
use poem::Endpoint;
use poem::EndpointExt;
use poem::Route;
use poem::Server;
use tokio::sync::oneshot;
use tracing::error;
use tracing::info;

use super::handlers::handle_mutate;
use super::handlers::handle_validate;
use super::WebhookError;
use crate::registry::TargetResources;

/// Build the `/mutate` and `/validate` routes with the target resource
/// registry injected. Shared with the integration tests, which drive the
/// routes without a TLS listener.
pub fn webhook_routes(targets: Arc<TargetResources>) -> impl Endpoint {
    Route::new()
        .at("/mutate", post(handle_mutate))
        .at("/validate", post(handle_validate))
        .data(targets)
        .with(Tracing)
}

/// TLS admission webhook server called synchronously by the API server.
pub struct WebhookServer {
    listen_addr: String,
    tls_cert_file: PathBuf,
    tls_key_file: PathBuf,
    targets: Arc<TargetResources>,
}

impl WebhookServer {
    pub fn new(
        listen_addr: String,
        tls_cert_file: PathBuf,
        tls_key_file: PathBuf,
        targets: Arc<TargetResources>,
    ) -> Self {
        Self {
            listen_addr,
            tls_cert_file,
            tls_key_file,
            targets,
        }
    }

    /// Serve until an error occurs or the shutdown signal fires.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::TlsConfig`] if the certificate or key cannot be read
    /// - [`WebhookError::ServerError`] if the server fails to bind or serve
    pub async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<(), Report<WebhookError>> {
        info!("Starting admission webhook server on {}", self.listen_addr);

        let cert =
            std::fs::read(&self.tls_cert_file).change_context(WebhookError::TlsConfig {
                path: self.tls_cert_file.display().to_string(),
            })?;
        let key = std::fs::read(&self.tls_key_file).change_context(WebhookError::TlsConfig {
            path: self.tls_key_file.display().to_string(),
        })?;

        let tls_config =
            RustlsConfig::new().fallback(RustlsCertificate::new().cert(cert).key(key));
        let listener = TcpListener::bind(&self.listen_addr).rustls(tls_config);

        let app = webhook_routes(self.targets);
        let server = Server::new(listener);

        tokio::select! {
            result = server.run(app) => {
                match result {
                    Ok(()) => {
                        info!("Webhook server stopped normally");
                        Ok(())
                    }
                    Err(e) => {
                        error!("Webhook server failed: {e}");
                        Err(Report::new(WebhookError::ServerError {
                            message: format!("Server failed: {e}"),
                        }))
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("Webhook server shutdown requested");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_server_can_be_created() {
        let targets = Arc::new(TargetResources::new(["vendor.com/gpu"]));
        let server = WebhookServer::new(
            "0.0.0.0:8443".to_string(),
            PathBuf::from("/etc/webhook/certs/cert.pem"),
            PathBuf::from("/etc/webhook/certs/key.pem"),
            targets.clone(),
        );

        assert_eq!(server.listen_addr, "0.0.0.0:8443");
        assert!(
            Arc::ptr_eq(&server.targets, &targets),
            "registry should be shared, not copied"
        );
    }

    #[tokio::test]
    async fn run_fails_when_tls_material_is_missing() {
        let server = WebhookServer::new(
            "127.0.0.1:0".to_string(),
            PathBuf::from("/nonexistent/cert.pem"),
            PathBuf::from("/nonexistent/key.pem"),
            Arc::new(TargetResources::default()),
        );
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let result = server.run(shutdown_rx).await;
        assert!(result.is_err(), "missing TLS files must fail startup");
    }

    #[tokio::test]
    async fn shutdown_signal_stops_pending_server() {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        shutdown_tx.send(()).expect("should send shutdown signal");

        let result = shutdown_rx.await;
        assert!(result.is_ok(), "shutdown receiver should work correctly");
    }
}
