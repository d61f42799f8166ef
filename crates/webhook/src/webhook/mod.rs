//! Admission webhook endpoints
//!
//! This module serves the two admission endpoints the Kubernetes API server
//! calls synchronously while admitting a pod:
//!
//! - `POST /mutate` - append the tolerations implied by the pod's extended
//!   resource requests, as an RFC 6902 JSON Patch
//! - `POST /validate` - reject pods that tolerate a target resource they do
//!   not request
//!
//! Both endpoints consume and produce `application/json` AdmissionReview
//! envelopes. A denial is a normal protocol outcome carried inside an HTTP
//! 200 response; only transport faults (empty body, wrong media type,
//! response-encoding failure) surface as HTTP errors.

use core::error::Error;

pub mod handlers;
pub mod server;
pub mod types;

/// Webhook errors
#[derive(Debug, derive_more::Display)]
pub enum WebhookError {
    #[display("Server error: {message}")]
    ServerError { message: String },
    #[display("Failed to load TLS material from {path}")]
    TlsConfig { path: String },
}

impl Error for WebhookError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_error_display_formatting() {
        let server_error = WebhookError::ServerError {
            message: "bind failed".to_string(),
        };
        assert_eq!(server_error.to_string(), "Server error: bind failed");

        let tls_error = WebhookError::TlsConfig {
            path: "/etc/webhook/certs/cert.pem".to_string(),
        };
        assert_eq!(
            tls_error.to_string(),
            "Failed to load TLS material from /etc/webhook/certs/cert.pem"
        );
    }
}
