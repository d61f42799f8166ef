use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone)]
#[command(about = "Admission webhook reconciling pod tolerations with extended resource requests")]
pub struct Cli {
    #[arg(
        long,
        env = "WEBHOOK_PORT",
        default_value = "8443",
        help = "Webhook server port"
    )]
    pub port: u16,

    #[arg(
        long,
        env = "WEBHOOK_TLS_CERT_FILE",
        value_hint = clap::ValueHint::FilePath,
        default_value = "/etc/webhook/certs/cert.pem",
        help = "x509 certificate file for the TLS listener"
    )]
    pub tls_cert_file: PathBuf,

    #[arg(
        long,
        env = "WEBHOOK_TLS_KEY_FILE",
        value_hint = clap::ValueHint::FilePath,
        default_value = "/etc/webhook/certs/key.pem",
        help = "x509 private key file for the TLS listener"
    )]
    pub tls_key_file: PathBuf,

    #[arg(
        long,
        help = "Extended resource name that requires a matching toleration, \
                e.g. vendor.com/gpu. May be repeated"
    )]
    pub target_resource: Vec<String>,
}
