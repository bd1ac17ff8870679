//! Startup error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use smarthq_config::ConfigError;
use smarthq_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const BIND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum BridgeError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration")]
    #[diagnostic(
        code(smarthqd::config),
        help(
            "Check the config file passed with --config and any SMARTHQ_* \
             environment variables."
        )
    )]
    Config(#[from] ConfigError),

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication with SmartHQ failed")]
    #[diagnostic(
        code(smarthqd::auth_failed),
        help("Provide a valid access token via access_token or SMARTHQ_ACCESS_TOKEN.")
    )]
    Authentication {
        #[source]
        source: CoreError,
    },

    // ── HTTP facade ──────────────────────────────────────────────────
    #[error("Cannot listen on {addr}")]
    #[diagnostic(
        code(smarthqd::bind),
        help("Another process may be using the port. Try --port.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed")]
    #[diagnostic(code(smarthqd::serve))]
    Serve(#[source] std::io::Error),
}

impl BridgeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::Authentication { .. } => exit_code::AUTH,
            Self::Bind { .. } => exit_code::BIND,
            Self::Serve(_) => exit_code::GENERAL,
        }
    }
}
