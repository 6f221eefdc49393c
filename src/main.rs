// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Command-line host for the admin gateway.
//!
//! ```text
//! admin-gateway status
//! admin-gateway login <IDENTITY_JSON> <TOKEN>
//! admin-gateway logout
//! admin-gateway request <METHOD> <PATH> [JSON_BODY]
//! ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use admin_gateway::auth::{inspector, Identity};
use admin_gateway::config::{GatewayConfig, LOG_FORMAT_ENV};
use admin_gateway::gateway::ApiRequest;
use admin_gateway::storage::FileBackend;
use admin_gateway::AdminContext;
use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Method;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "admin-gateway")]
#[command(about = "Session store and request gateway for the marketplace admin console", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the persisted session
    Status,

    /// Store a session issued by the login flow
    Login {
        /// Identity record as JSON
        #[arg(value_parser = parse_identity)]
        identity: Identity,
        /// Bearer token
        token: String,
    },

    /// Tear the session down
    Logout,

    /// Dispatch one request through the gateway
    Request {
        #[arg(value_enum, ignore_case = true)]
        method: HttpMethod,
        /// Path relative to the API base URL
        path: String,
        /// JSON body
        #[arg(value_parser = parse_json)]
        body: Option<Value>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

fn parse_identity(raw: &str) -> Result<Identity, String> {
    serde_json::from_str(raw).map_err(|e| format!("identity is not valid JSON: {e}"))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("body is not valid JSON: {e}"))
}

fn build_request(method: HttpMethod, path: String, body: Option<Value>) -> ApiRequest {
    let request = ApiRequest::new(method.into(), path);
    match body {
        Some(body) => request.with_body(body),
        None => request,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if env::var(LOG_FORMAT_ENV).is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let backend = Arc::new(FileBackend::new(&config.storage_path));
    let ctx = match AdminContext::new(&config, backend) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "Failed to initialize gateway");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Status => {
            let session = ctx.session.snapshot();
            let claims = session.token.as_deref().and_then(inspector::decode_lenient);
            let status = serde_json::json!({
                "authenticated": session.is_authenticated(),
                "identity": session.identity,
                "expires_at": claims.and_then(|c| c.expires_at()).map(|t| t.to_rfc3339()),
                "last_activity": ctx.session.last_activity().map(|t| t.to_rfc3339()),
            });
            println!("{status:#}");
            ExitCode::SUCCESS
        }
        Commands::Login { identity, token } => match ctx.sign_in(identity, token) {
            Ok(()) => {
                info!("Session stored");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "Failed to store session");
                ExitCode::FAILURE
            }
        },
        Commands::Logout => {
            ctx.logout();
            ExitCode::SUCCESS
        }
        Commands::Request { method, path, body } => match ctx
            .gateway
            .dispatch(build_request(method, path, body))
            .await
        {
            Ok(body) => {
                println!("{body:#}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error_code = e.error_code(), status = ?e.status(), "{}", e.user_message());
                ExitCode::FAILURE
            }
        },
    }
}
