//! Strata demo server.
//!
//! ```text
//! strata [--config strata.toml] [--bind 127.0.0.1:8080] [--debug]
//! ```
//!
//! Routes:
//! - `GET  /health`            liveness probe
//! - `ANY  /api/echo`          echoes method, path, query and client address
//! - `POST /api/items`         binds a JSON or form item, answers 201
//! - `GET  /api/admin/routes`  routing table, bearer-protected (when a token is configured)

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use strata::config::{load_config, validate_config, ServerConfig};
use strata::net::Listener;
use strata::observability::{logging::init_logging, metrics::init_metrics};
use strata::prelude::*;
use strata::{lifecycle, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Exact-match HTTP router with layered middleware", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Log the routing table at startup
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Deserialize, Serialize)]
struct Item {
    name: String,
    #[serde(default)]
    quantity: u32,
}

#[derive(Serialize)]
struct Echo {
    method: String,
    path: String,
    query: Vec<(String, String)>,
    client: String,
    request_id: Option<String>,
}

#[derive(Serialize)]
struct RouteView {
    method: String,
    path: String,
    middleware: usize,
}

fn build_router(config: &ServerConfig) -> Router {
    let router = Router::new(config.debug);
    router.pre(&[middleware::recover(), middleware::logger()]);
    router.use_middleware(&[middleware::metrics()]);

    router.get(
        "/health",
        handler_fn(|ctx| Box::pin(async move { ctx.json(StatusCode::OK, &"ok") })),
        &[],
    );

    let mut api = router.group("/api");
    api.use_middleware(&[middleware::request_id()]);

    api.any(
        "/echo",
        handler_fn(|ctx| {
            Box::pin(async move {
                let echo = Echo {
                    method: ctx.method().to_string(),
                    path: ctx.path().to_string(),
                    query: ctx.query_all(),
                    client: ctx.real_ip(),
                    request_id: ctx.request_id().map(str::to_string),
                };
                ctx.json(StatusCode::OK, &echo)
            })
        }),
        &[],
    );

    api.post(
        "/items",
        handler_fn(|ctx| {
            Box::pin(async move {
                let item: Item = ctx.bind()?;
                if item.name.trim().is_empty() {
                    return Err(Error::http(StatusCode::UNPROCESSABLE_ENTITY, "name must not be empty"));
                }
                ctx.json(StatusCode::CREATED, &item)
            })
        }),
        &[],
    );

    if let Some(token) = &config.auth.admin_token {
        let mut admin = api.group("/admin");
        admin.use_middleware(&[middleware::bearer_auth(token.clone())]);

        let listing = router.downgrade();
        admin.get(
            "/routes",
            handler_fn(move |ctx| {
                let listing = listing.clone();
                Box::pin(async move {
                    let routes: Vec<RouteView> = listing
                        .upgrade()
                        .map(|router| router.routes())
                        .unwrap_or_default()
                        .into_iter()
                        .map(|r| RouteView {
                            method: r.method.to_string(),
                            path: r.path,
                            middleware: r.middleware,
                        })
                        .collect();
                    ctx.json(StatusCode::OK, &routes)
                })
            }),
            &[],
        );
    }

    router
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    config.debug |= cli.debug;
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {error}");
        }
        return Err("invalid configuration".into());
    }

    init_logging(&config.observability.log_level);
    tracing::info!("strata v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        debug = config.debug,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = build_router(&config);
    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(router, config);
    let serving = tokio::spawn(server.run(listener, shutdown.clone()));

    lifecycle::shutdown_signal().await;
    shutdown.trigger();
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
