use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use fruitgraph::{Driver, Params, Value, app, config::AppConfig};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fruitgraph")]
#[command(about = "Streams fruits from an in-process graph store over HTTP")]
struct Cli {
    /// Interface to bind, overrides APP_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides APP_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Fruit to create at startup; repeatable
    #[arg(long = "seed")]
    seeds: Vec<String>,

    /// Enforce unique fruit names, overrides FRUIT_UNIQUE_NAMES
    #[arg(long)]
    unique_names: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.unique_names |= cli.unique_names;

    let driver = Arc::new(
        Driver::new(config.driver_config()?).context("failed to create graph driver")?,
    );
    info!(url = %driver.config().to_url(), "graph driver ready");

    if config.unique_names {
        driver
            .execute(
                "CREATE CONSTRAINT ON (f:Fruit) ASSERT f.name IS UNIQUE",
                Params::new(),
            )
            .await
            .context("failed to create fruit name constraint")?;
    }

    for name in &cli.seeds {
        let mut params = Params::new();
        params.insert("name".into(), Value::from(name.as_str()));
        driver
            .execute("CREATE (f:Fruit {name: $name})", params)
            .await
            .with_context(|| format!("failed to seed fruit '{}'", name))?;
    }
    if !cli.seeds.is_empty() {
        info!(count = cli.seeds.len(), "seeded fruits");
    }

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "fruitgraph started");

    axum::serve(listener, app(Arc::clone(&driver)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(stats = %driver.stats(), "fruitgraph stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fruitgraph=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
