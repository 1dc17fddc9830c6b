//! Gateway binary: load config, wire subsystems, serve.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use auth_gateway::auth::{AuthService, PasswordHasher, SqlxUserRepository, TokenSigner, UserRepository};
use auth_gateway::config::{load_config, GateMode};
use auth_gateway::gate::{spawn_bucket_janitor, LocalPolicyEngine, PolicyClassifier, RemoteClassifier};
use auth_gateway::lifecycle::{shutdown_signal, Shutdown};
use auth_gateway::observability::{logging, metrics};
use auth_gateway::HttpServer;

/// User-acquisition API gateway.
#[derive(Debug, Parser)]
#[command(name = "auth-gateway", version)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

/// How often the janitor sweeps idle rate-limit buckets, and how long a
/// bucket may sit idle before it is dropped.
const BUCKET_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const BUCKET_IDLE_TTL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("auth-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        gate_enabled = config.gate.enabled,
        gate_mode = ?config.gate.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Database pool and migrations.
    let pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .connect(&config.database.url)
            .await?,
    );
    sqlx::migrate!().run(&*pool).await?;

    // Accounts & identity wiring.
    let users: Arc<dyn UserRepository> = Arc::new(SqlxUserRepository::new(pool));
    let auth = Arc::new(AuthService::new(
        users,
        PasswordHasher::new(),
        TokenSigner::new(&config.auth.jwt_secret, config.auth.token_ttl_hours),
    ));

    let shutdown = Shutdown::new();

    // Policy classifier behind the gate.
    let classifier: Arc<dyn PolicyClassifier> = match config.gate.mode {
        GateMode::Local => {
            let engine = Arc::new(LocalPolicyEngine::from_config(&config.gate)?);
            spawn_bucket_janitor(
                engine.clone(),
                BUCKET_SWEEP_INTERVAL,
                BUCKET_IDLE_TTL,
                shutdown.subscribe(),
            );
            engine
        }
        GateMode::Remote => Arc::new(RemoteClassifier::from_config(&config.gate.remote)?),
    };

    // Bind and serve.
    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, auth, classifier);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
