use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rand::RngCore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scopeauth::auth::{PasswordHasher, ScopeSet, TokenService};
use scopeauth::config;
use scopeauth::models::{is_valid_username, NewAccount};
use scopeauth::state::AppState;
use scopeauth::store::{AccountStore, PgStore};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Keygen { bytes }) => keygen(bytes),
        Some(cli::Commands::Serve { port }) => {
            let cfg = config::load()?;
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::User { command }) => {
            let cfg = config::load()?;
            let db = PgStore::connect(&cfg.database_url, &cfg.pool).await?;
            db.migrate().await?;
            handle_user_command(command, &db, &cfg).await
        }
        Some(cli::Commands::Token { command }) => {
            let cfg = config::load()?;
            handle_token_command(command, &cfg)
        }
        None => {
            let cfg = config::load()?;
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    // OTLP export only when an endpoint is configured
    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "scopeauth"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "scopeauth=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    Ok(())
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url, &cfg.pool).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let state = Arc::new(AppState::new(Arc::new(db), &cfg)?);
    tracing::info!(
        ttl_minutes = cfg.token_ttl_minutes,
        bcrypt_cost = cfg.bcrypt_cost,
        disabled_policy = ?cfg.disabled_policy,
        "Auth core ready"
    );

    let app = scopeauth::api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("scopeauth listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn handle_user_command(
    cmd: cli::UserCommands,
    db: &PgStore,
    cfg: &config::Config,
) -> anyhow::Result<()> {
    match cmd {
        cli::UserCommands::Create {
            username,
            password,
            full_name,
            email,
            scopes,
            disabled,
        } => {
            if !is_valid_username(&username) {
                anyhow::bail!(
                    "username must be 1-{} bytes without surrounding whitespace",
                    scopeauth::models::MAX_USERNAME_LEN
                );
            }
            if password.is_empty() || password.len() > scopeauth::auth::MAX_PASSWORD_BYTES {
                anyhow::bail!(
                    "password must be 1-{} bytes",
                    scopeauth::auth::MAX_PASSWORD_BYTES
                );
            }
            let scopes = ScopeSet::from_scopes(scopes).context("Invalid scopes")?;
            let hasher = PasswordHasher::new(cfg.bcrypt_cost)?;
            let password_hash = hasher.hash_blocking(password).await?;

            let account = db
                .insert(NewAccount {
                    username,
                    full_name,
                    email,
                    password_hash,
                    disabled,
                    scopes,
                })
                .await?;
            println!(
                "Account created:\n  ID:       {}\n  Username: {}\n  Scopes:   {}\n  Disabled: {}",
                account.id, account.username, account.scopes, account.disabled
            );
        }
        cli::UserCommands::Show { username } => match db.find_by_username(&username).await? {
            Some(a) => {
                println!("{:<10} {}", "ID", a.id);
                println!("{:<10} {}", "USERNAME", a.username);
                println!("{:<10} {}", "NAME", a.full_name.as_deref().unwrap_or("-"));
                println!("{:<10} {}", "EMAIL", a.email.as_deref().unwrap_or("-"));
                println!("{:<10} {}", "SCOPES", a.scopes);
                println!("{:<10} {}", "DISABLED", a.disabled);
                println!("{:<10} {}", "CREATED", a.created_at.format("%Y-%m-%d"));
            }
            None => println!("Account not found."),
        },
    }
    Ok(())
}

fn handle_token_command(cmd: cli::TokenCommands, cfg: &config::Config) -> anyhow::Result<()> {
    match cmd {
        cli::TokenCommands::Inspect { token } => {
            let tokens = TokenService::new(&cfg.jwt_secret, cfg.token_ttl());
            match tokens.validate(token.trim()) {
                Ok(v) => {
                    println!("Token valid:");
                    println!("  Subject: {}", v.subject);
                    println!("  Scopes:  {}", v.scopes);
                    println!("  Issued:  {}", v.issued_at.to_rfc3339());
                    println!("  Expires: {}", v.expires_at.to_rfc3339());
                }
                Err(e) => anyhow::bail!("token rejected: {}", e),
            }
        }
    }
    Ok(())
}

fn keygen(bytes: usize) -> anyhow::Result<()> {
    if bytes < scopeauth::auth::SigningSecret::MIN_LEN {
        anyhow::bail!(
            "secret must be at least {} bytes",
            scopeauth::auth::SigningSecret::MIN_LEN
        );
    }
    let mut secret = zeroize::Zeroizing::new(vec![0u8; bytes]);
    rand::thread_rng().fill_bytes(&mut secret);
    println!("{}", hex::encode(&*secret));
    Ok(())
}
