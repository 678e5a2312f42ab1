use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_session::{
    create_router, AppState, Config, InhibitWakeLock, NatsClient, NatsCommandDispatcher,
    NatsGreetingDispatcher, NatsRecognitionEngine, NoWakeLock, SessionBackends, VoiceSession,
    WakeLock,
};

/// Wake phrase driven voice session service
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/voice-session")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Do not hold a wake lock while listening
    #[arg(long)]
    no_wake_lock: bool,

    /// Start listening immediately
    #[arg(long)]
    auto_start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Voice Session v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let client = Arc::new(NatsClient::connect(cfg.nats.clone()).await?);

    let wake_lock: Arc<dyn WakeLock> = if cfg.wake_lock.enabled && !args.no_wake_lock {
        Arc::new(InhibitWakeLock::new(cfg.service.name.clone()))
    } else {
        Arc::new(NoWakeLock)
    };

    let session = VoiceSession::spawn(
        cfg.session_config(),
        SessionBackends {
            engine: Box::new(NatsRecognitionEngine::new(Arc::clone(&client))),
            command_dispatcher: Arc::new(NatsCommandDispatcher::new(Arc::clone(&client))),
            greeting_dispatcher: Arc::new(NatsGreetingDispatcher::new(Arc::clone(&client))),
            wake_lock,
        },
    )?;

    if cfg.session.auto_start || args.auto_start {
        let snapshot = session.start().await;
        info!("Session {} is {}", snapshot.session_id, snapshot.state);
    }

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;

    info!("HTTP server listening on {}:{}", bind, port);

    let app = create_router(AppState::new(session.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    session.stop().await;

    Ok(())
}
