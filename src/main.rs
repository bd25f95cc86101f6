use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use phash_lambda::config::PhashConfig;
use phash_lambda::infrastructure::storage;
use phash_lambda::services::invocation::PhashHandler;
use phash_lambda::services::phash::PhashService;
use phash_lambda::{AppState, create_app};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve invocations from the AWS Lambda runtime (default)
    Lambda,
    /// Expose the invocation contract over HTTP for local development
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:9000")]
        addr: SocketAddr,
    },
    /// Hash an image file on local disk and print the result
    Hash {
        /// Path of the image
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Lambda);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phash_lambda=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(use_ansi(&command)),
        )
        .init();

    let config = PhashConfig::from_env();

    match command {
        Command::Hash { path } => {
            let result = tokio::task::spawn_blocking(move || PhashService::new().hash_file(&path))
                .await??;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Lambda => {
            let handler = build_handler(config).await;
            phash_lambda::lambda::run_lambda(handler)
                .await
                .map_err(|e| anyhow::anyhow!(e))
        }
        Command::Serve { addr } => {
            let handler = build_handler(config).await;
            serve(handler, addr).await
        }
    }
}

/// CloudWatch stores log lines verbatim, so escape codes stay off there
fn use_ansi(command: &Command) -> bool {
    !matches!(command, Command::Lambda)
}

async fn build_handler(config: PhashConfig) -> Arc<PhashHandler> {
    info!(
        "🛡️  Allowed buckets: [{}], scratch dir: {}, max object size: {}",
        config.allowed_buckets.iter().collect::<Vec<_>>().join(", "),
        config.scratch_dir.display(),
        config
            .max_object_size
            .map(|b| format!("{}MB", b / 1024 / 1024))
            .unwrap_or_else(|| "unlimited".to_string())
    );

    let store = storage::setup_storage(&config).await;
    Arc::new(PhashHandler::new(config, store))
}

async fn serve(handler: Arc<PhashHandler>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(AppState { handler }).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    info!("✅ Server ready at http://{}", addr);
    info!("📖 OpenAPI: http://{}/api-docs/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
