use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use mpdsonic::media::fs::OsFilesystem;
use mpdsonic::mpd::MpdClient;
use mpdsonic::server::Server;
use mpdsonic::{cli, config};

/// Resolve on the first Ctrl+C (graceful shutdown).
/// A second Ctrl+C while requests drain force-exits immediately.
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nmpdsonic: forced exit");
            std::process::exit(1);
        }
    });
}

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = config::Config::resolve(file_config, &args).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    });

    if !config.music_directory.is_dir() {
        eprintln!(
            "error: music directory is not a directory: {}",
            config.music_directory.display()
        );
        std::process::exit(1);
    }

    let db = MpdClient::connect(&config.mpd_address, config.mpd_password.clone())
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to connect to MPD at {}: {}", config.mpd_address, e);
            std::process::exit(1);
        });
    let fs = OsFilesystem::new(config.music_directory.clone());

    let listen = config.listen;
    tracing::info!(
        "mpdsonic {} on http://{} -> MPD {} (music: {})",
        env!("CARGO_PKG_VERSION"),
        listen,
        config.mpd_address,
        config.music_directory.display()
    );

    let server = Server::new(Arc::new(db), Arc::new(fs), config);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", listen, e);
            std::process::exit(1);
        });

    let app = server.router().into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
    {
        tracing::error!("HTTP server error: {}", e);
    }

    tracing::info!("Shutting down, stopping MPD keepalive...");
    server.shutdown().await;
    tracing::info!("Goodbye.");
}
