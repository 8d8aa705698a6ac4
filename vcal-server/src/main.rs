use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vcal_core::VcalConfig;
use vcal_server::{AppState, router, serve, singleton};

#[derive(Parser)]
#[command(name = "vcal-server")]
#[command(about = "Keep a vcal event file and push every change to connected clients")]
struct Args {
    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Event file to serve (overrides data_file)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Directory to serve over HTTP (overrides server.static_dir)
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Listen on all interfaces instead of localhost only
    #[arg(long)]
    public: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = VcalConfig::load()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_file) = args.data_file {
        config.data_file = Some(data_file);
    }
    if let Some(static_dir) = args.static_dir {
        config.server.static_dir = Some(static_dir);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_deref().unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data_file = config.data_path()?;

    // Ensure only one instance serves this file
    let lock = singleton::acquire_lock(&data_file)?;
    info!("Holding {}", lock.path().display());

    let state = AppState::open(&data_file).await?;
    info!("Serving events from {}", data_file.display());

    let static_dir = config.static_dir();
    if let Some(dir) = &static_dir {
        info!("Serving static files from {}", dir.display());
    }
    let app = router(state, static_dir);

    let host = if args.public { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
    let addr = SocketAddr::from((host, config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("vcal-server listening on ws://{}/ws", addr);

    serve(listener, app, shutdown_signal()).await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
