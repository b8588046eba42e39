use clap::Parser;
use formflow::server::{ServerConfig, serve};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Serves workflow documents over HTTP
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Path of the SQLite database file
    #[arg(short, long, env = "FORMFLOW_DATABASE", default_value = "data/app.db")]
    database: PathBuf,

    /// Do not insert the bundled workflows into an empty database
    #[arg(long, env = "FORMFLOW_NO_SEED")]
    no_seed: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = ServerConfig {
        bind: SocketAddr::new(cli.host, cli.port),
        database: cli.database,
        seed: !cli.no_seed,
    };

    if let Err(e) = serve(config).await {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}
