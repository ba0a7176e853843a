use bike_price_api::config::{ConfigLoader, ConfigValidator};
use bike_price_api::http_server::{AppState, HttpServer};
use bike_price_api::session::{MemorySessionStore, SessionStore};
use bike_price_api::store::establish_store;
use bike_price_api::utils::{init_logging, ShutdownCoordinator};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "bike-price-api")]
#[command(about = "Session-gated price queries over bike listings")]
#[command(version)]
enum Cli {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Load and validate the configuration, then exit
    CheckConfig(ConfigArgs),
    /// Print the configuration JSON schema
    Schema,
}

#[derive(Parser)]
struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Parser)]
struct ServeArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,
    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,
    /// Log level
    #[arg(short, long)]
    log_level: Option<String>,
}

impl ConfigArgs {
    fn loader(&self) -> ConfigLoader {
        match &self.config {
            Some(path) => ConfigLoader::new().with_file(path),
            None => ConfigLoader::new(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli {
        Cli::Serve(args) => {
            let mut config = args.config.loader().load()?;

            // Override with CLI args
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            if let Some(level) = args.log_level {
                config.logging.level = level;
            }

            init_logging(&config.logging);
            info!(
                "Starting bike price API on {}:{}",
                config.server.host, config.server.port
            );

            let listings = establish_store(&config.store).await;
            let sessions: Arc<dyn SessionStore> = match config.session.ttl() {
                Some(ttl) => Arc::new(MemorySessionStore::new().with_ttl(ttl)),
                None => Arc::new(MemorySessionStore::new()),
            };
            let state = Arc::new(AppState::new(&config, listings, sessions));

            let shutdown = ShutdownCoordinator::new();
            let signal = shutdown.clone();
            tokio::spawn(async move { signal.wait_for_shutdown_signal().await });

            HttpServer::new(config, state, shutdown).run().await?;
        }
        Cli::CheckConfig(args) => {
            let config = args.loader().load()?;
            println!("ok");
            println!(
                "  listening on {}:{}, {} requests per {}ms",
                config.server.host,
                config.server.port,
                config.rate_limit.max_requests,
                config.rate_limit.window_ms
            );
        }
        Cli::Schema => {
            println!("{}", ConfigValidator::new().export_schema());
        }
    }

    Ok(())
}
