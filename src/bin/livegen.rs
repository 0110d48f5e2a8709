//! Livegen CLI binary.
//!
//! Live video generation over the service WebSocket.
//!
//! # Commands
//!
//! - `generate` - Run one generation session and print the video URL
//! - `serve` - Start the HTTP API server

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use livegen::{
    server::{self, AppState},
    transport::WsConnector,
    Config, SessionDriver, SessionOutcome, SessionRequest, VERSION,
};

#[derive(Parser)]
#[command(name = "livegen")]
#[command(version = VERSION)]
#[command(about = "Livegen - live video generation sessions", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/livegen/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video for a task description
    Generate {
        /// Task text (or - for stdin)
        input: Option<String>,

        /// Read the task from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// API key (default: KNOWLIFY_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Service WebSocket endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Session deadline in seconds
        #[arg(short, long)]
        deadline_secs: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Bind to all interfaces
        #[arg(long)]
        bind_all: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(log_filter(None, cli.verbose), cli.log_json);
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Generate {
            input,
            file,
            api_key,
            endpoint,
            deadline_secs,
            json,
        } => {
            let mut config = config;
            if let Some(key) = api_key {
                config.service.api_key = Some(key);
            }
            if let Some(endpoint) = endpoint {
                config.service.endpoint = endpoint;
            }
            if let Some(secs) = deadline_secs {
                config.service.deadline_secs = secs;
            }
            let task = read_input(input, file)?;
            cmd_generate(config, task, json)
        },
        Commands::Serve {
            port,
            host,
            bind_all,
        } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if bind_all {
                config.server.host = "0.0.0.0".to_string();
            }
            cmd_serve(config)
        },
    }
}

fn cmd_generate(config: Config, task: String, json: bool) -> anyhow::Result<()> {
    let task = task.trim().to_string();
    if task.is_empty() {
        anyhow::bail!("Task is empty");
    }

    let Some(api_key) = config.service.api_key.clone() else {
        anyhow::bail!("No API key: pass --api-key or set KNOWLIFY_API_KEY");
    };

    let connector = WsConnector::new().with_connect_timeout(config.service.connect_timeout());
    let driver = SessionDriver::new(config.service.endpoint.clone())
        .with_connector(Arc::new(connector))
        .with_deadline(config.service.deadline());

    let runtime = tokio::runtime::Runtime::new()?;
    let outcome = runtime.block_on(driver.run(SessionRequest::new(task, api_key)));

    match outcome {
        SessionOutcome::Completed(artifact) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&artifact)?);
            } else {
                println!("{}", artifact.location);
                if let Some(vtt) = &artifact.vtt_link {
                    println!("Captions (VTT): {vtt}");
                }
                if let Some(srt) = &artifact.srt_link {
                    println!("Captions (SRT): {srt}");
                }
            }
            Ok(())
        },
        SessionOutcome::Failed(failure) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "error": failure.kind(), "message": failure.to_string() })
                );
            } else {
                eprintln!("Video generation failed: {failure}");
            }
            std::process::exit(1);
        },
    }
}

fn cmd_serve(config: Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;

    tracing::info!("Starting Livegen server on {}", addr);
    tracing::info!("Service endpoint: {}", config.service.endpoint);
    if config.service.api_key.is_none() {
        tracing::warn!("KNOWLIFY_API_KEY not configured; generation requests will fail");
    }
    tracing::info!(
        "Rate limit: {} requests per {}s",
        config.server.rate_limit_max,
        config.server.rate_limit_window_secs
    );

    let state = Arc::new(AppState::new(config));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        server::serve(addr, state)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    })
}

// Helper functions

/// Load `.env` first so that `RUST_LOG` set there takes effect
fn log_filter(env_file: Option<&Path>, verbose: bool) -> EnvFilter {
    let _ = match env_file {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };

    let log_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

fn init_logging(filter: EnvFilter, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// File config (explicit path, else the default location if it exists),
/// overlaid with the environment.
fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let file = match path {
        Some(path) => Config::from_file(path)?,
        None => match Config::default_path().filter(|p| p.exists()) {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        },
    };

    Ok(file.merge(Config::from_env()))
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_filter_reads_env_file() {
        let mut env_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(env_file, "RUST_LOG=livegen=trace").unwrap();
        std::env::remove_var("RUST_LOG");

        let filter = log_filter(Some(env_file.path()), false);
        assert!(filter.to_string().contains("livegen=trace"));

        std::env::remove_var("RUST_LOG");
    }
}
