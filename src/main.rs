mod cli;

use file_manager::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(config: config::Config) -> Result<()> {
    tracing::info!("Starting file manager");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "file_manager=trace,tower_http=debug".to_string()
        } else {
            "file_manager=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { .. } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let config = config::apply_overrides(config, cli.command.overrides())?;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(config))
        }
        Commands::Validate {
            config: ref config_path,
        } => {
            let path = config_path.clone().or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("file-manager {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Max body: {} bytes", config.server.max_body_bytes);
    println!("  Resources: {:?}", config.storage.resources_path);
    println!("  Metadata service: {}", config.crud.base_url());
    match config.crud.timeout_secs {
        Some(secs) => println!("  Metadata timeout: {}s", secs),
        None => println!("  Metadata timeout: none"),
    }

    Ok(())
}
