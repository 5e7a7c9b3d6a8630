use clap::{Parser, Subcommand};
use file_manager::config::Overrides;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "file-manager")]
#[command(author, version, about = "Image file manager backed by the CRUD metadata service")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "FILE_MANAGER_PORT")]
        port: Option<u16>,

        /// Directory holding entity image folders and default/default.png
        #[arg(long, env = "RESOURCES_PATH")]
        resources_path: Option<PathBuf>,

        /// Metadata service host
        #[arg(long, env = "CRUD_HOST")]
        crud_host: Option<String>,

        /// Metadata service port
        #[arg(long, env = "CRUD_PORT")]
        crud_port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

impl Commands {
    /// Overrides carried by the `start` command, empty for every other command.
    pub fn overrides(&self) -> Overrides {
        match self {
            Commands::Start {
                host,
                port,
                resources_path,
                crud_host,
                crud_port,
            } => Overrides {
                host: host.clone(),
                port: *port,
                resources_path: resources_path.clone(),
                crud_host: crud_host.clone(),
                crud_port: *crud_port,
            },
            _ => Overrides::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_start_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "file-manager",
            "start",
            "--port",
            "9000",
            "--resources-path",
            "/srv/images",
            "--crud-host",
            "crud",
            "--crud-port",
            "9001",
        ])
        .unwrap();

        let overrides = cli.command.overrides();
        assert_eq!(overrides.port, Some(9000));
        assert_eq!(overrides.resources_path, Some(PathBuf::from("/srv/images")));
        assert_eq!(overrides.crud_host.as_deref(), Some("crud"));
        assert_eq!(overrides.crud_port, Some(9001));
    }

    #[test]
    fn test_version_has_no_overrides() {
        let cli = Cli::try_parse_from(["file-manager", "version"]).unwrap();
        assert!(cli.command.overrides().port.is_none());
    }
}
