use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use patchbay::config::Config;
use patchbay::session;
use patchbay::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "patchbay")]
#[command(about = "An SSH patch request service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and initialize the database
    Init {
        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Ban a public key and/or address at the session boundary
    Ban {
        /// Public key to ban, authorized-keys form or fingerprint
        #[arg(long)]
        pubkey: Option<String>,

        /// Address to ban
        #[arg(long)]
        ip: Option<String>,

        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run one authenticated session (installed as sshd ForceCommand)
    Shell {
        /// Caller's public key, authorized-keys form or fingerprint
        #[arg(long)]
        pubkey: String,

        /// Caller's address, checked against bans
        #[arg(long)]
        ip: Option<String>,

        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = Config::load(path.as_deref())?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

fn run_init(data_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path, data_dir)?;
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.migrate()?;

    println!("initialized database at {}", config.db_path().display());
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        anyhow::bail!(
            "database not found at {}. Run 'patchbay init' first.",
            db_path.display()
        );
    }
    let store = SqliteStore::new(&db_path)?;
    store.migrate()?;
    Ok(store)
}

fn run_ban(
    pubkey: Option<String>,
    ip: Option<String>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path, None)?;
    let store = open_store(&config)?;

    let fingerprint = pubkey
        .as_deref()
        .map(patchbay::acl::canonicalize_pubkey)
        .transpose()?;
    store.ban(fingerprint.as_deref(), ip.as_deref())?;

    println!("banned");
    Ok(())
}

fn run_shell(pubkey: String, ip: Option<String>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path, None)?;
    let store = open_store(&config)?;
    let command = std::env::var("SSH_ORIGINAL_COMMAND").unwrap_or_default();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = session::dispatch(
        &store,
        &config,
        &pubkey,
        ip.as_deref(),
        &command,
        &mut stdin.lock(),
        &mut stdout.lock(),
    );

    if let Err(e) = result {
        tracing::error!(%pubkey, %command, error = %e, "session failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // stdout carries session responses; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("patchbay=info".parse()?))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { data_dir, config } => run_init(data_dir, config),
        Commands::Ban { pubkey, ip, config } => run_ban(pubkey, ip, config),
        Commands::Shell { pubkey, ip, config } => run_shell(pubkey, ip, config),
    }
}
