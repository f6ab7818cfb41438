//! Nexus CLI - Command-line access to the local session store and web search

use clap::{Parser, Subcommand};
use nexus_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success,
    not_found_error, performance, ErrorContext, LoggingConfig, NexusConfig, NexusError,
    NexusResult, SearchResult, StoredUser,
};
use nexus_search::{LibreXClient, SearchClientConfig, SearchProvider};
use nexus_session::{FileStore, SessionStore, StorageKeys};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Local user sessions and LibreX web search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override storage.data_dir
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the web through the configured LibreX instances
    Search {
        /// Search query
        query: String,

        /// Result page
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the stored user list
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Manage the current session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Manage configuration
    Config {
        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List stored users
    List {
        /// Print users as JSON (password hashes omitted)
        #[arg(long)]
        json: bool,
    },
    /// Replace the stored user list with the JSON array in FILE
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show the signed-in user
    Show,
    /// Sign in as a stored user (matched by id, username or email)
    Set {
        identifier: String,
    },
    /// Sign out
    Clear,
}

#[tokio::main]
async fn main() -> NexusResult<()> {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };

    init_logging(&logging_config).map_err(|e| NexusError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the RUST_LOG environment variable"),
    })?;

    info!("Starting Nexus CLI v{}", env!("CARGO_PKG_VERSION"));

    // `config --init --config <path>` creates the file, so it may not exist yet
    let mut config = match (&cli.command, cli.config.as_ref()) {
        (Commands::Config { init: true, .. }, Some(path)) if !path.exists() => {
            NexusConfig::default()
        }
        _ => load_config(cli.config.as_ref())?,
    };
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.display().to_string();
    }

    match cli.command {
        Commands::Search { query, page, json } => handle_search(&query, page, json, &config).await,
        Commands::Users { action } => handle_users(action, &config),
        Commands::Session { action } => handle_session(action, &config),
        Commands::Config {
            init,
            show,
            validate,
        } => handle_config(init, show, validate, cli.config.as_ref(), &config),
    }
}

fn load_config(config_path: Option<&PathBuf>) -> NexusResult<NexusConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return NexusConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("nexus").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".nexus").join("config.toml")),
        Some(PathBuf::from("nexus.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return NexusConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(NexusConfig::default())
}

/// Get the default configuration file path
fn default_config_path() -> NexusResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("nexus").join("config.toml"))
        .ok_or_else(|| NexusError::Config {
            message: "Could not determine a configuration directory".to_string(),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("default_config_path")
                .with_suggestion("Pass --config with an explicit path"),
        })
}

fn open_session_store(config: &NexusConfig) -> NexusResult<SessionStore<FileStore>> {
    let store = FileStore::new(config.storage.resolved_data_dir())?;
    Ok(SessionStore::with_keys(
        store,
        StorageKeys::from(&config.storage),
    ))
}

async fn handle_search(query: &str, page: u32, json: bool, config: &NexusConfig) -> NexusResult<()> {
    log_operation_start!("search", query = query, page = page);

    let client = LibreXClient::new(SearchClientConfig::from(&config.search))?;
    let results = match performance::measure_async("search", client.fetch_results(query, page)).await
    {
        Ok(results) => results,
        Err(e) => {
            log_operation_error!("search", e);
            return Err(e);
        }
    };

    log_operation_success!("search", results = results.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results, page);
    }

    Ok(())
}

fn print_results(results: &[SearchResult], page: u32) {
    if results.is_empty() {
        println!("No results on page {}.", page);
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.title);
        println!("   {}", result.url);
        println!("   {}", result.snippet);
        println!();
    }
}

fn handle_users(action: UsersAction, config: &NexusConfig) -> NexusResult<()> {
    let sessions = open_session_store(config)?;

    match action {
        UsersAction::List { json } => {
            let users = sessions.get_users();

            if json {
                let public: Vec<nexus_core::User> = users.iter().map(Into::into).collect();
                println!("{}", serde_json::to_string_pretty(&public)?);
            } else if users.is_empty() {
                println!("No stored users.");
            } else {
                for stored in &users {
                    println!(
                        "{}  {}  <{}>",
                        stored.user.id, stored.user.username, stored.user.email
                    );
                }
            }
        }
        UsersAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let users: Vec<StoredUser> = serde_json::from_str(&content)?;

            sessions.save_users(&users)?;
            println!("Imported {} users from {}", users.len(), file.display());
        }
    }

    Ok(())
}

fn handle_session(action: SessionAction, config: &NexusConfig) -> NexusResult<()> {
    let sessions = open_session_store(config)?;

    match action {
        SessionAction::Show => match sessions.get_current_user() {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("Not signed in."),
        },
        SessionAction::Set { identifier } => {
            let stored = sessions
                .find_user(&identifier)
                .ok_or_else(|| not_found_error!(format!("user '{}'", identifier), "cli"))?;

            sessions.save_current_user(&stored)?;
            println!("Signed in as {}", stored.user.username);
        }
        SessionAction::Clear => {
            sessions.clear_current_user()?;
            println!("Signed out.");
        }
    }

    Ok(())
}

fn handle_config(
    init: bool,
    show: bool,
    validate: bool,
    config_path: Option<&PathBuf>,
    config: &NexusConfig,
) -> NexusResult<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };

        NexusConfig::default().save_to_file(&path)?;
        println!("Configuration initialized at: {}", path.display());
    }

    if show {
        print!("{}", config.to_toml()?);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                println!("Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
