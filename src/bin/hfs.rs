//! hfs
//!
//! Command-line client for HFS. Credentials are saved once with `hfs login`
//! and reused by every other command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hfsapi::progress::make_progress_printer;
use hfsapi::{
    split_remote_path, ClientConfig, ConfigFilter, CredentialStore, DirectoryUploadOptions,
    FileCredentialStore, ListOptions, Session, StoredCredentials, UploadRequest, UploadStrategy,
};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

/// HFS API client. Log in once and saved credentials are used for all commands.
#[derive(Parser, Debug)]
#[command(name = "hfs")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Override the saved base URL (required when not logged in)
    #[arg(short, long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save credentials to the local config
    Login {
        /// Username
        #[arg(short, long)]
        username: Option<String>,

        /// Password (visible in shell history; prefer HFS_PASSWORD)
        #[arg(short, long, env = "HFS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Clear saved credentials
    Logout,

    /// Show the saved base URL and whether credentials are saved
    #[command(alias = "info")]
    Status,

    /// List a directory
    #[command(alias = "ls")]
    List {
        /// Directory URI
        #[arg(default_value = "/")]
        uri: String,
    },

    /// Upload a file, or a folder recursively
    Upload {
        /// Local file or directory
        path: PathBuf,

        /// Remote folder
        #[arg(short, long, default_value = "")]
        folder: String,

        /// Remote filename (files only; default: local name)
        #[arg(short, long)]
        name: Option<String>,

        /// Use multipart POST instead of PUT
        #[arg(long)]
        post: bool,

        /// Concurrent uploads for a folder
        #[arg(short, long, default_value = "1")]
        workers: usize,
    },

    /// Create a folder, e.g. data/myfolder
    Mkdir { path: String },

    /// Delete a file, e.g. data/foo.txt
    Delete { path: String },

    /// Read or write server config
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print the VFS tree as JSON
    Vfs,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print config as JSON
    Get {
        /// Comma-separated keys to return
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Comma-separated keys to omit
        #[arg(long, value_delimiter = ',')]
        omit: Vec<String>,
    },

    /// Set config keys (admin). Values that parse as JSON are sent as JSON.
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        pairs: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "hfsapi=debug" } else { "hfsapi=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = FileCredentialStore::default_location()?;

    match cli.command {
        Commands::Login { username, password } => login(&store, cli.base_url, username, password),
        Commands::Logout => {
            if store.clear()? {
                println!("Cleared.");
            } else {
                println!("No saved credentials.");
            }
            Ok(())
        }
        Commands::Status => {
            match store.load()? {
                Some(stored) => {
                    println!("base_url: {}", stored.base_url);
                    println!("auth: {}", if stored.has_auth() { "yes" } else { "no" });
                }
                None => println!("Not logged in. Run 'hfs login' or pass --base-url."),
            }
            Ok(())
        }
        Commands::List { uri } => {
            let session = open_session(&store, cli.base_url)?;
            let uri = format!("/{}", uri.trim_matches('/'));
            let listing = session
                .list_directory(&uri, ListOptions::default().with_timestamps())
                .await?;
            for entry in &listing.entries {
                let name = if entry.is_folder() {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                };
                println!(
                    "  {}  {} B  {}  {}",
                    name,
                    entry.size_or_zero(),
                    entry.created.as_deref().unwrap_or("-"),
                    entry.modified.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Commands::Upload {
            path,
            folder,
            name,
            post,
            workers,
        } => {
            let session = open_session(&store, cli.base_url)?;
            let strategy = if post {
                UploadStrategy::Multipart
            } else {
                UploadStrategy::put()
            };
            let folder = folder.trim_matches('/').to_string();

            if path.is_file() {
                let remote_name = match name {
                    Some(name) => name,
                    None => path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .context("path has no file name")?,
                };
                let request = UploadRequest::from_path(&folder, &remote_name, &path)
                    .with_strategy(strategy);
                let outcome = session.upload_file(request).await?;
                println!("Uploaded as {}.", outcome.filename);
            } else if path.is_dir() {
                let options = DirectoryUploadOptions::default()
                    .with_strategy(strategy)
                    .with_workers(workers)
                    .with_progress(make_progress_printer());
                let report = session.upload_local_dir(&folder, &path, options).await?;
                println!("Uploaded {} file(s).", report.uploaded.len());
                if !report.is_complete() {
                    for (relative_path, err) in &report.failed {
                        eprintln!("  failed: {}: {}", relative_path, err);
                    }
                    bail!("{} file(s) failed", report.failed.len());
                }
            } else {
                bail!("not found: {}", path.display());
            }
            Ok(())
        }
        Commands::Mkdir { path } => {
            let (parent, name) = split_remote_path(&path);
            let session = open_session(&store, cli.base_url)?;
            let url = session.create_folder(&parent, &name).await?;
            println!("Created {}.", url);
            Ok(())
        }
        Commands::Delete { path } => {
            let (folder, filename) = split_remote_path(&path);
            let session = open_session(&store, cli.base_url)?;
            session.delete_file(&folder, &filename).await?;
            println!("Deleted.");
            Ok(())
        }
        Commands::Config(ConfigCommands::Get { only, omit }) => {
            let session = open_session(&store, cli.base_url)?;
            let config = session.get_config(&ConfigFilter { only, omit }).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Config(ConfigCommands::Set { pairs }) => {
            let values = parse_pairs(&pairs)?;
            let session = open_session(&store, cli.base_url)?;
            session.set_config(values).await?;
            println!("OK.");
            Ok(())
        }
        Commands::Vfs => {
            let session = open_session(&store, cli.base_url)?;
            let vfs = session.get_vfs().await?;
            println!("{}", serde_json::to_string_pretty(&vfs)?);
            Ok(())
        }
    }
}

fn login(
    store: &FileCredentialStore,
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let base_url = match base_url {
        Some(url) => url,
        None => prompt("Base URL (e.g. http://127.0.0.1:8280): ")?,
    };
    if base_url.is_empty() {
        bail!("base URL required");
    }
    // Validates the URL before anything is written.
    Session::anonymous(&base_url)?;

    let username = match username {
        Some(name) => Some(name),
        None => Some(prompt("Username: ")?).filter(|s| !s.is_empty()),
    };
    let password = match (&username, password) {
        (Some(_), None) => Some(prompt("Password: ")?),
        (_, password) => password,
    };

    store.save(&StoredCredentials::new(&base_url, username, password))?;
    println!("Saved to {}.", store.path().display());
    Ok(())
}

/// Build a session from saved credentials, with `--base-url` taking precedence.
fn open_session(store: &FileCredentialStore, base_url: Option<String>) -> anyhow::Result<Session> {
    let stored = store.load()?;
    let config = match (base_url, stored) {
        (Some(url), Some(stored)) => ClientConfig::from_stored(StoredCredentials { base_url: url, ..stored }),
        (Some(url), None) => ClientConfig::new(url),
        (None, Some(stored)) => ClientConfig::from_stored(stored),
        (None, None) => bail!("no saved credentials. run 'hfs login' or pass --base-url"),
    };
    Ok(Session::new(config)?)
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut values = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE: {}", pair);
        };
        let value = value.trim();
        let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        values.insert(key.trim().to_string(), parsed);
    }
    Ok(values)
}

fn prompt(label: &str) -> anyhow::Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
