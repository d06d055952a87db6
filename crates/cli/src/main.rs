use clap::{Parser, Subcommand};
use std::path::PathBuf;

use reading_log_core::config::{config_path, load_config, load_config_from, save_config_to, set_config_key, AppConfig};
use reading_log_core::lookup::extent::parse_page_count;
use reading_log_core::prelude::*;

type CliResult = Result<(), ReadingLogError>;

#[derive(Parser)]
#[command(name = "reading-log")]
#[command(about = "Book metadata lookup by ISBN (openBD, NDL Search)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up book metadata for an ISBN
    Lookup {
        /// ISBN (hyphens, spaces and prefixes are ignored)
        #[arg(required = true)]
        isbn: String,

        /// Per-source timeout in seconds (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },

    /// Print the canonical form of an ISBN
    Normalize {
        #[arg(required = true)]
        isbn: String,
    },

    /// Parse a page count from an extent string such as "320p ; 19cm"
    Pages {
        #[arg(required = true)]
        extent: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize default config file
    Init,
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key (dot-separated path)
        key: String,
        /// Value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Lookup { isbn, timeout } => run_lookup(&cli, isbn, *timeout),
        Commands::Normalize { isbn } => run_normalize(isbn, cli.json),
        Commands::Pages { extent } => run_pages(extent, cli.json),
        Commands::Config { action } => run_config(&cli, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_config_path(cli: &Cli) -> Result<PathBuf, ConfigError> {
    match &cli.config {
        Some(p) => Ok(p.clone()),
        None => config_path(),
    }
}

/// An explicit `--config` file must be valid when it exists.
fn current_config(cli: &Cli) -> Result<AppConfig, ConfigError> {
    match &cli.config {
        Some(p) if p.exists() => load_config_from(p),
        Some(_) => Ok(AppConfig::default()),
        None => Ok(load_config()),
    }
}

fn run_lookup(cli: &Cli, raw: &str, timeout: Option<u64>) -> CliResult {
    let mut cfg = current_config(cli)?;
    if let Some(t) = timeout {
        cfg.lookup.timeout_secs = t;
    }
    let isbn = normalize(raw);
    let resolver = MetadataResolver::from_config(&cfg.lookup)?;
    let book = resolver.resolve(&isbn).ok_or(LookupError::NotFound)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&book)?);
    } else {
        println!("ISBN: {}", book.isbn);
        println!("Title: {}", book.title);
        if !book.author.is_empty() {
            println!("Author: {}", book.author);
        }
        if !book.publisher.is_empty() {
            println!("Publisher: {}", book.publisher);
        }
        if !book.pubdate.is_empty() {
            println!("Published: {}", book.pubdate);
        }
        if book.total_pages > 0 {
            println!("Pages: {}", book.total_pages);
        }
        if !book.cover_image.is_empty() {
            println!("Cover: {}", book.cover_image);
        }
    }
    Ok(())
}

fn run_normalize(raw: &str, json: bool) -> CliResult {
    let isbn = normalize(raw);
    if json {
        let out = serde_json::json!({
            "isbn": isbn,
            "meetsMinLength": isbn.meets_min_length(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", isbn);
    }
    Ok(())
}

fn run_pages(extent: &str, json: bool) -> CliResult {
    let pages = parse_page_count(extent);
    if json {
        println!("{}", serde_json::json!({ "totalPages": pages }));
    } else {
        println!("{}", pages);
    }
    Ok(())
}

fn run_config(cli: &Cli, action: &ConfigAction) -> CliResult {
    match action {
        ConfigAction::Init => {
            let path = resolve_config_path(cli)?;
            save_config_to(&AppConfig::default(), &path)?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Show => {
            let cfg = current_config(cli)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else {
                println!("{}", toml::to_string_pretty(&cfg).map_err(ConfigError::from)?);
            }
        }
        ConfigAction::Set { key, value } => {
            let path = resolve_config_path(cli)?;
            let mut cfg = if path.exists() {
                load_config_from(&path)?
            } else {
                AppConfig::default()
            };

            set_config_key(&mut cfg, key, value)?;
            save_config_to(&cfg, &path)?;
            if !cli.json {
                println!("Updated {}", key);
            }
        }
    }
    Ok(())
}
