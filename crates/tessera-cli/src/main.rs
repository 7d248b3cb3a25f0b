//! Tessera CLI - Command-line interface for the Tessera asset catalog

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{import, info, list, new, rename, scan};
use std::path::PathBuf;
use tessera_asset::ResourceKind;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Import, create and inspect engine resources", long_about = None)]
#[command(version)]
struct Cli {
    /// Load configuration from this file instead of the layered defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a source file (obj, png, mat, frag, ...) into the catalog
    Import {
        /// Path to the source file, relative to the assets root
        path: PathBuf,

        /// Resolve the path against the engine assets root
        #[arg(long)]
        engine: bool,

        /// Register without writing a cache file
        #[arg(long)]
        no_cache: bool,
    },

    /// Create a new resource from its type's default and save it
    New {
        /// Resource kind (mesh, texture, material, shader)
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Resource name (defaults to NewMesh, NewTexture, ...)
        #[arg(long)]
        name: Option<String>,

        /// Directory to create the resource in, relative to the assets root
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// List registered resources
    List {
        /// Only list one kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<ResourceKind>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Show a single resource
    Info {
        /// Resource name or identity
        name: String,

        /// Only search one kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<ResourceKind>,
    },

    /// Move a resource to a new path; its file stem becomes the new name
    Rename {
        /// Resource kind
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Current name or identity
        name: String,

        /// New path, relative to the assets root
        new_path: PathBuf,
    },

    /// Scan the cache directory and report what loads
    Scan,
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    s.parse::<ResourceKind>().map_err(|_| {
        format!(
            "unknown resource kind '{}'; valid values: mesh, texture, material, shader",
            s
        )
    })
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;
    log::debug!(
        "Assets root {}, cache {}",
        config.assets_dir.display(),
        config.cache_dir().display()
    );

    match cli.command {
        Commands::Import {
            path,
            engine,
            no_cache,
        } => import::run(config, import::ImportArgs {
            path,
            engine,
            no_cache,
        }),
        Commands::New { kind, name, dir } => new::run(config, kind, name.as_deref(), dir.as_deref()),
        Commands::List { kind, format } => list::run(config, kind, &format),
        Commands::Info { name, kind } => info::run(config, &name, kind),
        Commands::Rename {
            kind,
            name,
            new_path,
        } => rename::run(config, kind, &name, &new_path),
        Commands::Scan => scan::run(config),
    }
}
