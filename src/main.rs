//! CLI entry point for folio

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "A small static site generator for Markdown posts and pages", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Defaults to `build`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the output directory
    #[command(alias = "b")]
    Build,

    /// Build the site, then serve it and rebuild on changes
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = folio::server::DEFAULT_PORT)]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "127.0.0.1")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve only (no file watching or live reload)
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the output directory
    Clean,

    /// List site content
    List {
        /// Type of content to list (post, page, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let site = folio::Site::new(&base_dir)?;

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            tracing::info!("Building site in {:?}", base_dir);
            site.build()?;
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            tracing::info!("Building site in {:?}", base_dir);
            site.build()?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio::server::start(&site, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            site.clean()?;
        }

        Commands::List { r#type } => {
            folio::commands::list::run(&site, &r#type)?;
        }
    }

    Ok(())
}
