//! CLI entry point for portfolio-rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_rs::commands;
use portfolio_rs::Portfolio;

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(version)]
#[command(about = "Personal portfolio and blog server", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Clear and rebuild every cache
    #[command(name = "clear:all")]
    ClearAll,

    /// Run database migrations
    Migrate,

    /// Seed the default settings
    #[command(name = "db:seed")]
    Seed,

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Post category
        #[arg(long)]
        category: Option<String>,

        /// Short description shown in listings
        #[arg(long)]
        description: Option<String>,
    },

    /// List site information
    List {
        /// Type of content to list (posts, categories, settings)
        #[arg(default_value = "posts")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "portfolio_rs=debug,tower_http=debug,info"
    } else {
        "portfolio_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = Portfolio::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            site.serve(&ip, port).await?;
        }

        Commands::ClearAll => {
            let site = Portfolio::new(&base_dir)?;
            tracing::info!("Clearing caches in {:?}", base_dir);
            site.clear_all()?;
        }

        Commands::Migrate => {
            let site = Portfolio::new(&base_dir)?;
            commands::database::migrate(&site)?;
        }

        Commands::Seed => {
            let site = Portfolio::new(&base_dir)?;
            commands::database::seed(&site)?;
        }

        Commands::New {
            title,
            category,
            description,
        } => {
            let site = Portfolio::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            let options = commands::new::PostOptions {
                category,
                description,
            };
            site.new_post(&title, &options)?;
        }

        Commands::List { r#type } => {
            let site = Portfolio::new(&base_dir)?;
            commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("portfolio-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
