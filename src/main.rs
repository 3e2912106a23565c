//! CLI entry point for mdxdocs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdxdocs")]
#[command(version)]
#[command(about = "A minimal documentation site for compiled MDX content", long_about = None)]
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
    /// Initialize a new mdxdocs site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new document source
    New {
        /// Title of the new document
        title: String,

        /// Path for the new document (relative to the source directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Compile sources into store artifacts
    #[command(alias = "c")]
    Compile {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,

        /// Recompile everything, ignoring the cache
        #[arg(short, long)]
        force: bool,
    },

    /// Start the site server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Clean the artifact store and compile cache
    Clean,

    /// List compiled documents
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdxdocs=debug,info"
    } else {
        "mdxdocs=info"
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
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing mdxdocs site in {:?}", target_dir);
            mdxdocs::commands::init::init_site(&target_dir)?;
            println!("Initialized empty mdxdocs site in {:?}", target_dir);
        }

        Commands::New { title, path } => {
            let site = mdxdocs::Site::new(&base_dir)?;
            tracing::info!("Creating new document: {}", title);
            mdxdocs::commands::new::create_document(&site, &title, path.as_deref())?;
        }

        Commands::Compile { watch, force } => {
            let site = mdxdocs::Site::new(&base_dir)?;
            tracing::info!("Compiling sources...");

            mdxdocs::commands::compile::run_with_options(&site, force)?;
            println!("Compiled successfully!");

            if watch {
                tracing::info!("Watching for file changes...");
                mdxdocs::commands::compile::watch(&site).await?;
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            let site = mdxdocs::Site::new(&base_dir)?;

            // Compile first
            tracing::info!("Compiling sources...");
            site.compile()?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            mdxdocs::server::start(&site, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let site = mdxdocs::Site::new(&base_dir)?;
            tracing::info!("Cleaning artifact store...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List => {
            let site = mdxdocs::Site::new(&base_dir)?;
            mdxdocs::commands::list::run(&site)?;
        }

        Commands::Version => {
            println!("mdxdocs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
