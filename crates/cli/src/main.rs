use anyhow::Result;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use tracing_subscriber::EnvFilter;

mod handlers;

/// yadisk - Yandex Disk from your terminal
#[derive(Parser, Debug)]
#[command(name = "yadisk")]
#[command(version)]
#[command(about = "Manage Yandex Disk from your terminal", long_about = None)]
struct Cli {
    /// OAuth token (never stored on disk)
    #[arg(long, env = "YANDEX_DISK_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Output format for listings (table, json)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Disk capacity and owner
    Info,

    /// List a folder
    Ls {
        /// Remote folder
        #[arg(default_value = "disk:/")]
        path: String,
        #[arg(long, default_value = "100")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Every file on the disk, flattened
    Files {
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Recently uploaded files
    Recent {
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Published files
    Published {
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Create a folder
    Mkdir { path: String },

    /// Upload a local file
    Upload {
        /// Local file
        file: String,
        /// Remote destination
        remote: String,
        /// Replace an existing remote file
        #[arg(long)]
        overwrite: bool,
    },

    /// Download a remote file
    Download {
        /// Remote file
        remote: String,
        /// Local destination
        dest: String,
    },

    /// Copy a resource
    Cp {
        from: String,
        to: String,
        #[arg(long)]
        overwrite: bool,
    },

    /// Move or rename a resource
    Mv {
        from: String,
        to: String,
        #[arg(long)]
        overwrite: bool,
    },

    /// Delete a resource
    Rm {
        path: String,
        /// Skip the trash
        #[arg(long)]
        permanently: bool,
    },

    /// Publish a resource and print its public URL
    Publish { path: String },

    /// Remove public access
    Unpublish { path: String },

    /// Custom properties
    Meta {
        #[command(subcommand)]
        action: MetaAction,
    },

    /// Published resources of other users
    Public {
        #[command(subcommand)]
        action: PublicAction,
    },

    /// Trash management
    Trash {
        #[command(subcommand)]
        action: TrashAction,
    },

    /// Let the server fetch a URL into the disk
    Import {
        url: String,
        remote: String,
        #[arg(long)]
        disable_redirects: bool,
    },

    /// Status of an asynchronous operation
    Operation { id: String },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the OAuth URL that grants a token to an application
    AuthUrl { client_id: String },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum MetaAction {
    /// Show all metadata of a resource
    Show { path: String },
    /// Set a custom property (value is parsed as JSON, else kept as a string)
    Set {
        path: String,
        key: String,
        value: String,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum PublicAction {
    /// Metadata of a published resource
    Info { public_key: String },
    /// Download a published resource
    Download {
        public_key: String,
        dest: String,
        /// File inside a published folder
        #[arg(long)]
        path: Option<String>,
    },
    /// Save a published resource into your disk
    Save {
        public_key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        path: Option<String>,
    },
    /// Access settings of one of your published resources
    Settings {
        path: String,
        #[arg(long)]
        allow_address_access: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum TrashAction {
    /// List the trash
    Ls {
        #[arg(default_value = "trash:/")]
        path: String,
        #[arg(long, default_value = "100")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },
    /// Restore a resource from the trash
    Restore {
        path: String,
        /// New name for the restored resource
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        overwrite: bool,
    },
    /// Empty the trash, or remove one entry
    Clear { path: Option<String> },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
    /// Validate the configuration file
    Validate,
}

fn init_logging(verbose: u8, configured_level: &str, format: &str) {
    let level = match verbose {
        0 => configured_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("yadisk={level},yadisk_core={level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "compact" => builder.compact().init(),
        _ => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    // A broken file must not lock the user out of `config init --force`
    let config = match yadisk_core::load_config_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}; using default settings", e);
            yadisk_core::ConfigFile::default()
        }
    };
    let logging = config.logging.clone().unwrap_or_default();
    init_logging(cli.verbose, &logging.level, &logging.format);

    let output = cli.output.clone().unwrap_or_else(|| {
        config
            .output
            .as_ref()
            .map(|o| o.default_format.clone())
            .unwrap_or_else(|| "table".to_string())
    });

    let ctx = handlers::Context {
        token: cli.token,
        config,
        output,
    };

    // Execute command
    match cli.command {
        Commands::Info => handlers::handle_info(&ctx).await,
        Commands::Ls { path, limit, offset } => handlers::handle_ls(&ctx, &path, limit, offset).await,
        Commands::Files { limit, offset } => {
            handlers::handle_listing(&ctx, handlers::Listing::All, limit, offset).await
        }
        Commands::Recent { limit, offset } => {
            handlers::handle_listing(&ctx, handlers::Listing::Recent, limit, offset).await
        }
        Commands::Published { limit, offset } => {
            handlers::handle_listing(&ctx, handlers::Listing::Published, limit, offset).await
        }
        Commands::Mkdir { path } => handlers::handle_mkdir(&ctx, &path).await,
        Commands::Upload { file, remote, overwrite } => {
            handlers::handle_upload(&ctx, &file, &remote, overwrite).await
        }
        Commands::Download { remote, dest } => handlers::handle_download(&ctx, &remote, &dest).await,
        Commands::Cp { from, to, overwrite } => {
            handlers::handle_copy_move(&ctx, false, &from, &to, overwrite).await
        }
        Commands::Mv { from, to, overwrite } => {
            handlers::handle_copy_move(&ctx, true, &from, &to, overwrite).await
        }
        Commands::Rm { path, permanently } => handlers::handle_rm(&ctx, &path, permanently).await,
        Commands::Publish { path } => handlers::handle_publish(&ctx, &path, true).await,
        Commands::Unpublish { path } => handlers::handle_publish(&ctx, &path, false).await,
        Commands::Meta { action } => handlers::handle_meta(&ctx, action).await,
        Commands::Public { action } => handlers::handle_public(&ctx, action).await,
        Commands::Trash { action } => handlers::handle_trash(&ctx, action).await,
        Commands::Import { url, remote, disable_redirects } => {
            handlers::handle_import(&ctx, &url, &remote, disable_redirects).await
        }
        Commands::Operation { id } => handlers::handle_operation(&ctx, &id).await,
        Commands::Config { action } => handlers::handle_config(&ctx, action).await,
        Commands::AuthUrl { client_id } => {
            println!("{}", yadisk_core::authorization_url(&client_id));
            Ok(())
        }
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
    }
}
