mod commands;
mod session;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::Workspace;
use session::Role;

#[derive(Parser)]
#[command(name = "launchkit")]
#[command(
    version,
    about = "Generate, preview and publish AI-built landing pages",
    long_about = None
)]
struct Cli {
    /// Log progress at info level (otherwise RUST_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Start a session for an owner account
    Login {
        /// Owner id
        owner: String,

        /// Session role; elevated sessions may use prompt presets
        #[arg(long, value_enum, default_value = "standard")]
        role: Role,
    },

    /// End the current session
    Logout,

    /// Show the current session
    Whoami,

    /// Configure API key, model, store and public URL
    Configure,

    /// Generate a landing page from a prompt and save it as a draft
    Generate {
        /// Description of the page to build
        prompt: Option<String>,

        /// Use a curated prompt preset instead (elevated sessions)
        #[arg(long, conflicts_with = "prompt")]
        preset: Option<String>,
    },

    /// Generate new content for an existing site from its prompt
    Regenerate {
        /// Site id
        id: String,

        /// Use a different prompt
        #[arg(long)]
        prompt: Option<String>,
    },

    /// List prompt presets
    Presets,

    /// List your sites, newest first
    List,

    /// Show one of your sites
    Show {
        /// Site id
        id: String,

        /// Print the site content as JSON
        #[arg(long)]
        json: bool,
    },

    /// Make a site publicly resolvable
    Publish {
        /// Site id
        id: String,
    },

    /// Withdraw a published site
    Unpublish {
        /// Site id
        id: String,
    },

    /// Print the share link for a site
    Link {
        /// Site id
        id: String,
    },

    /// Resolve an address or share link as a visitor would
    Resolve {
        /// Address (p/<owner>/<site>) or share link
        address: String,
    },

    /// Replace a site's content from a JSON file
    Edit {
        /// Site id
        id: String,

        /// Site content JSON
        file: PathBuf,
    },

    /// Export a site as a standalone index.html
    Export {
        /// Site id
        id: String,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate a site content JSON file
    Validate {
        /// Site content JSON
        file: PathBuf,
    },

    /// Serve public pages and the live preview
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "launchkit", &mut io::stdout());
        return Ok(());
    }

    let ws = Workspace::load()?;

    match cli.command {
        Command::Login { owner, role } => commands::auth::login(&ws, owner, role).await,
        Command::Logout => commands::auth::logout(&ws).await,
        Command::Whoami => commands::auth::whoami(&ws).await,
        Command::Configure => commands::configure::run(&ws).await,
        Command::Generate { prompt, preset } => {
            commands::sites::generate(&ws, prompt, preset).await
        }
        Command::Regenerate { id, prompt } => commands::sites::regenerate(&ws, id, prompt).await,
        Command::Presets => commands::sites::presets(&ws).await,
        Command::List => commands::sites::list(&ws).await,
        Command::Show { id, json } => commands::sites::show(&ws, id, json).await,
        Command::Publish { id } => commands::sites::publish(&ws, id).await,
        Command::Unpublish { id } => commands::sites::unpublish(&ws, id).await,
        Command::Link { id } => commands::sites::link(&ws, id).await,
        Command::Resolve { address } => commands::sites::resolve(&ws, address).await,
        Command::Edit { id, file } => commands::sites::edit(&ws, id, file).await,
        Command::Export { id, output } => commands::export::run(&ws, id, output).await,
        Command::Validate { file } => commands::validate::run(&ws, file).await,
        Command::Serve { host, port } => commands::serve::run(&ws, host, port).await,
        Command::Completions { .. } => Ok(()),
    }
}
