use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sandspace")]
#[command(about = "Report and manage app sandbox storage", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Human
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Report per-category sandbox usage")]
    Stats {
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Show capacity of the volume holding the sandbox")]
    Disk {
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Measure the aggregate size of a subtree")]
    Size {
        #[arg(short, long)]
        path: String,
    },
    #[command(about = "List files under a directory (data root by default)")]
    List {
        #[arg(short, long)]
        path: Option<String>,
    },
    #[command(about = "Delete a subtree, children before parents")]
    Delete {
        #[arg(short, long)]
        path: String,
        #[arg(long)]
        yes: bool,
    },
    #[command(about = "Delete everything under the cache root")]
    ClearCache {
        #[arg(long)]
        yes: bool,
    },
    #[command(about = "Print the sandbox home directory")]
    Home,
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
    #[command(about = "Run as a method-channel server over stdio (for AI integration)")]
    Serve,
}

#[derive(Subcommand)]
pub enum ConfigActions {
    #[command(about = "Show current configuration and the resolved layout")]
    Show,
    #[command(about = "Set a configuration value")]
    Set {
        #[arg(short, long)]
        key: String,
        // No short form: the global -v belongs to --verbose.
        #[arg(long)]
        value: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
