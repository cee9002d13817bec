//! Clap derive structures for the `companies` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// companies -- browse a live company directory from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "companies",
    version,
    about = "Browse a live company directory from the command line",
    long_about = "Reads the company collection of a realtime database, keeps it \
        live, and prints it sorted by id.\n\n\
        Configure a database once with `companies config set database_url <URL>`, \
        or pass --url on every call.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Database profile to use
    #[arg(long, short = 'p', env = "COMPANIES_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Database root URL (overrides profile)
    #[arg(long, short = 'u', env = "COMPANIES_URL", global = true)]
    pub url: Option<String>,

    /// Collection path (overrides profile)
    #[arg(long, env = "COMPANIES_COLLECTION", global = true)]
    pub collection: Option<String>,

    /// Read token passed through to the database
    #[arg(long, env = "COMPANIES_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "COMPANIES_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "COMPANIES_INSECURE", global = true)]
    pub insecure: bool,

    /// Connect timeout in seconds (overrides profile)
    #[arg(long, env = "COMPANIES_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the company list, sorted by id
    #[command(alias = "ls")]
    List(ListArgs),

    /// Keep the subscription open and print every change
    Watch(WatchArgs),

    /// Open a company's webpage in the default browser
    Open(OpenArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LIST / WATCH / OPEN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Plain one-shot read instead of the first live snapshot
    #[arg(long)]
    pub once: bool,

    /// Only the "recent" strip (the first few records)
    #[arg(long, short = 'r')]
    pub recent: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only the "recent" strip (the first few records)
    #[arg(long, short = 'r')]
    pub recent: bool,
}

#[derive(Debug, Args)]
pub struct OpenArgs {
    /// Company id (the first record with this id is opened)
    #[arg(allow_negative_numbers = true)]
    pub id: i64,

    /// Print the webpage instead of opening it
    #[arg(long)]
    pub print: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (database_url, collection, auth_token_env, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a read token in the system keyring (for --profile)
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
