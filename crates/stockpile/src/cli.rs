//! Clap derive structures for the `stockpile` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use stockpile_core::UserRole;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stockpile -- inventory, sales, and suppliers from the command line
#[derive(Debug, Parser)]
#[command(
    name = "stockpile",
    version,
    about = "Manage your business inventory from the command line",
    long_about = "A CLI for the stockpile inventory backend.\n\n\
        Signs in per invocation, synchronizes the product, supplier, sale,\n\
        and user collections, and routes mutations through the same session\n\
        facade the rest of the tooling uses.",
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
    /// Backend base URL (overrides the config file)
    #[arg(long, short = 'b', env = "STOCKPILE_BACKEND_URL", global = true)]
    pub backend: Option<String>,

    /// Sign-in email
    #[arg(long, short = 'e', env = "STOCKPILE_EMAIL", global = true)]
    pub email: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STOCKPILE_OUTPUT",
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

    /// Request timeout in seconds
    #[arg(long, env = "STOCKPILE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
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
    /// Verify credentials and show the signed-in profile
    Login,

    /// Manage products
    #[command(alias = "prod", alias = "p")]
    Products(ProductsArgs),

    /// View suppliers (manager only)
    #[command(alias = "sup")]
    Suppliers(SuppliersArgs),

    /// Record and list sales
    #[command(alias = "s")]
    Sales(SalesArgs),

    /// Manage user accounts (manager only)
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Headline numbers and recent sales
    #[command(alias = "dash")]
    Dashboard,

    /// Ask the analytics assistant a free-text question (manager only)
    Ask(AskArgs),

    /// Inspect or initialize the config file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// Backend base URL
        #[arg(long)]
        backend: String,

        /// Default sign-in email
        #[arg(long)]
        email: Option<String>,
    },

    /// Print the config file path
    Path,
}

// ── Products ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List all products
    #[command(alias = "ls")]
    List,

    /// Add a new product
    Add(ProductFields),

    /// Update an existing product (all fields are overwritten)
    Update {
        /// Product id
        id: String,

        #[command(flatten)]
        fields: ProductFields,
    },

    /// Draft a product description with the assist model
    Describe {
        /// Product name
        #[arg(long)]
        name: String,

        /// Product category
        #[arg(long)]
        category: String,
    },
}

#[derive(Debug, Args)]
pub struct ProductFields {
    #[arg(long)]
    pub name: String,

    /// Description text; use `products describe` to draft one
    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub category: String,

    /// Supplier document id
    #[arg(long)]
    pub supplier: String,

    #[arg(long)]
    pub stock: u32,

    #[arg(long)]
    pub price: f64,

    #[arg(long)]
    pub cost: f64,

    /// Draft the description with the assist model before saving
    #[arg(long, conflicts_with = "description")]
    pub draft_description: bool,
}

// ── Suppliers ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SuppliersArgs {
    #[command(subcommand)]
    pub command: SuppliersCommand,
}

#[derive(Debug, Subcommand)]
pub enum SuppliersCommand {
    /// List all suppliers
    #[command(alias = "ls")]
    List,
}

// ── Sales ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SalesArgs {
    #[command(subcommand)]
    pub command: SalesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SalesCommand {
    /// List sales, newest first
    #[command(alias = "ls")]
    List,

    /// Record a sale (decrements the product's stock atomically)
    Record {
        /// Product id
        #[arg(long)]
        product: String,

        /// Units sold
        #[arg(long)]
        quantity: u32,
    },
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List user profiles
    #[command(alias = "ls")]
    List,

    /// Register a new employee account + profile.
    ///
    /// Note: the backend rotates the active session to the new account,
    /// so you will have to sign in again afterwards.
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Role for the new account
        #[arg(long, value_enum, default_value = "employee")]
        role: RoleArg,

        /// Advisory cap on a single sale's total value
        #[arg(long)]
        max_sale_value: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Manager,
    Employee,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Manager => UserRole::Manager,
            RoleArg::Employee => UserRole::Employee,
        }
    }
}

// ── Ask ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question, e.g. "Which product is the most profitable?"
    pub query: Vec<String>,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
