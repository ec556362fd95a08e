//! Shopwright CLI - Migrations and catalog maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sw-cli migrate
//!
//! # Preview the slug a product name would get
//! sw-cli slug preview "Classic White T-Shirt" --table products
//!
//! # Bulk category maintenance (admin access token required)
//! sw-cli --access-token "$TOKEN" categories hide-empty
//!
//! # Opt into the demo admin role
//! sw-cli --access-token "$TOKEN" account become-demo-admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `slug preview` - Show the slug allocated for a name
//! - `products list|delete` - Product maintenance
//! - `categories list|publish-drafts|hide-empty|delete-empty|delete` - Category maintenance
//! - `account become-demo-admin` - Grant the demo admin role to the caller
//!
//! Catalog and account commands resolve the caller from the access token,
//! so operators go through the same authorization gate as the dashboard.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;

use shopwright_admin::telemetry;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "sw-cli")]
#[command(author, version, about = "Shopwright CLI tools")]
struct Cli {
    /// Supabase access token of the operator
    #[arg(long, global = true, env = "SHOPWRIGHT_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Slug utilities
    Slug {
        #[command(subcommand)]
        action: SlugAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum SlugAction {
    /// Show the slug a name would be allocated
    Preview {
        /// Display name to slugify
        name: String,

        /// Slugs to treat as taken
        #[arg(short, long)]
        taken: Vec<String>,

        /// Also treat slugs already stored in this table as taken
        #[arg(long, value_enum)]
        table: Option<SlugTable>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SlugTable {
    Products,
    Categories,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, newest first
    List,
    /// Delete a product and its images
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List categories with product counts
    List,
    /// Activate every inactive category
    PublishDrafts,
    /// Deactivate categories with no products
    HideEmpty,
    /// Delete categories with no products
    DeleteEmpty,
    /// Delete a single category
    Delete {
        /// Category ID
        id: String,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Grant the demo admin role to the signed-in user
    BecomeDemoAdmin,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    telemetry::init_tracing(
        "shopwright_cli=info,shopwright_admin=info",
        telemetry::json_logs_requested(),
    );

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let token = cli.access_token.map(SecretString::from);

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Slug { action } => match action {
            SlugAction::Preview { name, taken, table } => {
                let table = table.map(|t| match t {
                    SlugTable::Products => commands::slug::Table::Products,
                    SlugTable::Categories => commands::slug::Table::Categories,
                });
                commands::slug::preview(&name, taken, table).await?;
            }
        },
        Commands::Products { action } => {
            let ctx = commands::Context::connect(token).await?;
            match action {
                ProductAction::List => commands::catalog::list_products(&ctx).await?,
                ProductAction::Delete { id } => {
                    commands::catalog::delete_product(&ctx, &id).await?;
                }
            }
        }
        Commands::Categories { action } => {
            let ctx = commands::Context::connect(token).await?;
            match action {
                CategoryAction::List => commands::catalog::list_categories(&ctx).await?,
                CategoryAction::PublishDrafts => commands::catalog::publish_drafts(&ctx).await?,
                CategoryAction::HideEmpty => commands::catalog::hide_empty(&ctx).await?,
                CategoryAction::DeleteEmpty => commands::catalog::delete_empty(&ctx).await?,
                CategoryAction::Delete { id } => {
                    commands::catalog::delete_category(&ctx, &id).await?;
                }
            }
        }
        Commands::Account { action } => {
            let ctx = commands::Context::connect(token).await?;
            match action {
                AccountAction::BecomeDemoAdmin => commands::account::become_demo_admin(&ctx).await?,
            }
        }
    }
    Ok(())
}
