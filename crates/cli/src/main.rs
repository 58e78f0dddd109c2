//! Marketplace CLI - drive the client engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the resumed session
//! mp-cli session status
//!
//! # Sign in, returning to a remembered page if allowed
//! mp-cli session login -e ada@example.com -p secret --from /orders/42
//!
//! # Cart and wishlist (persisted under MARKETPLACE_DATA_DIR)
//! mp-cli cart add p-1 --name "Mug" --price 12.50 -q 2
//! mp-cli wishlist toggle p-2 --name "Lamp" --price 40
//!
//! # Ask the route guard about a path
//! mp-cli route check /vendor/products
//!
//! # Admin notifications
//! mp-cli notifications list --limit 10
//! mp-cli notifications read 66f1c0ffee
//! ```
//!
//! Every command resumes the persisted session before it runs.
//!
//! # Environment Variables
//!
//! - `MARKETPLACE_API_URL` - Base URL of the marketplace API (required)
//! - `RUST_LOG` - Log filter (default: `marketplace_client=warn,marketplace_cli=info`)
//!
//! See `ClientConfig` for the rest.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use marketplace_client::{ClientConfig, Marketplace};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace client CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or change the session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Ask the route guard about a path
    Route {
        #[command(subcommand)]
        action: RouteAction,
    },
    /// Admin notification feed
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show the current session
    Status,
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Page to return to after signing in
        #[arg(long)]
        from: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        phone: Option<String>,

        /// Requested role (`buyer`, `vendor`)
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Sign out
    Logout,
}

/// Product fields captured when adding to a collection.
#[derive(clap::Args)]
struct ProductArgs {
    /// Product ID
    id: String,

    /// Product name
    #[arg(long)]
    name: String,

    /// Unit price, e.g. `12.50`
    #[arg(long)]
    price: String,

    /// Image URL
    #[arg(long)]
    image: Option<String>,

    /// Vendor ID
    #[arg(long)]
    vendor: Option<String>,
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart entries and the total
    List,
    /// Add a product
    Add {
        #[command(flatten)]
        product: ProductArgs,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { id: String },
    /// Overwrite a product's quantity (0 removes it)
    Set { id: String, quantity: u32 },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List saved products
    List,
    /// Save a product, or unsave it if already saved
    Toggle {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Empty the wishlist
    Clear,
}

#[derive(Subcommand)]
enum RouteAction {
    /// Show what the guard does for a path
    Check { path: String },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// Refresh and list recent notifications
    List {
        /// Number of notifications (default: `MARKETPLACE_NOTIFICATION_LIMIT`)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Show the unread count
    Unread,
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Delete one notification
    Delete { id: String },
    /// Delete every notification
    DeleteAll,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_client=warn,marketplace_cli=info".into());

    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first; Sentry must be up before the subscriber.
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), commands::CliError> {
    let mut app = Marketplace::open(config)?;
    let status = app.bootstrap().await;
    tracing::debug!(?status, "Session bootstrapped");

    match cli.command {
        Commands::Session { action } => match action {
            SessionAction::Status => commands::session::status(&app),
            SessionAction::Login {
                email,
                password,
                from,
            } => commands::session::login(&mut app, &email, &password, from.as_deref()).await?,
            SessionAction::Register {
                name,
                email,
                password,
                phone,
                role,
            } => {
                commands::session::register(&mut app, name, email, password, phone, role.as_deref())
                    .await?;
            }
            SessionAction::Logout => commands::session::logout(&mut app),
        },
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&app),
            CartAction::Add { product, quantity } => {
                commands::cart::add(&mut app, product.into_snapshot()?, quantity)?;
            }
            CartAction::Remove { id } => commands::cart::remove(&mut app, &id)?,
            CartAction::Set { id, quantity } => commands::cart::set(&mut app, &id, quantity)?,
            CartAction::Clear => commands::cart::clear(&mut app)?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::List => commands::wishlist::list(&app),
            WishlistAction::Toggle { product } => {
                commands::wishlist::toggle(&mut app, product.into_snapshot()?)?;
            }
            WishlistAction::Clear => commands::wishlist::clear(&mut app)?,
        },
        Commands::Route { action } => match action {
            RouteAction::Check { path } => commands::route::check(&app, &path),
        },
        Commands::Notifications { action } => {
            let feed = app.notifications();
            match action {
                NotificationAction::List { limit } => {
                    let limit = limit.unwrap_or(app.config().notification_limit);
                    commands::notifications::list(feed, limit).await?;
                }
                NotificationAction::Unread => commands::notifications::unread(feed).await?,
                NotificationAction::Read { id } => commands::notifications::read(feed, &id).await?,
                NotificationAction::ReadAll => commands::notifications::read_all(feed).await?,
                NotificationAction::Delete { id } => {
                    commands::notifications::delete(feed, &id).await?;
                }
                NotificationAction::DeleteAll => commands::notifications::delete_all(feed).await?,
            }
        }
    }
    Ok(())
}

impl ProductArgs {
    fn into_snapshot(self) -> Result<marketplace_client::models::ProductSnapshot, commands::CliError> {
        let price = marketplace_core::Price::parse(&self.price)
            .map_err(|e| commands::CliError::InvalidArgument(format!("price: {e}")))?;
        Ok(marketplace_client::models::ProductSnapshot {
            id: self.id.into(),
            name: self.name,
            price,
            image: self.image,
            vendor_id: self.vendor.map(Into::into),
        })
    }
}
