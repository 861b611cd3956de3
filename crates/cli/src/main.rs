//! DineEase CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! dineease migrate
//!
//! # Create the test restaurant, its menu and a 10% coupon
//! dineease seed
//!
//! # Create a coupon
//! dineease coupon create --code SPRING --percentage 15 --days 14
//!
//! # Move an order through the kitchen
//! dineease order status 42 preparing
//!
//! # Owner dashboard
//! dineease report 1 --json
//!
//! # Rate a captured frame (faces found with DINEEASE_FACE_MODEL)
//! dineease rate frame.jpg --table 4
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string (required)
//! - `DINEEASE_DB_MAX_CONNECTIONS`, `DINEEASE_DB_ACQUIRE_TIMEOUT_SECS` - Pool
//!   settings
//! - `DINEEASE_TOP_ITEMS` - Best sellers shown by `report`
//! - `DINEEASE_FACE_MODEL` - `SeetaFace` model used by `rate`
//! - `DINEEASE_LOG_JSON` - Set to `1` for JSON log lines
//! - `RUST_LOG` - Log filter (defaults to `dineease=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dineease_core::{OrderStatus, RestaurantId};
use dineease_ordering::services::FaceRegion;

mod commands;

#[derive(Parser)]
#[command(name = "dineease")]
#[command(author, version, about = "DineEase CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create the test restaurant with a sample menu and a 10% coupon
    Seed,
    /// Manage coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Print the owner dashboard for a restaurant
    Report {
        /// Restaurant ID
        restaurant_id: i32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rate a captured frame and store the result
    Rate {
        /// Image file (JPEG, PNG or WebP)
        image: PathBuf,

        /// Face region as x,y,width,height instead of running the detector
        /// (repeatable; the largest is used)
        #[arg(long = "face")]
        faces: Vec<FaceRegion>,

        /// Treat the whole image as the face instead of running the detector
        #[arg(long, conflicts_with = "faces")]
        whole_frame: bool,

        /// Table the frame was captured at
        #[arg(long)]
        table: Option<i32>,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Create a new coupon
    Create {
        /// Coupon code (generated when omitted)
        #[arg(short, long)]
        code: Option<String>,

        /// Percentage off (1-100)
        #[arg(short, long, default_value_t = 10)]
        percentage: i64,

        /// Days the coupon stays valid, starting now
        #[arg(short, long, default_value_t = 30)]
        days: i64,

        /// Create the coupon switched off
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Move an order to a new status
    Status {
        /// Order ID
        id: i32,

        /// New status (`pending`, `preparing`, `completed`, `cancelled`)
        status: OrderStatus,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dineease=info,dineease_ordering=info".into());
    let json = std::env::var("DINEEASE_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Coupon { action } => match action {
            CouponAction::Create {
                code,
                percentage,
                days,
                inactive,
            } => {
                commands::coupon::create(code.as_deref(), percentage, days, !inactive).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::Status { id, status } => {
                commands::order::set_status(id, status).await?;
            }
        },
        Commands::Report {
            restaurant_id,
            json,
        } => commands::report::run(RestaurantId::new(restaurant_id), json).await?,
        Commands::Rate {
            image,
            faces,
            whole_frame,
            table,
        } => commands::rate::run(&image, faces, whole_frame, table).await?,
    }
    Ok(())
}
