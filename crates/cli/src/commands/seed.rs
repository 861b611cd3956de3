//! Seed the database with a restaurant to try orders against.
//!
//! Running the command twice is safe: an existing "Test Restaurant" is left
//! as it is, and a taken coupon code is skipped.

use chrono::Duration;
use tracing::{info, warn};

use dineease_core::{CouponCode, Cuisine, Price};
use dineease_ordering::AppError;
use dineease_ordering::db::RepositoryError;
use dineease_ordering::models::{MenuItemInput, NewCoupon, RestaurantFilter, RestaurantInput};
use dineease_ordering::services::{CatalogService, CouponService};

/// Name of the seeded restaurant.
pub const TEST_RESTAURANT: &str = "Test Restaurant";

/// Code of the seeded coupon.
pub const WELCOME_COUPON: &str = "WELCOME10";

const SAMPLE_MENU: [(&str, i64, &str); 5] = [
    ("Butter Chicken", 1250, "Chicken simmered in a mild tomato and butter sauce."),
    ("Paneer Tikka", 950, "Chargrilled cottage cheese with peppers and onion."),
    ("Dal Makhani", 800, "Slow-cooked black lentils finished with cream."),
    ("Garlic Naan", 350, "Tandoor-baked flatbread brushed with garlic butter."),
    ("Mango Lassi", 400, "Chilled yoghurt drink blended with Alphonso mango."),
];

/// Create the test restaurant, its sample menu and a 10% coupon.
///
/// # Errors
///
/// Returns an error if configuration is missing or a database call fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;
    let ctx = super::operator_context();
    let catalog = CatalogService::new(&pool);

    let existing = catalog
        .list(&RestaurantFilter {
            search: Some(TEST_RESTAURANT.to_string()),
            ..RestaurantFilter::default()
        })
        .await?;

    if let Some(restaurant) = existing.iter().find(|r| r.name == TEST_RESTAURANT) {
        info!(restaurant_id = %restaurant.id, "Test restaurant already exists");
    } else {
        let restaurant = catalog
            .create_restaurant(
                &ctx,
                &RestaurantInput {
                    name: TEST_RESTAURANT.to_string(),
                    location: "Test Location".to_string(),
                    description: "A test restaurant with delicious food and great ambiance."
                        .to_string(),
                    cuisine: Cuisine::Indian,
                    image: None,
                },
            )
            .await?;

        for (name, cents, description) in SAMPLE_MENU {
            catalog
                .add_menu_item(
                    &ctx,
                    restaurant.id,
                    &MenuItemInput {
                        name: name.to_string(),
                        price: Price::from_cents(cents),
                        description: description.to_string(),
                        image: None,
                    },
                )
                .await?;
        }
        info!(
            restaurant_id = %restaurant.id,
            items = SAMPLE_MENU.len(),
            "Successfully created restaurant: {}",
            restaurant.name
        );
    }

    let coupon = NewCoupon::new(
        Some(CouponCode::parse(WELCOME_COUPON)?),
        10,
        ctx.now,
        ctx.now + Duration::days(365),
        true,
    )?;
    match CouponService::new(&pool).create(&ctx, &coupon).await {
        Ok(coupon) => info!(code = %coupon.code, "Created coupon"),
        Err(AppError::Repository(RepositoryError::Conflict(message))) => {
            warn!("{message}, skipping");
        }
        Err(e) => return Err(e.into()),
    }

    info!("Seeding complete!");
    Ok(())
}
