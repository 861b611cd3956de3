//! Service calls against a live `PostgreSQL`.
//!
//! These tests require:
//! - A running `PostgreSQL` database reachable at `DATABASE_URL`
//!
//! Run with: `cargo test -p dineease-integration-tests -- --include-ignored`

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dineease_core::{CouponCode, Cuisine, OrderStatus, Price, Rating};
use dineease_ordering::db::{self, MIGRATOR};
use dineease_ordering::forms::{PlaceOrderInput, ReviewInput};
use dineease_ordering::models::{
    CouponError, MenuItemInput, NewCoupon, ReviewError, RestaurantInput,
};
use dineease_ordering::services::{
    CatalogService, CouponService, OrderService, ReportingService, ReviewService,
};
use dineease_ordering::{AppError, OrderingConfig, RequestContext};

async fn pool() -> PgPool {
    let config = OrderingConfig::from_env().expect("DATABASE_URL must be set");
    let pool = db::create_pool(&config.database).await.unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_order_coupon_review_round_trip() {
    let pool = pool().await;
    let owner = RequestContext::from_session(None);
    let customer = RequestContext::from_session(None);

    let catalog = CatalogService::new(&pool);
    let restaurant = catalog
        .create_restaurant(
            &owner,
            &RestaurantInput {
                name: "Round Trip Kitchen".to_string(),
                location: "Test Location".to_string(),
                description: String::new(),
                cuisine: Cuisine::Thai,
                image: None,
            },
        )
        .await
        .unwrap();
    let burger = catalog
        .add_menu_item(
            &owner,
            restaurant.id,
            &MenuItemInput {
                name: "Burger".to_string(),
                price: Price::from_cents(500),
                description: String::new(),
                image: None,
            },
        )
        .await
        .unwrap();
    let pizza = catalog
        .add_menu_item(
            &owner,
            restaurant.id,
            &MenuItemInput {
                name: "Pizza".to_string(),
                price: Price::from_cents(1000),
                description: String::new(),
                image: None,
            },
        )
        .await
        .unwrap();

    let code = CouponCode::generate();
    CouponService::new(&pool)
        .create(
            &owner,
            &NewCoupon::new(
                Some(code.clone()),
                10,
                owner.now - Duration::hours(1),
                owner.now + Duration::days(1),
                true,
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let orders = OrderService::new(&pool);
    let order = orders
        .place_order(
            &customer,
            restaurant.id,
            &PlaceOrderInput {
                lines: vec![(burger.id, 2), (pizza.id, 1)],
                coupon: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.total_price, Price::from_cents(2000));

    let coupons = CouponService::new(&pool);
    let order = coupons.apply(&customer, order.id, &code).await.unwrap();
    assert_eq!(order.total_price, Price::from_cents(1800));

    let err = coupons.apply(&customer, order.id, &code).await.unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponError::AlreadyApplied)));
    let reloaded = orders.get_order(&customer, order.id).await.unwrap();
    assert_eq!(reloaded.total_price, Price::from_cents(1800));

    // Someone else cannot see the order.
    assert!(orders.get_order(&owner, order.id).await.is_err());

    let reviews = ReviewService::new(&pool);
    let input = ReviewInput {
        rating: Rating::new(5).unwrap(),
        body: "Quick and delicious.".to_string(),
    };
    let err = reviews.submit(&customer, order.id, &input).await.unwrap_err();
    assert!(matches!(err, AppError::Review(ReviewError::OrderNotCompleted(OrderStatus::Pending))));

    orders
        .transition_status(&owner, order.id, OrderStatus::Preparing)
        .await
        .unwrap();
    orders
        .transition_status(&owner, order.id, OrderStatus::Completed)
        .await
        .unwrap();

    reviews.submit(&customer, order.id, &input).await.unwrap();
    let err = reviews.submit(&customer, order.id, &input).await.unwrap_err();
    assert!(matches!(err, AppError::Review(ReviewError::AlreadyReviewed)));

    let dashboard = ReportingService::new(&pool, 5)
        .dashboard(&owner.clone().with_clock(Utc::now()), restaurant.id)
        .await
        .unwrap();
    assert_eq!(dashboard.report.revenue, Price::from_cents(1800));
    assert_eq!(dashboard.report.total_orders, 1);
    assert_eq!(dashboard.report.count(OrderStatus::Completed), 1);
    assert_eq!(dashboard.report.review_count, 1);
    assert_eq!(dashboard.report.average_rating, Some(Decimal::new(500, 2)));
    let top: Vec<(&str, u64)> = dashboard
        .report
        .top_items
        .iter()
        .map(|t| (t.name.as_str(), t.quantity))
        .collect();
    assert_eq!(top, [("Burger", 2), ("Pizza", 1)]);
    let today = dashboard.report.daily.last().unwrap();
    assert_eq!(today.orders, 1);
    assert_eq!(today.revenue, Price::from_cents(1800));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_unknown_coupon_rolls_back_order() {
    let pool = pool().await;
    let ctx = RequestContext::from_session(None);

    let catalog = CatalogService::new(&pool);
    let restaurant = catalog
        .create_restaurant(
            &ctx,
            &RestaurantInput {
                name: "Rollback Diner".to_string(),
                location: "Test Location".to_string(),
                description: String::new(),
                cuisine: Cuisine::Italian,
                image: None,
            },
        )
        .await
        .unwrap();
    let item = catalog
        .add_menu_item(
            &ctx,
            restaurant.id,
            &MenuItemInput {
                name: "Risotto".to_string(),
                price: Price::from_cents(1300),
                description: String::new(),
                image: None,
            },
        )
        .await
        .unwrap();

    let orders = OrderService::new(&pool);
    let err = orders
        .place_order(
            &ctx,
            restaurant.id,
            &PlaceOrderInput {
                lines: vec![(item.id, 1)],
                coupon: Some(CouponCode::generate()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Coupon(CouponError::NotFound(_))));
    assert!(orders.list_for_customer(&ctx).await.unwrap().is_empty());
}
