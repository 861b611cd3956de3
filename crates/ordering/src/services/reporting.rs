//! Owner dashboard aggregation.
//!
//! [`ReportingService`] computes all-time figures with SQL aggregates and
//! loads only the current month's orders for the daily series.
//! [`DashboardReport::build`] produces the same report in memory from
//! already loaded orders and reviews.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{Instrument, instrument};

use dineease_core::{MenuItemId, OrderStatus, Price, RestaurantId};

use crate::context::RequestContext;
use crate::db::{OrderRepository, RestaurantRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::models::order::Order;
pub use crate::models::report::{DailyTotals, StatusCount, TopItem};
use crate::models::report::{OrderTotals, RatingSummary, rank_top_items};
use crate::models::restaurant::Restaurant;
use crate::models::review::Review;

/// Everything shown on the owner dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardReport {
    /// One entry per status, in lifecycle order, including zeros.
    pub status_counts: Vec<StatusCount>,
    /// Orders in any status
    pub total_orders: u64,
    /// Sum of `total_price` over completed orders.
    pub revenue: Price,
    /// Mean review rating rounded to two places, `None` without reviews.
    pub average_rating: Option<Decimal>,
    /// Number of reviews
    pub review_count: u64,
    /// Best sellers, most ordered first
    pub top_items: Vec<TopItem>,
    /// Day 1 of the current month through today.
    pub daily: Vec<DailyTotals>,
}

impl DashboardReport {
    /// Aggregate `orders` and `reviews` as of `today`.
    #[must_use]
    pub fn build(orders: &[Order], reviews: &[Review], today: NaiveDate, top_n: usize) -> Self {
        let mut totals = OrderTotals::default();
        for order in orders {
            totals.record(order.status, 1, order.total_price);
        }

        let total_stars: Decimal = reviews
            .iter()
            .map(|r| Decimal::from(r.rating.stars()))
            .sum();
        let count = reviews.len() as u64;
        let mean = (count > 0).then(|| total_stars / Decimal::from(count));

        let completed = orders.iter().filter(|o| o.status == OrderStatus::Completed);
        Self::assemble(
            &totals,
            RatingSummary::new(count, mean),
            top_items(completed, top_n),
            daily_totals(orders, today),
        )
    }

    fn assemble(
        totals: &OrderTotals,
        ratings: RatingSummary,
        top_items: Vec<TopItem>,
        daily: Vec<DailyTotals>,
    ) -> Self {
        Self {
            status_counts: totals.status_counts(),
            total_orders: totals.total(),
            revenue: totals.completed_revenue,
            average_rating: ratings.average,
            review_count: ratings.count,
            top_items,
            daily,
        }
    }

    /// Count for one status.
    #[must_use]
    pub fn count(&self, status: OrderStatus) -> u64 {
        self.status_counts
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }
}

fn top_items<'a>(completed: impl Iterator<Item = &'a Order>, top_n: usize) -> Vec<TopItem> {
    let mut items: BTreeMap<MenuItemId, TopItem> = BTreeMap::new();
    for order in completed {
        for line in &order.items {
            let entry = items.entry(line.menu_item_id).or_insert_with(|| TopItem {
                menu_item_id: line.menu_item_id,
                name: line.name.clone(),
                order_count: 0,
                quantity: 0,
            });
            entry.order_count += 1;
            entry.quantity += u64::from(line.quantity);
        }
    }
    rank_top_items(items.into_values().collect(), top_n)
}

/// Midnight UTC on the first day of `now`'s month.
fn month_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn daily_totals(orders: &[Order], today: NaiveDate) -> Vec<DailyTotals> {
    let Some(first) = today.with_day(1) else {
        return Vec::new();
    };
    let mut days: Vec<DailyTotals> = first
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| DailyTotals {
            date,
            orders: 0,
            revenue: Price::ZERO,
        })
        .collect();

    for order in orders {
        let date = order.created_at.date_naive();
        if date < first || date > today {
            continue;
        }
        let index = (date.day0() as usize).min(days.len().saturating_sub(1));
        if let Some(day) = days.get_mut(index) {
            day.orders += 1;
            if order.status == OrderStatus::Completed {
                day.revenue = day.revenue + order.total_price;
            }
        }
    }
    days
}

/// A restaurant together with its dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantDashboard {
    /// The restaurant reported on
    pub restaurant: Restaurant,
    /// Its figures
    pub report: DashboardReport,
}

/// Read-side reporting for restaurant owners.
pub struct ReportingService<'a> {
    pool: &'a PgPool,
    top_n: usize,
}

impl<'a> ReportingService<'a> {
    /// Create a reporting service listing `top_n` best sellers.
    #[must_use]
    pub const fn new(pool: &'a PgPool, top_n: usize) -> Self {
        Self { pool, top_n }
    }

    /// Build the dashboard for a restaurant as of `ctx.now`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist, or a
    /// repository error if loading fails.
    #[instrument(skip(self, ctx), fields(restaurant_id = %restaurant_id))]
    pub async fn dashboard(
        &self,
        ctx: &RequestContext,
        restaurant_id: RestaurantId,
    ) -> Result<RestaurantDashboard> {
        async {
            let restaurant = RestaurantRepository::new(self.pool)
                .get(restaurant_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Restaurant".to_string()))?;

            let orders = OrderRepository::new(self.pool);
            let totals = orders.totals_for_restaurant(restaurant_id).await?;
            let top_items = orders.top_items(restaurant_id, self.top_n).await?;
            let this_month = orders
                .list_for_restaurant(restaurant_id, month_start(ctx.now))
                .await?;
            let ratings = ReviewRepository::new(self.pool)
                .rating_summary(restaurant_id)
                .await?;

            let report = DashboardReport::assemble(
                &totals,
                ratings,
                top_items,
                daily_totals(&this_month, ctx.now.date_naive()),
            );
            tracing::info!(
                total_orders = report.total_orders,
                revenue = %report.revenue,
                month_orders = this_month.len(),
                "Built dashboard"
            );
            Ok(RestaurantDashboard { restaurant, report })
        }
        .instrument(ctx.span("dashboard"))
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use dineease_core::{Customer, OrderId, OrderItemId, Rating, ReviewId, UserId};

    use super::*;
    use crate::models::order::OrderItem;

    fn order(id: i32, status: OrderStatus, day: u32, lines: &[(i32, &str, u32, i64)]) -> Order {
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|&(item, name, quantity, cents)| OrderItem {
                id: OrderItemId::new(id * 100 + item),
                menu_item_id: MenuItemId::new(item),
                name: name.to_string(),
                unit_price: Price::from_cents(cents),
                quantity,
            })
            .collect();
        let mut order = Order {
            id: OrderId::new(id),
            restaurant_id: RestaurantId::new(1),
            customer: Customer::User(UserId::new(1)),
            status,
            items,
            total_price: Price::ZERO,
            discount_applied: Price::ZERO,
            coupon_id: None,
            reviewed: false,
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 18, 30, 0).unwrap(),
        };
        order.recompute_total();
        order
    }

    fn review(id: i32, stars: i64) -> Review {
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        Review {
            id: ReviewId::new(id),
            order_id: OrderId::new(id),
            restaurant_id: RestaurantId::new(1),
            user_id: None,
            rating: Rating::new(stars).unwrap(),
            body: "Delicious, will return".into(),
            created_at: at,
            updated_at: at,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn test_empty_restaurant() {
        let report = DashboardReport::build(&[], &[], today(), 5);
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.status_counts.len(), 4);
        assert!(report.status_counts.iter().all(|c| c.count == 0));
        assert_eq!(report.revenue, Price::ZERO);
        assert_eq!(report.average_rating, None);
        assert!(report.top_items.is_empty());
        assert_eq!(report.daily.len(), 10);
    }

    #[test]
    fn test_revenue_counts_only_completed() {
        let orders = [
            order(1, OrderStatus::Completed, 1, &[(1, "Naan", 2, 500)]),
            order(2, OrderStatus::Pending, 2, &[(1, "Naan", 1, 500)]),
            order(3, OrderStatus::Cancelled, 2, &[(2, "Dal", 1, 900)]),
            order(4, OrderStatus::Completed, 3, &[(2, "Dal", 1, 900)]),
        ];
        let report = DashboardReport::build(&orders, &[], today(), 5);
        assert_eq!(report.revenue, Price::from_cents(1900));
        assert_eq!(report.total_orders, 4);
        assert_eq!(report.count(OrderStatus::Completed), 2);
        assert_eq!(report.count(OrderStatus::Preparing), 0);
    }

    #[test]
    fn test_average_rating() {
        let reviews = [review(1, 5), review(2, 4), review(3, 4)];
        let report = DashboardReport::build(&[], &reviews, today(), 5);
        assert_eq!(report.average_rating, Some(Decimal::new(433, 2)));
        assert_eq!(report.review_count, 3);
    }

    #[test]
    fn test_top_items_rank_by_line_count_then_quantity_then_name() {
        let orders = [
            order(1, OrderStatus::Completed, 1, &[(1, "Naan", 1, 300), (2, "Dal", 5, 900)]),
            order(2, OrderStatus::Completed, 2, &[(1, "Naan", 1, 300), (3, "Chai", 2, 200)]),
            order(3, OrderStatus::Completed, 3, &[(3, "Chai", 1, 200), (4, "Aloo", 7, 400)]),
            order(4, OrderStatus::Pending, 4, &[(2, "Dal", 50, 900)]),
        ];
        let report = DashboardReport::build(&orders, &[], today(), 3);
        let names: Vec<&str> = report.top_items.iter().map(|t| t.name.as_str()).collect();
        // Chai and Naan both appear twice; Chai sold more portions. Aloo beats
        // Dal on quantity.
        assert_eq!(names, ["Chai", "Naan", "Aloo"]);
        assert_eq!(report.top_items[0].quantity, 3);
    }

    #[test]
    fn test_daily_series_covers_month_to_date() {
        let orders = [
            order(1, OrderStatus::Completed, 1, &[(1, "Naan", 2, 500)]),
            order(2, OrderStatus::Pending, 1, &[(1, "Naan", 1, 500)]),
            order(3, OrderStatus::Completed, 10, &[(1, "Naan", 1, 500)]),
        ];
        let report = DashboardReport::build(&orders, &[], today(), 5);
        assert_eq!(
            report.daily.first().unwrap().date,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert_eq!(report.daily.last().unwrap().date, today());
        assert_eq!(report.daily[0].orders, 2);
        assert_eq!(report.daily[0].revenue, Price::from_cents(1000));
        assert_eq!(report.daily[9].revenue, Price::from_cents(500));
        assert_eq!(report.daily[5].orders, 0);
    }

    #[test]
    fn test_orders_from_other_months_skip_daily_series() {
        let mut old = order(1, OrderStatus::Completed, 1, &[(1, "Naan", 1, 500)]);
        old.created_at = Utc.with_ymd_and_hms(2026, 2, 27, 9, 0, 0).unwrap();
        let report = DashboardReport::build(&[old], &[], today(), 5);
        assert_eq!(report.revenue, Price::from_cents(500));
        assert!(report.daily.iter().all(|d| d.orders == 0));
    }

    #[test]
    fn test_month_start_is_midnight_on_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 0).unwrap();
        assert_eq!(
            month_start(now),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
    }
}
