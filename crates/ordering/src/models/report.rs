//! Owner dashboard figures.
//!
//! These are produced either by SQL aggregates in [`crate::db`] or in memory
//! from loaded orders, and combined into a
//! [`DashboardReport`](crate::services::DashboardReport).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use dineease_core::{MenuItemId, OrderStatus, Price};

/// Number of orders in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    /// Lifecycle status
    pub status: OrderStatus,
    /// Orders currently in that status
    pub count: u64,
}

/// A best-selling menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopItem {
    /// Menu item the lines refer to
    pub menu_item_id: MenuItemId,
    /// Item name as captured on the most recent line
    pub name: String,
    /// Completed orders containing the item.
    pub order_count: u64,
    /// Portions sold across those orders.
    pub quantity: u64,
}

/// Rank best sellers by completed orders, then portions, then name, and
/// keep the first `top_n`.
pub(crate) fn rank_top_items(mut items: Vec<TopItem>, top_n: usize) -> Vec<TopItem> {
    items.sort_by(|a, b| {
        b.order_count
            .cmp(&a.order_count)
            .then_with(|| b.quantity.cmp(&a.quantity))
            .then_with(|| a.name.cmp(&b.name))
    });
    items.truncate(top_n);
    items
}

/// Orders and completed revenue for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Orders placed that day, in any status
    pub orders: u64,
    /// Total of the day's completed orders
    pub revenue: Price,
}

/// Order counts per status and completed revenue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderTotals {
    /// Orders per status; statuses without orders are absent.
    pub by_status: BTreeMap<OrderStatus, u64>,
    /// Sum of `total_price` over completed orders.
    pub completed_revenue: Price,
}

impl OrderTotals {
    /// Add `orders` orders in `status` whose totals sum to `total`.
    pub fn record(&mut self, status: OrderStatus, orders: u64, total: Price) {
        *self.by_status.entry(status).or_default() += orders;
        if status == OrderStatus::Completed {
            self.completed_revenue = self.completed_revenue + total;
        }
    }

    /// One entry per status in lifecycle order, zeros included.
    #[must_use]
    pub fn status_counts(&self) -> Vec<StatusCount> {
        OrderStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: self.by_status.get(&status).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Orders across every status.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.by_status.values().sum()
    }
}

/// Review count and mean rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingSummary {
    /// Number of reviews
    pub count: u64,
    /// Mean rating rounded half away from zero to two places, `None`
    /// without reviews.
    pub average: Option<Decimal>,
}

impl RatingSummary {
    /// Summary of `count` reviews with unrounded mean `mean`.
    #[must_use]
    pub fn new(count: u64, mean: Option<Decimal>) -> Self {
        Self {
            count,
            average: mean
                .filter(|_| count > 0)
                .map(|m| m.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_count_every_status_but_only_completed_revenue() {
        let mut totals = OrderTotals::default();
        totals.record(OrderStatus::Completed, 2, Price::from_cents(3000));
        totals.record(OrderStatus::Cancelled, 1, Price::from_cents(900));
        totals.record(OrderStatus::Completed, 1, Price::from_cents(500));

        assert_eq!(totals.total(), 4);
        assert_eq!(totals.completed_revenue, Price::from_cents(3500));
        let counts = totals.status_counts();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.first().map(|c| (c.status, c.count)), Some((OrderStatus::Pending, 0)));
    }

    #[test]
    fn test_rating_summary_rounds_mean() {
        let summary = RatingSummary::new(3, Some(Decimal::new(13, 0) / Decimal::new(3, 0)));
        assert_eq!(summary.average, Some(Decimal::new(433, 2)));
        assert_eq!(RatingSummary::new(0, None).average, None);
    }

    #[test]
    fn test_rank_top_items_ties() {
        let item = |id, name: &str, order_count, quantity| TopItem {
            menu_item_id: MenuItemId::new(id),
            name: name.to_string(),
            order_count,
            quantity,
        };
        let ranked = rank_top_items(
            vec![item(1, "Naan", 2, 2), item(2, "Chai", 2, 3), item(3, "Dal", 2, 3)],
            2,
        );
        let names: Vec<&str> = ranked.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Chai", "Dal"]);
    }
}
