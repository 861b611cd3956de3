//! Order service: placing orders and moving them through the kitchen.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{Instrument, instrument};

use dineease_core::{Customer, MenuItemId, OrderId, OrderStatus, RestaurantId};

use crate::context::RequestContext;
use crate::db::{CouponRepository, OrderRepository, RestaurantRepository};
use crate::error::{AppError, Result};
use crate::forms::PlaceOrderInput;
use crate::models::coupon::{CouponError, apply_coupon};
use crate::models::order::{NewOrder, Order, OrderBuilder};
use crate::models::restaurant::MenuItem;

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
    restaurants: RestaurantRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
            restaurants: RestaurantRepository::new(pool),
        }
    }

    /// Place an order for the context's customer, applying a coupon if one
    /// was entered.
    ///
    /// The order, its lines and any discount are written in one transaction;
    /// a rejected coupon rolls the whole order back.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant or a menu item does not
    /// exist, `AppError::Order` if a line is rejected, and `AppError::Coupon`
    /// if the coupon cannot be applied.
    #[instrument(
        skip(self, ctx, input),
        fields(restaurant_id = %restaurant_id, lines = input.lines.len())
    )]
    pub async fn place_order(
        &self,
        ctx: &RequestContext,
        restaurant_id: RestaurantId,
        input: &PlaceOrderInput,
    ) -> Result<Order> {
        async {
            self.restaurants
                .get(restaurant_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Restaurant".to_string()))?;

            let ids: Vec<MenuItemId> = input.lines.iter().map(|(id, _)| *id).collect();
            let items = self.restaurants.menu_items_by_ids(&ids).await?;
            let new_order =
                build_order(restaurant_id, ctx.customer, &input.lines, &items, ctx.now)?;

            let mut tx = self.pool.begin().await?;
            let mut order = OrderRepository::insert(&mut *tx, &new_order).await?;

            if let Some(code) = &input.coupon {
                let coupon = CouponRepository::find_by_code(&mut *tx, code)
                    .await?
                    .ok_or_else(|| CouponError::NotFound(code.clone()))?;
                let discount = apply_coupon(&mut order, &coupon, ctx.now)?;
                OrderRepository::save_pricing(&mut *tx, &order).await?;
                tracing::info!(coupon = %coupon.code, %discount, "Applied coupon at checkout");
            }

            tx.commit().await?;
            tracing::info!(order_id = %order.id, total = %order.total_price, "Placed order");
            Ok(order)
        }
        .instrument(ctx.span("place_order"))
        .await
    }

    /// Move an order to `status` on behalf of the restaurant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist and
    /// `AppError::Order` if the transition is not allowed.
    #[instrument(skip(self, ctx), fields(order_id = %order_id, status = %status))]
    pub async fn transition_status(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        async {
            let mut tx = self.pool.begin().await?;
            let mut order = OrderRepository::lock(&mut *tx, order_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

            let previous = order.transition_to(status)?;
            OrderRepository::save_status(&mut *tx, order.id, order.status).await?;
            tx.commit().await?;

            tracing::info!(from = %previous, to = %order.status, "Order status changed");
            Ok(order)
        }
        .instrument(ctx.span("transition_status"))
        .await
    }

    /// One of the context customer's orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist or belongs to
    /// someone else.
    pub async fn get_order(&self, ctx: &RequestContext, order_id: OrderId) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .instrument(ctx.span("get_order"))
            .await?;
        owned_by(order, &ctx.customer)
    }

    /// Every order of the context customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list_for_customer(&self, ctx: &RequestContext) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .list_for_customer(&ctx.customer)
            .instrument(ctx.span("list_orders"))
            .await?)
    }

    /// Every order of a restaurant, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list_for_restaurant(
        &self,
        ctx: &RequestContext,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Order>> {
        Ok(self
            .orders
            .list_for_restaurant(restaurant_id, None)
            .instrument(ctx.span("list_restaurant_orders"))
            .await?)
    }
}

/// Turn requested `(menu item, quantity)` lines into a finalized order.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown menu item and `AppError::Order`
/// for any line the builder rejects.
pub fn build_order(
    restaurant_id: RestaurantId,
    customer: Customer,
    lines: &[(MenuItemId, u32)],
    items: &[MenuItem],
    now: DateTime<Utc>,
) -> Result<NewOrder> {
    let by_id: HashMap<MenuItemId, &MenuItem> = items.iter().map(|item| (item.id, item)).collect();

    let mut builder = OrderBuilder::new(restaurant_id, customer);
    for (id, quantity) in lines {
        let item = by_id
            .get(id)
            .ok_or_else(|| AppError::NotFound("Menu item".to_string()))?;
        builder.add_line_item(item, *quantity)?;
    }
    Ok(builder.build(now)?)
}

/// Hide orders that belong to another customer.
pub(crate) fn owned_by(order: Option<Order>, customer: &Customer) -> Result<Order> {
    match order {
        Some(order) if order.customer == *customer => Ok(order),
        Some(order) => {
            tracing::debug!(order_id = %order.id, "Order belongs to another customer");
            Err(AppError::NotFound("Order".to_string()))
        }
        None => Err(AppError::NotFound("Order".to_string())),
    }
}
