//! Order repository.
//!
//! Reads go through the pool. Writes that must be atomic with other writes
//! take a `&mut PgConnection` so the service can run them inside one
//! transaction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use dineease_core::{
    CouponId, Customer, GuestId, MenuItemId, OrderId, OrderItemId, OrderStatus, Price,
    RestaurantId, UserId,
};

use super::{RepositoryError, to_u32, to_u64};
use crate::models::order::{NewOrder, Order, OrderItem};
use crate::models::report::{OrderTotals, TopItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    restaurant_id: i32,
    user_id: Option<i32>,
    guest_id: Option<Uuid>,
    status: OrderStatus,
    total_price: Price,
    discount_applied: Price,
    coupon_id: Option<i32>,
    reviewed: bool,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let customer = Customer::from_parts(
            self.user_id.map(UserId::new),
            self.guest_id.map(GuestId::from_uuid),
        )
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "order {} must have exactly one of user_id and guest_id",
                self.id
            ))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            restaurant_id: RestaurantId::new(self.restaurant_id),
            customer,
            status: self.status,
            items,
            total_price: self.total_price,
            discount_applied: self.discount_applied,
            coupon_id: self.coupon_id.map(CouponId::new),
            reviewed: self.reviewed,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    menu_item_id: i32,
    name: String,
    unit_price: Price,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            menu_item_id: MenuItemId::new(row.menu_item_id),
            name: row.name,
            unit_price: row.unit_price,
            quantity: to_u32(row.quantity, "quantity")?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusTotalRow {
    status: OrderStatus,
    orders: i64,
    total: Price,
}

#[derive(Debug, sqlx::FromRow)]
struct TopItemRow {
    menu_item_id: i32,
    name: String,
    order_count: i64,
    quantity: i64,
}

impl TryFrom<TopItemRow> for TopItem {
    type Error = RepositoryError;

    fn try_from(row: TopItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            menu_item_id: MenuItemId::new(row.menu_item_id),
            name: row.name,
            order_count: to_u64(row.order_count, "order count")?,
            quantity: to_u64(row.quantity, "quantity")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, restaurant_id, user_id, guest_id, status, total_price, \
                             discount_applied, coupon_id, reviewed, created_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, menu_item_id, name, unit_price, quantity";

/// Attach line items to their orders.
fn assemble(rows: Vec<OrderRow>, items: Vec<OrderItemRow>) -> Result<Vec<Order>, RepositoryError> {
    let mut by_order: BTreeMap<i32, Vec<OrderItem>> = BTreeMap::new();
    for item in items {
        let order_id = item.order_id;
        by_order.entry(order_id).or_default().push(item.try_into()?);
    }
    rows.into_iter()
        .map(|row| {
            let items = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored order is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id, false).await
    }

    /// Every order of a restaurant placed at or after `since` (all orders
    /// when `None`), oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored order is invalid.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE restaurant_id = $1 AND ($2::timestamptz IS NULL OR created_at >= $2)
            ORDER BY created_at, id
            "
        ))
        .bind(restaurant_id.as_i32())
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT {ORDER_ITEM_COLUMNS}
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            "
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        assemble(rows, items)
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored order is invalid.
    pub async fn list_for_customer(
        &self,
        customer: &Customer,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id IS NOT DISTINCT FROM $1 AND guest_id IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(customer.user_id().map(|id| id.as_i32()))
        .bind(customer.guest_id().map(|id| id.as_uuid()))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT {ORDER_ITEM_COLUMNS}
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            "
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        assemble(rows, items)
    }

    /// Order counts per status and completed revenue over every order of a
    /// restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals_for_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<OrderTotals, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusTotalRow>(
            r"
            SELECT status, COUNT(*) AS orders, COALESCE(SUM(total_price), 0) AS total
            FROM orders
            WHERE restaurant_id = $1
            GROUP BY status
            ",
        )
        .bind(restaurant_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let mut totals = OrderTotals::default();
        for row in rows {
            totals.record(row.status, to_u64(row.orders, "order count")?, row.total);
        }
        Ok(totals)
    }

    /// The `limit` best-selling items across completed orders, ranked by
    /// orders containing the item, then portions, then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_items(
        &self,
        restaurant_id: RestaurantId,
        limit: usize,
    ) -> Result<Vec<TopItem>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, TopItemRow>(
            r"
            SELECT oi.menu_item_id,
                   (ARRAY_AGG(oi.name ORDER BY o.created_at DESC, oi.id DESC))[1] AS name,
                   COUNT(DISTINCT oi.order_id) AS order_count,
                   SUM(oi.quantity)::BIGINT AS quantity
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            WHERE o.restaurant_id = $1 AND o.status = $2
            GROUP BY oi.menu_item_id
            ORDER BY order_count DESC, quantity DESC, name ASC
            LIMIT $3
            ",
        )
        .bind(restaurant_id.as_i32())
        .bind(OrderStatus::Completed)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a built order and its lines.
    ///
    /// Run inside a transaction so the order never exists without its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn insert(conn: &mut PgConnection, new: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (restaurant_id, user_id, guest_id, status, total_price, created_at)
            VALUES ($1, $2, $3, 'pending', $4, $5)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(new.restaurant_id.as_i32())
        .bind(new.customer.user_id().map(|id| id.as_i32()))
        .bind(new.customer.guest_id().map(|id| id.as_uuid()))
        .bind(new.total_price)
        .bind(new.created_at)
        .fetch_one(&mut *conn)
        .await?;

        let mut items = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("quantity out of range: {}", line.quantity))
            })?;
            let item = sqlx::query_as::<_, OrderItemRow>(&format!(
                r"
                INSERT INTO order_items (order_id, menu_item_id, name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {ORDER_ITEM_COLUMNS}
                "
            ))
            .bind(row.id)
            .bind(line.menu_item_id.as_i32())
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(quantity)
            .fetch_one(&mut *conn)
            .await?;
            items.push(item.try_into()?);
        }

        row.into_order(items)
    }

    /// Load an order and lock its row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored order is invalid.
    pub async fn lock(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        load(conn, id, true).await
    }

    /// Persist `total_price`, `discount_applied` and `coupon_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn save_pricing(
        conn: &mut PgConnection,
        order: &Order,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET total_price = $2, discount_applied = $3, coupon_id = $4
            WHERE id = $1
            ",
        )
        .bind(order.id.as_i32())
        .bind(order.total_price)
        .bind(order.discount_applied)
        .bind(order.coupon_id.map(|id| id.as_i32()))
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Persist a status change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn save_status(
        conn: &mut PgConnection,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(status)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flag an order as reviewed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order no longer exists.
    pub async fn mark_reviewed(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET reviewed = TRUE WHERE id = $1")
            .bind(id.as_i32())
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn load(
    conn: &mut PgConnection,
    id: OrderId,
    for_update: bool,
) -> Result<Option<Order>, RepositoryError> {
    let lock = if for_update { "FOR UPDATE" } else { "" };
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 {lock}"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItemRow>(&format!(
        "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(TryInto::try_into)
    .collect::<Result<Vec<OrderItem>, _>>()?;

    row.into_order(items).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_row(id: i32, user_id: Option<i32>, guest_id: Option<Uuid>) -> OrderRow {
        OrderRow {
            id,
            restaurant_id: 1,
            user_id,
            guest_id,
            status: OrderStatus::Pending,
            total_price: Price::from_cents(1500),
            discount_applied: Price::ZERO,
            coupon_id: None,
            reviewed: false,
            created_at: Utc::now(),
        }
    }

    fn item_row(id: i32, order_id: i32, quantity: i32) -> OrderItemRow {
        OrderItemRow {
            id,
            order_id,
            menu_item_id: id,
            name: format!("Dish {id}"),
            unit_price: Price::from_cents(500),
            quantity,
        }
    }

    #[test]
    fn test_assemble_groups_items_by_order() {
        let orders = assemble(
            vec![order_row(1, Some(3), None), order_row(2, None, Some(Uuid::new_v4()))],
            vec![item_row(10, 1, 1), item_row(11, 2, 2), item_row(12, 1, 2)],
        )
        .unwrap();
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[1].items.len(), 1);
        assert_eq!(orders[0].customer, Customer::User(UserId::new(3)));
        assert!(orders[1].customer.guest_id().is_some());
    }

    #[test]
    fn test_order_without_owner_is_corrupt() {
        let err = assemble(vec![order_row(1, None, None)], vec![]).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_negative_quantity_is_corrupt() {
        let err =
            assemble(vec![order_row(1, Some(1), None)], vec![item_row(1, 1, -2)]).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
