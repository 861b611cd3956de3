//! Restaurant and menu item repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dineease_core::{Cuisine, MenuItemId, Price, RestaurantId};

use super::RepositoryError;
use crate::models::restaurant::{
    MenuItem, MenuItemInput, Restaurant, RestaurantFilter, RestaurantInput,
};

/// Default page size when listing restaurants.
const DEFAULT_LIST_LIMIT: i64 = 50;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: i32,
    name: String,
    location: String,
    description: String,
    cuisine: Cuisine,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: RestaurantId::new(row.id),
            name: row.name,
            location: row.location,
            description: row.description,
            cuisine: row.cuisine,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: i32,
    restaurant_id: i32,
    name: String,
    price: Price,
    description: String,
    image: Option<String>,
    archived_at: Option<DateTime<Utc>>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: MenuItemId::new(row.id),
            restaurant_id: RestaurantId::new(row.restaurant_id),
            name: row.name,
            price: row.price,
            description: row.description,
            image: row.image,
            archived_at: row.archived_at,
        }
    }
}

const RESTAURANT_COLUMNS: &str =
    "id, name, location, description, cuisine, image, created_at, updated_at";

const MENU_ITEM_COLUMNS: &str =
    "id, restaurant_id, name, price, description, image, archived_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for the catalog tables.
pub struct RestaurantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RestaurantRepository<'a> {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &RestaurantInput) -> Result<Restaurant, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            r"
            INSERT INTO restaurants (name, location, description, cuisine, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESTAURANT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.description)
        .bind(input.cuisine)
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a restaurant's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no restaurant has this ID.
    pub async fn update(
        &self,
        id: RestaurantId,
        input: &RestaurantInput,
    ) -> Result<Restaurant, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            r"
            UPDATE restaurants
            SET name = $2, location = $3, description = $4, cuisine = $5, image = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING {RESTAURANT_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.description)
        .bind(input.cuisine)
        .bind(input.image.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Get a restaurant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RestaurantId) -> Result<Option<Restaurant>, RepositoryError> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List restaurants matching `filter`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, RestaurantRow>(&format!(
            r"
            SELECT {RESTAURANT_COLUMNS}
            FROM restaurants
            WHERE ($1::cuisine IS NULL OR cuisine = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR location ILIKE $2)
            ORDER BY name, id
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(filter.cuisine)
        .bind(search)
        .bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Orderable menu items of a restaurant, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn menu(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            r"
            SELECT {MENU_ITEM_COLUMNS}
            FROM menu_items
            WHERE restaurant_id = $1 AND archived_at IS NULL
            ORDER BY name, id
            "
        ))
        .bind(restaurant_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Fetch menu items by ID, including archived items and items of other
    /// restaurants, so the caller can report why an item cannot be ordered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn menu_items_by_ids(
        &self,
        ids: &[MenuItemId],
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(MenuItemId::as_i32).collect();
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a dish to a restaurant's menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the restaurant does not exist.
    pub async fn add_menu_item(
        &self,
        restaurant_id: RestaurantId,
        input: &MenuItemInput,
    ) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            r"
            INSERT INTO menu_items (restaurant_id, name, price, description, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MENU_ITEM_COLUMNS}
            "
        ))
        .bind(restaurant_id.as_i32())
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            _ => RepositoryError::Database(e),
        })?;

        Ok(row.into())
    }

    /// Update a dish. Archived dishes cannot be edited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not an active item
    /// of this restaurant.
    pub async fn update_menu_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
        input: &MenuItemInput,
    ) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            r"
            UPDATE menu_items
            SET name = $3, price = $4, description = $5, image = $6
            WHERE id = $1 AND restaurant_id = $2 AND archived_at IS NULL
            RETURNING {MENU_ITEM_COLUMNS}
            "
        ))
        .bind(item_id.as_i32())
        .bind(restaurant_id.as_i32())
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .bind(input.image.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Remove a dish from the menu. Past orders keep referencing it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item is not an active item
    /// of this restaurant.
    pub async fn archive_menu_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE menu_items
            SET archived_at = $3
            WHERE id = $1 AND restaurant_id = $2 AND archived_at IS NULL
            ",
        )
        .bind(item_id.as_i32())
        .bind(restaurant_id.as_i32())
        .bind(at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Escape `LIKE` wildcards in user input.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off_today"), r"50\% off\_today");
        assert_eq!(escape_like("plain"), "plain");
    }
}
