//! Catalog domain models: restaurants and their menus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dineease_core::{Cuisine, MenuItemId, Price, RestaurantId};

/// A restaurant listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Unique restaurant ID.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Street address or area.
    pub location: String,
    /// Free-text description (may be empty).
    pub description: String,
    /// Cuisine served.
    pub cuisine: Cuisine,
    /// Relative path of the cover image under the media root.
    pub image: Option<String>,
    /// When the restaurant was created.
    pub created_at: DateTime<Utc>,
    /// When the restaurant was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A dish on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Unique menu item ID.
    pub id: MenuItemId,
    /// Restaurant this item belongs to.
    pub restaurant_id: RestaurantId,
    /// Dish name.
    pub name: String,
    /// Unit price (always at least 0.01).
    pub price: Price,
    /// Free-text description (may be empty).
    pub description: String,
    /// Relative path of the dish image under the media root.
    pub image: Option<String>,
    /// Set when the owner removes the item; archived items stay referenced by
    /// historical orders but can no longer be ordered.
    pub archived_at: Option<DateTime<Utc>>,
}

impl MenuItem {
    /// Whether the item can currently be ordered.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        self.archived_at.is_none()
    }
}

/// A restaurant together with its orderable menu.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantWithMenu {
    /// The restaurant itself.
    pub restaurant: Restaurant,
    /// Orderable menu items, sorted by name.
    pub menu: Vec<MenuItem>,
}

/// Validated input for creating or updating a restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RestaurantInput {
    /// Display name.
    pub name: String,
    /// Street address or area.
    pub location: String,
    /// Free-text description.
    pub description: String,
    /// Cuisine served.
    pub cuisine: Cuisine,
    /// Optional cover image path.
    pub image: Option<String>,
}

/// Validated input for creating or updating a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuItemInput {
    /// Dish name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Free-text description.
    pub description: String,
    /// Optional dish image path.
    pub image: Option<String>,
}

/// Filter criteria for listing restaurants.
#[derive(Debug, Clone, Default)]
pub struct RestaurantFilter {
    /// Only restaurants serving this cuisine.
    pub cuisine: Option<Cuisine>,
    /// Case-insensitive substring match on name or location.
    pub search: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip.
    pub offset: Option<i64>,
}
