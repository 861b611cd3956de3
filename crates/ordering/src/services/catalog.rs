//! Catalog service: restaurants and their menus.

use sqlx::PgPool;
use tracing::{Instrument, instrument};

use dineease_core::{MenuItemId, RestaurantId};

use crate::context::RequestContext;
use crate::db::{RepositoryError, RestaurantRepository};
use crate::error::{AppError, Result};
use crate::models::restaurant::{
    MenuItem, MenuItemInput, Restaurant, RestaurantFilter, RestaurantInput, RestaurantWithMenu,
};

/// Catalog service.
pub struct CatalogService<'a> {
    restaurants: RestaurantRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            restaurants: RestaurantRepository::new(pool),
        }
    }

    /// Browse restaurants.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self, filter: &RestaurantFilter) -> Result<Vec<Restaurant>> {
        Ok(self.restaurants.list(filter).await?)
    }

    /// A restaurant and its orderable menu.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist.
    pub async fn restaurant_with_menu(&self, id: RestaurantId) -> Result<RestaurantWithMenu> {
        let restaurant = self
            .restaurants
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Restaurant".to_string()))?;
        let menu = self.restaurants.menu(id).await?;
        Ok(RestaurantWithMenu { restaurant, menu })
    }

    /// Register a restaurant.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the insert fails.
    #[instrument(skip(self, ctx, input), fields(name = %input.name))]
    pub async fn create_restaurant(
        &self,
        ctx: &RequestContext,
        input: &RestaurantInput,
    ) -> Result<Restaurant> {
        async {
            let restaurant = self.restaurants.create(input).await?;
            tracing::info!(restaurant_id = %restaurant.id, "Created restaurant");
            Ok(restaurant)
        }
        .instrument(ctx.span("create_restaurant"))
        .await
    }

    /// Edit a restaurant's details.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist.
    #[instrument(skip(self, ctx, input), fields(restaurant_id = %id))]
    pub async fn update_restaurant(
        &self,
        ctx: &RequestContext,
        id: RestaurantId,
        input: &RestaurantInput,
    ) -> Result<Restaurant> {
        self.restaurants
            .update(id, input)
            .instrument(ctx.span("update_restaurant"))
            .await
            .map_err(|e| not_found_as(e, "Restaurant"))
    }

    /// Add a dish to a restaurant's menu.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the restaurant does not exist.
    #[instrument(skip(self, ctx, input), fields(restaurant_id = %restaurant_id))]
    pub async fn add_menu_item(
        &self,
        ctx: &RequestContext,
        restaurant_id: RestaurantId,
        input: &MenuItemInput,
    ) -> Result<MenuItem> {
        async {
            let item = self
                .restaurants
                .add_menu_item(restaurant_id, input)
                .await
                .map_err(|e| not_found_as(e, "Restaurant"))?;
            tracing::info!(menu_item_id = %item.id, price = %item.price, "Added menu item");
            Ok(item)
        }
        .instrument(ctx.span("add_menu_item"))
        .await
    }

    /// Edit a dish. Archived dishes cannot be edited.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the dish is not on the menu.
    #[instrument(
        skip(self, ctx, input),
        fields(restaurant_id = %restaurant_id, menu_item_id = %item_id)
    )]
    pub async fn update_menu_item(
        &self,
        ctx: &RequestContext,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
        input: &MenuItemInput,
    ) -> Result<MenuItem> {
        self.restaurants
            .update_menu_item(restaurant_id, item_id, input)
            .instrument(ctx.span("update_menu_item"))
            .await
            .map_err(|e| not_found_as(e, "Menu item"))
    }

    /// Take a dish off the menu.
    ///
    /// The row is kept so past orders still resolve.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the dish is not on the menu.
    #[instrument(skip(self, ctx), fields(restaurant_id = %restaurant_id, menu_item_id = %item_id))]
    pub async fn remove_menu_item(
        &self,
        ctx: &RequestContext,
        restaurant_id: RestaurantId,
        item_id: MenuItemId,
    ) -> Result<()> {
        async {
            self.restaurants
                .archive_menu_item(restaurant_id, item_id, ctx.now)
                .await
                .map_err(|e| not_found_as(e, "Menu item"))?;
            tracing::info!("Archived menu item");
            Ok(())
        }
        .instrument(ctx.span("remove_menu_item"))
        .await
    }
}

fn not_found_as(err: RepositoryError, what: &str) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(what.to_string()),
        other => AppError::Repository(other),
    }
}
