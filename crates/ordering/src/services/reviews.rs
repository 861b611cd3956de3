//! Review service.

use sqlx::PgPool;
use tracing::{Instrument, instrument};

use dineease_core::{OrderId, RestaurantId};

use crate::context::RequestContext;
use crate::db::{OrderRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::forms::ReviewInput;
use crate::models::review::{NewReview, Review};

/// Review service.
pub struct ReviewService<'a> {
    pool: &'a PgPool,
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Review a completed order on behalf of its customer.
    ///
    /// The review is stored and the order marked reviewed in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist and
    /// `AppError::Review` if the customer did not place it, it is not
    /// completed, it was already reviewed, or the text is too short.
    #[instrument(skip(self, ctx, input), fields(order_id = %order_id, rating = %input.rating))]
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        order_id: OrderId,
        input: &ReviewInput,
    ) -> Result<Review> {
        async {
            let mut tx = self.pool.begin().await?;
            let order = OrderRepository::lock(&mut *tx, order_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

            let new_review =
                NewReview::for_order(&order, &ctx.customer, input.rating, &input.body)?;
            let review = ReviewRepository::insert(&mut *tx, &new_review).await?;
            OrderRepository::mark_reviewed(&mut *tx, order.id).await?;
            tx.commit().await?;

            tracing::info!(review_id = %review.id, "Review submitted");
            Ok(review)
        }
        .instrument(ctx.span("submit_review"))
        .await
    }

    /// The review left on an order, if any.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn for_order(&self, order_id: OrderId) -> Result<Option<Review>> {
        Ok(self.reviews.get_for_order(order_id).await?)
    }

    /// Reviews of a restaurant, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list_for_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Review>> {
        Ok(self.reviews.list_for_restaurant(restaurant_id).await?)
    }
}
