//! Coupon repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use dineease_core::{CouponCode, CouponId};

use super::RepositoryError;
use crate::models::coupon::{Coupon, NewCoupon};

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: CouponCode,
    discount_percentage: i16,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_percentage = u8::try_from(row.discount_percentage)
            .ok()
            .filter(|p| (1..=100).contains(p))
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid discount percentage in database: {}",
                    row.discount_percentage
                ))
            })?;

        Ok(Self {
            id: CouponId::new(row.id),
            code: row.code,
            discount_percentage,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const COUPON_COLUMNS: &str =
    "id, code, discount_percentage, valid_from, valid_to, is_active, created_at";

/// Repository for coupons.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already taken.
    pub async fn create(&self, coupon: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            INSERT INTO coupons (code, discount_percentage, valid_from, valid_to, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(&coupon.code)
        .bind(i16::from(coupon.discount_percentage))
        .bind(coupon.valid_from)
        .bind(coupon.valid_to)
        .bind(coupon.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let message = format!("coupon code {} already exists", coupon.code);
            RepositoryError::conflict_on_unique(e, message)
        })?;

        row.try_into()
    }

    /// Look up a coupon by its (normalized) code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_code(&mut conn, code).await
    }

    /// Look up a coupon by code on an existing connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(
        conn: &mut PgConnection,
        code: &CouponCode,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Every coupon, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Switch a coupon on or off.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this ID.
    pub async fn set_active(&self, id: CouponId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE coupons SET is_active = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(active)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
