//! Business logic services.
//!
//! # Services
//!
//! - `catalog` - Restaurants and menus
//! - `orders` - Placing orders and moving them through the kitchen
//! - `coupons` - Creating coupons and applying them to pending orders
//! - `reviews` - Reviews of completed orders
//! - `reporting` - Owner dashboard
//! - `ratings` - Table-side emotion ratings, backed by `emotion`

pub mod catalog;
pub mod coupons;
pub mod emotion;
pub mod orders;
pub mod ratings;
pub mod reporting;
pub mod reviews;

pub use catalog::CatalogService;
pub use coupons::CouponService;
pub use emotion::{
    EmotionError, EmotionReading, FaceDetector, FaceRegion, FixedRegions, SeetaFaceDetector,
    WholeFrame,
};
pub use orders::OrderService;
pub use ratings::RatingService;
pub use reporting::{DashboardReport, ReportingService, RestaurantDashboard};
pub use reviews::ReviewService;
