//! DineEase ordering library.
//!
//! Restaurants and menus, orders, coupons, reviews, owner reporting and
//! table-side ratings, backed by `PostgreSQL`.
//!
//! # Layers
//!
//! - [`models`] - Domain types and the pure rules over them
//! - [`forms`] - Input validation with per-field messages
//! - [`db`] - `sqlx` repositories and migrations
//! - [`services`] - Transactional operations, each run inside a
//!   [`RequestContext`] span
//! - [`config`] - Environment configuration
//! - [`error`] - [`AppError`] and user-facing messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod services;

pub use config::OrderingConfig;
pub use context::RequestContext;
pub use error::{AppError, Result};
