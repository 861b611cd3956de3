//! Request-scoped context passed into every service call.
//!
//! Replaces process-global request state: the caller builds one
//! [`RequestContext`] per request and each service call runs inside its
//! [`span`](RequestContext::span), so every log line carries the request ID
//! and the acting customer.

use chrono::{DateTime, Utc};
use tracing::Span;
use uuid::Uuid;

use dineease_core::{Customer, UserId};

/// Who is acting, under which request ID, and at what time.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation ID (from an upstream header, or freshly generated).
    pub request_id: String,
    /// The signed-in user or guest making the request.
    pub customer: Customer,
    /// Time the request is evaluated at.
    pub now: DateTime<Utc>,
}

impl RequestContext {
    /// Context for `customer` with a new request ID and the current time.
    #[must_use]
    pub fn new(customer: Customer) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            customer,
            now: Utc::now(),
        }
    }

    /// Context for a signed-in user, or a fresh guest when `user` is `None`.
    #[must_use]
    pub fn from_session(user: Option<UserId>) -> Self {
        Self::new(Customer::from_session(user))
    }

    /// Reuse an upstream request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Pin the clock, for coupon windows and daily reports.
    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Span wrapping one service operation.
    #[must_use]
    pub fn span(&self, operation: &'static str) -> Span {
        tracing::info_span!(
            "request",
            operation,
            request_id = %self.request_id,
            customer = %self.customer,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestContext::from_session(None);
        let b = RequestContext::from_session(None);
        assert_ne!(a.request_id, b.request_id);
        assert!(a.customer.guest_id().is_some());
    }

    #[test]
    fn test_builders() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
        let ctx = RequestContext::from_session(Some(UserId::new(7)))
            .with_request_id("req-1")
            .with_clock(at);
        assert_eq!(ctx.request_id, "req-1");
        assert_eq!(ctx.now, at);
        assert_eq!(ctx.customer, Customer::User(UserId::new(7)));
    }
}
