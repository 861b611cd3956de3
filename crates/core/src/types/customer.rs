//! Who an order belongs to: a registered user or an anonymous guest.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Opaque identifier for a guest (not signed in) customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Generate a fresh guest identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one stored in a cookie or row).
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The owner of an order or review.
///
/// Exactly one of user or guest; the two can never both be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Customer {
    /// A signed-in user.
    User(UserId),
    /// An anonymous visitor.
    Guest(GuestId),
}

impl Customer {
    /// Resolve the customer for a request: the signed-in user if present,
    /// otherwise a newly generated guest.
    #[must_use]
    pub fn from_session(user: Option<UserId>) -> Self {
        user.map_or_else(|| Self::Guest(GuestId::generate()), Self::User)
    }

    /// Rebuild a customer from the nullable storage columns.
    ///
    /// Returns `None` unless exactly one side is present.
    #[must_use]
    pub const fn from_parts(user: Option<UserId>, guest: Option<GuestId>) -> Option<Self> {
        match (user, guest) {
            (Some(user), None) => Some(Self::User(user)),
            (None, Some(guest)) => Some(Self::Guest(guest)),
            _ => None,
        }
    }

    /// The user id, if this is a signed-in customer.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// The guest id, if this is an anonymous customer.
    #[must_use]
    pub const fn guest_id(&self) -> Option<GuestId> {
        match self {
            Self::User(_) => None,
            Self::Guest(id) => Some(*id),
        }
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Guest(_) => write!(f, "Guest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_prefers_user() {
        let customer = Customer::from_session(Some(UserId::new(9)));
        assert_eq!(customer, Customer::User(UserId::new(9)));
        assert_eq!(customer.guest_id(), None);
    }

    #[test]
    fn test_from_session_generates_guest() {
        let a = Customer::from_session(None);
        let b = Customer::from_session(None);
        assert!(a.guest_id().is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_parts_requires_exactly_one() {
        let guest = GuestId::generate();
        assert_eq!(
            Customer::from_parts(None, Some(guest)),
            Some(Customer::Guest(guest))
        );
        assert_eq!(
            Customer::from_parts(Some(UserId::new(1)), None),
            Some(Customer::User(UserId::new(1)))
        );
        assert_eq!(Customer::from_parts(None, None), None);
        assert_eq!(Customer::from_parts(Some(UserId::new(1)), Some(guest)), None);
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&Customer::User(UserId::new(4))).expect("serialize");
        assert_eq!(json, r#"{"kind":"user","id":4}"#);
    }
}
