//! Type-safe opaque identifiers.
//!
//! The backend hands out identifiers as strings. Each kind of identifier
//! gets its own newtype so an [`EventId`] can never be passed where a
//! [`UserId`] is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier string.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

opaque_id! {
    /// Identifier of an event.
    EventId
}

opaque_id! {
    /// Identifier of a user account.
    UserId
}

opaque_id! {
    /// Identifier of an uploaded media item.
    MediaId
}

opaque_id! {
    /// Identifier of a friendship row.
    FriendshipId
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_string() {
        let id = EventId::new("evt-42");
        assert_eq!(id.to_string(), "evt-42");
        assert_eq!(id.as_str(), "evt-42");
    }

    #[test]
    fn serializes_transparently() {
        let id = UserId::from("u-1");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"u-1\"");

        let Ok(back) = serde_json::from_str::<UserId>(&json) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, id);
    }

    #[test]
    fn hash_works_in_hashset() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(EventId::new("a"));
        set.insert(EventId::new("a"));
        set.insert(EventId::new("b"));
        assert_eq!(set.len(), 2);
    }
}
