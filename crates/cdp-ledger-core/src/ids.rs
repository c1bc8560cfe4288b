//! Identifier types for cdp-ledger.
//!
//! Every table uses a serial integer primary key. Each key gets its own
//! newtype so a post id can never be passed where a payback sequence number
//! is expected.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro reduces boilerplate for the serial identifier
//! types, ensuring consistent implementation of serialization, parsing, and
//! display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input was not a base-10 integer.
    #[error("invalid identifier: expected an integer")]
    NotAnInteger,

    /// Serial identifiers start at 1.
    #[error("invalid identifier: must be positive")]
    NotPositive,
}

/// Macro to define a serial identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `i32` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as a bare integer)
/// - `FromStr`, `Display`, `Debug`
/// - `From<i32>`, `From<$name> for i32`
///
/// # Example
///
/// ```ignore
/// int_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::new(7);
/// let parsed: MyId = "7".parse().unwrap();
/// ```
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database key.
            #[must_use]
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            /// Return the raw database key.
            #[must_use]
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: i32 = s.trim().parse().map_err(|_| IdError::NotAnInteger)?;
                if raw < 1 {
                    return Err(IdError::NotPositive);
                }
                Ok(Self(raw))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(raw: i32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id_type!(UserId, "A user identifier (`users.id`).");
int_id_type!(PostId, "A post identifier (`posts.id`).");
int_id_type!(
    DepositId,
    "A deposit sequence number (`cdp.stt`).\n\nDeposits are addressed by their sequence number, never by code."
);
int_id_type!(PaybackId, "A payback sequence number (`cdp_payback.stt`).");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: PaybackId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "PaybackId(42)");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("abc".parse::<UserId>(), Err(IdError::NotAnInteger));
        assert_eq!("0".parse::<UserId>(), Err(IdError::NotPositive));
        assert_eq!("-3".parse::<PostId>(), Err(IdError::NotPositive));
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&DepositId::new(9)).unwrap();
        assert_eq!(json, "9");

        let back: DepositId = serde_json::from_str("9").unwrap();
        assert_eq!(back, DepositId::new(9));
    }
}
