//! # Value Objects
//!
//! Identifiers, amounts and the small state enums shared by the resolver,
//! the enricher and the confirmation deriver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Blue score: DAG-ordering height used to measure confirmation depth.
pub type BlueScore = u64;

/// Chain tip value meaning "not yet known".
pub const UNKNOWN_BLUE_SCORE: BlueScore = 0;

/// Confirmation depth at which the count collapses into "confirmed".
pub const CONFIRMED_THRESHOLD: u64 = 86_400;

/// Base units in one display unit.
pub const BASE_UNITS_PER_COIN: u64 = 100_000_000;

/// Opaque, content-addressed transaction identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a raw identifier. Surrounding whitespace is stripped.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(id.trim().to_string())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monetary amount in base units.
///
/// Display conversion divides by [`BASE_UNITS_PER_COIN`] using integer
/// arithmetic only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Create from base units.
    pub const fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    /// Amount in base units.
    pub const fn base_units(&self) -> u64 {
        self.0
    }

    /// Whole display units (truncated).
    pub const fn whole_units(&self) -> u64 {
        self.0 / BASE_UNITS_PER_COIN
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / BASE_UNITS_PER_COIN;
        let frac = self.0 % BASE_UNITS_PER_COIN;
        if frac == 0 {
            return write!(f, "{}.0", whole);
        }
        let digits = format!("{:08}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Display-ready confirmation state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationStatus {
    /// Transaction was accepted by an accepting block.
    pub accepted: bool,
    /// Confirmation count, only while below the confirmed threshold.
    pub confirmations: Option<u64>,
    /// Depth reached the confirmed threshold.
    pub confirmed: bool,
}

impl ConfirmationStatus {
    /// Status of a transaction that is not accepted.
    pub const fn not_accepted() -> Self {
        Self {
            accepted: false,
            confirmations: None,
            confirmed: false,
        }
    }

    /// Accepted, but depth cannot be shown (tip unknown or stale).
    pub const fn accepted_unknown_depth() -> Self {
        Self {
            accepted: true,
            confirmations: None,
            confirmed: false,
        }
    }
}

/// Where a load currently stands.
///
/// `Idle → Fetching → {Resolved | NotFound(n) → Fetching | PermanentlyNotFound | Failed}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ResolutionPhase {
    /// No identifier loaded yet.
    #[default]
    Idle,
    /// Fetch in flight.
    Fetching {
        /// 1-based attempt number
        attempt: u32,
    },
    /// Transaction stored.
    Resolved,
    /// Indexer lag; a retry is scheduled.
    NotFound {
        /// Not-found outcomes so far
        attempts: u32,
    },
    /// Retry bound exhausted. Terminal.
    PermanentlyNotFound {
        /// Not-found outcomes observed
        attempts: u32,
    },
    /// Hard fetch failure. Terminal.
    Failed {
        /// Error message
        reason: String,
    },
}

impl ResolutionPhase {
    /// True while the presentation surface should show a loading indicator.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Idle | Self::Fetching { .. } | Self::NotFound { .. })
    }

    /// True once no further fetches will happen for this load.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::PermanentlyNotFound { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_trims() {
        let id = TransactionId::new("  abc \n");
        assert_eq!(id.as_str(), "abc");
        assert!(TransactionId::new("   ").is_empty());
    }

    #[test]
    fn test_amount_display_whole() {
        assert_eq!(Amount::from_base_units(500_000_000).to_string(), "5.0");
        assert_eq!(Amount::ZERO.to_string(), "0.0");
    }

    #[test]
    fn test_amount_display_fraction() {
        assert_eq!(Amount::from_base_units(150_000_000).to_string(), "1.5");
        assert_eq!(Amount::from_base_units(1).to_string(), "0.00000001");
        assert_eq!(Amount::from_base_units(123_456_789_012).to_string(), "1234.56789012");
    }

    #[test]
    fn test_amount_display_max_is_exact() {
        // u64::MAX is not representable in an f64; integer formatting keeps every digit.
        assert_eq!(Amount::from_base_units(u64::MAX).to_string(), "184467440737.09551615");
    }

    #[test]
    fn test_amount_checked_add_overflow() {
        let max = Amount::from_base_units(u64::MAX);
        assert!(max.checked_add(Amount::from_base_units(1)).is_none());
        assert_eq!(
            Amount::from_base_units(2).checked_add(Amount::from_base_units(3)),
            Some(Amount::from_base_units(5))
        );
    }

    #[test]
    fn test_phase_loading_and_terminal() {
        assert!(ResolutionPhase::Idle.is_loading());
        assert!(ResolutionPhase::NotFound { attempts: 3 }.is_loading());
        assert!(!ResolutionPhase::PermanentlyNotFound { attempts: 10 }.is_loading());
        assert!(ResolutionPhase::PermanentlyNotFound { attempts: 10 }.is_terminal());
        assert!(!ResolutionPhase::Fetching { attempt: 1 }.is_terminal());
    }

    #[test]
    fn test_phase_serializes_tagged() {
        let json = serde_json::to_value(ResolutionPhase::NotFound { attempts: 2 }).unwrap();
        assert_eq!(json["phase"], "not_found");
        assert_eq!(json["attempts"], 2);
    }
}
