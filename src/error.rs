//! Error types for the debug-checked entry points.
//!
//! The clearing walk itself has exactly one failure modality — "no match" —
//! and that is an ordinary `None`, not an error (see the crate docs). The
//! only thing that can actually go wrong here is a caller handing in a
//! stream that doesn't respect its sort contract, which [`try_clear`] and
//! [`try_clear_range`] can optionally catch in debug builds.
//!
//! [`try_clear`]: crate::try_clear
//! [`try_clear_range`]: crate::try_clear_range

use thiserror::Error;

/// Which side of the book an ordering-contract violation was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The asks stream (must be non-descending by price).
    Ask,
    /// The bids stream (must be non-ascending by price).
    Bid,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ask => write!(f, "ASK"),
            Self::Bid => write!(f, "BID"),
        }
    }
}

/// Errors raised by [`crate::try_clear`] / [`crate::try_clear_range`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClearingError {
    /// OM_ERR_500: a stream was not sorted the way its side's contract requires.
    #[error("OM_ERR_500: {side} stream violates its ordering contract at position {position}")]
    OrderingViolation {
        /// Which stream broke its contract.
        side: Side,
        /// Zero-based pull index of the out-of-order element.
        position: usize,
    },
}
