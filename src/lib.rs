//! Volume-maximising uniform-price call auction clearing.
//!
//! This crate computes, from two presorted streams of limit orders, the
//! single price (or price range) that clears the maximum possible volume in
//! a uniform-price call auction. It is deliberately narrow: no order intake,
//! no persistence, no settlement, no notion of accounts or identity — just
//! the clearing arithmetic, generic over whatever price domain the caller
//! already uses.
//!
//! ```
//! use callauction_core::{clear, domains::f64_less, Order};
//!
//! let asks = vec![Order::new(10.0, 5u64), Order::new(20.0, 5)];
//! let bids = vec![Order::new(25.0, 5)];
//! assert_eq!(clear(asks.into_iter(), bids.into_iter(), f64_less), Some((10.0, 5)));
//! ```

pub mod clearing;
pub mod domains;
mod error;

pub use clearing::{clear, clear_range, try_clear, try_clear_range, ClearRange, Order, Volume};
pub use error::{ClearingError, Side};
