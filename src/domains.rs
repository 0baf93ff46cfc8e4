//! Ready-made `less` comparators for common price domains.
//!
//! The clearing core takes an injected strict-less predicate and performs no
//! arithmetic on prices itself — see [`crate::clear`]. Any totally ordered
//! `P` works; these two cover the domains this crate's own tests exercise.

use rust_decimal::Decimal;

/// Strict-less for `f64`, via total ordering.
///
/// `f64`'s own `<` leaves `NaN` unordered and treats `-0.0`/`0.0` as equal,
/// which would violate the strict weak order the walk assumes; `total_cmp`
/// gives a consistent order for every bit pattern, including `±∞`.
#[must_use]
pub fn f64_less(a: &f64, b: &f64) -> bool {
    a.total_cmp(b) == std::cmp::Ordering::Less
}

/// Strict-less for [`Decimal`], which is already totally ordered.
#[must_use]
pub fn decimal_less(a: &Decimal, b: &Decimal) -> bool {
    a < b
}
