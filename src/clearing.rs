//! The volume-maximising uniform-price clearing walk.
//!
//! [`clear`] and [`clear_range`] are the two public entry points. Both take
//! a presorted asks stream (non-descending by price), a presorted bids
//! stream (non-ascending by price), and a strict `less` predicate on the
//! price domain — see [`crate::domains`] for ready-made ones. Neither
//! function performs any arithmetic on prices; `less` is the only thing that
//! ever touches `P`.
//!
//! The walk itself ([`walk`]) is a single two-pointer pass: it admits bids
//! from the top of the book, admits asks from the bottom to keep
//! `ask_volume >= bid_volume`, and stops the moment either side runs dry or
//! the two sides stop crossing. It never re-visits an element and never
//! buffers a stream.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{ClearingError, Side};

/// A single resting limit order: a price paired with the volume offered at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order<P, V> {
    pub price: P,
    pub volume: V,
}

impl<P, V> Order<P, V> {
    /// Create an order from its price and volume.
    pub fn new(price: P, volume: V) -> Self {
        Self { price, volume }
    }
}

/// The price range over which the maximum matched volume is achievable,
/// returned by [`clear_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearRange<P, V> {
    /// `(low, high)`, both prices of orders admitted by the walk; `low` is
    /// the last admitted ask price, `high` the outermost bid price at which
    /// the maximum volume is still feasible.
    pub range: (P, P),
    /// The maximum matched volume, identical to what [`clear`] would return.
    pub volume: V,
}

/// A non-negative cumulative volume counter.
///
/// The walk never needs anything from `V` beyond a zero value, ordering, and
/// an overflow-checked sum, so this is deliberately narrower than pulling in
/// a numeric-traits crate for it. Implemented for the unsigned integer
/// widths a caller is likely to size an order book with.
pub trait Volume: Copy + Ord + std::fmt::Debug {
    /// The additive identity; also the volume of an order that cleared nothing.
    const ZERO: Self;

    /// Checked addition for the cumulative sums the walk maintains.
    ///
    /// `clear`/`clear_range` panic if this overflows — see the crate docs.
    fn checked_add(self, other: Self) -> Option<Self>;
}

macro_rules! impl_volume {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Volume for $t {
                const ZERO: Self = 0;

                fn checked_add(self, other: Self) -> Option<Self> {
                    <$t>::checked_add(self, other)
                }
            }
        )+
    };
}

impl_volume!(u8, u16, u32, u64, u128, usize);

/// Terminal state of the walk, from which both result forms are derived.
struct Terminal<P, V> {
    /// Price of the last admitted ask (the range's `low`).
    ask_price: P,
    /// Price of the last admitted bid, full stop (used by [`clear`]).
    bid_price: P,
    /// Price of the last bid whose admission was actually re-covered by a
    /// following ask, used as the range's `high` — see the module docs on
    /// [`walk`] for why this differs from `bid_price`.
    bid_price_range: P,
    ask_volume: V,
    bid_volume: V,
}

impl<P, V: Volume> Terminal<P, V> {
    fn volume(&self) -> V {
        self.ask_volume.min(self.bid_volume)
    }
}

/// Run the two-pointer clearing walk to its terminal state.
///
/// ## Why `bid_price` and `bid_price_range` differ
///
/// Every admitted bid updates `bid_price` unconditionally — it is simply
/// "the last bid we admitted". `bid_price_range` is more selective: a bid
/// that arrives while `ask_volume == bid_volume` (the book is momentarily
/// balanced) only becomes part of the clearing range if the following asks
/// actually restore the invariant before the asks run out. If they don't —
/// the walk terminates on exhaustion or a price miss before `ask_volume`
/// catches back up — that bid doesn't count as covered, and
/// `bid_price_range` keeps whatever the previous covered bid left it at. A
/// bid admitted while `ask_volume > bid_volume` (strictly ahead) is covered
/// independently of anything that follows, so it updates `bid_price_range`
/// immediately. This is what makes the returned range the *outermost*
/// prices at which the maximum volume is feasible, rather than just the
/// last prices touched.
fn walk<P, V, L>(
    mut asks: impl Iterator<Item = Order<P, V>>,
    mut bids: impl Iterator<Item = Order<P, V>>,
    less: &L,
) -> Option<Terminal<P, V>>
where
    P: Clone + std::fmt::Debug,
    V: Volume,
    L: Fn(&P, &P) -> bool,
{
    let Some(first_ask) = asks.next() else {
        tracing::trace!("walk: asks stream empty, no match");
        return None;
    };
    let mut ask_price = first_ask.price;
    let mut ask_volume = first_ask.volume;
    let mut bid_volume = V::ZERO;
    let mut bid_price: Option<P> = None;
    let mut bid_price_range: Option<P> = None;
    tracing::trace!(ask_price = ?ask_price, ask_volume = ?ask_volume, "walk: first ask admitted");

    loop {
        let Some(bid) = bids.next() else {
            tracing::debug!("walk: bids exhausted, terminating");
            break;
        };
        if less(&bid.price, &ask_price) {
            tracing::debug!(
                bid_price = ?bid.price,
                ask_price = ?ask_price,
                "walk: bid below ask frontier, terminating"
            );
            break;
        }

        let strict_before = ask_volume > bid_volume;
        bid_volume = bid_volume
            .checked_add(bid.volume)
            .expect("cumulative bid volume overflow");
        bid_price = Some(bid.price.clone());
        if strict_before {
            bid_price_range = Some(bid.price.clone());
        }
        tracing::trace!(
            bid_price = ?bid.price,
            bid_volume = ?bid_volume,
            ask_volume = ?ask_volume,
            "walk: bid admitted"
        );

        let mut covered = true;
        while ask_volume < bid_volume {
            let Some(ask) = asks.next() else {
                tracing::debug!("walk: asks exhausted while covering bid, terminating");
                covered = false;
                break;
            };
            if less(&bid.price, &ask.price) {
                tracing::debug!(
                    ask_price = ?ask.price,
                    bid_price = ?bid.price,
                    "walk: ask above admitting bid, terminating"
                );
                covered = false;
                break;
            }
            ask_price = ask.price;
            ask_volume = ask_volume
                .checked_add(ask.volume)
                .expect("cumulative ask volume overflow");
            tracing::trace!(
                ask_price = ?ask_price,
                ask_volume = ?ask_volume,
                bid_volume = ?bid_volume,
                "walk: ask admitted"
            );
        }
        if !covered {
            break;
        }

        if !strict_before {
            bid_price_range = Some(bid.price.clone());
        }
    }

    let terminal = Terminal {
        ask_price,
        bid_price: bid_price?,
        bid_price_range: bid_price_range?,
        ask_volume,
        bid_volume,
    };
    if terminal.volume() == V::ZERO {
        tracing::debug!("walk: terminal volume is zero, no match");
        return None;
    }
    Some(terminal)
}

/// Compute the single clearing price that maximises matched volume.
///
/// `asks` must be non-descending by price and `bids` non-ascending; `less`
/// must be a strict weak order on the price domain consistent with that
/// sort. Violating the contract produces an undefined but still-terminating
/// result — use [`try_clear`] to catch it in debug builds.
///
/// Returns `None` if no positive volume can clear. Otherwise returns the
/// clearing price and the matched volume, which is always at least `1`.
#[must_use]
pub fn clear<P, V, L>(
    asks: impl Iterator<Item = Order<P, V>>,
    bids: impl Iterator<Item = Order<P, V>>,
    less: L,
) -> Option<(P, V)>
where
    P: Clone + std::fmt::Debug,
    V: Volume,
    L: Fn(&P, &P) -> bool,
{
    let Some(terminal) = walk(asks, bids, &less) else {
        tracing::info!(matched = false, "clear: no match");
        return None;
    };
    let volume = terminal.volume();
    let price = if terminal.bid_volume > terminal.ask_volume {
        terminal.bid_price
    } else {
        terminal.ask_price
    };
    tracing::info!(
        matched = true,
        price = ?price,
        volume = ?volume,
        "clear: volume-maximising price found"
    );
    Some((price, volume))
}

/// Compute the full closed price range over which the maximum matched
/// volume is achievable, plus that volume.
///
/// Same input contract as [`clear`]; see [`try_clear_range`] for a
/// debug-checked variant. Returns `None` under the same conditions as
/// [`clear`].
#[must_use]
pub fn clear_range<P, V, L>(
    asks: impl Iterator<Item = Order<P, V>>,
    bids: impl Iterator<Item = Order<P, V>>,
    less: L,
) -> Option<ClearRange<P, V>>
where
    P: Clone + std::fmt::Debug,
    V: Volume,
    L: Fn(&P, &P) -> bool,
{
    let Some(terminal) = walk(asks, bids, &less) else {
        tracing::info!(matched = false, "clear_range: no match");
        return None;
    };
    let volume = terminal.volume();
    let range = (terminal.ask_price, terminal.bid_price_range);
    tracing::info!(
        matched = true,
        low = ?range.0,
        high = ?range.1,
        volume = ?volume,
        "clear_range: optimal range found"
    );
    Some(ClearRange { range, volume })
}

/// Wrap an asks stream so each pull is checked against the non-descending
/// contract, recording the first violation (if any) into `error`.
fn checked_asks<'a, P, V, L>(
    mut iter: impl Iterator<Item = Order<P, V>> + 'a,
    less: &'a L,
    error: Rc<Cell<Option<ClearingError>>>,
) -> impl Iterator<Item = Order<P, V>> + 'a
where
    P: Clone + 'a,
    V: 'a,
    L: Fn(&P, &P) -> bool,
{
    let mut prev: Option<P> = None;
    let mut position = 0usize;
    std::iter::from_fn(move || {
        let item = iter.next()?;
        if let Some(p) = &prev {
            if less(&item.price, p) && error.get().is_none() {
                error.set(Some(ClearingError::OrderingViolation {
                    side: Side::Ask,
                    position,
                }));
            }
        }
        prev = Some(item.price.clone());
        position += 1;
        Some(item)
    })
}

/// Wrap a bids stream so each pull is checked against the non-ascending
/// contract, recording the first violation (if any) into `error`.
fn checked_bids<'a, P, V, L>(
    mut iter: impl Iterator<Item = Order<P, V>> + 'a,
    less: &'a L,
    error: Rc<Cell<Option<ClearingError>>>,
) -> impl Iterator<Item = Order<P, V>> + 'a
where
    P: Clone + 'a,
    V: 'a,
    L: Fn(&P, &P) -> bool,
{
    let mut prev: Option<P> = None;
    let mut position = 0usize;
    std::iter::from_fn(move || {
        let item = iter.next()?;
        if let Some(p) = &prev {
            if less(p, &item.price) && error.get().is_none() {
                error.set(Some(ClearingError::OrderingViolation {
                    side: Side::Bid,
                    position,
                }));
            }
        }
        prev = Some(item.price.clone());
        position += 1;
        Some(item)
    })
}

/// [`clear`], with the ordering contract checked as each element is pulled.
///
/// The check only covers elements the walk actually visits — if the walk
/// stops early (it always stops at the first sign the two sides no longer
/// cross), whatever comes after in either stream is never inspected. That's
/// consistent with the core's single-pass, no-buffering guarantee: this is
/// a pull-synchronized assertion, not a full pre-validation.
///
/// In release builds (`debug_assertions` off) this is exactly `clear`
/// wrapped in `Ok`, at no extra cost.
pub fn try_clear<P, V, L>(
    asks: impl Iterator<Item = Order<P, V>>,
    bids: impl Iterator<Item = Order<P, V>>,
    less: L,
) -> Result<Option<(P, V)>, ClearingError>
where
    P: Clone + std::fmt::Debug,
    V: Volume,
    L: Fn(&P, &P) -> bool,
{
    #[cfg(debug_assertions)]
    {
        let error = Rc::new(Cell::new(None));
        let asks = checked_asks(asks, &less, Rc::clone(&error));
        let bids = checked_bids(bids, &less, Rc::clone(&error));
        let result = clear(asks, bids, &less);
        match error.get() {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }
    #[cfg(not(debug_assertions))]
    {
        Ok(clear(asks, bids, less))
    }
}

/// [`clear_range`], with the ordering contract checked as each element is
/// pulled. See [`try_clear`] for what "checked" means here.
pub fn try_clear_range<P, V, L>(
    asks: impl Iterator<Item = Order<P, V>>,
    bids: impl Iterator<Item = Order<P, V>>,
    less: L,
) -> Result<Option<ClearRange<P, V>>, ClearingError>
where
    P: Clone + std::fmt::Debug,
    V: Volume,
    L: Fn(&P, &P) -> bool,
{
    #[cfg(debug_assertions)]
    {
        let error = Rc::new(Cell::new(None));
        let asks = checked_asks(asks, &less, Rc::clone(&error));
        let bids = checked_bids(bids, &less, Rc::clone(&error));
        let result = clear_range(asks, bids, &less);
        match error.get() {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }
    #[cfg(not(debug_assertions))]
    {
        Ok(clear_range(asks, bids, less))
    }
}
