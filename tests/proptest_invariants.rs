//! Property-based tests for the universal invariants in the clearing core's
//! design notes: volume maximality, price feasibility, range endpoints,
//! single-price/range agreement, no-match agreement, zero-volume
//! idempotence, and the monotonicity of non-match.
//!
//! Books are generated already sorted (asks ascending, bids descending)
//! since that ordering is the core's documented input contract, not
//! something it's responsible for establishing itself.

use callauction_core::{clear, clear_range, domains::f64_less, Order};
use proptest::prelude::*;

/// A sorted ask ladder: strictly non-descending prices, arbitrary volumes.
fn ask_book() -> impl Strategy<Value = Vec<Order<f64, u64>>> {
    prop::collection::vec((1.0f64..1000.0, 0u64..50), 0..12).prop_map(|mut rows| {
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        rows.into_iter().map(|(p, v)| Order::new(p, v)).collect()
    })
}

/// A sorted bid ladder: strictly non-ascending prices, arbitrary volumes.
fn bid_book() -> impl Strategy<Value = Vec<Order<f64, u64>>> {
    prop::collection::vec((1.0f64..1000.0, 0u64..50), 0..12).prop_map(|mut rows| {
        rows.sort_by(|a, b| b.0.total_cmp(&a.0));
        rows.into_iter().map(|(p, v)| Order::new(p, v)).collect()
    })
}

fn cumulative_ask_at_or_below(asks: &[Order<f64, u64>], p: f64) -> u64 {
    asks.iter()
        .filter(|o| !f64_less(&p, &o.price))
        .map(|o| o.volume)
        .sum()
}

fn cumulative_bid_at_or_above(bids: &[Order<f64, u64>], p: f64) -> u64 {
    bids.iter()
        .filter(|o| !f64_less(&o.price, &p))
        .map(|o| o.volume)
        .sum()
}

proptest! {
    /// No-match agreement (invariant 5) and single-price consistency
    /// (invariant 4): `clear` and `clear_range` must always agree on
    /// whether there's a match, on volume, and the single price must fall
    /// within the returned range.
    #[test]
    fn clear_and_clear_range_agree(asks in ask_book(), bids in bid_book()) {
        let price = clear(asks.clone().into_iter(), bids.clone().into_iter(), f64_less);
        let range = clear_range(asks.into_iter(), bids.into_iter(), f64_less);

        prop_assert_eq!(price.is_some(), range.is_some());
        if let (Some((p, v1)), Some(r)) = (price, range) {
            prop_assert_eq!(v1, r.volume);
            let (low, high) = r.range;
            prop_assert!(!f64_less(&p, &low));
            prop_assert!(!f64_less(&high, &p));
            // Range endpoints (invariant 3): low must not exceed high.
            prop_assert!(!f64_less(&high, &low));
        }
    }

    /// Price feasibility (invariant 2): at the clearing price, the smaller
    /// of the two cumulative volumes equals the reported matched volume.
    #[test]
    fn clearing_price_is_feasible(asks in ask_book(), bids in bid_book()) {
        if let Some((p, v)) = clear(asks.clone().into_iter(), bids.clone().into_iter(), f64_less) {
            let a = cumulative_ask_at_or_below(&asks, p);
            let b = cumulative_bid_at_or_above(&bids, p);
            prop_assert_eq!(a.min(b), v);
        }
    }

    /// Volume maximality (invariant 1): no feasible price in either book
    /// clears more volume than what `clear` reports (checked against every
    /// ask/bid price actually present, which brackets the true optimum).
    #[test]
    fn volume_is_maximal_among_candidate_prices(asks in ask_book(), bids in bid_book()) {
        let best = clear(asks.clone().into_iter(), bids.clone().into_iter(), f64_less)
            .map(|(_, v)| v)
            .unwrap_or(0);

        let mut candidates: Vec<f64> = asks.iter().map(|o| o.price).collect();
        candidates.extend(bids.iter().map(|o| o.price));

        for p in candidates {
            let a = cumulative_ask_at_or_below(&asks, p);
            let b = cumulative_bid_at_or_above(&bids, p);
            prop_assert!(a.min(b) <= best);
        }
    }

    /// Monotonicity of non-match (invariant 7): if every bid is strictly
    /// below every ask, there must be no match.
    #[test]
    fn disjoint_books_never_match(asks in ask_book(), bids in bid_book()) {
        let lowest_ask = asks.iter().map(|o| o.price).fold(f64::INFINITY, f64::min);
        let highest_bid = bids.iter().map(|o| o.price).fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(!asks.is_empty() && !bids.is_empty());
        prop_assume!(f64_less(&highest_bid, &lowest_ask));

        let result = clear(asks.into_iter(), bids.into_iter(), f64_less);
        prop_assert_eq!(result, None);
    }

    /// Zero-volume idempotence (invariant 6): splicing a zero-volume order
    /// into either ladder (preserving sort order) must not change the
    /// matched volume.
    #[test]
    fn zero_volume_insertion_preserves_matched_volume(
        asks in ask_book(),
        bids in bid_book(),
        extra_price in 1.0f64..1000.0,
    ) {
        let before = clear(asks.clone().into_iter(), bids.clone().into_iter(), f64_less)
            .map(|(_, v)| v);

        let mut widened_asks = asks.clone();
        widened_asks.push(Order::new(extra_price, 0));
        widened_asks.sort_by(|a, b| a.price.total_cmp(&b.price));

        let after = clear(widened_asks.into_iter(), bids.into_iter(), f64_less)
            .map(|(_, v)| v);

        prop_assert_eq!(before, after);
    }
}

/// Iterator thrift (invariant 8): the walk must not pull more than one
/// extra element past what it needs from either side. A plain counting
/// wrapper over a fixed book is enough to catch a regression that, say,
/// re-reads the current element or peeks ahead speculatively.
#[test]
fn walk_pulls_each_element_at_most_once() {
    use std::cell::Cell;

    struct Counting<I> {
        inner: I,
        pulls: std::rc::Rc<Cell<usize>>,
    }

    impl<I: Iterator> Iterator for Counting<I> {
        type Item = I::Item;
        fn next(&mut self) -> Option<Self::Item> {
            self.pulls.set(self.pulls.get() + 1);
            self.inner.next()
        }
    }

    let asks = vec![Order::new(5.0, 10u64), Order::new(15.0, 10), Order::new(25.0, 10)];
    let bids = vec![Order::new(30.0, 15u64), Order::new(20.0, 10), Order::new(10.0, 10)];

    let ask_pulls = std::rc::Rc::new(Cell::new(0));
    let bid_pulls = std::rc::Rc::new(Cell::new(0));

    let counted_asks = Counting {
        inner: asks.clone().into_iter(),
        pulls: ask_pulls.clone(),
    };
    let counted_bids = Counting {
        inner: bids.clone().into_iter(),
        pulls: bid_pulls.clone(),
    };

    let result = clear(counted_asks, counted_bids, f64_less);
    assert_eq!(result, Some((20.0, 20)));
    assert!(ask_pulls.get() <= asks.len());
    assert!(bid_pulls.get() <= bids.len());
}
