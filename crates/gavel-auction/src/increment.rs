//! Bid increment schedule.
//!
//! The step between consecutive bids depends on the amount being raised:
//!
//! | reference amount   | step   |
//! |--------------------|--------|
//! | below 5 000        | 500    |
//! | below 10 000       | 1 000  |
//! | below 50 000       | 2 500  |
//! | below 100 000      | 5 000  |
//! | 100 000 and above  | 10 000 |
//!
//! The reference is the player's base price for an opening bid, otherwise
//! the last accepted amount. All functions here are pure.

use gavel_protocol::Lakhs;

/// Step applied on top of `amount`.
pub fn min_increment(amount: Lakhs) -> Lakhs {
    match amount {
        0..5_000 => 500,
        5_000..10_000 => 1_000,
        10_000..50_000 => 2_500,
        50_000..100_000 => 5_000,
        _ => 10_000,
    }
}

/// The only amount the next bid may carry.
///
/// With no bid yet this is `max(base, step(base))`, so a player whose base
/// price is below the first step opens at the step.
pub fn expected_next(last_bid: Option<Lakhs>, base_price: Lakhs) -> Lakhs {
    match last_bid {
        Some(last) => last.saturating_add(min_increment(last)),
        None => base_price.max(min_increment(base_price)),
    }
}

/// An opening bid must sit on the base price or on the step grid.
pub fn is_aligned_opening(amount: Lakhs, base_price: Lakhs) -> bool {
    amount == base_price || amount % min_increment(base_price) == 0
}
