//! Capacity-bounded amounts for a trade.
//!
//! "Sheep" is the instruction's selling asset and "wheat" its buying asset.
//! A price `n/d` exchanges `n` wheat for every `d` sheep.
//!
//! The number of sheep that can move is bounded by every leg:
//!
//! ```text
//! S = buyer's sheep available          (sends sheep)
//! R = buyer's wheat receive capacity   (receives wheat)
//! W = seller's wheat available         (sends wheat)
//! C = seller's sheep receive capacity  (receives sheep)
//!
//! maxSellingAllowed = min(S, C, floor(R * d / n), floor(W * d / n))
//! sheepSent         = min(requested, maxSellingAllowed)
//! wheatReceived     = min(floor(requested * n / d), floor(maxSellingAllowed * n / d))
//! ```
//!
//! A wheat bound that overflows 64 bits is unbounded; a wheat amount that
//! overflows is zero. Both amounts are floor-rounded independently and
//! `wheatReceived` is never re-derived from `sheepSent`.

use stellar_xdr::curr::Price;

use newtrade_common::math::mul_div_floor;

use super::trust_resolver::{BalanceHolder, ResolvedLegs};
use crate::result::NewTradeResultCode;

/// Bound value used for "no bound".
pub const UNBOUNDED: i64 = i64::MAX;

/// Per-leg limits feeding the amount computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeCapacity {
    /// `S`: sheep the buyer can send.
    pub selling_available: i64,
    /// `R`: wheat the buyer can receive.
    pub buying_receivable: i64,
    /// Whether the buyer's wheat leg is a trust line (only those can be full).
    pub buying_is_trustline: bool,
    /// `W`: wheat the seller can send.
    pub counter_available: i64,
    /// `C`: sheep the seller can receive.
    pub counter_receivable: i64,
}

impl TradeCapacity {
    /// Read the limits off resolved legs.
    pub fn from_legs(legs: &ResolvedLegs<'_>) -> Self {
        Self {
            selling_available: legs.buyer_selling.available(),
            buying_receivable: legs.buyer_buying.receive_capacity(),
            buying_is_trustline: matches!(legs.buyer_buying, BalanceHolder::TrustLine(_)),
            counter_available: legs.seller_buying.available(),
            counter_receivable: legs.seller_selling.receive_capacity(),
        }
    }
}

/// Quantities a trade moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeAmounts {
    /// Sheep moved from buyer to seller.
    pub sheep_sent: i64,
    /// Wheat moved from seller to buyer.
    pub wheat_received: i64,
}

/// Sheep that `wheat` units of capacity allow: `floor(wheat * d / n)`.
///
/// Overflow means the bound exceeds any representable amount, so it is
/// reported as [`UNBOUNDED`].
pub fn selling_bound_for_wheat(wheat: i64, price: &Price) -> i64 {
    // Inputs are non-negative and d, n > 0, so overflow is the only failure.
    mul_div_floor(wheat.max(0), price.d as i64, price.n as i64).unwrap_or(UNBOUNDED)
}

/// Wheat exchanged for `sheep`: `floor(sheep * n / d)`, zero on overflow.
pub fn wheat_for_sheep(sheep: i64, price: &Price) -> i64 {
    mul_div_floor(sheep.max(0), price.n as i64, price.d as i64).unwrap_or(0)
}

/// Largest sheep amount every leg can absorb.
pub fn max_selling_allowed(capacity: &TradeCapacity, price: &Price) -> i64 {
    capacity
        .selling_available
        .min(capacity.counter_receivable)
        .min(selling_bound_for_wheat(capacity.buying_receivable, price))
        .min(selling_bound_for_wheat(capacity.counter_available, price))
}

/// Compute the amounts a trade of `requested` sheep at `price` moves.
///
/// Fails with [`NewTradeResultCode::LineFull`] when the buyer's wheat trust
/// line has no room at all.
pub fn compute_trade_amounts(
    requested: i64,
    capacity: &TradeCapacity,
    price: &Price,
) -> Result<TradeAmounts, NewTradeResultCode> {
    if capacity.buying_is_trustline && capacity.buying_receivable == 0 {
        return Err(NewTradeResultCode::LineFull);
    }

    let max_selling = max_selling_allowed(capacity, price);
    let sheep_sent = requested.max(0).min(max_selling);
    let wheat_received = wheat_for_sheep(requested, price).min(wheat_for_sheep(max_selling, price));

    tracing::trace!(
        requested,
        max_selling,
        sheep_sent,
        wheat_received,
        price_n = price.n,
        price_d = price.d,
        "Computed trade amounts"
    );

    Ok(TradeAmounts {
        sheep_sent,
        wheat_received,
    })
}
