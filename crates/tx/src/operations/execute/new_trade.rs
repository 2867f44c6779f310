//! New Trade operation execution.
//!
//! A new trade moves value directly between two named parties at a fixed
//! price: the buyer delivers the selling asset ("sheep") and receives the
//! buying asset ("wheat"), the seller does the opposite. The traded quantity
//! is clamped to what every leg can actually send or receive, and an offer
//! record with a fresh id is stored for the trade.
//!
//! Pipeline: validate, resolve the four legs, compute the amounts, then apply
//! the four balance changes and store the offer inside one state scope.

use stellar_xdr::curr::{AccountId, Asset, OfferEntry, OfferEntryExt, OfferEntryFlags, Price};

use newtrade_common::asset::{asset_to_string, is_asset_valid};

use super::trade_capacity::{compute_trade_amounts, TradeAmounts, TradeCapacity};
use super::trust_resolver::resolve_legs;
use crate::metrics::MetricsSink;
use crate::operations::{OperationFrame, OperationType, Resolution};
use crate::result::{
    NewTradeResult, NewTradeResultCode, NewTradeSuccessResult, NewTradeSuccessResultOffer,
    OperationResult, TradeClaimAtom,
};
use crate::state::LedgerStateManager;
use crate::{Result, TxError};

/// Offer id of an offer that has not been stored yet.
pub const UNASSIGNED_OFFER_ID: i64 = 0;

/// A trade instruction between two named accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTradeOp {
    /// Asset the buyer gives up.
    pub selling: Asset,
    /// Asset the buyer acquires.
    pub buying: Asset,
    /// Requested quantity of `selling`.
    pub amount: i64,
    /// `n` units of `buying` per `d` units of `selling`.
    pub price: Price,
    pub buyer: AccountId,
    pub seller: AccountId,
}

/// Check the shape of a trade instruction without touching ledger state.
pub fn validate_new_trade(op: &NewTradeOp) -> std::result::Result<(), NewTradeResultCode> {
    if !is_asset_valid(&op.selling) || !is_asset_valid(&op.buying) {
        return Err(NewTradeResultCode::Malformed);
    }
    if op.selling == op.buying {
        return Err(NewTradeResultCode::Malformed);
    }
    if op.amount < 0 {
        return Err(NewTradeResultCode::Malformed);
    }
    if op.price.n <= 0 || op.price.d <= 0 {
        return Err(NewTradeResultCode::Malformed);
    }
    Ok(())
}

/// Build the offer record for a trade, with the id left unassigned.
pub fn build_offer(seller: &AccountId, op: &NewTradeOp, flags: u32) -> OfferEntry {
    OfferEntry {
        seller_id: seller.clone(),
        offer_id: UNASSIGNED_OFFER_ID,
        selling: op.selling.clone(),
        buying: op.buying.clone(),
        amount: op.amount,
        price: op.price.clone(),
        flags,
        ext: OfferEntryExt::V0,
    }
}

/// What a resolved trade will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewTradePlan {
    /// Zero amount: succeed without loading or storing anything.
    NoOp,
    /// Move `amounts` and store an offer.
    Trade {
        amounts: TradeAmounts,
        /// Buyer and seller are the same account; balances stay put.
        self_trade: bool,
    },
}

/// The new-trade operation bound to one instruction.
#[derive(Debug, Clone, Copy)]
pub struct NewTradeFrame<'a> {
    op: &'a NewTradeOp,
    passive: bool,
}

impl<'a> NewTradeFrame<'a> {
    pub fn new(op: &'a NewTradeOp) -> Self {
        Self { op, passive: false }
    }

    /// Mark the stored offer as passive.
    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    pub fn op(&self) -> &'a NewTradeOp {
        self.op
    }

    /// Flags of the stored offer.
    pub fn flags(&self) -> u32 {
        if self.passive {
            OfferEntryFlags::PassiveFlag as u32
        } else {
            0
        }
    }
}

impl OperationFrame for NewTradeFrame<'_> {
    type Plan = NewTradePlan;

    fn op_type(&self) -> OperationType {
        OperationType::NewTrade
    }

    fn check_valid(&self) -> std::result::Result<(), OperationResult> {
        validate_new_trade(self.op).map_err(failure)
    }

    fn resolve(
        &self,
        source: &AccountId,
        state: &LedgerStateManager,
    ) -> Result<Resolution<NewTradePlan>> {
        let op = self.op;
        if op.amount == 0 {
            tracing::debug!("Zero-amount trade, nothing to resolve");
            return Ok(Resolution::Ready(NewTradePlan::NoOp));
        }

        if !state.has_account(source) {
            return Err(TxError::SourceAccountNotFound);
        }
        let buyer = state
            .get_account(&op.buyer)
            .ok_or_else(|| TxError::AccountNotFound(format!("buyer {:?}", op.buyer)))?;
        let seller = state
            .get_account(&op.seller)
            .ok_or_else(|| TxError::AccountNotFound(format!("seller {:?}", op.seller)))?;

        let legs = match resolve_legs(state, buyer, seller, &op.selling, &op.buying) {
            Ok(legs) => legs,
            Err(code) => return Ok(Resolution::Rejected(failure(code))),
        };
        let capacity = TradeCapacity::from_legs(&legs);
        let amounts = match compute_trade_amounts(op.amount, &capacity, &op.price) {
            Ok(amounts) => amounts,
            Err(code) => return Ok(Resolution::Rejected(failure(code))),
        };

        Ok(Resolution::Ready(NewTradePlan::Trade {
            amounts,
            self_trade: op.buyer == op.seller,
        }))
    }

    fn execute(
        &self,
        source: &AccountId,
        plan: NewTradePlan,
        state: &mut LedgerStateManager,
    ) -> Result<OperationResult> {
        let op = self.op;
        let (amounts, self_trade) = match plan {
            NewTradePlan::NoOp => {
                return Ok(success(Vec::new(), NewTradeSuccessResultOffer::NoOffer));
            }
            NewTradePlan::Trade {
                amounts,
                self_trade,
            } => (amounts, self_trade),
        };

        if self_trade {
            tracing::debug!("Self-trade, balances unchanged");
        } else {
            let wheat = amounts.wheat_received;
            let sheep = amounts.sheep_sent;
            apply_leg(state, "buyer buying", &op.buyer, &op.buying, wheat);
            apply_leg(state, "buyer selling", &op.buyer, &op.selling, -sheep);
            apply_leg(state, "seller buying", &op.seller, &op.buying, -wheat);
            apply_leg(state, "seller selling", &op.seller, &op.selling, sheep);
        }

        let mut offer = build_offer(&op.seller, op, self.flags());
        offer.offer_id = state.next_id()?;
        state.create_offer(offer.clone());
        if !state.touch_account(source) {
            return Err(TxError::SourceAccountNotFound);
        }

        tracing::debug!(
            offer_id = offer.offer_id,
            sheep_sent = amounts.sheep_sent,
            wheat_received = amounts.wheat_received,
            self_trade,
            "Trade executed"
        );

        let claim = TradeClaimAtom {
            claimant: op.buyer.clone(),
            offer_id: offer.offer_id,
            asset_bought: op.buying.clone(),
            amount_bought: amounts.wheat_received,
            asset_sold: op.selling.clone(),
            amount_sold: amounts.sheep_sent,
        };
        Ok(success(vec![claim], NewTradeSuccessResultOffer::Created(offer)))
    }
}

/// Execute a NewTrade operation.
pub fn execute_new_trade(
    op: &NewTradeOp,
    source: &AccountId,
    state: &mut LedgerStateManager,
    metrics: &dyn MetricsSink,
) -> Result<OperationResult> {
    NewTradeFrame::new(op).apply(source, state, metrics)
}

/// Add `delta` to one leg's balance.
///
/// # Panics
///
/// Panics if the change would leave the balance out of bounds. Amounts are
/// clamped to every leg's capacity before this runs, so a failure here means
/// ledger state can no longer be trusted.
fn apply_leg(
    state: &mut LedgerStateManager,
    leg: &'static str,
    account_id: &AccountId,
    asset: &Asset,
    delta: i64,
) {
    let outcome = match asset {
        Asset::Native => state.add_account_balance(account_id, delta),
        _ => state.add_trustline_balance(account_id, asset, delta),
    };
    if let Err(err) = outcome {
        tracing::error!(
            leg,
            account = ?account_id,
            asset = %asset_to_string(asset),
            delta,
            error = %err,
            "Trade balance invariant violated"
        );
        panic!(
            "trade invariant violated on {} leg of {:?} ({}, delta {}): {}",
            leg,
            account_id,
            asset_to_string(asset),
            delta,
            err
        );
    }
}

fn failure(code: NewTradeResultCode) -> OperationResult {
    match NewTradeResult::from_failure_code(code) {
        Some(result) => result.into(),
        None => panic!("{} is not a failure code", code),
    }
}

fn success(
    offers_claimed: Vec<TradeClaimAtom>,
    offer: NewTradeSuccessResultOffer,
) -> OperationResult {
    NewTradeResult::Success(NewTradeSuccessResult {
        offers_claimed,
        offer,
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{CountingMetrics, NoopMetrics};
    use crate::test_utils::*;
    use stellar_xdr::curr::{AlphaNum4, AssetCode4};

    struct Market {
        state: LedgerStateManager,
        issuer: AccountId,
        buyer: AccountId,
        seller: AccountId,
        usd: Asset,
    }

    /// Buyer holds USD and wants XLM from the seller.
    fn market(buyer_usd: i64, buyer_limit: i64, seller_xlm: i64) -> Market {
        let mut state = LedgerStateManager::new(20, 1_000);
        let issuer = create_test_account_id(1);
        let buyer = create_test_account_id(2);
        let seller = create_test_account_id(3);
        let usd = create_asset("USD", &issuer);
        state.put_account(create_test_account(issuer.clone(), 10_000));
        state.put_account(create_test_account(buyer.clone(), 500));
        state.put_account(create_test_account(seller.clone(), seller_xlm));
        state.put_trustline(create_test_trustline(&buyer, &usd, buyer_usd, buyer_limit, true));
        state.put_trustline(create_test_trustline(&seller, &usd, 0, i64::MAX, true));
        Market {
            state,
            issuer,
            buyer,
            seller,
            usd,
        }
    }

    fn trade(m: &Market, amount: i64, n: i32, d: i32) -> NewTradeOp {
        NewTradeOp {
            selling: m.usd.clone(),
            buying: Asset::Native,
            amount,
            price: Price { n, d },
            buyer: m.buyer.clone(),
            seller: m.seller.clone(),
        }
    }

    fn code_of(result: &OperationResult) -> NewTradeResultCode {
        result.as_new_trade().unwrap().code()
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let m = market(100, 1_000, 100);
        assert_eq!(validate_new_trade(&trade(&m, 10, 1, 1)), Ok(()));

        let mut same = trade(&m, 10, 1, 1);
        same.buying = same.selling.clone();
        assert_eq!(validate_new_trade(&same), Err(NewTradeResultCode::Malformed));

        assert_eq!(
            validate_new_trade(&trade(&m, -1, 1, 1)),
            Err(NewTradeResultCode::Malformed)
        );
        assert_eq!(
            validate_new_trade(&trade(&m, 10, 0, 1)),
            Err(NewTradeResultCode::Malformed)
        );
        assert_eq!(
            validate_new_trade(&trade(&m, 10, 1, -3)),
            Err(NewTradeResultCode::Malformed)
        );

        let mut bad_code = trade(&m, 10, 1, 1);
        bad_code.selling = Asset::CreditAlphanum4(AlphaNum4 {
            asset_code: AssetCode4([0; 4]),
            issuer: m.issuer.clone(),
        });
        assert_eq!(
            validate_new_trade(&bad_code),
            Err(NewTradeResultCode::Malformed)
        );
    }

    #[test]
    fn test_build_offer_leaves_id_unassigned() {
        let m = market(100, 1_000, 100);
        let op = trade(&m, 42, 3, 2);
        let offer = build_offer(&m.seller, &op, 0);
        assert_eq!(offer.offer_id, UNASSIGNED_OFFER_ID);
        assert_eq!(offer.seller_id, m.seller);
        assert_eq!(offer.amount, 42);
        assert_eq!(offer.price, Price { n: 3, d: 2 });
        assert_eq!(offer.selling, m.usd);
        assert_eq!(offer.buying, Asset::Native);
    }

    #[test]
    fn test_trade_moves_four_balances() {
        let mut m = market(100, 1_000, 1_000);
        let op = trade(&m, 40, 2, 1);
        let source = m.buyer.clone();
        let result = execute_new_trade(&op, &source, &mut m.state, &NoopMetrics).unwrap();

        let success = result.as_new_trade().unwrap().success().unwrap();
        let claim = &success.offers_claimed[0];
        assert_eq!(claim.amount_sold, 40);
        assert_eq!(claim.amount_bought, 80);
        assert_eq!(claim.claimant, m.buyer);

        let usd = &m.usd;
        assert_eq!(m.state.get_trustline(&m.buyer, usd).unwrap().balance, 60);
        assert_eq!(m.state.get_trustline(&m.seller, usd).unwrap().balance, 40);
        assert_eq!(m.state.get_account(&m.buyer).unwrap().balance, 580);
        assert_eq!(m.state.get_account(&m.seller).unwrap().balance, 920);

        let offer = success.created_offer().unwrap();
        assert_eq!(offer.offer_id, 1_001);
        assert_eq!(claim.offer_id, offer.offer_id);
        assert_eq!(m.state.get_offer(&m.seller, 1_001), Some(offer));
    }

    #[test]
    fn test_trade_clamped_by_seller_funds() {
        let mut m = market(100, 1_000, 30);
        let op = trade(&m, 100, 1, 1);
        let source = m.buyer.clone();
        let result = execute_new_trade(&op, &source, &mut m.state, &NoopMetrics).unwrap();

        let claim = &result.as_new_trade().unwrap().success().unwrap().offers_claimed[0];
        assert_eq!(claim.amount_sold, 30);
        assert_eq!(claim.amount_bought, 30);
        assert_eq!(m.state.get_account(&m.seller).unwrap().balance, 0);
    }

    #[test]
    fn test_zero_amount_is_noop() {
        let mut m = market(100, 1_000, 100);
        let op = trade(&m, 0, 1, 1);
        let source = m.buyer.clone();
        let result = execute_new_trade(&op, &source, &mut m.state, &NoopMetrics).unwrap();

        let success = result.as_new_trade().unwrap().success().unwrap();
        assert!(success.offers_claimed.is_empty());
        assert_eq!(success.offer, NewTradeSuccessResultOffer::NoOffer);
        assert!(!m.state.has_changes());
        assert_eq!(m.state.id_pool(), 1_000);
    }

    #[test]
    fn test_unauthorized_selling_line() {
        let mut m = market(100, 1_000, 100);
        let mut tl = m.state.get_trustline(&m.buyer, &m.usd).unwrap().clone();
        tl.flags = 0;
        m.state.put_trustline(tl);

        let op = trade(&m, 10, 1, 1);
        let source = m.buyer.clone();
        let metrics = CountingMetrics::default();
        let result = execute_new_trade(&op, &source, &mut m.state, &metrics).unwrap();
        assert_eq!(code_of(&result), NewTradeResultCode::SellNotAuthorized);
        assert_eq!(metrics.count("op-new-trade.invalid.sell-not-authorized"), 1);
        assert!(!m.state.has_changes());
    }

    #[test]
    fn test_passive_flag_on_offer() {
        let mut m = market(100, 1_000, 100);
        let op = trade(&m, 10, 1, 1);
        let source = m.buyer.clone();
        let result = NewTradeFrame::new(&op)
            .passive()
            .apply(&source, &mut m.state, &NoopMetrics)
            .unwrap();
        let offer = result
            .as_new_trade()
            .unwrap()
            .success()
            .unwrap()
            .created_offer()
            .unwrap()
            .clone();
        assert_eq!(offer.flags, OfferEntryFlags::PassiveFlag as u32);
        assert_eq!(NewTradeFrame::new(&op).flags(), 0);
    }

    #[test]
    fn test_missing_buyer_is_an_error() {
        let mut m = market(100, 1_000, 100);
        let mut op = trade(&m, 10, 1, 1);
        op.buyer = create_test_account_id(9);
        let source = m.seller.clone();
        let err = execute_new_trade(&op, &source, &mut m.state, &NoopMetrics).unwrap_err();
        assert!(matches!(err, TxError::AccountNotFound(_)));
        assert!(!m.state.has_changes());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let mut m = market(100, 1_000, 100);
        let op = trade(&m, 10, 1, 1);
        let source = create_test_account_id(9);
        let err = execute_new_trade(&op, &source, &mut m.state, &NoopMetrics).unwrap_err();
        assert!(matches!(err, TxError::SourceAccountNotFound));
    }

    #[test]
    #[should_panic(expected = "trade invariant violated")]
    fn test_apply_leg_panics_out_of_bounds() {
        let mut m = market(100, 1_000, 100);
        let buyer = m.buyer.clone();
        let usd = m.usd.clone();
        apply_leg(&mut m.state, "buyer selling", &buyer, &usd, -101);
    }

    #[test]
    fn test_invariant_panic_inside_scope_rolls_back() {
        let mut m = market(100, 1_000, 100);
        let buyer = m.buyer.clone();
        let seller = m.seller.clone();
        let usd = m.usd.clone();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = m.state.begin_scope();
            scope.next_id().unwrap();
            scope.add_account_balance(&seller, 5).unwrap();
            scope.add_trustline_balance(&buyer, &usd, -40).unwrap();
            apply_leg(&mut scope, "buyer selling", &buyer, &usd, -101);
        }));

        assert!(outcome.is_err());
        assert_eq!(m.state.scope_depth(), 0);
        assert!(!m.state.has_changes());
        assert_eq!(m.state.id_pool(), 1_000);
        assert_eq!(m.state.get_account(&m.seller).unwrap().balance, 100);
        assert_eq!(m.state.get_trustline(&m.buyer, &m.usd).unwrap().balance, 100);
    }

    #[test]
    fn test_failure_keeps_code() {
        let result = failure(NewTradeResultCode::LineFull);
        assert_eq!(code_of(&result), NewTradeResultCode::LineFull);
        assert!(!result.is_success());
    }

    #[test]
    #[should_panic(expected = "is not a failure code")]
    fn test_failure_rejects_success_code() {
        failure(NewTradeResultCode::Success);
    }
}
