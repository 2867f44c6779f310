//! Execution of the new-trade ledger operation.
//!
//! A new trade exchanges two assets directly between a named buyer and a
//! named seller at a fixed price. Execution is deterministic: every validating
//! node that applies the same operation to the same state produces the same
//! result and the same changes.
//!
//! # Key Types
//!
//! - [`LedgerStateManager`]: in-memory accounts, trust lines and offers, with
//!   nested all-or-nothing scopes ([`StateScope`]).
//!
//! - [`LedgerDelta`]: every change staged during execution, with pre- and
//!   post-state for updates.
//!
//! - [`OperationFrame`]: the validate / resolve / execute interface each
//!   operation kind implements.
//!
//! - [`OperationResult`]: the user-facing outcome. Failure codes carry no
//!   payload; success carries the created offer and the claimed trade.
//!
//! # Pipeline
//!
//! 1. **Validate**: asset shapes, distinct assets, non-negative amount and a
//!    positive price. No ledger reads.
//! 2. **Resolve**: load buyer and seller and resolve their trust lines,
//!    buyer before seller and selling asset before buying asset.
//! 3. **Capacity**: clamp the traded amount to what every leg can send or
//!    receive.
//! 4. **Execute**: apply the four balance changes, store an offer with a
//!    fresh id, and touch the source account.
//!
//! # Example
//!
//! ```
//! use newtrade_tx::{
//!     execute_operation, CountingMetrics, LedgerStateManager, NewTradeOp, Operation,
//!     OperationBody,
//! };
//! use newtrade_tx::stellar_xdr::curr::{
//!     AccountEntry, AccountEntryExt, AccountId, Asset, Price, PublicKey, SequenceNumber,
//!     String32, Thresholds, Uint256,
//! };
//!
//! fn account(seed: u8, balance: i64) -> AccountEntry {
//!     AccountEntry {
//!         account_id: AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([seed; 32]))),
//!         balance,
//!         seq_num: SequenceNumber(1),
//!         num_sub_entries: 0,
//!         inflation_dest: None,
//!         flags: 0,
//!         home_domain: String32::default(),
//!         thresholds: Thresholds([1, 0, 0, 0]),
//!         signers: vec![].try_into().unwrap(),
//!         ext: AccountEntryExt::V0,
//!     }
//! }
//!
//! let mut state = LedgerStateManager::new(1, 0);
//! let buyer = account(1, 1_000);
//! let seller = account(2, 1_000);
//! let source = buyer.account_id.clone();
//! let op = Operation::new(OperationBody::NewTrade(NewTradeOp {
//!     selling: Asset::Native,
//!     buying: Asset::Native,
//!     amount: 10,
//!     price: Price { n: 1, d: 1 },
//!     buyer: buyer.account_id.clone(),
//!     seller: seller.account_id.clone(),
//! }));
//! state.put_account(buyer);
//! state.put_account(seller);
//!
//! // Selling and buying the same asset is malformed.
//! let metrics = CountingMetrics::default();
//! let result = execute_operation(&op, &source, &mut state, &metrics).unwrap();
//! assert!(!result.is_success());
//! assert_eq!(metrics.count("op-new-trade.invalid.malformed"), 1);
//! ```

pub mod apply;
mod error;
pub mod metrics;
pub mod operations;
pub mod result;
pub mod state;

#[cfg(test)]
pub mod test_utils;

pub use apply::{Change, LedgerDelta};
pub use error::TxError;
pub use metrics::{sink_from_config, CountingMetrics, MetricsSink, NoopMetrics};
pub use operations::execute::{
    build_offer, execute_new_trade, prefetch_keys_new_trade, validate_new_trade, NewTradeFrame,
    NewTradePlan, UNASSIGNED_OFFER_ID,
};
pub use operations::{
    execute_operation, prefetch_keys, NewTradeOp, Operation, OperationBody, OperationFrame,
    OperationType, Resolution,
};
pub use result::{
    NewTradeResult, NewTradeResultCode, NewTradeSuccessResult, NewTradeSuccessResultOffer,
    OperationResult, TradeClaimAtom,
};
pub use state::{AssetKey, BalanceError, LedgerReader, LedgerStateManager, OfferKey, StateScope};

pub use newtrade_common::stellar_xdr;

/// Result type for operation processing.
pub type Result<T> = std::result::Result<T, TxError>;
