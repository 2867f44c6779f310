//! Operation execution dispatcher.
//!
//! This module provides the entry point for executing operations. Each
//! operation type has its own submodule with the specific execution logic;
//! the trade pipeline is split into leg resolution and capacity computation.

use stellar_xdr::curr::{AccountId, LedgerKey};

use crate::metrics::MetricsSink;
use crate::result::OperationResult;
use crate::state::LedgerStateManager;
use crate::Result;

use super::{Operation, OperationBody, OperationType};

mod new_trade;
mod prefetch;
mod trade_capacity;
mod trust_resolver;

pub use new_trade::{
    build_offer, execute_new_trade, validate_new_trade, NewTradeFrame, NewTradeOp, NewTradePlan,
    UNASSIGNED_OFFER_ID,
};
pub use prefetch::prefetch_keys_new_trade;
pub use trade_capacity::{
    compute_trade_amounts, max_selling_allowed, selling_bound_for_wheat, wheat_for_sheep,
    TradeAmounts, TradeCapacity, UNBOUNDED,
};
pub use trust_resolver::{
    is_trustline_authorized, resolve_leg, resolve_legs, BalanceHolder, LegSide, ResolvedLegs,
};

/// Execute a single operation.
///
/// The operation runs as `op.source_account` when set, otherwise as the
/// transaction source. Changes are kept only if the operation succeeds.
///
/// # Returns
///
/// The operation result, which may indicate success or a specific failure
/// code. `Err` is reserved for engine failures such as a missing account.
pub fn execute_operation(
    op: &Operation,
    tx_source: &AccountId,
    state: &mut LedgerStateManager,
    metrics: &dyn MetricsSink,
) -> Result<OperationResult> {
    let op_source = op.source_account.as_ref().unwrap_or(tx_source);
    let op_type = OperationType::from_body(&op.body);
    tracing::trace!(op_type = %op_type, "Executing operation");

    match &op.body {
        OperationBody::NewTrade(op) => execute_new_trade(op, op_source, state, metrics),
    }
}

/// Ledger keys an operation may read, in load order.
pub fn prefetch_keys(op: &Operation, tx_source: &AccountId) -> Vec<LedgerKey> {
    let op_source = op.source_account.as_ref().unwrap_or(tx_source);
    match &op.body {
        OperationBody::NewTrade(op) => prefetch_keys_new_trade(op, op_source),
    }
}
