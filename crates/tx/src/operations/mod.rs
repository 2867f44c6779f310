//! Operation types, the operation interface, and execution.
//!
//! Every operation kind implements [`OperationFrame`]: a state-free
//! validity check, a read-only resolution against ledger state, and an
//! execution step that stages changes. The provided
//! [`OperationFrame::apply`] runs the three inside a nested
//! [`StateScope`](crate::StateScope) and reports the outcome to the metrics
//! sink.

pub mod execute;

use stellar_xdr::curr::AccountId;

use crate::metrics::{MetricsSink, CATEGORY_INVALID, CATEGORY_SUCCESS};
use crate::result::OperationResult;
use crate::state::LedgerStateManager;
use crate::Result;

pub use execute::{execute_operation, prefetch_keys, NewTradeOp};

/// Enumeration of all operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationType {
    NewTrade,
}

impl OperationType {
    /// Get the operation type from an operation body.
    pub fn from_body(body: &OperationBody) -> Self {
        match body {
            OperationBody::NewTrade(_) => OperationType::NewTrade,
        }
    }

    /// Get the name of this operation type.
    pub fn name(&self) -> &'static str {
        match self {
            OperationType::NewTrade => "NewTrade",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Body of an operation: one variant per operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    NewTrade(NewTradeOp),
}

/// An operation with an optional source override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Account the operation acts as; the transaction source when `None`.
    pub source_account: Option<AccountId>,
    pub body: OperationBody,
}

impl Operation {
    pub fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }

    pub fn with_source(mut self, source: AccountId) -> Self {
        self.source_account = Some(source);
        self
    }

    pub fn op_type(&self) -> OperationType {
        OperationType::from_body(&self.body)
    }
}

/// Outcome of resolving an operation against ledger state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<P> {
    /// Every check passed; execute this plan.
    Ready(P),
    /// A check failed with a user-facing result. Nothing is staged.
    Rejected(OperationResult),
}

/// Interface shared by all operation kinds.
pub trait OperationFrame {
    /// Everything `execute` needs from resolution, owned so that state can
    /// be borrowed mutably afterwards.
    type Plan;

    fn op_type(&self) -> OperationType;

    /// Check the operation's shape. Must not read ledger state.
    fn check_valid(&self) -> std::result::Result<(), OperationResult>;

    /// Load and check everything the operation needs, without staging changes.
    fn resolve(&self, source: &AccountId, state: &LedgerStateManager)
        -> Result<Resolution<Self::Plan>>;

    /// Stage the changes described by `plan`.
    fn execute(
        &self,
        source: &AccountId,
        plan: Self::Plan,
        state: &mut LedgerStateManager,
    ) -> Result<OperationResult>;

    /// Validate, resolve and execute inside a nested scope.
    ///
    /// The scope commits only when the result is a success; any rejection,
    /// error or panic leaves `state` as it was.
    fn apply(
        &self,
        source: &AccountId,
        state: &mut LedgerStateManager,
        metrics: &dyn MetricsSink,
    ) -> Result<OperationResult> {
        let op_type = self.op_type();
        if let Err(result) = self.check_valid() {
            tracing::debug!(op_type = %op_type, code = result.code_name(), "Operation invalid");
            metrics.mark(CATEGORY_INVALID, result.code_name());
            return Ok(result);
        }

        let mut scope = state.begin_scope();
        let plan = match self.resolve(source, &scope)? {
            Resolution::Ready(plan) => plan,
            Resolution::Rejected(result) => {
                tracing::debug!(op_type = %op_type, code = result.code_name(), "Operation rejected");
                metrics.mark(CATEGORY_INVALID, result.code_name());
                return Ok(result);
            }
        };

        let result = self.execute(source, plan, &mut scope)?;
        if result.is_success() {
            scope.commit();
            metrics.mark(CATEGORY_SUCCESS, "apply");
        } else {
            tracing::debug!(op_type = %op_type, code = result.code_name(), "Operation failed");
            metrics.mark(CATEGORY_INVALID, result.code_name());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{CountingMetrics, NoopMetrics};
    use crate::result::NewTradeResultCode;
    use crate::test_utils::*;
    use stellar_xdr::curr::{Asset, Price};

    fn new_trade(amount: i64) -> (LedgerStateManager, NewTradeOp) {
        let mut state = LedgerStateManager::new(3, 0);
        let issuer = create_test_account_id(1);
        let buyer = create_test_account_id(2);
        let seller = create_test_account_id(3);
        let usd = create_asset("USD", &issuer);
        state.put_account(create_test_account(issuer, 1_000));
        state.put_account(create_test_account(buyer.clone(), 1_000));
        state.put_account(create_test_account(seller.clone(), 1_000));
        state.put_trustline(create_test_trustline(&buyer, &usd, 0, 1_000, true));
        state.put_trustline(create_test_trustline(&seller, &usd, 500, 1_000, true));
        let op = NewTradeOp {
            selling: Asset::Native,
            buying: usd,
            amount,
            price: Price { n: 1, d: 1 },
            buyer,
            seller,
        };
        (state, op)
    }

    #[test]
    fn test_operation_type() {
        let (_, op) = new_trade(1);
        let op = Operation::new(OperationBody::NewTrade(op));
        assert_eq!(op.op_type(), OperationType::NewTrade);
        assert_eq!(op.op_type().to_string(), "NewTrade");
    }

    #[test]
    fn test_execute_operation_uses_explicit_source() {
        let (mut state, trade) = new_trade(10);
        let seller = trade.seller.clone();
        let op = Operation::new(OperationBody::NewTrade(trade)).with_source(seller.clone());
        let missing_tx_source = create_test_account_id(42);

        let result = execute_operation(&op, &missing_tx_source, &mut state, &NoopMetrics).unwrap();
        assert!(result.is_success());
        // The seller acted, so its entry is the last update.
        let last = state.delta().updated_entries().last().cloned().unwrap();
        match last.data {
            stellar_xdr::curr::LedgerEntryData::Account(account) => {
                assert_eq!(account.account_id, seller)
            }
            other => panic!("expected account update, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_operation_falls_back_to_tx_source() {
        let (mut state, trade) = new_trade(10);
        let op = Operation::new(OperationBody::NewTrade(trade));
        let missing_tx_source = create_test_account_id(42);
        let err = execute_operation(&op, &missing_tx_source, &mut state, &NoopMetrics);
        assert!(matches!(err, Err(crate::TxError::SourceAccountNotFound)));
        assert_eq!(state.scope_depth(), 0);
        assert!(!state.has_changes());
    }

    #[test]
    fn test_apply_marks_metrics() {
        let (mut state, mut trade) = new_trade(10);
        let source = trade.buyer.clone();
        let metrics = CountingMetrics::default();

        let op = Operation::new(OperationBody::NewTrade(trade.clone()));
        execute_operation(&op, &source, &mut state, &metrics).unwrap();
        assert_eq!(metrics.count("op-new-trade.success.apply"), 1);

        trade.price = Price { n: 0, d: 1 };
        let op = Operation::new(OperationBody::NewTrade(trade));
        let result = execute_operation(&op, &source, &mut state, &metrics).unwrap();
        assert_eq!(
            result.as_new_trade().unwrap().code(),
            NewTradeResultCode::Malformed
        );
        assert_eq!(metrics.count("op-new-trade.invalid.malformed"), 1);
        assert_eq!(metrics.total(), 2);
    }

    #[test]
    fn test_prefetch_keys_uses_operation_source() {
        let (_, trade) = new_trade(10);
        let seller = trade.seller.clone();
        let op = Operation::new(OperationBody::NewTrade(trade)).with_source(seller.clone());
        let keys = prefetch_keys(&op, &create_test_account_id(42));
        assert_eq!(
            keys[0],
            stellar_xdr::curr::LedgerKey::Account(stellar_xdr::curr::LedgerKeyAccount {
                account_id: seller
            })
        );
    }
}
