//! Operation result types.
//!
//! Results are plain values, shaped after the ledger protocol's XDR unions:
//! a closed set of codes where only the success arm carries a payload.
//!
//! - [`NewTradeResult`]: outcome of one new-trade operation
//! - [`NewTradeResultCode`]: the numeric code, with stable kebab-case names
//!   used for meters and logs
//! - [`OperationResult`]: result of any operation kind

use stellar_xdr::curr::{AccountId, Asset, OfferEntry};

use crate::operations::OperationType;

/// Numeric result codes of the new-trade operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum NewTradeResultCode {
    Success = 0,
    Malformed = -1,
    SellNoTrust = -2,
    BuyNoTrust = -3,
    SellNotAuthorized = -4,
    BuyNotAuthorized = -5,
    LineFull = -6,
    Underfunded = -7,
    SellNoIssuer = -9,
    BuyNoIssuer = -10,
}

impl NewTradeResultCode {
    /// Check if this is the success code.
    pub fn is_success(&self) -> bool {
        matches!(self, NewTradeResultCode::Success)
    }

    /// Numeric value of the code.
    pub fn value(&self) -> i32 {
        *self as i32
    }

    /// Stable kebab-case name, used as the meter reason.
    pub fn name(&self) -> &'static str {
        match self {
            NewTradeResultCode::Success => "success",
            NewTradeResultCode::Malformed => "malformed",
            NewTradeResultCode::SellNoTrust => "sell-no-trust",
            NewTradeResultCode::BuyNoTrust => "buy-no-trust",
            NewTradeResultCode::SellNotAuthorized => "sell-not-authorized",
            NewTradeResultCode::BuyNotAuthorized => "buy-not-authorized",
            NewTradeResultCode::LineFull => "line-full",
            NewTradeResultCode::Underfunded => "underfunded",
            NewTradeResultCode::SellNoIssuer => "sell-no-issuer",
            NewTradeResultCode::BuyNoIssuer => "buy-no-issuer",
        }
    }
}

impl std::fmt::Display for NewTradeResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One realized exchange, seen from the claiming (buying) side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeClaimAtom {
    /// Account that received `asset_bought`.
    pub claimant: AccountId,
    /// Offer recorded for this trade.
    pub offer_id: i64,
    pub asset_bought: Asset,
    pub amount_bought: i64,
    pub asset_sold: Asset,
    pub amount_sold: i64,
}

/// The offer arm of a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewTradeSuccessResultOffer {
    /// An offer was stored.
    Created(OfferEntry),
    /// Nothing was stored (zero-amount instruction).
    NoOffer,
}

/// Payload of a successful trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTradeSuccessResult {
    pub offers_claimed: Vec<TradeClaimAtom>,
    pub offer: NewTradeSuccessResultOffer,
}

impl NewTradeSuccessResult {
    /// The stored offer, if any.
    pub fn created_offer(&self) -> Option<&OfferEntry> {
        match &self.offer {
            NewTradeSuccessResultOffer::Created(offer) => Some(offer),
            NewTradeSuccessResultOffer::NoOffer => None,
        }
    }
}

/// Outcome of a new-trade operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewTradeResult {
    Success(NewTradeSuccessResult),
    Malformed,
    SellNoTrust,
    BuyNoTrust,
    SellNotAuthorized,
    BuyNotAuthorized,
    LineFull,
    Underfunded,
    SellNoIssuer,
    BuyNoIssuer,
}

impl NewTradeResult {
    /// Build the payload-free result for a failure code.
    ///
    /// Returns `None` for [`NewTradeResultCode::Success`], which needs a payload.
    pub fn from_failure_code(code: NewTradeResultCode) -> Option<Self> {
        let result = match code {
            NewTradeResultCode::Success => return None,
            NewTradeResultCode::Malformed => NewTradeResult::Malformed,
            NewTradeResultCode::SellNoTrust => NewTradeResult::SellNoTrust,
            NewTradeResultCode::BuyNoTrust => NewTradeResult::BuyNoTrust,
            NewTradeResultCode::SellNotAuthorized => NewTradeResult::SellNotAuthorized,
            NewTradeResultCode::BuyNotAuthorized => NewTradeResult::BuyNotAuthorized,
            NewTradeResultCode::LineFull => NewTradeResult::LineFull,
            NewTradeResultCode::Underfunded => NewTradeResult::Underfunded,
            NewTradeResultCode::SellNoIssuer => NewTradeResult::SellNoIssuer,
            NewTradeResultCode::BuyNoIssuer => NewTradeResult::BuyNoIssuer,
        };
        Some(result)
    }

    /// Get the result code.
    pub fn code(&self) -> NewTradeResultCode {
        match self {
            NewTradeResult::Success(_) => NewTradeResultCode::Success,
            NewTradeResult::Malformed => NewTradeResultCode::Malformed,
            NewTradeResult::SellNoTrust => NewTradeResultCode::SellNoTrust,
            NewTradeResult::BuyNoTrust => NewTradeResultCode::BuyNoTrust,
            NewTradeResult::SellNotAuthorized => NewTradeResultCode::SellNotAuthorized,
            NewTradeResult::BuyNotAuthorized => NewTradeResultCode::BuyNotAuthorized,
            NewTradeResult::LineFull => NewTradeResultCode::LineFull,
            NewTradeResult::Underfunded => NewTradeResultCode::Underfunded,
            NewTradeResult::SellNoIssuer => NewTradeResultCode::SellNoIssuer,
            NewTradeResult::BuyNoIssuer => NewTradeResultCode::BuyNoIssuer,
        }
    }

    /// Check if the trade succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, NewTradeResult::Success(_))
    }

    /// The success payload, if any.
    pub fn success(&self) -> Option<&NewTradeSuccessResult> {
        match self {
            NewTradeResult::Success(success) => Some(success),
            _ => None,
        }
    }
}

/// Result of any operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    NewTrade(NewTradeResult),
}

impl OperationResult {
    /// Kind of operation this result belongs to.
    pub fn op_type(&self) -> OperationType {
        match self {
            OperationResult::NewTrade(_) => OperationType::NewTrade,
        }
    }

    /// Check if the operation succeeded.
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::NewTrade(r) => r.is_success(),
        }
    }

    /// Stable name of the result code.
    pub fn code_name(&self) -> &'static str {
        match self {
            OperationResult::NewTrade(r) => r.code().name(),
        }
    }

    /// The new-trade result, if this is one.
    pub fn as_new_trade(&self) -> Option<&NewTradeResult> {
        match self {
            OperationResult::NewTrade(r) => Some(r),
        }
    }
}

impl From<NewTradeResult> for OperationResult {
    fn from(result: NewTradeResult) -> Self {
        OperationResult::NewTrade(result)
    }
}
