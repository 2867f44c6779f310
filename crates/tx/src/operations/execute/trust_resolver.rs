//! Trust-line and authorization resolution for the legs of a trade.
//!
//! A trade touches up to four balances, one per (party, asset) pair. Each is
//! resolved to a [`BalanceHolder`]: the account itself for the native asset,
//! or the party's authorized trust line for an issued asset.
//!
//! Legs are resolved buyer first, and for each party the selling asset before
//! the buying asset. The first failing check in that order decides the
//! reported code.

use stellar_xdr::curr::{AccountEntry, AccountId, Asset, TrustLineEntry, TrustLineFlags};

use newtrade_common::asset::asset_to_string;

use crate::result::NewTradeResultCode;
use crate::state::LedgerStateManager;

/// Which asset of the instruction a leg holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegSide {
    /// The instruction's selling asset.
    Selling,
    /// The instruction's buying asset.
    Buying,
}

impl LegSide {
    fn no_issuer(self) -> NewTradeResultCode {
        match self {
            LegSide::Selling => NewTradeResultCode::SellNoIssuer,
            LegSide::Buying => NewTradeResultCode::BuyNoIssuer,
        }
    }

    fn no_trust(self) -> NewTradeResultCode {
        match self {
            LegSide::Selling => NewTradeResultCode::SellNoTrust,
            LegSide::Buying => NewTradeResultCode::BuyNoTrust,
        }
    }

    fn not_authorized(self) -> NewTradeResultCode {
        match self {
            LegSide::Selling => NewTradeResultCode::SellNotAuthorized,
            LegSide::Buying => NewTradeResultCode::BuyNotAuthorized,
        }
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            LegSide::Selling => "selling",
            LegSide::Buying => "buying",
        }
    }
}

/// Borrowed view of the entry that holds one leg's balance.
#[derive(Debug, Clone, Copy)]
pub enum BalanceHolder<'a> {
    /// Native asset: the account's own balance field.
    Native(&'a AccountEntry),
    /// Issued asset: an authorized trust line.
    TrustLine(&'a TrustLineEntry),
}

impl<'a> BalanceHolder<'a> {
    /// Account holding the balance.
    pub fn account_id(&self) -> &'a AccountId {
        match *self {
            BalanceHolder::Native(account) => &account.account_id,
            BalanceHolder::TrustLine(trustline) => &trustline.account_id,
        }
    }

    /// Current balance.
    pub fn balance(&self) -> i64 {
        match self {
            BalanceHolder::Native(account) => account.balance,
            BalanceHolder::TrustLine(trustline) => trustline.balance,
        }
    }

    /// Whether this leg holds the native asset.
    pub fn is_native(&self) -> bool {
        matches!(self, BalanceHolder::Native(_))
    }

    /// Amount this leg can send.
    pub fn available(&self) -> i64 {
        self.balance().max(0)
    }

    /// Amount this leg can still receive.
    ///
    /// A trust line can grow up to its limit. The native balance has no
    /// limit of its own and is capped only by `i64::MAX`.
    pub fn receive_capacity(&self) -> i64 {
        match self {
            BalanceHolder::Native(account) => i64::MAX - account.balance.max(0),
            BalanceHolder::TrustLine(trustline) => {
                trustline.limit.saturating_sub(trustline.balance).max(0)
            }
        }
    }
}

/// Whether the issuer has authorized this trust line.
pub fn is_trustline_authorized(trustline: &TrustLineEntry) -> bool {
    trustline.flags & (TrustLineFlags::AuthorizedFlag as u32) != 0
}

/// Resolve the balance holder of `account` for `asset`.
///
/// For an issued asset the checks run in order: the issuer exists, the trust
/// line exists, the trust line is authorized.
pub fn resolve_leg<'a>(
    state: &'a LedgerStateManager,
    account: &'a AccountEntry,
    asset: &Asset,
    side: LegSide,
) -> Result<BalanceHolder<'a>, NewTradeResultCode> {
    if matches!(asset, Asset::Native) {
        return Ok(BalanceHolder::Native(account));
    }

    let (trustline, issuer_exists) = state.load_trustline_with_issuer(&account.account_id, asset);
    if !issuer_exists {
        return Err(side.no_issuer());
    }
    let trustline = trustline.ok_or_else(|| side.no_trust())?;
    if !is_trustline_authorized(trustline) {
        return Err(side.not_authorized());
    }
    Ok(BalanceHolder::TrustLine(trustline))
}

/// The four resolved legs of a trade.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLegs<'a> {
    pub buyer_selling: BalanceHolder<'a>,
    pub buyer_buying: BalanceHolder<'a>,
    pub seller_selling: BalanceHolder<'a>,
    pub seller_buying: BalanceHolder<'a>,
}

/// Resolve every leg of a trade in the fixed precedence order.
pub fn resolve_legs<'a>(
    state: &'a LedgerStateManager,
    buyer: &'a AccountEntry,
    seller: &'a AccountEntry,
    selling: &Asset,
    buying: &Asset,
) -> Result<ResolvedLegs<'a>, NewTradeResultCode> {
    let buyer_selling = resolve_logged(state, "buyer", buyer, selling, LegSide::Selling)?;
    let buyer_buying = resolve_logged(state, "buyer", buyer, buying, LegSide::Buying)?;
    let seller_selling = resolve_logged(state, "seller", seller, selling, LegSide::Selling)?;
    let seller_buying = resolve_logged(state, "seller", seller, buying, LegSide::Buying)?;

    Ok(ResolvedLegs {
        buyer_selling,
        buyer_buying,
        seller_selling,
        seller_buying,
    })
}

fn resolve_logged<'a>(
    state: &'a LedgerStateManager,
    party: &'static str,
    account: &'a AccountEntry,
    asset: &Asset,
    side: LegSide,
) -> Result<BalanceHolder<'a>, NewTradeResultCode> {
    let holder = resolve_leg(state, account, asset, side);
    match &holder {
        Ok(h) => tracing::trace!(
            party,
            leg = side.name(),
            asset = %asset_to_string(asset),
            balance = h.balance(),
            "Resolved trade leg"
        ),
        Err(code) => tracing::debug!(
            party,
            leg = side.name(),
            asset = %asset_to_string(asset),
            code = %code,
            "Trade leg rejected"
        ),
    }
    holder
}
