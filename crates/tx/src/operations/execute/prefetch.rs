//! Prefetch key collection for batch loading.
//!
//! Statically determines which ledger keys an operation may read, so the
//! caller can load them into a [`LedgerStateManager`](crate::LedgerStateManager)
//! before execution. Keys come back in a fixed order with duplicates removed:
//! accounts first (source, buyer, seller, then issuers), then trust lines in
//! resolution order.

use std::collections::BTreeSet;

use stellar_xdr::curr::{AccountId, Asset, LedgerKey, LedgerKeyAccount, LedgerKeyTrustLine};

use newtrade_common::asset::{asset_to_trustline_asset, get_issuer};

use super::new_trade::NewTradeOp;

// ---------------------------------------------------------------------------
// LedgerKey helper constructors
// ---------------------------------------------------------------------------

fn account_key(id: &AccountId) -> LedgerKey {
    LedgerKey::Account(LedgerKeyAccount {
        account_id: id.clone(),
    })
}

fn trustline_key(id: &AccountId, asset: &Asset) -> Option<LedgerKey> {
    asset_to_trustline_asset(asset).map(|asset| {
        LedgerKey::Trustline(LedgerKeyTrustLine {
            account_id: id.clone(),
            asset,
        })
    })
}

/// Ordered, duplicate-free key list.
#[derive(Debug, Default)]
struct KeyList {
    seen: BTreeSet<LedgerKey>,
    keys: Vec<LedgerKey>,
}

impl KeyList {
    fn push(&mut self, key: LedgerKey) {
        if self.seen.insert(key.clone()) {
            self.keys.push(key);
        }
    }
}

/// Keys a new trade may load.
///
/// Zero-amount trades load nothing beyond the source account.
pub fn prefetch_keys_new_trade(op: &NewTradeOp, source: &AccountId) -> Vec<LedgerKey> {
    let mut keys = KeyList::default();
    keys.push(account_key(source));
    if op.amount == 0 {
        return keys.keys;
    }

    keys.push(account_key(&op.buyer));
    keys.push(account_key(&op.seller));
    for asset in [&op.selling, &op.buying] {
        if let Some(issuer) = get_issuer(asset) {
            keys.push(account_key(issuer));
        }
    }

    for party in [&op.buyer, &op.seller] {
        for asset in [&op.selling, &op.buying] {
            if let Some(key) = trustline_key(party, asset) {
                keys.push(key);
            }
        }
    }
    keys.keys
}
