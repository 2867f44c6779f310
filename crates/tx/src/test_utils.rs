//! Shared test utilities for operation tests.

use stellar_xdr::curr::{
    AccountEntry, AccountEntryExt, AccountId, Asset, LedgerEntry, LedgerEntryData,
    LedgerEntryExt, OfferEntry, OfferEntryExt, Price, PublicKey, SequenceNumber, String32,
    Thresholds, TrustLineEntry, TrustLineEntryExt, TrustLineFlags, Uint256,
};

use newtrade_common::asset::{asset_to_trustline_asset, make_alphanum4};

// ============================================================================
// Account creation helpers
// ============================================================================

/// Create a test account ID from a seed byte.
/// Different seeds produce different account IDs.
pub fn create_test_account_id(seed: u8) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([seed; 32])))
}

/// Create a basic test account with specified balance.
pub fn create_test_account(account_id: AccountId, balance: i64) -> AccountEntry {
    AccountEntry {
        account_id,
        balance,
        seq_num: SequenceNumber(1),
        num_sub_entries: 0,
        inflation_dest: None,
        flags: 0,
        home_domain: String32::default(),
        thresholds: Thresholds([1, 0, 0, 0]),
        signers: vec![].try_into().unwrap(),
        ext: AccountEntryExt::V0,
    }
}

/// Wrap an account in a ledger entry.
pub fn account_ledger_entry(account: AccountEntry, last_modified: u32) -> LedgerEntry {
    LedgerEntry {
        last_modified_ledger_seq: last_modified,
        data: LedgerEntryData::Account(account),
        ext: LedgerEntryExt::V0,
    }
}

// ============================================================================
// Asset and trustline helpers
// ============================================================================

/// Create an AlphaNum4 asset with the given code.
pub fn create_asset(code: &str, issuer: &AccountId) -> Asset {
    make_alphanum4(code, issuer.clone())
}

/// Create a trustline, authorized or not.
pub fn create_test_trustline(
    account_id: &AccountId,
    asset: &Asset,
    balance: i64,
    limit: i64,
    authorized: bool,
) -> TrustLineEntry {
    TrustLineEntry {
        account_id: account_id.clone(),
        asset: asset_to_trustline_asset(asset).unwrap(),
        balance,
        limit,
        flags: if authorized {
            TrustLineFlags::AuthorizedFlag as u32
        } else {
            0
        },
        ext: TrustLineEntryExt::V0,
    }
}

// ============================================================================
// Offer helpers
// ============================================================================

/// Create a non-passive offer at price 1/1.
pub fn create_test_offer(
    seller: &AccountId,
    offer_id: i64,
    selling: &Asset,
    buying: &Asset,
    amount: i64,
) -> OfferEntry {
    OfferEntry {
        seller_id: seller.clone(),
        offer_id,
        selling: selling.clone(),
        buying: buying.clone(),
        amount,
        price: Price { n: 1, d: 1 },
        flags: 0,
        ext: OfferEntryExt::V0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_account_id_uniqueness() {
        assert_ne!(create_test_account_id(0), create_test_account_id(1));
        assert_eq!(create_test_account_id(0), create_test_account_id(0));
    }

    #[test]
    fn test_create_test_trustline_flags() {
        let issuer = create_test_account_id(1);
        let holder = create_test_account_id(2);
        let usd = create_asset("USD", &issuer);
        assert_eq!(
            create_test_trustline(&holder, &usd, 0, 10, true).flags,
            TrustLineFlags::AuthorizedFlag as u32
        );
        assert_eq!(create_test_trustline(&holder, &usd, 0, 10, false).flags, 0);
    }
}
