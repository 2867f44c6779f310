//! Ledger state management for operation execution.
//!
//! [`LedgerStateManager`] owns the canonical copies of every account, trust
//! line and offer an operation can see. Readers get borrowed views; writers go
//! through methods that record the change in the [`LedgerDelta`] and, when a
//! [`StateScope`] is open, remember the pre-scope value so the scope can be
//! rolled back.
//!
//! All maps are ordered so that iteration (rollback, prefetch, debugging
//! output) is identical on every node.

use std::collections::BTreeMap;

use stellar_xdr::curr::{
    AccountEntry, AccountId, Asset, LedgerEntry, LedgerEntryData, LedgerEntryExt, LedgerKey,
    OfferEntry, TrustLineAsset, TrustLineEntry,
};
use thiserror::Error;

use newtrade_common::asset::account_id_to_bytes;
use newtrade_common::LedgerConfig;

use crate::apply::LedgerDelta;
use crate::{Result, TxError};

mod scope;

pub use scope::StateScope;
use scope::ScopeFrame;

/// Key for trustline entries: (account_id bytes, asset key).
pub type TrustlineKey = ([u8; 32], AssetKey);

/// Trait for reading ledger entries from storage.
pub trait LedgerReader {
    /// Get a ledger entry by key.
    fn get_entry(&self, key: &LedgerKey) -> Option<LedgerEntry>;
}

/// Asset key for trustline lookup.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetKey {
    /// Native asset.
    Native,
    /// Credit alphanum4 asset (code, issuer).
    CreditAlphanum4([u8; 4], [u8; 32]),
    /// Credit alphanum12 asset (code, issuer).
    CreditAlphanum12([u8; 12], [u8; 32]),
}

impl AssetKey {
    /// Create an AssetKey from an XDR Asset.
    pub fn from_asset(asset: &Asset) -> Self {
        match asset {
            Asset::Native => AssetKey::Native,
            Asset::CreditAlphanum4(a) => {
                AssetKey::CreditAlphanum4(a.asset_code.0, account_id_to_bytes(&a.issuer))
            }
            Asset::CreditAlphanum12(a) => {
                AssetKey::CreditAlphanum12(a.asset_code.0, account_id_to_bytes(&a.issuer))
            }
        }
    }

    /// Create an AssetKey from a TrustLineAsset. Pool shares have no key.
    pub fn from_trustline_asset(asset: &TrustLineAsset) -> Option<Self> {
        match asset {
            TrustLineAsset::Native => Some(AssetKey::Native),
            TrustLineAsset::CreditAlphanum4(a) => Some(AssetKey::CreditAlphanum4(
                a.asset_code.0,
                account_id_to_bytes(&a.issuer),
            )),
            TrustLineAsset::CreditAlphanum12(a) => Some(AssetKey::CreditAlphanum12(
                a.asset_code.0,
                account_id_to_bytes(&a.issuer),
            )),
            TrustLineAsset::PoolShare(_) => None,
        }
    }
}

/// Key for offer entries: (seller bytes, offer id).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OfferKey {
    pub seller: [u8; 32],
    pub offer_id: i64,
}

impl OfferKey {
    pub fn new(seller: [u8; 32], offer_id: i64) -> Self {
        Self { seller, offer_id }
    }
}

/// Identity of any entry tracked by the state manager.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum EntryKey {
    Account([u8; 32]),
    Trustline(TrustlineKey),
    Offer(OfferKey),
}

#[derive(Debug, Clone)]
pub(crate) enum StoredEntry {
    Account(AccountEntry),
    Trustline(TrustLineEntry),
    Offer(OfferEntry),
}

/// Value of an entry at the moment a scope first touched it.
#[derive(Debug, Clone)]
pub(crate) struct EntrySnapshot {
    entry: Option<StoredEntry>,
    last_modified: Option<u32>,
}

/// A balance mutation that would leave the holder out of bounds.
///
/// The mutation is not applied when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// The account or trust line is not loaded.
    #[error("no balance holder loaded for {0}")]
    Missing(String),

    /// The balance would become negative.
    #[error("balance {balance} + {delta} would be negative")]
    BelowZero { balance: i64, delta: i64 },

    /// The trust line balance would exceed its limit.
    #[error("balance {balance} + {delta} would exceed limit {limit}")]
    AboveLimit { balance: i64, delta: i64, limit: i64 },

    /// The addition does not fit in 64 bits.
    #[error("balance {balance} + {delta} overflows")]
    Overflow { balance: i64, delta: i64 },
}

/// Ledger state manager for operation execution.
///
/// This provides read/write access to ledger entries during execution,
/// tracking all changes for later persistence.
#[derive(Debug, Clone)]
pub struct LedgerStateManager {
    /// Current ledger sequence.
    ledger_seq: u32,
    /// ID pool for generating offer IDs.
    id_pool: u64,
    /// Account entries by account ID (32-byte public key).
    accounts: BTreeMap<[u8; 32], AccountEntry>,
    /// Trustline entries by (account, asset).
    trustlines: BTreeMap<TrustlineKey, TrustLineEntry>,
    /// Offer entries by (seller, offer_id).
    offers: BTreeMap<OfferKey, OfferEntry>,
    /// `last_modified_ledger_seq` of every tracked entry.
    last_modified: BTreeMap<EntryKey, u32>,
    /// Changes recorded so far.
    delta: LedgerDelta,
    /// Open scopes, innermost last.
    scopes: Vec<ScopeFrame>,
}

impl LedgerStateManager {
    /// Create an empty state manager.
    pub fn new(ledger_seq: u32, id_pool: u64) -> Self {
        Self {
            ledger_seq,
            id_pool,
            accounts: BTreeMap::new(),
            trustlines: BTreeMap::new(),
            offers: BTreeMap::new(),
            last_modified: BTreeMap::new(),
            delta: LedgerDelta::new(ledger_seq),
            scopes: Vec::new(),
        }
    }

    /// Create an empty state manager from the `[ledger]` configuration.
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.ledger_seq, config.id_pool)
    }

    /// Get the current ledger sequence.
    pub fn ledger_seq(&self) -> u32 {
        self.ledger_seq
    }

    /// Get the current ID pool.
    pub fn id_pool(&self) -> u64 {
        self.id_pool
    }

    /// Generate the next ID from the pool.
    ///
    /// Ids are never reused: rolling back a scope restores the pool only to
    /// a value that was never handed out to a committed entry.
    pub fn next_id(&mut self) -> Result<i64> {
        let next = self
            .id_pool
            .checked_add(1)
            .ok_or_else(|| TxError::Internal("id_pool overflow".into()))?;
        let id = i64::try_from(next)
            .map_err(|_| TxError::Internal("id_pool exceeds i64::MAX".into()))?;
        self.id_pool = next;
        Ok(id)
    }

    // ==================== Loading ====================

    /// Load initial state from a ledger reader.
    ///
    /// Keys the reader does not know are skipped. Returns how many entries
    /// were loaded.
    pub fn load_from_reader<R: LedgerReader>(&mut self, reader: &R, keys: &[LedgerKey]) -> usize {
        let mut loaded = 0;
        for key in keys {
            if let Some(entry) = reader.get_entry(key) {
                self.load_entry(entry);
                loaded += 1;
            }
        }
        tracing::trace!(requested = keys.len(), loaded, "Loaded entries from reader");
        loaded
    }

    /// Load a single entry into the state manager without recording a change.
    pub fn load_entry(&mut self, entry: LedgerEntry) {
        let last_modified = entry.last_modified_ledger_seq;
        match entry.data {
            LedgerEntryData::Account(account) => {
                let key = account_id_to_bytes(&account.account_id);
                self.last_modified
                    .insert(EntryKey::Account(key), last_modified);
                self.accounts.insert(key, account);
            }
            LedgerEntryData::Trustline(trustline) => {
                let Some(asset_key) = AssetKey::from_trustline_asset(&trustline.asset) else {
                    tracing::debug!("Ignoring pool share trustline");
                    return;
                };
                let key = (account_id_to_bytes(&trustline.account_id), asset_key);
                self.last_modified
                    .insert(EntryKey::Trustline(key), last_modified);
                self.trustlines.insert(key, trustline);
            }
            LedgerEntryData::Offer(offer) => {
                let key = OfferKey::new(account_id_to_bytes(&offer.seller_id), offer.offer_id);
                self.last_modified.insert(EntryKey::Offer(key), last_modified);
                self.offers.insert(key, offer);
            }
            other => {
                tracing::debug!(entry_type = ?other.discriminant(), "Ignoring unsupported entry type");
            }
        }
    }

    /// Put an account into state without recording a change.
    pub fn put_account(&mut self, entry: AccountEntry) {
        let ledger_seq = self.ledger_seq;
        self.load_entry(ledger_entry(ledger_seq, LedgerEntryData::Account(entry)));
    }

    /// Put a trust line into state without recording a change.
    pub fn put_trustline(&mut self, entry: TrustLineEntry) {
        let ledger_seq = self.ledger_seq;
        self.load_entry(ledger_entry(ledger_seq, LedgerEntryData::Trustline(entry)));
    }

    // ==================== Accounts ====================

    /// Get an account by ID (read-only).
    pub fn get_account(&self, account_id: &AccountId) -> Option<&AccountEntry> {
        self.accounts.get(&account_id_to_bytes(account_id))
    }

    /// Whether an account is loaded.
    pub fn has_account(&self, account_id: &AccountId) -> bool {
        self.accounts.contains_key(&account_id_to_bytes(account_id))
    }

    /// Update an existing account entry, recording pre- and post-state.
    pub fn update_account(&mut self, entry: AccountEntry) {
        let key = account_id_to_bytes(&entry.account_id);
        let entry_key = EntryKey::Account(key);
        self.remember(&entry_key);

        let pre_state = self.accounts.get(&key).map(|acc| {
            ledger_entry(
                self.last_modified_of(&entry_key),
                LedgerEntryData::Account(acc.clone()),
            )
        });
        let post_state = ledger_entry(self.ledger_seq, LedgerEntryData::Account(entry.clone()));
        if let Some(pre) = pre_state {
            self.delta.record_update(pre, post_state);
        }

        self.last_modified.insert(entry_key, self.ledger_seq);
        self.accounts.insert(key, entry);
    }

    /// Record the account as modified without changing any field.
    ///
    /// Returns false if the account is not loaded.
    pub fn touch_account(&mut self, account_id: &AccountId) -> bool {
        match self.get_account(account_id).cloned() {
            Some(account) => {
                self.update_account(account);
                true
            }
            None => false,
        }
    }

    /// Add `delta` to an account's native balance.
    ///
    /// Returns the new balance. The native balance has no upper bound other
    /// than `i64::MAX`.
    pub fn add_account_balance(
        &mut self,
        account_id: &AccountId,
        delta: i64,
    ) -> std::result::Result<i64, BalanceError> {
        let mut account = self
            .get_account(account_id)
            .cloned()
            .ok_or_else(|| BalanceError::Missing(format!("account {:?}", account_id)))?;
        let balance = apply_balance_delta(account.balance, delta, None)?;
        account.balance = balance;
        self.update_account(account);
        Ok(balance)
    }

    // ==================== Trust lines ====================

    /// Get a trust line by account and asset (read-only).
    pub fn get_trustline(&self, account_id: &AccountId, asset: &Asset) -> Option<&TrustLineEntry> {
        let key = (account_id_to_bytes(account_id), AssetKey::from_asset(asset));
        self.trustlines.get(&key)
    }

    /// Load a trust line together with whether the asset's issuer exists.
    ///
    /// For the native asset there is no trust line and no issuer, so this
    /// returns `(None, true)`.
    pub fn load_trustline_with_issuer(
        &self,
        account_id: &AccountId,
        asset: &Asset,
    ) -> (Option<&TrustLineEntry>, bool) {
        match newtrade_common::asset::get_issuer(asset) {
            None => (None, true),
            Some(issuer) => (
                self.get_trustline(account_id, asset),
                self.has_account(issuer),
            ),
        }
    }

    /// Update an existing trust line, recording pre- and post-state.
    pub fn update_trustline(&mut self, entry: TrustLineEntry) -> std::result::Result<(), BalanceError> {
        let asset_key = AssetKey::from_trustline_asset(&entry.asset)
            .ok_or_else(|| BalanceError::Missing("pool share trustline".into()))?;
        let key = (account_id_to_bytes(&entry.account_id), asset_key);
        let entry_key = EntryKey::Trustline(key);
        self.remember(&entry_key);

        let pre_state = self.trustlines.get(&key).map(|tl| {
            ledger_entry(
                self.last_modified_of(&entry_key),
                LedgerEntryData::Trustline(tl.clone()),
            )
        });
        let post_state = ledger_entry(self.ledger_seq, LedgerEntryData::Trustline(entry.clone()));
        if let Some(pre) = pre_state {
            self.delta.record_update(pre, post_state);
        }

        self.last_modified.insert(entry_key, self.ledger_seq);
        self.trustlines.insert(key, entry);
        Ok(())
    }

    /// Add `delta` to a trust line balance, keeping it within `0..=limit`.
    ///
    /// Returns the new balance.
    pub fn add_trustline_balance(
        &mut self,
        account_id: &AccountId,
        asset: &Asset,
        delta: i64,
    ) -> std::result::Result<i64, BalanceError> {
        let mut trustline = self.get_trustline(account_id, asset).cloned().ok_or_else(|| {
            BalanceError::Missing(format!(
                "trustline {} for {:?}",
                newtrade_common::asset::asset_to_string(asset),
                account_id
            ))
        })?;
        let balance = apply_balance_delta(trustline.balance, delta, Some(trustline.limit))?;
        trustline.balance = balance;
        self.update_trustline(trustline)?;
        Ok(balance)
    }

    // ==================== Offers ====================

    /// Get an offer by seller and id (read-only).
    pub fn get_offer(&self, seller_id: &AccountId, offer_id: i64) -> Option<&OfferEntry> {
        self.offers
            .get(&OfferKey::new(account_id_to_bytes(seller_id), offer_id))
    }

    /// Number of offers currently held.
    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    /// Create a new offer entry.
    pub fn create_offer(&mut self, entry: OfferEntry) {
        let key = OfferKey::new(account_id_to_bytes(&entry.seller_id), entry.offer_id);
        let entry_key = EntryKey::Offer(key);
        self.remember(&entry_key);

        self.delta
            .record_create(ledger_entry(self.ledger_seq, LedgerEntryData::Offer(entry.clone())));
        self.last_modified.insert(entry_key, self.ledger_seq);
        self.offers.insert(key, entry);
    }

    // ==================== Generic access ====================

    /// Get any tracked entry by ledger key.
    pub fn get_entry(&self, key: &LedgerKey) -> Option<LedgerEntry> {
        match key {
            LedgerKey::Account(k) => {
                let bytes = account_id_to_bytes(&k.account_id);
                let account = self.accounts.get(&bytes)?;
                Some(ledger_entry(
                    self.last_modified_of(&EntryKey::Account(bytes)),
                    LedgerEntryData::Account(account.clone()),
                ))
            }
            LedgerKey::Trustline(k) => {
                let key = (
                    account_id_to_bytes(&k.account_id),
                    AssetKey::from_trustline_asset(&k.asset)?,
                );
                let trustline = self.trustlines.get(&key)?;
                Some(ledger_entry(
                    self.last_modified_of(&EntryKey::Trustline(key)),
                    LedgerEntryData::Trustline(trustline.clone()),
                ))
            }
            LedgerKey::Offer(k) => {
                let key = OfferKey::new(account_id_to_bytes(&k.seller_id), k.offer_id);
                let offer = self.offers.get(&key)?;
                Some(ledger_entry(
                    self.last_modified_of(&EntryKey::Offer(key)),
                    LedgerEntryData::Offer(offer.clone()),
                ))
            }
            _ => None,
        }
    }

    // ==================== Delta ====================

    /// Get the recorded changes.
    pub fn delta(&self) -> &LedgerDelta {
        &self.delta
    }

    /// Consume the manager and return the recorded changes.
    pub fn take_delta(self) -> LedgerDelta {
        self.delta
    }

    /// Check if any changes were recorded.
    pub fn has_changes(&self) -> bool {
        self.delta.has_changes()
    }

    // ==================== Scopes ====================

    /// Open a nested scope.
    ///
    /// Changes made through the returned guard are kept only if
    /// [`StateScope::commit`] is called; dropping the guard undoes them.
    pub fn begin_scope(&mut self) -> StateScope<'_> {
        self.scopes.push(ScopeFrame::new(
            self.delta.snapshot_lengths(),
            self.id_pool,
        ));
        let depth = self.scopes.len();
        tracing::trace!(depth, "Opened state scope");
        StateScope::new(self, depth)
    }

    /// Number of currently open scopes.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Close the innermost scope, keeping its changes.
    pub(crate) fn commit_scope(&mut self, depth: usize) {
        debug_assert_eq!(self.scopes.len(), depth, "scopes must close innermost first");
        if let Some(frame) = self.scopes.pop() {
            if let Some(parent) = self.scopes.last_mut() {
                parent.absorb(frame);
            }
        }
        tracing::trace!(depth, "Committed state scope");
    }

    /// Close the innermost scope, undoing its changes.
    pub(crate) fn rollback_scope(&mut self, depth: usize) {
        debug_assert_eq!(self.scopes.len(), depth, "scopes must close innermost first");
        let Some(frame) = self.scopes.pop() else {
            return;
        };
        let (snapshots, delta_lengths, id_pool) = frame.into_parts();
        for (key, snapshot) in snapshots {
            self.restore(key, snapshot);
        }
        self.delta.truncate_to(&delta_lengths);
        self.id_pool = id_pool;
        tracing::trace!(depth, "Rolled back state scope");
    }

    /// Save the current value of an entry into the innermost scope, once.
    fn remember(&mut self, key: &EntryKey) {
        let needed = self
            .scopes
            .last()
            .is_some_and(|frame| !frame.contains(key));
        if !needed {
            return;
        }
        let snapshot = self.snapshot(key);
        if let Some(frame) = self.scopes.last_mut() {
            frame.insert(key.clone(), snapshot);
        }
    }

    fn snapshot(&self, key: &EntryKey) -> EntrySnapshot {
        let entry = match key {
            EntryKey::Account(k) => self.accounts.get(k).cloned().map(StoredEntry::Account),
            EntryKey::Trustline(k) => self.trustlines.get(k).cloned().map(StoredEntry::Trustline),
            EntryKey::Offer(k) => self.offers.get(k).cloned().map(StoredEntry::Offer),
        };
        EntrySnapshot {
            entry,
            last_modified: self.last_modified.get(key).copied(),
        }
    }

    fn restore(&mut self, key: EntryKey, snapshot: EntrySnapshot) {
        match (&key, snapshot.entry) {
            (EntryKey::Account(k), Some(StoredEntry::Account(entry))) => {
                self.accounts.insert(*k, entry);
            }
            (EntryKey::Account(k), _) => {
                self.accounts.remove(k);
            }
            (EntryKey::Trustline(k), Some(StoredEntry::Trustline(entry))) => {
                self.trustlines.insert(*k, entry);
            }
            (EntryKey::Trustline(k), _) => {
                self.trustlines.remove(k);
            }
            (EntryKey::Offer(k), Some(StoredEntry::Offer(entry))) => {
                self.offers.insert(*k, entry);
            }
            (EntryKey::Offer(k), _) => {
                self.offers.remove(k);
            }
        }
        match snapshot.last_modified {
            Some(seq) => {
                self.last_modified.insert(key, seq);
            }
            None => {
                self.last_modified.remove(&key);
            }
        }
    }

    fn last_modified_of(&self, key: &EntryKey) -> u32 {
        self.last_modified
            .get(key)
            .copied()
            .unwrap_or(self.ledger_seq)
    }
}

fn ledger_entry(last_modified_ledger_seq: u32, data: LedgerEntryData) -> LedgerEntry {
    LedgerEntry {
        last_modified_ledger_seq,
        data,
        ext: LedgerEntryExt::V0,
    }
}

/// Checked `balance + delta` within `0..=limit` (no limit for native).
fn apply_balance_delta(
    balance: i64,
    delta: i64,
    limit: Option<i64>,
) -> std::result::Result<i64, BalanceError> {
    let new_balance = balance
        .checked_add(delta)
        .ok_or(BalanceError::Overflow { balance, delta })?;
    if new_balance < 0 {
        return Err(BalanceError::BelowZero { balance, delta });
    }
    if let Some(limit) = limit {
        if new_balance > limit {
            return Err(BalanceError::AboveLimit {
                balance,
                delta,
                limit,
            });
        }
    }
    Ok(new_balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use stellar_xdr::curr::{LedgerKeyAccount, LedgerKeyTrustLine};

    fn state_with_trustline(balance: i64, limit: i64) -> (LedgerStateManager, AccountId, Asset) {
        let mut state = LedgerStateManager::new(10, 0);
        let issuer = create_test_account_id(1);
        let holder = create_test_account_id(2);
        let asset = create_asset("USD", &issuer);
        state.put_account(create_test_account(issuer, 1_000));
        state.put_account(create_test_account(holder.clone(), 1_000));
        state.put_trustline(create_test_trustline(&holder, &asset, balance, limit, true));
        (state, holder, asset)
    }

    #[test]
    fn test_next_id_increments() {
        let mut state = LedgerStateManager::new(1, 41);
        assert_eq!(state.next_id().unwrap(), 42);
        assert_eq!(state.next_id().unwrap(), 43);
        assert_eq!(state.id_pool(), 43);
    }

    #[test]
    fn test_next_id_exhausted() {
        let mut state = LedgerStateManager::new(1, i64::MAX as u64);
        assert!(matches!(state.next_id(), Err(TxError::Internal(_))));
        // A failed allocation leaves the pool untouched.
        assert_eq!(state.id_pool(), i64::MAX as u64);
    }

    #[test]
    fn test_from_config() {
        let config = LedgerConfig {
            ledger_seq: 77,
            id_pool: 5,
        };
        let state = LedgerStateManager::from_config(&config);
        assert_eq!(state.ledger_seq(), 77);
        assert_eq!(state.id_pool(), 5);
        assert!(!state.has_changes());
    }

    #[test]
    fn test_load_entry_does_not_record() {
        let mut state = LedgerStateManager::new(10, 0);
        let id = create_test_account_id(3);
        state.load_entry(account_ledger_entry(create_test_account(id.clone(), 500), 4));

        assert_eq!(state.get_account(&id).map(|a| a.balance), Some(500));
        assert!(!state.has_changes());

        let key = LedgerKey::Account(LedgerKeyAccount { account_id: id });
        assert_eq!(state.get_entry(&key).unwrap().last_modified_ledger_seq, 4);
    }

    #[test]
    fn test_add_account_balance_records_update() {
        let mut state = LedgerStateManager::new(10, 0);
        let id = create_test_account_id(3);
        state.load_entry(account_ledger_entry(create_test_account(id.clone(), 500), 4));

        assert_eq!(state.add_account_balance(&id, 250), Ok(750));
        assert_eq!(state.delta().updated_entries().len(), 1);
        assert_eq!(state.delta().update_states()[0].last_modified_ledger_seq, 4);
        assert_eq!(state.delta().updated_entries()[0].last_modified_ledger_seq, 10);
    }

    #[test]
    fn test_add_account_balance_rejects_negative() {
        let mut state = LedgerStateManager::new(10, 0);
        let id = create_test_account_id(3);
        state.put_account(create_test_account(id.clone(), 100));

        assert_eq!(
            state.add_account_balance(&id, -101),
            Err(BalanceError::BelowZero {
                balance: 100,
                delta: -101
            })
        );
        assert_eq!(state.get_account(&id).unwrap().balance, 100);
        assert!(!state.has_changes());
    }

    #[test]
    fn test_add_account_balance_overflow() {
        let mut state = LedgerStateManager::new(10, 0);
        let id = create_test_account_id(3);
        state.put_account(create_test_account(id.clone(), i64::MAX - 1));
        assert!(matches!(
            state.add_account_balance(&id, 2),
            Err(BalanceError::Overflow { .. })
        ));
    }

    #[test]
    fn test_add_balance_missing_holder() {
        let mut state = LedgerStateManager::new(10, 0);
        let id = create_test_account_id(3);
        assert!(matches!(
            state.add_account_balance(&id, 1),
            Err(BalanceError::Missing(_))
        ));
        let asset = create_asset("USD", &create_test_account_id(1));
        assert!(matches!(
            state.add_trustline_balance(&id, &asset, 1),
            Err(BalanceError::Missing(_))
        ));
    }

    #[test]
    fn test_add_trustline_balance_within_limit() {
        let (mut state, holder, asset) = state_with_trustline(10, 100);
        assert_eq!(state.add_trustline_balance(&holder, &asset, 90), Ok(100));
        assert_eq!(
            state.add_trustline_balance(&holder, &asset, 1),
            Err(BalanceError::AboveLimit {
                balance: 100,
                delta: 1,
                limit: 100
            })
        );
        assert_eq!(state.add_trustline_balance(&holder, &asset, -100), Ok(0));
        assert!(matches!(
            state.add_trustline_balance(&holder, &asset, -1),
            Err(BalanceError::BelowZero { .. })
        ));
        assert_eq!(state.delta().updated_entries().len(), 2);
    }

    #[test]
    fn test_load_trustline_with_issuer() {
        let (state, holder, asset) = state_with_trustline(10, 100);
        let (tl, issuer_exists) = state.load_trustline_with_issuer(&holder, &asset);
        assert!(issuer_exists);
        assert_eq!(tl.map(|t| t.balance), Some(10));

        let ghost = create_asset("EUR", &create_test_account_id(99));
        let (tl, issuer_exists) = state.load_trustline_with_issuer(&holder, &ghost);
        assert!(!issuer_exists);
        assert!(tl.is_none());

        let (tl, issuer_exists) = state.load_trustline_with_issuer(&holder, &Asset::Native);
        assert!(issuer_exists);
        assert!(tl.is_none());
    }

    #[test]
    fn test_get_entry_trustline_and_offer() {
        let (mut state, holder, asset) = state_with_trustline(10, 100);
        let key = LedgerKey::Trustline(LedgerKeyTrustLine {
            account_id: holder.clone(),
            asset: newtrade_common::asset::asset_to_trustline_asset(&asset).unwrap(),
        });
        assert!(matches!(
            state.get_entry(&key).map(|e| e.data),
            Some(LedgerEntryData::Trustline(_))
        ));

        let offer = create_test_offer(&holder, 7, &asset, &Asset::Native, 10);
        state.create_offer(offer.clone());
        assert_eq!(state.get_offer(&holder, 7), Some(&offer));
        assert_eq!(state.offer_count(), 1);
        assert_eq!(state.delta().created_entries().len(), 1);
    }

    #[test]
    fn test_touch_account() {
        let mut state = LedgerStateManager::new(10, 0);
        let id = create_test_account_id(3);
        assert!(!state.touch_account(&id));
        state.put_account(create_test_account(id.clone(), 5));
        assert!(state.touch_account(&id));
        let delta = state.delta();
        assert_eq!(delta.updated_entries().len(), 1);
        assert_eq!(
            delta.update_states()[0].data,
            delta.updated_entries()[0].data
        );
    }
}
