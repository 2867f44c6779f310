//! Asset utilities for validation and conversion.
//!
//! These helpers decide whether an [`Asset`] is well formed, extract its
//! issuer, and render asset codes for log output.
//!
//! # Examples
//!
//! ```rust
//! use newtrade_common::asset::{asset_to_string, is_asset_valid, make_alphanum4};
//! use stellar_xdr::curr::{AccountId, Asset, PublicKey, Uint256};
//!
//! let issuer = AccountId(PublicKey::PublicKeyTypeEd25519(Uint256([7; 32])));
//! let usd = make_alphanum4("USD", issuer);
//! assert!(is_asset_valid(&usd));
//! assert_eq!(asset_to_string(&usd), "USD");
//! assert!(is_asset_valid(&Asset::Native));
//! ```

use stellar_xdr::curr::{
    AccountId, AlphaNum12, AlphaNum4, Asset, AssetCode12, AssetCode4, PublicKey, TrustLineAsset,
};

// ============================================================================
// Asset Code Conversion
// ============================================================================

/// Convert an asset code byte array to a string.
///
/// Reads bytes until a null byte is encountered or the end of the array.
///
/// ```rust
/// use newtrade_common::asset::asset_code_to_str;
///
/// assert_eq!(asset_code_to_str(&[b'U', b'S', b'D', 0]), "USD");
/// ```
pub fn asset_code_to_str<const N: usize>(code: &[u8; N]) -> String {
    let len = code.iter().position(|&b| b == 0).unwrap_or(N);
    String::from_utf8_lossy(&code[..len]).into_owned()
}

/// Convert a string to an asset code byte array.
///
/// Copies the string into the array, padding with zeros. Longer strings are
/// truncated.
///
/// ```rust
/// use newtrade_common::asset::str_to_asset_code;
///
/// let code: [u8; 4] = str_to_asset_code("USD");
/// assert_eq!(&code, b"USD\0");
/// ```
pub fn str_to_asset_code<const N: usize>(s: &str) -> [u8; N] {
    let mut result = [0u8; N];
    let n = std::cmp::min(N, s.len());
    result[..n].copy_from_slice(&s.as_bytes()[..n]);
    result
}

/// Convert an Asset to its display form: "XLM" for native, otherwise the code.
pub fn asset_to_string(asset: &Asset) -> String {
    match asset {
        Asset::Native => "XLM".to_string(),
        Asset::CreditAlphanum4(alpha4) => asset_code_to_str(&alpha4.asset_code.0),
        Asset::CreditAlphanum12(alpha12) => asset_code_to_str(&alpha12.asset_code.0),
    }
}

/// Build an AlphaNum4 asset from a code string and issuer.
pub fn make_alphanum4(code: &str, issuer: AccountId) -> Asset {
    Asset::CreditAlphanum4(AlphaNum4 {
        asset_code: AssetCode4(str_to_asset_code(code)),
        issuer,
    })
}

/// Build an AlphaNum12 asset from a code string and issuer.
pub fn make_alphanum12(code: &str, issuer: AccountId) -> Asset {
    Asset::CreditAlphanum12(AlphaNum12 {
        asset_code: AssetCode12(str_to_asset_code(code)),
        issuer,
    })
}

// ============================================================================
// Asset Validation
// ============================================================================

/// Validate an asset code byte slice: all non-zero bytes must be ASCII
/// alphanumeric, zeros may only be trailing, and `char_count >= min_chars`.
fn is_asset_code_valid(code: &[u8], min_chars: usize) -> bool {
    let mut zeros = false;
    let mut char_count = 0;

    for &b in code {
        if b == 0 {
            zeros = true;
        } else if zeros {
            // zeros can only be trailing
            return false;
        } else if !b.is_ascii_alphanumeric() {
            return false;
        } else {
            char_count += 1;
        }
    }
    char_count >= min_chars
}

/// An issuer identity is usable when its key is not the all-zero key.
fn is_issuer_valid(issuer: &AccountId) -> bool {
    account_id_to_bytes(issuer) != [0u8; 32]
}

/// Check that an Asset is well formed.
///
/// Native is always valid. Issued assets need a non-empty code (1..=4
/// characters for AlphaNum4, 5..=12 for AlphaNum12) and a real issuer key.
pub fn is_asset_valid(asset: &Asset) -> bool {
    match asset {
        Asset::Native => true,
        Asset::CreditAlphanum4(alpha4) => {
            is_asset_code_valid(&alpha4.asset_code.0, 1) && is_issuer_valid(&alpha4.issuer)
        }
        Asset::CreditAlphanum12(alpha12) => {
            is_asset_code_valid(&alpha12.asset_code.0, 5) && is_issuer_valid(&alpha12.issuer)
        }
    }
}

// ============================================================================
// Asset Accessors
// ============================================================================

/// Get the issuer of an asset, or `None` for native.
pub fn get_issuer(asset: &Asset) -> Option<&AccountId> {
    match asset {
        Asset::Native => None,
        Asset::CreditAlphanum4(a) => Some(&a.issuer),
        Asset::CreditAlphanum12(a) => Some(&a.issuer),
    }
}

/// Convert an Asset to a TrustLineAsset, returning None for native.
pub fn asset_to_trustline_asset(asset: &Asset) -> Option<TrustLineAsset> {
    match asset {
        Asset::Native => None,
        Asset::CreditAlphanum4(a) => Some(TrustLineAsset::CreditAlphanum4(a.clone())),
        Asset::CreditAlphanum12(a) => Some(TrustLineAsset::CreditAlphanum12(a.clone())),
    }
}

/// Convert an AccountId to its raw 32-byte key.
pub fn account_id_to_bytes(account_id: &AccountId) -> [u8; 32] {
    match &account_id.0 {
        PublicKey::PublicKeyTypeEd25519(key) => key.0,
    }
}
