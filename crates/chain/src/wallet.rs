//! Mnemonic-backed signing wallets

use crate::error::{ChainError, ChainResult};
use bip39::Mnemonic;
use cosmrs::{
    bip32::DerivationPath,
    crypto::{secp256k1::SigningKey, PublicKey},
    AccountId,
};
use std::fmt;
use std::sync::Arc;

/// Cosmos derivation path (BIP44 coin type 118)
pub const COSMOS_DERIVATION_PATH: &str = "m/44'/118'/0'/0/0";

/// Bech32 prefix of dYdX v4 addresses
pub const DEFAULT_ADDRESS_PREFIX: &str = "dydx";

/// Mnemonic phrase plus the address prefix it is derived under
#[derive(Clone)]
pub struct WalletCredential {
    mnemonic: String,
    prefix: String,
}

impl WalletCredential {
    pub fn new(mnemonic: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }
}

impl fmt::Debug for WalletCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletCredential")
            .field("mnemonic", &"<redacted>")
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// A signing identity derived from a mnemonic
pub struct LocalWallet {
    signing_key: SigningKey,
    address: AccountId,
}

impl LocalWallet {
    /// Derive the wallet at the default Cosmos path
    pub fn from_mnemonic(mnemonic: &str, prefix: &str) -> ChainResult<Self> {
        let mnemonic =
            Mnemonic::parse(mnemonic).map_err(|e| ChainError::InvalidMnemonic(e.to_string()))?;
        let seed = mnemonic.to_seed("");

        let path: DerivationPath = COSMOS_DERIVATION_PATH
            .parse()
            .map_err(|e| ChainError::KeyDerivation(format!("{:?}", e)))?;

        let signing_key = SigningKey::derive_from_path(seed, &path)
            .map_err(|e| ChainError::KeyDerivation(e.to_string()))?;

        let address = signing_key
            .public_key()
            .account_id(prefix)
            .map_err(|e| ChainError::KeyDerivation(e.to_string()))?;

        Ok(Self {
            signing_key,
            address,
        })
    }

    pub fn from_credential(credential: &WalletCredential) -> ChainResult<Self> {
        Self::from_mnemonic(credential.mnemonic(), credential.prefix())
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.signing_key.public_key()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address.to_string())
            .finish_non_exhaustive()
    }
}

/// A numbered sub-ledger owned by a wallet
#[derive(Debug, Clone)]
pub struct SubaccountInfo {
    pub wallet: Arc<LocalWallet>,
    pub subaccount_number: u32,
}

impl SubaccountInfo {
    pub fn new(wallet: Arc<LocalWallet>, subaccount_number: u32) -> Self {
        Self {
            wallet,
            subaccount_number,
        }
    }

    pub fn address(&self) -> &AccountId {
        self.wallet.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_derivation_path() {
        let path: Result<DerivationPath, _> = COSMOS_DERIVATION_PATH.parse();
        assert!(path.is_ok());
    }

    #[test]
    fn test_wallet_address_uses_prefix() {
        let wallet = LocalWallet::from_mnemonic(TEST_MNEMONIC, DEFAULT_ADDRESS_PREFIX).unwrap();
        assert_eq!(wallet.address().prefix(), "dydx");
        assert!(wallet.address().to_string().starts_with("dydx1"));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = LocalWallet::from_mnemonic(TEST_MNEMONIC, "dydx").unwrap();
        let b = LocalWallet::from_mnemonic(TEST_MNEMONIC, "dydx").unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let err = LocalWallet::from_mnemonic("not a real mnemonic", "dydx").unwrap_err();
        assert!(matches!(err, ChainError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_credential_debug_redacts_mnemonic() {
        let credential = WalletCredential::new(TEST_MNEMONIC, "dydx");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("abandon"));
    }
}
