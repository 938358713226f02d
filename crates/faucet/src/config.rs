//! Faucet configuration

use crate::amount::native_base_units;
use crate::error::{FaucetError, FaucetResult};
use crate::logging::LogFormat;
use ::config::{Config, File};
use faucet_chain::{ValidatorConfig, WalletCredential, DEFAULT_ADDRESS_PREFIX};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Local devnet stablecoin faucet mnemonic
const DEV_FAUCET_WALLET: &str = "merge panther lobster crazy road hollow amused security before critic about cliff exhibit cause coyote talent happy where lion river tobacco option coconut small";

/// Local devnet native token faucet mnemonic
const DEV_FAUCET_NATIVE_TOKEN_WALLET: &str = "color habit donor nurse dinosaur stable wonder process post perfect raven gold census inside worth inquiry mammal panic olive toss shadow strong name drum";

/// A value that never appears in logs or responses
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Faucet service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// HTTP listen port
    pub listen_port: u16,

    /// PEM certificate path, HTTPS is served when both cert and key are set
    pub cert: Option<String>,

    /// PEM private key path
    pub key: Option<String>,

    /// Root of the front-end bundle
    pub static_web_path: String,

    /// Access log file, rotated daily. Stdout when unset
    pub access_log_file: Option<String>,

    /// Paths that fall back to the SPA index page
    pub front_path_reg_exp: Option<String>,

    pub validator_client: ValidatorConfig,

    /// Bech32 prefix used to derive both faucet wallets
    pub address_prefix: String,

    /// Stablecoin faucet wallet mnemonic
    #[serde(skip_serializing)]
    pub faucet_wallet: Secret,

    /// Native token faucet wallet mnemonic
    #[serde(skip_serializing)]
    pub faucet_native_token_wallet: Secret,

    /// Native tokens sent per request, in whole units
    pub faucet_native_token_amount: u64,

    /// Report non-zero chain result codes as success
    pub mask_chain_failures: bool,

    /// Upper bound on validator connection and wallet derivation
    pub init_timeout_secs: u64,

    /// Upper bound on signing and broadcasting one transaction
    pub submit_timeout_secs: u64,

    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            listen_port: 9000,
            cert: None,
            key: None,
            static_web_path: "public".to_string(),
            access_log_file: None,
            front_path_reg_exp: None,
            validator_client: ValidatorConfig::default(),
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            faucet_wallet: Secret::new(DEV_FAUCET_WALLET),
            faucet_native_token_wallet: Secret::new(DEV_FAUCET_NATIVE_TOKEN_WALLET),
            faucet_native_token_amount: 1,
            mask_chain_failures: false,
            init_timeout_secs: 30,
            submit_timeout_secs: 60,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Keys with a default value, as dotted paths into the config file
const DEFAULTED_KEYS: &[&str] = &[
    "listen_port",
    "static_web_path",
    "address_prefix",
    "faucet_wallet",
    "faucet_native_token_wallet",
    "faucet_native_token_amount",
    "mask_chain_failures",
    "init_timeout_secs",
    "submit_timeout_secs",
    "log_level",
    "log_format",
    "validator_client.validator_url",
    "validator_client.chain_id",
    "validator_client.default_client_memo",
    "validator_client.use_timestamp_nonce",
    "validator_client.denom_config.stable_denom",
    "validator_client.denom_config.stable_decimals",
    "validator_client.denom_config.gas_denom",
    "validator_client.denom_config.native_denom",
    "validator_client.denom_config.native_decimals",
    "validator_client.broadcast_options.mode",
    "validator_client.broadcast_options.gas_limit",
    "validator_client.broadcast_options.fee_amount",
];

/// What loading the configuration substituted, reported once logging is up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub path: PathBuf,
    pub file_found: bool,
    /// Keys missing or empty in the file that took their default
    pub defaulted: Vec<&'static str>,
    /// Keys replaced from environment variables
    pub env_overrides: Vec<&'static str>,
}

impl LoadReport {
    pub fn log(&self) {
        info!("Try read config file: {}", self.path.display());
        if !self.file_found {
            info!("Config file {} not found, using defaults", self.path.display());
        } else {
            for key in &self.defaulted {
                info!("{} uses default value", key);
            }
        }
        for key in &self.env_overrides {
            info!("{} set from environment", key);
        }
    }
}

impl FaucetConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> FaucetResult<(Self, LoadReport)> {
        let mut report = LoadReport {
            path: path.to_path_buf(),
            file_found: path.exists(),
            ..LoadReport::default()
        };

        let mut config = if report.file_found {
            let settings = Config::builder()
                .add_source(File::from(path))
                .build()
                .map_err(|e| FaucetError::Config(format!("{}: {}", path.display(), e)))?;

            report.defaulted = DEFAULTED_KEYS
                .iter()
                .copied()
                .filter(|key| settings.get::<::config::Value>(key).is_err())
                .collect();

            settings
                .try_deserialize::<FaucetConfig>()
                .map_err(|e| FaucetError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            report.defaulted = DEFAULTED_KEYS.to_vec();
            Self::default()
        };

        for key in config.fill_missing() {
            if !report.defaulted.contains(&key) {
                report.defaulted.push(key);
            }
        }

        report.env_overrides = config.apply_env_overrides();
        report
            .defaulted
            .retain(|key| !report.env_overrides.contains(key));

        config.validate()?;
        Ok((config, report))
    }

    /// Config file path from the `CONFIG` environment variable
    pub fn default_path() -> PathBuf {
        std::env::var("CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"))
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> FaucetResult<()> {
        let denoms = &self.validator_client.denom_config;
        if native_base_units(self.faucet_native_token_amount, denoms.native_decimals).is_none() {
            return Err(FaucetError::Config(format!(
                "faucet_native_token_amount {} with native_decimals {} overflows u128",
                self.faucet_native_token_amount, denoms.native_decimals
            )));
        }
        self.front_path_regex()?;
        Ok(())
    }

    /// Replace empty or zero values with their defaults, returning the keys replaced
    fn fill_missing(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let validator_defaults = &defaults.validator_client;
        let denom_defaults = &validator_defaults.denom_config;
        let mut filled = Vec::new();

        macro_rules! fill {
            ($field:expr, $default:expr, $name:literal, $missing:expr) => {
                if $missing {
                    filled.push($name);
                    $field = $default.clone();
                }
            };
        }

        fill!(self.listen_port, defaults.listen_port, "listen_port", self.listen_port == 0);
        fill!(
            self.static_web_path,
            defaults.static_web_path,
            "static_web_path",
            self.static_web_path.trim().is_empty()
        );
        fill!(
            self.address_prefix,
            defaults.address_prefix,
            "address_prefix",
            self.address_prefix.trim().is_empty()
        );
        fill!(
            self.faucet_native_token_amount,
            defaults.faucet_native_token_amount,
            "faucet_native_token_amount",
            self.faucet_native_token_amount == 0
        );
        fill!(
            self.faucet_wallet,
            defaults.faucet_wallet,
            "faucet_wallet",
            self.faucet_wallet.is_empty()
        );
        fill!(
            self.faucet_native_token_wallet,
            defaults.faucet_native_token_wallet,
            "faucet_native_token_wallet",
            self.faucet_native_token_wallet.is_empty()
        );

        let validator = &mut self.validator_client;
        fill!(
            validator.validator_url,
            validator_defaults.validator_url,
            "validator_client.validator_url",
            validator.validator_url.trim().is_empty()
        );
        fill!(
            validator.chain_id,
            validator_defaults.chain_id,
            "validator_client.chain_id",
            validator.chain_id.trim().is_empty()
        );
        fill!(
            validator.default_client_memo,
            validator_defaults.default_client_memo,
            "validator_client.default_client_memo",
            validator.default_client_memo.is_empty()
        );

        let denom = &mut validator.denom_config;
        fill!(
            denom.stable_denom,
            denom_defaults.stable_denom,
            "validator_client.denom_config.stable_denom",
            denom.stable_denom.trim().is_empty()
        );
        fill!(
            denom.gas_denom,
            denom_defaults.gas_denom,
            "validator_client.denom_config.gas_denom",
            denom.gas_denom.trim().is_empty()
        );
        fill!(
            denom.native_denom,
            denom_defaults.native_denom,
            "validator_client.denom_config.native_denom",
            denom.native_denom.trim().is_empty()
        );

        for optional in [
            &mut self.cert,
            &mut self.key,
            &mut self.access_log_file,
            &mut self.front_path_reg_exp,
        ] {
            if optional.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *optional = None;
            }
        }

        filled
    }

    /// Override selected values from environment variables, returning the keys set
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        let mut applied = Vec::new();

        if let Some(port) = std::env::var("FAUCET_LISTEN_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
        {
            self.listen_port = port;
            applied.push("listen_port");
        }

        if let Ok(url) = std::env::var("FAUCET_VALIDATOR_URL") {
            self.validator_client.validator_url = url;
            applied.push("validator_client.validator_url");
        }

        if let Ok(chain_id) = std::env::var("FAUCET_CHAIN_ID") {
            self.validator_client.chain_id = chain_id;
            applied.push("validator_client.chain_id");
        }

        if let Ok(mnemonic) = std::env::var("FAUCET_WALLET_MNEMONIC") {
            self.faucet_wallet = Secret::new(mnemonic);
            applied.push("faucet_wallet");
        }

        if let Ok(mnemonic) = std::env::var("FAUCET_NATIVE_TOKEN_WALLET_MNEMONIC") {
            self.faucet_native_token_wallet = Secret::new(mnemonic);
            applied.push("faucet_native_token_wallet");
        }

        applied
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.listen_port))
    }

    /// Certificate and key paths when HTTPS is configured
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (self.cert.as_deref(), self.key.as_deref()) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }

    /// Compiled SPA fallback pattern, matching every path when unset
    pub fn front_path_regex(&self) -> FaucetResult<Regex> {
        let pattern = self.front_path_reg_exp.as_deref().unwrap_or("");
        Regex::new(pattern)
            .map_err(|e| FaucetError::Config(format!("Invalid front_path_reg_exp: {}", e)))
    }

    pub fn index_file(&self) -> PathBuf {
        Path::new(&self.static_web_path).join("index.html")
    }

    pub fn stable_wallet_credential(&self) -> WalletCredential {
        WalletCredential::new(self.faucet_wallet.expose(), &self.address_prefix)
    }

    pub fn native_wallet_credential(&self) -> WalletCredential {
        WalletCredential::new(self.faucet_native_token_wallet.expose(), &self.address_prefix)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, report) = FaucetConfig::load(&dir.path().join("absent.json")).unwrap();
        assert!(!report.file_found);
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.static_web_path, "public");
        assert_eq!(config.validator_client.chain_id, "localdydxprotocol");
        assert_eq!(config.faucet_native_token_amount, 1);
    }

    #[test]
    fn test_partial_file_is_filled_field_by_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "listen_port": 8080,
                "static_web_path": "",
                "validator_client": {{ "chain_id": "dydx-testnet-4" }},
                "faucet_native_token_amount": 5
            }}"#
        )
        .unwrap();

        let (config, report) = FaucetConfig::load(&path).unwrap();
        assert!(report.file_found);
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.static_web_path, "public");
        assert_eq!(config.validator_client.chain_id, "dydx-testnet-4");
        assert_eq!(config.validator_client.validator_url, "http://localhost:26657");
        assert_eq!(config.validator_client.denom_config.stable_decimals, 6);
        assert_eq!(config.faucet_native_token_amount, 5);

        // Empty in the file
        assert!(report.defaulted.contains(&"static_web_path"));
        // Absent from the file
        assert!(report.defaulted.contains(&"validator_client.validator_url"));
        assert!(report.defaulted.contains(&"validator_client.denom_config.stable_decimals"));
        assert!(report.defaulted.contains(&"log_level"));
        // Set in the file
        assert!(!report.defaulted.contains(&"listen_port"));
        assert!(!report.defaulted.contains(&"validator_client.chain_id"));
        assert!(!report.defaulted.contains(&"faucet_native_token_amount"));
    }

    #[test]
    fn test_zero_values_are_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "listen_port": 0, "faucet_wallet": "  " }"#).unwrap();

        let (config, report) = FaucetConfig::load(&path).unwrap();
        assert_eq!(config.listen_port, 9000);
        assert!(!config.faucet_wallet.is_empty());
        assert_eq!(
            report.defaulted.iter().filter(|k| **k == "listen_port").count(),
            1
        );
        assert!(report.defaulted.contains(&"faucet_wallet"));
    }

    #[test]
    fn test_overflowing_native_amount_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "validator_client": { "denom_config": { "native_decimals": 40 } } }"#,
        )
        .unwrap();

        assert!(matches!(FaucetConfig::load(&path), Err(FaucetError::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FaucetConfig::load(&path), Err(FaucetError::Config(_))));
    }

    #[test]
    fn test_serialized_config_omits_mnemonics() {
        let json = serde_json::to_string(&FaucetConfig::default()).unwrap();
        assert!(!json.contains("faucet_wallet"));
        assert!(!json.contains("faucet_native_token_wallet"));
        assert!(!json.contains("merge panther"));
        assert!(json.contains("faucet_native_token_amount"));
    }

    #[test]
    fn test_debug_redacts_mnemonics() {
        let debug = format!("{:?}", FaucetConfig::default());
        assert!(!debug.contains("color habit"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_empty_front_path_matches_everything() {
        let config = FaucetConfig::default();
        let regex = config.front_path_regex().unwrap();
        assert!(regex.is_match("/anything/at/all"));
    }

    #[test]
    fn test_invalid_front_path_is_rejected() {
        let config = FaucetConfig {
            front_path_reg_exp: Some("(".to_string()),
            ..FaucetConfig::default()
        };
        assert!(config.front_path_regex().is_err());
    }

    #[test]
    fn test_tls_requires_cert_and_key() {
        let mut config = FaucetConfig::default();
        config.cert = Some("cert.pem".to_string());
        assert!(config.tls_paths().is_none());
        config.key = Some("key.pem".to_string());
        assert_eq!(config.tls_paths(), Some(("cert.pem", "key.pem")));
    }
}
