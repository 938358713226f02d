//! Fixed-point scaling of token amounts into base units

use crate::error::{FaucetError, FaucetResult};
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Longest accepted amount text
const MAX_AMOUNT_LEN: usize = 64;

/// Digits allowed after the decimal point
const MAX_FRACTION_DIGITS: i64 = 36;

/// Digits allowed before the decimal point, enough for any u64
const MAX_WHOLE_DIGITS: i64 = 20;

/// A non-negative decimal token amount, kept exactly as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount(BigDecimal);

impl TokenAmount {
    pub fn parse(value: &str) -> FaucetResult<Self> {
        let text = value.trim();
        if text.len() > MAX_AMOUNT_LEN {
            return Err(FaucetError::InvalidAmount(format!(
                "amount longer than {} characters",
                MAX_AMOUNT_LEN
            )));
        }

        let decimal = BigDecimal::from_str(text)
            .map_err(|e| FaucetError::InvalidAmount(format!("{}: {}", value, e)))?;

        // Rescaling cost grows with the exponent, so bound it before any arithmetic
        let (_, scale) = decimal.as_bigint_and_exponent();
        if !(-MAX_WHOLE_DIGITS..=MAX_FRACTION_DIGITS).contains(&scale) {
            return Err(FaucetError::InvalidAmount(format!(
                "{} is out of range",
                value
            )));
        }

        if decimal < BigDecimal::zero() {
            return Err(FaucetError::InvalidAmount(format!(
                "{} must not be negative",
                value
            )));
        }
        Ok(Self(decimal))
    }

    /// `amount × 10^decimals`, truncating digits beyond `decimals`
    pub fn to_quantums(&self, decimals: u32) -> FaucetResult<u64> {
        let truncated = self.0.with_scale_round(decimals as i64, RoundingMode::Down);
        let (quantums, _) = truncated.as_bigint_and_exponent();
        quantums.to_u64().ok_or_else(|| {
            FaucetError::InvalidAmount(format!("{} exceeds the maximum transfer size", self.0))
        })
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A JSON number keeps its shortest round-trip text, so 1.23 stays 1.23
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        TokenAmount::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// `whole_units × 10^decimals`, or `None` when it does not fit a u128
pub fn native_base_units(whole_units: u64, decimals: u32) -> Option<u128> {
    10u128
        .checked_pow(decimals)
        .and_then(|scale| scale.checked_mul(whole_units as u128))
}
