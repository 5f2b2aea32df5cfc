use crate::utils::Token;
use alloy_primitives::{Address, U256};
use eyre::{Result, eyre};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::warn;

/// UniswapV2 router functions the analysis understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum SwapKind {
    #[strum(serialize = "swapExactTokensForTokens")]
    ExactTokensForTokens,
    #[strum(serialize = "swapExactETHForTokens")]
    ExactEthForTokens,
    #[strum(serialize = "swapExactTokensForETH")]
    ExactTokensForEth,
    #[strum(serialize = "swapExactTokensForTokensSupportingFeeOnTransferTokens")]
    ExactTokensForTokensFeeOnTransfer,
    #[strum(serialize = "swapExactETHForTokensSupportingFeeOnTransferTokens")]
    ExactEthForTokensFeeOnTransfer,
    #[strum(serialize = "swapExactTokensForETHSupportingFeeOnTransferTokens")]
    ExactTokensForEthFeeOnTransfer,
    #[strum(serialize = "swapTokensForExactTokens")]
    TokensForExactTokens,
    #[strum(serialize = "swapETHForExactTokens")]
    EthForExactTokens,
    #[strum(serialize = "swapTokensForExactETH")]
    TokensForExactEth,
}

/// Which side of a swap the caller fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeShape {
    /// Input amount fixed, output bounded below by `amountOutMin`.
    ExactInput,
    /// Output amount fixed, input bounded above by `amountInMax`.
    ExactOutput,
}

impl SwapKind {
    pub fn shape(&self) -> TradeShape {
        match self {
            SwapKind::ExactTokensForTokens
            | SwapKind::ExactEthForTokens
            | SwapKind::ExactTokensForEth
            | SwapKind::ExactTokensForTokensFeeOnTransfer
            | SwapKind::ExactEthForTokensFeeOnTransfer
            | SwapKind::ExactTokensForEthFeeOnTransfer => TradeShape::ExactInput,
            SwapKind::TokensForExactTokens | SwapKind::EthForExactTokens | SwapKind::TokensForExactEth => {
                TradeShape::ExactOutput
            }
        }
    }

    /// True when the input is paid as `msg.value` rather than a call argument.
    pub fn spends_native(&self) -> bool {
        matches!(
            self,
            SwapKind::ExactEthForTokens | SwapKind::ExactEthForTokensFeeOnTransfer | SwapKind::EthForExactTokens
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwapRecordError {
    #[error("swap path has {0} entries, need at least 2")]
    ShortPath(usize),
    #[error("invalid token address {0:?}")]
    InvalidAddress(String),
}

/// Token entry of a decoded swap path, as resolved by the decoder.
#[derive(Debug, Clone, Deserialize)]
pub struct PathToken {
    pub address: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl PathToken {
    /// `default_decimals` applies when the decoder could not resolve the token's decimals.
    pub fn to_token(&self, default_decimals: u8) -> Result<Token, SwapRecordError> {
        let address = parse_address(&self.address)?;
        let decimals = self.decimals.unwrap_or(default_decimals);
        Ok(Token::new_with_data(address, self.symbol.clone(), self.name.clone(), Some(decimals)))
    }
}

/// One decoded router call from the mempool, with the gas fields of its transaction.
///
/// Amounts are raw integers in token base units. Any amount that is absent or
/// cannot be read as a non-negative integer is `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedSwap {
    pub function: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount_in: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount_out_min: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount_out: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount_in_max: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub value: Option<U256>,
    #[serde(default)]
    pub path: Vec<PathToken>,
    #[serde(default, rename = "gas", deserialize_with = "deserialize_amount")]
    pub gas_limit: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub gas_price: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub effective_gas_price: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub hash: Option<String>,
}

impl DecodedSwap {
    /// `None` for router functions outside the supported set.
    pub fn kind(&self) -> Option<SwapKind> {
        SwapKind::from_str(&self.function).ok()
    }

    /// First and last token of the path.
    pub fn endpoints(&self, default_decimals: u8) -> Result<(Token, Token), SwapRecordError> {
        match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) if self.path.len() >= 2 => {
                Ok((first.to_token(default_decimals)?, last.to_token(default_decimals)?))
            }
            _ => Err(SwapRecordError::ShortPath(self.path.len())),
        }
    }

    /// Input amount of an exact-input swap; ETH-input calls carry it in `value`.
    pub fn exact_input_amount(&self) -> Option<U256> {
        self.amount_in.or_else(|| self.kind().filter(SwapKind::spends_native).and(self.value))
    }

    /// Input cap of an exact-output swap; ETH-input calls carry it in `value`.
    pub fn max_input_amount(&self) -> Option<U256> {
        self.amount_in_max.or_else(|| self.kind().filter(SwapKind::spends_native).and(self.value))
    }
}

/// Parse an address string, accepting any hex case.
pub fn parse_address(raw: &str) -> Result<Address, SwapRecordError> {
    Address::from_str(raw.trim()).map_err(|_| SwapRecordError::InvalidAddress(raw.to_string()))
}

/// Parse a JSON array of decoded swaps, skipping entries that do not form a record.
///
/// Returns the parsed swaps and the number of skipped entries.
pub fn parse_decoded_swaps(json: &str) -> Result<(Vec<DecodedSwap>, usize)> {
    let raw: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = raw else {
        return Err(eyre!("decoded swaps must be a JSON array"));
    };

    let mut swaps = Vec::with_capacity(entries.len());
    let mut skipped = 0usize;
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<DecodedSwap>(entry) {
            Ok(swap) => swaps.push(swap),
            Err(e) => {
                warn!("Skipping malformed swap record #{}: {}", idx, e);
                skipped += 1;
            }
        }
    }
    Ok((swaps, skipped))
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(amount_from_value))
}

/// Read a raw integer amount from a JSON number, a decimal string or a `0x` hex string.
pub fn amount_from_value(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Some(U256::from(v))
            } else {
                // integers above u64 arrive as floats
                let f = n.as_f64()?;
                if !f.is_finite() || f < 0.0 {
                    return None;
                }
                // uint256 max rounds up to exactly 2^256 here
                if f >= 2f64.powi(256) {
                    return Some(U256::MAX);
                }
                U256::from_str_radix(&format!("{:.0}", f.trunc()), 10).ok()
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) if hex.is_empty() => Some(U256::ZERO),
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None => U256::from_str_radix(s, 10).ok(),
            }
        }
        _ => None,
    }
}
