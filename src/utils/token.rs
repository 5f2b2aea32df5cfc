use crate::utils::constants::DEFAULT_TOKEN_DECIMALS;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// ERC20 metadata attached to an asset address.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    address: Address,
    decimals: u8,
    name: Option<String>,
    symbol: Option<String>,
}

impl Token {
    pub fn new_with_data(address: Address, symbol: Option<String>, name: Option<String>, decimals: Option<u8>) -> Token {
        Token { address, symbol, name, decimals: decimals.unwrap_or(DEFAULT_TOKEN_DECIMALS) }
    }

    /// Symbol if known, otherwise the lowercase address.
    pub fn get_symbol(&self) -> String {
        self.symbol.clone().unwrap_or_else(|| asset_key(&self.address))
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals
    }

    pub fn get_address(&self) -> Address {
        self.address
    }
}

/// Convert a raw integer amount into whole units of a token with `decimals` decimals.
///
/// Amounts beyond `f64` precision lose their low digits, which is fine for rate estimation.
pub fn to_float_with_decimals(value: U256, decimals: u8) -> f64 {
    let raw = value.to_string().parse::<f64>().unwrap_or(0.0);
    raw / 10f64.powi(decimals as i32)
}

/// Lowercase `0x`-prefixed hex rendering used for report keys and fallback symbols.
pub fn asset_key(address: &Address) -> String {
    address.to_string().to_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::constants::{USDC, WETH};

    #[test]
    fn test_serialize() {
        let weth_token = Token::new_with_data(WETH, Some("WETH".to_string()), None, Some(18));

        let serialized = serde_json::to_string(&weth_token).unwrap();
        assert_eq!(
            serialized,
            "{\"address\":\"0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2\",\"decimals\":18,\"name\":null,\"symbol\":\"WETH\"}"
        );
    }

    #[test]
    fn test_to_float_respects_decimals() {
        assert_eq!(to_float_with_decimals(U256::from(2_500_000u64), 6), 2.5);

        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert!((to_float_with_decimals(one_and_half, 18) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_to_float_handles_amounts_above_u64() {
        let amount = U256::from_str_radix("250000000000000000000000", 10).unwrap();
        assert!((to_float_with_decimals(amount, 18) - 250_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_symbol_falls_back_to_lowercase_address() {
        let token = Token::new_with_data(Address::repeat_byte(0xAB), None, None, None);
        assert_eq!(token.get_symbol(), "0xabababababababababababababababababababab");
        assert_eq!(token.symbol(), None);
        assert_eq!(token.get_decimals(), DEFAULT_TOKEN_DECIMALS);

        let usdc = Token::new_with_data(USDC, Some("USDC".to_string()), None, Some(6));
        assert_eq!(usdc.get_symbol(), "USDC");
    }
}
