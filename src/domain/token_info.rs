//! Presale token metadata as read from the presale contract.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Decimals of the presale price (stablecoin units).
pub const PRICE_DECIMALS: u8 = 6;

/// Named view of the presale contract's `getTokenInfo()` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub decimals: u8,
    pub presale_supply: U256,
    /// Price of one whole token, fixed-point with [`PRICE_DECIMALS`] decimals.
    pub price_per_token: U256,
    pub min_purchase: U256,
    pub max_purchase: U256,
    pub sale_active: bool,
    pub stablecoin_payment_enabled: bool,
}

impl TokenInfo {
    /// Whether a stablecoin purchase can currently be attempted at all.
    pub fn accepts_stablecoin(&self) -> bool {
        self.sale_active && self.stablecoin_payment_enabled
    }
}

/// Everything the purchase screen reads from chain in one refresh.
///
/// Fields are `None` until the first successful read; a failed read keeps
/// the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub token_info: Option<TokenInfo>,
    pub total_sold: Option<U256>,
    pub stablecoin_balance: Option<U256>,
    pub stablecoin_allowance: Option<U256>,
}

impl ChainSnapshot {
    /// Overlay the fields that were read successfully onto this snapshot.
    pub fn merge(&mut self, fresh: ChainSnapshot) {
        if fresh.token_info.is_some() {
            self.token_info = fresh.token_info;
        }
        if fresh.total_sold.is_some() {
            self.total_sold = fresh.total_sold;
        }
        if fresh.stablecoin_balance.is_some() {
            self.stablecoin_balance = fresh.stablecoin_balance;
        }
        if fresh.stablecoin_allowance.is_some() {
            self.stablecoin_allowance = fresh.stablecoin_allowance;
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_token_info() -> TokenInfo {
    TokenInfo {
        name: "Motra".to_string(),
        symbol: "MOTRA".to_string(),
        total_supply: U256::from(100_000_000u64),
        decimals: 2,
        presale_supply: U256::from(50_000_000u64),
        price_per_token: U256::from(10_000u64),
        min_purchase: U256::from(1u64),
        max_purchase: U256::from(1_000_000u64),
        sale_active: true,
        stablecoin_payment_enabled: true,
    }
}
