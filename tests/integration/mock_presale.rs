//! In-memory presale contract.

use std::sync::Mutex;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use color_eyre::eyre::Result;
use motra_presale::{
    domain::token_info::TokenInfo,
    infra::client::{PresaleClient, PresaleReader, PresaleWriter, TxError},
};

/// 0.01 USDC per token.
pub const PRICE: u64 = 10_000;

/// 1000 USDC.
pub const STARTING_BALANCE: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Approve(U256),
    Buy(U256),
}

#[derive(Debug)]
pub struct MockState {
    pub token_info: TokenInfo,
    pub total_sold: U256,
    pub balance: U256,
    pub allowance: U256,
    pub reject_approval: bool,
    pub sold_out: bool,
    pub calls: Vec<Call>,
    pub reads: usize,
}

pub struct MockPresale {
    account: Option<Address>,
    pub state: Mutex<MockState>,
}

pub fn token_info() -> TokenInfo {
    TokenInfo {
        name: "Motra Token".to_string(),
        symbol: "MOTRA".to_string(),
        total_supply: U256::from(100_000_000u64),
        decimals: 2,
        presale_supply: U256::from(50_000_000u64),
        price_per_token: U256::from(PRICE),
        min_purchase: U256::from(1u64),
        max_purchase: U256::from(1_000_000u64),
        sale_active: true,
        stablecoin_payment_enabled: true,
    }
}

impl MockPresale {
    pub fn connected() -> Self {
        Self::with_account(Some(Address::repeat_byte(0xab)))
    }

    pub fn disconnected() -> Self {
        Self::with_account(None)
    }

    fn with_account(account: Option<Address>) -> Self {
        Self {
            account,
            state: Mutex::new(MockState {
                token_info: token_info(),
                total_sold: U256::ZERO,
                balance: U256::from(STARTING_BALANCE),
                allowance: U256::ZERO,
                reject_approval: false,
                sold_out: false,
                calls: Vec::new(),
                reads: 0,
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }
}

#[async_trait]
impl PresaleReader for MockPresale {
    async fn token_info(&self) -> Result<TokenInfo> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state.token_info.clone())
    }

    async fn total_sold(&self) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state.total_sold)
    }

    async fn stablecoin_balance(&self, _owner: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state.balance)
    }

    async fn stablecoin_allowance(&self, _owner: Address) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        Ok(state.allowance)
    }
}

#[async_trait]
impl PresaleWriter for MockPresale {
    async fn approve_stablecoin(&self, amount: U256) -> Result<B256, TxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Approve(amount));
        if state.reject_approval {
            return Err(TxError::Rejected("User rejected the request".to_string()));
        }
        state.allowance = amount;
        Ok(B256::repeat_byte(0x01))
    }

    async fn buy_tokens(&self, amount: U256) -> Result<B256, TxError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Buy(amount));
        if state.sold_out {
            return Err(TxError::Rejected(
                "execution reverted: custom error TokenSoldOut()".to_string(),
            ));
        }
        let cost = amount * state.token_info.price_per_token;
        if state.allowance < cost || state.balance < cost {
            return Err(TxError::Rejected(
                "execution reverted: InsufficientUSDT()".to_string(),
            ));
        }
        state.allowance -= cost;
        state.balance -= cost;
        state.total_sold += amount;
        Ok(B256::repeat_byte(0x02))
    }
}

impl PresaleClient for MockPresale {
    fn account(&self) -> Option<Address> {
        self.account
    }
}
