//! Solidity interfaces for the presale and its stablecoin.

use alloy::sol;

use crate::domain::token_info::TokenInfo;

sol! {
    /// MOTRA presale contract. Only the surface used by the client is declared.
    #[sol(rpc)]
    interface IPresale {
        error InsufficientUSDT();
        error InsufficientETH();
        error TokenSoldOut();
        error PresaleNotActive();
        error ZeroAmount();
        error TransferFailed();

        function getTokenInfo() external view returns (
            string name,
            string symbol,
            uint256 totalSupply,
            uint8 decimals,
            uint256 presaleSupply,
            uint256 pricePerToken,
            uint256 minPurchase,
            uint256 maxPurchase,
            bool presaleActive,
            bool usdtPaymentEnabled
        );
        function totalSoldTokens() external view returns (uint256);
        function buyTokenWithUSDT(uint256 amount) external;
    }
}

sol! {
    /// ERC-20 subset for balance and allowance management.
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

impl From<IPresale::getTokenInfoReturn> for TokenInfo {
    fn from(ret: IPresale::getTokenInfoReturn) -> Self {
        Self {
            name: ret.name,
            symbol: ret.symbol,
            total_supply: ret.totalSupply,
            decimals: ret.decimals,
            presale_supply: ret.presaleSupply,
            price_per_token: ret.pricePerToken,
            min_purchase: ret.minPurchase,
            max_purchase: ret.maxPurchase,
            sale_active: ret.presaleActive,
            stablecoin_payment_enabled: ret.usdtPaymentEnabled,
        }
    }
}

impl IPresale::IPresaleErrors {
    /// Custom error name, used as the revert signal.
    pub fn signal(&self) -> &'static str {
        match self {
            IPresale::IPresaleErrors::InsufficientUSDT(_) => "InsufficientUSDT",
            IPresale::IPresaleErrors::InsufficientETH(_) => "InsufficientETH",
            IPresale::IPresaleErrors::TokenSoldOut(_) => "TokenSoldOut",
            IPresale::IPresaleErrors::PresaleNotActive(_) => "PresaleNotActive",
            IPresale::IPresaleErrors::ZeroAmount(_) => "ZeroAmount",
            IPresale::IPresaleErrors::TransferFailed(_) => "TransferFailed",
        }
    }
}
