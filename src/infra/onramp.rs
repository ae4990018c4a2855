//! Fiat on-ramp hand-off.
//!
//! The on-ramp runs its own purchase flow in the browser; the client only
//! builds the launch link for buying the stablecoin on the presale chain.

use alloy::transports::http::reqwest::Url;
use color_eyre::eyre::{Result, WrapErr};

use crate::config::Config;

/// Parameters the on-ramp widget is launched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnRampRequest {
    pub client_id: String,
    pub token_address: String,
    pub chain_id: u64,
    /// Decimal stablecoin amount, e.g. "1.50".
    pub amount: String,
    pub title: String,
}

impl OnRampRequest {
    pub fn new(config: &Config, amount: &str, title: &str) -> Self {
        Self {
            client_id: config.onramp.client_id.clone(),
            token_address: config.contracts.stablecoin_address.clone(),
            chain_id: config.network.chain_id,
            amount: amount.to_string(),
            title: title.to_string(),
        }
    }

    /// Launch URL under `widget_url`.
    pub fn url(&self, widget_url: &str) -> Result<Url> {
        let chain_id = self.chain_id.to_string();
        Url::parse_with_params(
            widget_url,
            [
                ("clientId", self.client_id.as_str()),
                ("chainId", chain_id.as_str()),
                ("tokenAddress", self.token_address.as_str()),
                ("amount", self.amount.as_str()),
                ("title", self.title.as_str()),
            ],
        )
        .wrap_err_with(|| format!("Invalid on-ramp widget URL {widget_url}"))
    }
}

/// Launch link for buying `amount` of the stablecoin.
pub fn launch_url(config: &Config, amount: &str, title: &str) -> Result<String> {
    let url = OnRampRequest::new(config, amount, title).url(&config.onramp.widget_url)?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_url_carries_widget_params() {
        let mut config = Config::base();
        config.onramp.client_id = "client-1".to_string();

        let url = launch_url(&config, "1.50", "Buy USDC to Purchase MOTRA").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.starts_with("https://pay.thirdweb.com/buy?"));
        assert!(params.contains(&("clientId".to_string(), "client-1".to_string())));
        assert!(params.contains(&("chainId".to_string(), "8453".to_string())));
        assert!(params.contains(&(
            "tokenAddress".to_string(),
            "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string()
        )));
        assert!(params.contains(&("amount".to_string(), "1.50".to_string())));
        assert!(params.contains(&(
            "title".to_string(),
            "Buy USDC to Purchase MOTRA".to_string()
        )));
    }

    #[test]
    fn test_invalid_widget_url() {
        let mut config = Config::base();
        config.onramp.widget_url = "not a url".to_string();
        assert!(launch_url(&config, "1.00", "x").is_err());
    }
}
