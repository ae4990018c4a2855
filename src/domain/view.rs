//! Presentation model for the purchase screen.
//!
//! [`build_view`] turns the current state into everything the screen shows,
//! so the rendering code only lays out what it is given.

use alloy::primitives::{Address, U256};

use super::{
    amount::{
        DISPLAY_PRECISION, STABLECOIN_DECIMALS, format_units, has_sufficient_balance,
        needs_approval, parse_purchase_amount, parse_token_amount, required_raw_cost,
        required_stablecoin,
    },
    revert::PurchaseError,
    sequencer::{PaymentMethod, Phase},
    token_info::{ChainSnapshot, PRICE_DECIMALS, TokenInfo},
};

/// Decimals used when showing token quantities (supply, sold).
pub const TOKEN_DISPLAY_DECIMALS: u8 = 2;

pub const CONNECT_PROMPT: &str = "Please connect your wallet to purchase tokens";

/// Everything the purchase screen depends on.
#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    pub account: Option<Address>,
    pub snapshot: &'a ChainSnapshot,
    pub token_amount: &'a str,
    pub payment_method: PaymentMethod,
    pub phase: Phase,
    pub error: Option<&'a PurchaseError>,
    /// Marketing name of the token, e.g. "MOTRA".
    pub token_label: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseView {
    ConnectPrompt { title: String },
    Screen(Box<PurchaseScreen>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostPanel {
    pub cost: String,
    pub balance: String,
    pub sufficient: bool,
    pub note: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseButton {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiatPanel {
    pub heading: String,
    pub estimate: String,
    pub widget_title: String,
    /// Stablecoin amount handed to the on-ramp.
    pub onramp_amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseScreen {
    pub title: String,
    pub token_rows: Vec<InfoRow>,
    pub payment_method: PaymentMethod,
    pub stablecoin_selectable: bool,
    pub token_amount: String,
    pub cost: Option<CostPanel>,
    pub button: Option<PurchaseButton>,
    pub fiat: Option<FiatPanel>,
    pub total_sold: Option<String>,
    pub error: Option<String>,
}

pub fn build_view(inputs: &ViewInputs<'_>) -> PurchaseView {
    let title = format!("Purchase {} Tokens", inputs.token_label);
    if inputs.account.is_none() {
        return PurchaseView::ConnectPrompt { title };
    }

    let snapshot = inputs.snapshot;
    let info = snapshot.token_info.as_ref();
    let amount = inputs.token_amount;
    let amount_positive = parse_token_amount(amount).is_some();

    let cost = if inputs.payment_method == PaymentMethod::Stablecoin && amount_positive {
        Some(cost_panel(snapshot, amount))
    } else {
        None
    };

    let button = (inputs.payment_method == PaymentMethod::Stablecoin)
        .then(|| purchase_button(inputs));

    let fiat = if inputs.payment_method == PaymentMethod::Fiat && amount_positive {
        Some(fiat_panel(info, amount, inputs.token_label))
    } else {
        None
    };

    PurchaseView::Screen(Box::new(PurchaseScreen {
        title,
        token_rows: info.map(token_rows).unwrap_or_default(),
        payment_method: inputs.payment_method,
        stablecoin_selectable: info.is_some_and(|i| i.stablecoin_payment_enabled),
        token_amount: amount.to_string(),
        cost,
        button,
        fiat,
        total_sold: snapshot
            .total_sold
            .filter(|sold| *sold > U256::ZERO)
            .map(|sold| format!("{} tokens", format_units(sold, TOKEN_DISPLAY_DECIMALS))),
        error: inputs.error.map(|e| e.to_string()),
    }))
}

fn token_rows(info: &TokenInfo) -> Vec<InfoRow> {
    let flag = |on: bool, yes: &str, no: &str| InfoRow {
        label: "",
        value: if on { yes } else { no }.to_string(),
        tone: if on { Tone::Good } else { Tone::Bad },
    };

    vec![
        InfoRow {
            label: "Token Name",
            value: info.name.clone(),
            tone: Tone::Normal,
        },
        InfoRow {
            label: "Symbol",
            value: info.symbol.clone(),
            tone: Tone::Normal,
        },
        InfoRow {
            label: "Price per Token",
            value: format!("{} USDC", format_units(info.price_per_token, PRICE_DECIMALS)),
            tone: Tone::Normal,
        },
        InfoRow {
            label: "Available",
            value: format!(
                "{} tokens",
                format_units(info.total_supply, TOKEN_DISPLAY_DECIMALS)
            ),
            tone: Tone::Normal,
        },
        InfoRow {
            label: "Presale Status",
            ..flag(info.sale_active, "Active", "Inactive")
        },
        InfoRow {
            label: "USDC Payment",
            ..flag(info.stablecoin_payment_enabled, "Enabled", "Disabled")
        },
    ]
}

fn cost_panel(snapshot: &ChainSnapshot, amount: &str) -> CostPanel {
    let info = snapshot.token_info.as_ref();
    let cost = info
        .map(|i| required_stablecoin(amount, i.price_per_token, DISPLAY_PRECISION))
        .unwrap_or_else(|| "0".to_string());
    let balance = snapshot
        .stablecoin_balance
        .map(|b| format_units(b, STABLECOIN_DECIMALS))
        .unwrap_or_else(|| "Loading...".to_string());
    let sufficient = has_sufficient_balance(snapshot.stablecoin_balance, amount, info);

    let note = if !is_whole_amount(amount) {
        "Enter a whole number of tokens"
    } else if !sufficient {
        "Insufficient USDC balance"
    } else if needs_approval(snapshot.stablecoin_allowance, amount, info) {
        "First time purchase requires USDC approval"
    } else {
        "Ready to purchase"
    };

    CostPanel {
        cost: format!("{cost} USDC"),
        balance: format!("{balance} USDC"),
        sufficient,
        note,
    }
}

fn purchase_button(inputs: &ViewInputs<'_>) -> PurchaseButton {
    let snapshot = inputs.snapshot;
    let info = snapshot.token_info.as_ref();
    let amount = inputs.token_amount;
    let sufficient = has_sufficient_balance(snapshot.stablecoin_balance, amount, info);

    let label = match inputs.phase {
        Phase::NeedsApproval | Phase::Approving => "Approving...",
        Phase::Purchasing => "Processing...",
        _ if !sufficient => "Insufficient USDC",
        _ if needs_approval(snapshot.stablecoin_allowance, amount, info) => {
            "Approve & Purchase with USDC"
        }
        _ => "Purchase with USDC",
    };

    PurchaseButton {
        label,
        enabled: can_purchase(snapshot, amount, inputs.phase),
    }
}

/// Whether a stablecoin purchase of `token_amount` may start now.
///
/// The contract only takes whole tokens, so fractional amounts never reach
/// the approval step.
pub fn can_purchase(snapshot: &ChainSnapshot, token_amount: &str, phase: Phase) -> bool {
    let info = snapshot.token_info.as_ref();
    let busy = matches!(
        phase,
        Phase::NeedsApproval | Phase::Approving | Phase::Purchasing
    );

    !busy
        && is_whole_amount(token_amount)
        && info.is_some_and(|i| {
            i.accepts_stablecoin() && required_raw_cost(token_amount, i.price_per_token).is_some()
        })
        && has_sufficient_balance(snapshot.stablecoin_balance, token_amount, info)
}

fn is_whole_amount(token_amount: &str) -> bool {
    parse_purchase_amount(token_amount).is_some_and(|amount| amount > U256::ZERO)
}

fn fiat_panel(info: Option<&TokenInfo>, amount: &str, token_label: &str) -> FiatPanel {
    let estimate = info
        .map(|i| required_stablecoin(amount, i.price_per_token, DISPLAY_PRECISION))
        .unwrap_or_else(|| "0".to_string());

    FiatPanel {
        heading: format!("Buy {} {} Tokens with Fiat", amount.trim(), token_label),
        estimate: format!(
            "For {} {} tokens, you need approximately {} USDC",
            amount.trim(),
            token_label,
            estimate
        ),
        widget_title: format!("Buy USDC to Purchase {token_label}"),
        onramp_amount: estimate,
    }
}
