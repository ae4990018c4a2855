//! Submit one step of a purchase flow and report its outcome.
//!
//! Each function awaits the mined receipt and converts any failure into the
//! [`PurchaseError`] the sequencer records. Nothing here returns an error to
//! the caller; the outcome is always a [`FlowEvent`].

use alloy::primitives::U256;
use tracing::{error, info};

use crate::domain::{
    amount::parse_purchase_amount,
    revert::PurchaseError,
    sequencer::{FlowEvent, PurchaseIntent},
};

use super::client::{PresaleWriter, TxError};

/// Approve the presale to spend `amount` raw stablecoin units.
pub async fn submit_approval<W: PresaleWriter + ?Sized>(writer: &W, amount: U256) -> FlowEvent {
    match writer.approve_stablecoin(amount).await {
        Ok(tx_hash) => {
            info!("USDC approval confirmed: {}", tx_hash);
            FlowEvent::ApprovalConfirmed {
                tx_hash: tx_hash.to_string(),
            }
        }
        Err(TxError::Preparation(reason)) => {
            error!("Error preparing approval: {}", reason);
            FlowEvent::ApprovalFailed(PurchaseError::Preparation)
        }
        Err(e) => {
            error!("USDC approval failed: {}", e);
            FlowEvent::ApprovalFailed(PurchaseError::ApprovalRejected)
        }
    }
}

/// Buy the whole-token amount in `intent`.
pub async fn submit_purchase<W: PresaleWriter + ?Sized>(
    writer: &W,
    intent: &PurchaseIntent,
) -> FlowEvent {
    let Some(amount) = parse_purchase_amount(&intent.token_amount) else {
        error!(
            "Error preparing purchase transaction: invalid amount {:?}",
            intent.token_amount
        );
        return FlowEvent::PurchaseFailed(PurchaseError::PurchasePreparation);
    };

    match writer.buy_tokens(amount).await {
        Ok(tx_hash) => {
            info!("Purchase of {} tokens confirmed: {}", amount, tx_hash);
            FlowEvent::PurchaseConfirmed {
                tx_hash: tx_hash.to_string(),
            }
        }
        Err(TxError::Preparation(reason)) => {
            error!("Error preparing purchase transaction: {}", reason);
            FlowEvent::PurchaseFailed(PurchaseError::PurchasePreparation)
        }
        Err(e) => {
            error!("Purchase failed: {}", e);
            FlowEvent::PurchaseFailed(PurchaseError::from_revert_signal(e.signal()))
        }
    }
}
