//! Purchase failure taxonomy and the user-facing message for each case.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Known presale revert reasons, matched against the raw revert signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertReason {
    InsufficientStablecoin,
    InsufficientGas,
    SoldOut,
    SaleInactive,
    ZeroAmount,
    TransferFailed,
    Unknown,
}

/// Signal fragments in match order. The first fragment found wins.
const REVERT_SIGNALS: [(&str, RevertReason); 6] = [
    ("InsufficientUSDT", RevertReason::InsufficientStablecoin),
    ("InsufficientETH", RevertReason::InsufficientGas),
    ("TokenSoldOut", RevertReason::SoldOut),
    ("PresaleNotActive", RevertReason::SaleInactive),
    ("ZeroAmount", RevertReason::ZeroAmount),
    ("TransferFailed", RevertReason::TransferFailed),
];

impl RevertReason {
    /// Classify a revert signal (error name or raw provider message).
    pub fn from_signal(signal: &str) -> Self {
        REVERT_SIGNALS
            .iter()
            .find(|(fragment, _)| signal.contains(fragment))
            .map(|(_, reason)| *reason)
            .unwrap_or(RevertReason::Unknown)
    }

    pub fn message(&self) -> &'static str {
        match self {
            RevertReason::InsufficientStablecoin => {
                "Insufficient USDC balance. Please make sure you have enough USDC in your wallet."
            }
            RevertReason::InsufficientGas => {
                "Insufficient ETH balance. Please make sure you have enough ETH for gas fees."
            }
            RevertReason::SoldOut => "Sorry, the presale has sold out!",
            RevertReason::SaleInactive => {
                "The presale is currently not active. Please try again later."
            }
            RevertReason::ZeroAmount => "Please enter a valid token amount.",
            RevertReason::TransferFailed => {
                "Transaction failed. Please check your USDC approval and try again."
            }
            RevertReason::Unknown => "Purchase failed. Please try again.",
        }
    }
}

/// Every way a purchase flow can end without buying tokens.
///
/// The `Display` text is exactly what the error modal shows.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PurchaseError {
    #[error("Error preparing transaction. Please try again.")]
    Preparation,
    #[error("Error preparing purchase transaction. Please try again.")]
    PurchasePreparation,
    #[error("USDC approval failed. Please try again.")]
    ApprovalRejected,
    #[error("{}", .0.message())]
    Reverted(RevertReason),
}

impl PurchaseError {
    /// Build a purchase failure from a revert signal.
    pub fn from_revert_signal(signal: &str) -> Self {
        PurchaseError::Reverted(RevertReason::from_signal(signal))
    }
}
