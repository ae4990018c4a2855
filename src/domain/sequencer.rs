//! Approval-then-purchase sequencing.
//!
//! The sequencer is a plain state machine. It never talks to the chain; the
//! app feeds it [`FlowEvent`]s reported by transaction tasks and dispatches
//! whatever [`Step`] it hands back. Only one flow can be in flight: a new
//! intent is rejected while an approval or purchase is pending.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;
use tracing::{debug, warn};

use super::revert::PurchaseError;

/// How the user wants to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum PaymentMethod {
    #[default]
    #[strum(serialize = "USDC")]
    Stablecoin,
    #[strum(serialize = "Card & Stablecoin")]
    Fiat,
}

impl PaymentMethod {
    pub fn toggle(self) -> Self {
        match self {
            PaymentMethod::Stablecoin => PaymentMethod::Fiat,
            PaymentMethod::Fiat => PaymentMethod::Stablecoin,
        }
    }
}

/// A purchase the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseIntent {
    pub token_amount: String,
    pub payment_method: PaymentMethod,
}

impl PurchaseIntent {
    pub fn stablecoin(token_amount: impl Into<String>) -> Self {
        Self {
            token_amount: token_amount.into(),
            payment_method: PaymentMethod::Stablecoin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Idle,
    NeedsApproval,
    Approving,
    Purchasing,
    Success,
    Failed,
}

/// What the caller must submit next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Submit the stablecoin approval, then report its outcome.
    Approve,
    /// Submit the purchase for this intent.
    Purchase(PurchaseIntent),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("a purchase is already in progress ({0})")]
    Busy(Phase),
    #[error("fiat purchases are handled by the on-ramp")]
    FiatIntent,
}

/// Outcome of a submitted transaction, reported back to the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    ApprovalConfirmed { tx_hash: String },
    ApprovalFailed(PurchaseError),
    PurchaseConfirmed { tx_hash: String },
    PurchaseFailed(PurchaseError),
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    phase: Phase,
    pending: Option<PurchaseIntent>,
    error: Option<PurchaseError>,
    last_tx_hash: Option<String>,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
            error: None,
            last_tx_hash: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> Option<&PurchaseIntent> {
        self.pending.as_ref()
    }

    pub fn error(&self) -> Option<&PurchaseError> {
        self.error.as_ref()
    }

    /// Hash of the last confirmed purchase, if the last flow succeeded.
    pub fn last_tx_hash(&self) -> Option<&str> {
        self.last_tx_hash.as_deref()
    }

    /// True while an approval or purchase is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::NeedsApproval | Phase::Approving | Phase::Purchasing
        )
    }

    /// Start a new flow for `intent`.
    pub fn begin(
        &mut self,
        intent: PurchaseIntent,
        needs_approval: bool,
    ) -> Result<Step, SequenceError> {
        if self.is_busy() {
            warn!("Rejecting purchase intent while {}", self.phase);
            return Err(SequenceError::Busy(self.phase));
        }
        if intent.payment_method == PaymentMethod::Fiat {
            return Err(SequenceError::FiatIntent);
        }

        self.last_tx_hash = None;
        self.pending = Some(intent.clone());
        if needs_approval {
            self.phase = Phase::NeedsApproval;
            debug!("Purchase of {} needs approval", intent.token_amount);
            Ok(Step::Approve)
        } else {
            self.phase = Phase::Purchasing;
            debug!("Purchasing {} directly", intent.token_amount);
            Ok(Step::Purchase(intent))
        }
    }

    /// The approval transaction has been handed to the wallet.
    pub fn approval_submitted(&mut self) {
        if self.phase == Phase::NeedsApproval {
            self.phase = Phase::Approving;
        } else {
            warn!("Ignoring approval submission in phase {}", self.phase);
        }
    }

    /// The approval landed on chain. Returns the intent to purchase, exactly
    /// once per approval.
    pub fn approval_confirmed(&mut self) -> Option<PurchaseIntent> {
        if self.phase != Phase::Approving {
            warn!("Ignoring approval confirmation in phase {}", self.phase);
            return None;
        }
        let intent = self.pending.clone()?;
        self.phase = Phase::Purchasing;
        Some(intent)
    }

    pub fn approval_failed(&mut self, error: PurchaseError) {
        if matches!(self.phase, Phase::NeedsApproval | Phase::Approving) {
            self.fail(error);
        } else {
            warn!("Ignoring approval failure in phase {}", self.phase);
        }
    }

    pub fn purchase_confirmed(&mut self, tx_hash: String) {
        if self.phase != Phase::Purchasing {
            warn!("Ignoring purchase confirmation in phase {}", self.phase);
            return;
        }
        self.phase = Phase::Success;
        self.pending = None;
        self.error = None;
        self.last_tx_hash = Some(tx_hash);
    }

    pub fn purchase_failed(&mut self, error: PurchaseError) {
        if self.phase == Phase::Purchasing {
            self.fail(error);
        } else {
            warn!("Ignoring purchase failure in phase {}", self.phase);
        }
    }

    /// Feed a transaction outcome. Returns the intent to purchase when an
    /// approval confirmation unlocks it.
    pub fn apply(&mut self, event: FlowEvent) -> Option<PurchaseIntent> {
        match event {
            FlowEvent::ApprovalConfirmed { .. } => self.approval_confirmed(),
            FlowEvent::ApprovalFailed(error) => {
                self.approval_failed(error);
                None
            }
            FlowEvent::PurchaseConfirmed { tx_hash } => {
                self.purchase_confirmed(tx_hash);
                None
            }
            FlowEvent::PurchaseFailed(error) => {
                self.purchase_failed(error);
                None
            }
        }
    }

    /// Close the error modal.
    pub fn dismiss(&mut self) {
        if self.phase == Phase::Failed {
            self.phase = Phase::Idle;
            self.pending = None;
            self.error = None;
        }
    }

    fn fail(&mut self, error: PurchaseError) {
        warn!("Purchase flow failed: {}", error);
        self.phase = Phase::Failed;
        self.error = Some(error);
    }
}
