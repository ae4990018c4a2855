//! Purchase orchestration.
//!
//! [`PurchaseController`] owns the sequencer and the latest chain snapshot,
//! spawns the read and transaction tasks, and folds their results back in.
//! The app loop drives it from user actions and drains its channel; nothing
//! here touches the terminal.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::domain::{
    amount::{approval_amount, needs_approval},
    revert::PurchaseError,
    sequencer::{FlowEvent, PaymentMethod, Phase, PurchaseIntent, SequenceError, Sequencer, Step},
    token_info::ChainSnapshot,
    view::{PurchaseView, ViewInputs, build_view, can_purchase},
};

use super::{
    client::{PresaleClient, fetch_snapshot},
    flow,
};

/// Results reported by background chain tasks.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Snapshot(ChainSnapshot),
    Flow(FlowEvent),
}

/// Why a purchase intent was not started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("Connect a wallet to purchase")]
    Disconnected,
    #[error("Purchase not available")]
    NotReady,
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// What handling a [`ClientEvent`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Refreshed,
    /// The approval landed and the purchase was sent.
    PurchaseSubmitted,
    Succeeded { tx_hash: String },
    Failed(PurchaseError),
    /// Stale or out-of-phase event.
    Ignored,
}

pub struct PurchaseController {
    client: Arc<dyn PresaleClient>,
    events: UnboundedSender<ClientEvent>,
    standing_allowance: U256,
    sequencer: Sequencer,
    snapshot: ChainSnapshot,
    refreshing: bool,
}

impl PurchaseController {
    /// `standing_allowance` is the raw stablecoin amount approved when an
    /// approval is needed, unless the purchase itself costs more.
    pub fn new(
        client: Arc<dyn PresaleClient>,
        standing_allowance: U256,
        events: UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            client,
            events,
            standing_allowance,
            sequencer: Sequencer::new(),
            snapshot: ChainSnapshot::default(),
            refreshing: false,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.client.account()
    }

    pub fn snapshot(&self) -> &ChainSnapshot {
        &self.snapshot
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Start a background read of chain state. Returns `false` without
    /// reading while disconnected or while a read is already running.
    pub fn request_refresh(&mut self) -> bool {
        let Some(account) = self.account() else {
            return false;
        };
        if self.refreshing {
            return false;
        }
        self.refreshing = true;

        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let snapshot = fetch_snapshot(client.as_ref(), account).await;
            let _ = tx.send(ClientEvent::Snapshot(snapshot));
        });
        true
    }

    /// Start a flow for `intent`, sending the approval or the purchase.
    pub fn start_purchase(&mut self, intent: PurchaseIntent) -> Result<Step, StartError> {
        if self.account().is_none() {
            return Err(StartError::Disconnected);
        }
        if !self.sequencer.is_busy()
            && intent.payment_method == PaymentMethod::Stablecoin
            && !can_purchase(&self.snapshot, &intent.token_amount, self.sequencer.phase())
        {
            return Err(StartError::NotReady);
        }

        let info = self.snapshot.token_info.as_ref();
        let needs = needs_approval(self.snapshot.stablecoin_allowance, &intent.token_amount, info);
        let allowance = info.map_or(self.standing_allowance, |i| {
            approval_amount(&intent.token_amount, i.price_per_token, self.standing_allowance)
        });

        let step = self.sequencer.begin(intent, needs)?;
        match &step {
            Step::Approve => {
                self.sequencer.approval_submitted();
                info!("Requesting USDC approval of {} raw units", allowance);
                self.spawn_approval(allowance);
            }
            Step::Purchase(intent) => self.spawn_purchase(intent.clone()),
        }
        Ok(step)
    }

    /// Fold a task result into the snapshot or the sequencer. A confirmed
    /// approval sends the pending purchase.
    pub fn handle_event(&mut self, event: ClientEvent) -> Outcome {
        let flow_event = match event {
            ClientEvent::Snapshot(snapshot) => {
                self.refreshing = false;
                self.snapshot.merge(snapshot);
                return Outcome::Refreshed;
            }
            ClientEvent::Flow(event) => event,
        };

        let before = self.sequencer.phase();
        if let Some(intent) = self.sequencer.apply(flow_event) {
            self.spawn_purchase(intent);
            return Outcome::PurchaseSubmitted;
        }

        let after = self.sequencer.phase();
        if after == before {
            return Outcome::Ignored;
        }
        match after {
            Phase::Success => Outcome::Succeeded {
                tx_hash: self.sequencer.last_tx_hash().unwrap_or_default().to_string(),
            },
            Phase::Failed => self
                .sequencer
                .error()
                .cloned()
                .map_or(Outcome::Ignored, Outcome::Failed),
            _ => Outcome::Ignored,
        }
    }

    /// Close the error modal.
    pub fn dismiss(&mut self) {
        self.sequencer.dismiss();
    }

    pub fn view(
        &self,
        token_amount: &str,
        payment_method: PaymentMethod,
        token_label: &str,
    ) -> PurchaseView {
        build_view(&ViewInputs {
            account: self.account(),
            snapshot: &self.snapshot,
            token_amount,
            payment_method,
            phase: self.sequencer.phase(),
            error: self.sequencer.error(),
            token_label,
        })
    }

    fn spawn_approval(&self, amount: U256) {
        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = flow::submit_approval(client.as_ref(), amount).await;
            let _ = tx.send(ClientEvent::Flow(event));
        });
    }

    fn spawn_purchase(&self, intent: PurchaseIntent) {
        debug!("Submitting purchase of {}", intent.token_amount);
        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = flow::submit_purchase(client.as_ref(), &intent).await;
            let _ = tx.send(ClientEvent::Flow(event));
        });
    }
}
