//! End-to-end purchase flow against the in-memory presale.

use std::{sync::Arc, time::Duration};

use alloy::primitives::U256;
use motra_presale::{
    config::Config,
    domain::{
        revert::{PurchaseError, RevertReason},
        sequencer::{PaymentMethod, Phase, PurchaseIntent, SequenceError, Step},
        view::{PurchaseScreen, PurchaseView},
    },
    infra::controller::{ClientEvent, Outcome, PurchaseController, StartError},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    time::timeout,
};

use super::mock_presale::{Call, MockPresale};

struct Harness {
    client: Arc<MockPresale>,
    controller: PurchaseController,
    events: UnboundedReceiver<ClientEvent>,
    standing_allowance: U256,
}

impl Harness {
    fn new(client: MockPresale) -> Self {
        let client = Arc::new(client);
        let (tx, events) = mpsc::unbounded_channel();
        let standing_allowance = U256::from(Config::base().presale.approval_amount);
        let controller = PurchaseController::new(client.clone(), standing_allowance, tx);
        Self {
            client,
            controller,
            events,
            standing_allowance,
        }
    }

    async fn next_event(&mut self) -> ClientEvent {
        timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("chain task did not report")
            .expect("event channel closed")
    }

    /// Feed task results back until no flow or read is in flight.
    async fn settle(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while self.controller.sequencer().is_busy() || self.controller.is_refreshing() {
            let event = self.next_event().await;
            outcomes.push(self.controller.handle_event(event));
        }
        outcomes
    }

    async fn refresh(&mut self) {
        self.controller.request_refresh();
        self.settle().await;
    }

    fn start(&mut self, amount: &str) -> Result<Step, StartError> {
        self.controller
            .start_purchase(PurchaseIntent::stablecoin(amount))
    }

    fn screen(&self, amount: &str) -> Box<PurchaseScreen> {
        match self
            .controller
            .view(amount, PaymentMethod::Stablecoin, "MOTRA")
        {
            PurchaseView::Screen(screen) => screen,
            PurchaseView::ConnectPrompt { .. } => panic!("expected purchase screen"),
        }
    }
}

fn succeeded(outcome: &Outcome) -> bool {
    matches!(outcome, Outcome::Succeeded { tx_hash } if !tx_hash.is_empty())
}

#[tokio::test]
async fn test_first_purchase_approves_then_buys() {
    let mut harness = Harness::new(MockPresale::connected());
    harness.refresh().await;

    let cost = harness.screen("150").cost.unwrap();
    assert_eq!(cost.cost, "1.50 USDC");
    assert_eq!(cost.note, "First time purchase requires USDC approval");

    assert_eq!(harness.start("150"), Ok(Step::Approve));
    let outcomes = harness.settle().await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], Outcome::PurchaseSubmitted);
    assert!(succeeded(&outcomes[1]));
    assert_eq!(
        harness.client.calls(),
        vec![
            Call::Approve(harness.standing_allowance),
            Call::Buy(U256::from(150u64))
        ]
    );
    assert_eq!(harness.controller.sequencer().phase(), Phase::Success);
    assert!(harness.controller.sequencer().error().is_none());
}

#[tokio::test]
async fn test_repeat_purchase_skips_approval() {
    let mut harness = Harness::new(MockPresale::connected());
    harness.refresh().await;
    harness.start("150").unwrap();
    harness.settle().await;

    harness.refresh().await;
    assert_eq!(harness.screen("10").cost.unwrap().note, "Ready to purchase");
    assert_eq!(
        harness.start("10"),
        Ok(Step::Purchase(PurchaseIntent::stablecoin("10")))
    );
    let outcomes = harness.settle().await;
    assert!(succeeded(&outcomes[0]));

    let calls = harness.client.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], Call::Buy(U256::from(10u64)));

    harness.refresh().await;
    assert_eq!(
        harness.controller.snapshot().total_sold,
        Some(U256::from(160u64))
    );
    assert_eq!(harness.screen("").total_sold.as_deref(), Some("1.6 tokens"));
}

#[tokio::test]
async fn test_purchase_above_standing_allowance_approves_full_cost() {
    let client = MockPresale::connected();
    // 3M USDC
    client.state.lock().unwrap().balance = U256::from(3_000_000_000_000u64);
    let mut harness = Harness::new(client);
    harness.refresh().await;

    // 200M tokens at 0.01 cost 2M USDC, twice the standing allowance
    assert!(harness.screen("200000000").button.unwrap().enabled);
    assert_eq!(harness.start("200000000"), Ok(Step::Approve));
    let outcomes = harness.settle().await;

    assert_eq!(
        harness.client.calls(),
        vec![
            Call::Approve(U256::from(2_000_000_000_000u64)),
            Call::Buy(U256::from(200_000_000u64))
        ]
    );
    assert!(succeeded(&outcomes[1]));
    assert!(harness.controller.sequencer().error().is_none());
}

#[tokio::test]
async fn test_rejected_approval_never_purchases() {
    let client = MockPresale::connected();
    client.state.lock().unwrap().reject_approval = true;
    let mut harness = Harness::new(client);
    harness.refresh().await;

    harness.start("150").unwrap();
    let outcomes = harness.settle().await;

    assert_eq!(
        outcomes,
        vec![Outcome::Failed(PurchaseError::ApprovalRejected)]
    );
    assert_eq!(
        harness.client.calls(),
        vec![Call::Approve(harness.standing_allowance)]
    );
    assert_eq!(
        harness.screen("150").error.as_deref(),
        Some("USDC approval failed. Please try again.")
    );

    harness.controller.dismiss();
    assert_eq!(harness.controller.sequencer().phase(), Phase::Idle);
    assert!(harness.screen("150").error.is_none());
}

#[tokio::test]
async fn test_sold_out_shows_message() {
    let client = MockPresale::connected();
    client.state.lock().unwrap().sold_out = true;
    let mut harness = Harness::new(client);
    harness.refresh().await;

    harness.start("150").unwrap();
    let outcomes = harness.settle().await;

    assert_eq!(
        outcomes.last(),
        Some(&Outcome::Failed(PurchaseError::Reverted(RevertReason::SoldOut)))
    );
    assert_eq!(
        harness.screen("150").error.as_deref(),
        Some("Sorry, the presale has sold out!")
    );
}

#[tokio::test]
async fn test_fractional_amount_is_never_approved() {
    let mut harness = Harness::new(MockPresale::connected());
    harness.refresh().await;

    let screen = harness.screen("1.5");
    assert!(!screen.button.unwrap().enabled);
    assert_eq!(screen.cost.unwrap().note, "Enter a whole number of tokens");

    assert_eq!(harness.start("1.5"), Err(StartError::NotReady));
    assert!(harness.client.calls().is_empty());
    assert_eq!(harness.controller.sequencer().phase(), Phase::Idle);
}

#[tokio::test]
async fn test_approval_confirmation_unlocks_one_purchase() {
    let mut harness = Harness::new(MockPresale::connected());
    harness.refresh().await;

    assert_eq!(harness.start("150"), Ok(Step::Approve));
    let approval = harness.next_event().await;
    assert_eq!(
        harness.controller.handle_event(approval.clone()),
        Outcome::PurchaseSubmitted
    );

    // A duplicate confirmation must not start a second purchase
    assert_eq!(harness.controller.handle_event(approval), Outcome::Ignored);

    let outcomes = harness.settle().await;
    assert!(succeeded(&outcomes[0]));
    let buys = harness
        .client
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Buy(_)))
        .count();
    assert_eq!(buys, 1);
}

#[tokio::test]
async fn test_overlapping_intent_is_rejected() {
    let mut harness = Harness::new(MockPresale::connected());
    harness.refresh().await;

    assert_eq!(harness.start("150"), Ok(Step::Approve));
    assert_eq!(
        harness.start("20"),
        Err(StartError::Sequence(SequenceError::Busy(Phase::Approving)))
    );

    let button = harness.screen("150").button.unwrap();
    assert!(!button.enabled);
    assert_eq!(button.label, "Approving...");

    harness.settle().await;
    assert_eq!(
        harness.client.calls(),
        vec![
            Call::Approve(harness.standing_allowance),
            Call::Buy(U256::from(150u64))
        ]
    );
}

#[tokio::test]
async fn test_disconnected_wallet_shows_prompt_without_reads() {
    let mut harness = Harness::new(MockPresale::disconnected());

    assert!(!harness.controller.request_refresh());
    assert!(!harness.controller.is_refreshing());
    assert_eq!(harness.client.reads(), 0);

    assert_eq!(harness.start("150"), Err(StartError::Disconnected));
    assert!(harness.client.calls().is_empty());

    match harness
        .controller
        .view("150", PaymentMethod::Stablecoin, "MOTRA")
    {
        PurchaseView::ConnectPrompt { title } => {
            assert_eq!(title, "Purchase MOTRA Tokens");
        }
        PurchaseView::Screen(_) => panic!("expected connect prompt"),
    }
}

#[tokio::test]
async fn test_single_refresh_in_flight() {
    let mut harness = Harness::new(MockPresale::connected());

    assert!(harness.controller.request_refresh());
    assert!(!harness.controller.request_refresh());
    assert_eq!(harness.settle().await, vec![Outcome::Refreshed]);

    // One pass reads token info, total sold, balance and allowance
    assert_eq!(harness.client.reads(), 4);
    assert!(harness.controller.snapshot().token_info.is_some());
}

#[tokio::test]
async fn test_insufficient_balance_blocks_purchase() {
    let client = MockPresale::connected();
    client.state.lock().unwrap().balance = U256::from(1_000_000u64);
    let mut harness = Harness::new(client);
    harness.refresh().await;

    let screen = harness.screen("150");
    let cost = screen.cost.unwrap();
    assert!(!cost.sufficient);
    assert_eq!(cost.balance, "1 USDC");
    assert_eq!(cost.note, "Insufficient USDC balance");
    assert!(!screen.button.unwrap().enabled);

    assert_eq!(harness.start("150"), Err(StartError::NotReady));
    assert!(harness.client.calls().is_empty());
}
