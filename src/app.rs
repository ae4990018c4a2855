use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use alloy::primitives::{Address, U256};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use motra_presale::{
    config::{Config, PRIVATE_KEY_ENV, get_config_dir},
    domain::{
        sequencer::{Phase, PurchaseIntent, Step},
        view::PurchaseView,
    },
    infra::{
        client::{EvmPresaleClient, PresaleClient, signer_from_env},
        controller::{ClientEvent, Outcome, PurchaseController, StartError},
        onramp,
    },
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    action::Action,
    cli::Args,
    components::{Component, purchase::PurchaseComponent},
    tui::{Event, Frame, Tui},
};

pub struct App {
    pub should_quit: bool,
    pub should_suspend: bool,
    pub show_help: bool,
    pub config: Config,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
    pub client_rx: UnboundedReceiver<ClientEvent>,
    pub tui: Tui,
    pub controller: PurchaseController,
    pub purchase_component: PurchaseComponent,
    pub status_message: String,
    pub last_refresh: Option<Instant>,
    pub poll_interval: Duration,
}

impl App {
    pub fn new(args: &Args) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (client_tx, client_rx) = mpsc::unbounded_channel();

        let config = Config::load(&get_config_dir(), &args.network, args.rpc_url.as_deref())?;
        let poll_interval = Duration::from_secs(
            args.poll_interval
                .unwrap_or(config.presale.poll_interval_secs)
                .max(1),
        );

        let signer = signer_from_env(PRIVATE_KEY_ENV)?;
        let client = EvmPresaleClient::new(&config, signer)?;
        match client.account() {
            Some(address) => info!("Wallet connected: {}", address),
            None => info!("No wallet connected ({} not set)", PRIVATE_KEY_ENV),
        }
        let controller = PurchaseController::new(
            Arc::new(client),
            U256::from(config.presale.approval_amount),
            client_tx,
        );

        let purchase_component = PurchaseComponent::new(action_tx.clone());

        let tui = Tui::new()?
            .tick_rate(args.tick_rate)
            .frame_rate(args.frame_rate)
            .paste(true);

        Ok(Self {
            should_quit: false,
            should_suspend: false,
            show_help: false,
            config,
            action_tx,
            action_rx,
            client_rx,
            tui,
            controller,
            purchase_component,
            status_message: "Ready".to_string(),
            last_refresh: None,
            poll_interval,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.tui.enter()?;

        self.request_refresh();

        loop {
            // Handle events
            if let Some(event) = self.tui.next().await {
                self.handle_event(event)?;
            }

            // Handle results from chain tasks
            while let Ok(event) = self.client_rx.try_recv() {
                self.handle_client_event(event);
            }

            // Handle actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.handle_action(action)?;
            }

            if self.should_suspend {
                self.tui.suspend()?;
                self.should_suspend = false;
                self.tui.resume()?;
            }

            if self.should_quit {
                break;
            }
        }

        self.tui.exit()?;
        Ok(())
    }

    fn error_shown(&self) -> bool {
        self.controller.sequencer().error().is_some()
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Init => {
                info!("Application initialized");
            }
            Event::Tick => {
                self.action_tx.send(Action::Tick)?;
            }
            Event::Render => {
                self.action_tx.send(Action::Render)?;
            }
            Event::Key(key_event) => {
                self.handle_key_event(key_event)?;
            }
            Event::Paste(text) => {
                if !self.error_shown() {
                    self.purchase_component.paste(&text);
                }
            }
            Event::Resize(w, h) => {
                self.action_tx.send(Action::Resize(w, h))?;
            }
            Event::Error => {
                self.action_tx
                    .send(Action::Error("Terminal input error".to_string()))?;
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.action_tx.send(Action::Quit)?;
            return Ok(());
        }

        // The error modal captures input until it is closed
        if self.error_shown() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.action_tx.send(Action::DismissError)?,
                KeyCode::Char('q') => self.action_tx.send(Action::Quit)?,
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::Quit)?;
            }
            KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.action_tx.send(Action::Suspend)?;
            }
            KeyCode::Char('?') => {
                self.action_tx.send(Action::Help)?;
            }
            KeyCode::Char('r') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::Refresh)?;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
            }
            _ => {
                self.purchase_component.handle_key_event(key)?;
            }
        }
        Ok(())
    }

    fn handle_action(&mut self, action: Action) -> Result<()> {
        if !matches!(action, Action::Tick | Action::Render) {
            debug!("Handling action: {:?}", action);
        }
        match action {
            Action::Tick => {
                let due = self
                    .last_refresh
                    .is_none_or(|last| last.elapsed() >= self.poll_interval);
                if due {
                    self.request_refresh();
                }
            }
            Action::Render => {
                self.draw_ui()?;
            }
            Action::Resize(w, h) => {
                self.tui.resize(Rect::new(0, 0, w, h))?;
                self.draw_ui()?;
            }
            Action::Suspend => {
                self.should_suspend = true;
            }
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Error(message) => {
                warn!("{}", message);
                self.status_message = message;
            }
            Action::Help => {
                self.show_help = !self.show_help;
            }
            Action::Refresh => {
                self.last_refresh = None;
                self.request_refresh();
            }
            Action::Purchase => {
                self.start_purchase();
            }
            Action::DismissError => {
                self.controller.dismiss();
                self.status_message = "Ready".to_string();
            }
            Action::TogglePaymentMethod => {
                self.purchase_component.toggle_payment_method();
            }
        }
        Ok(())
    }

    fn request_refresh(&mut self) {
        if self.controller.request_refresh() {
            self.last_refresh = Some(Instant::now());
        }
    }

    fn current_view(&self) -> PurchaseView {
        self.controller.view(
            &self.purchase_component.token_amount,
            self.purchase_component.payment_method,
            &self.config.presale.token_label,
        )
    }

    fn start_purchase(&mut self) {
        let intent = PurchaseIntent {
            token_amount: self.purchase_component.token_amount.trim().to_string(),
            payment_method: self.purchase_component.payment_method,
        };

        match self.controller.start_purchase(intent) {
            Ok(Step::Approve) => {
                self.status_message = "Approving USDC...".to_string();
            }
            Ok(Step::Purchase(_)) => {
                self.status_message = "Processing purchase...".to_string();
            }
            Err(StartError::Disconnected) => {}
            Err(e) => {
                self.status_message = e.to_string();
            }
        }
    }

    fn handle_client_event(&mut self, event: ClientEvent) {
        match self.controller.handle_event(event) {
            Outcome::Refreshed | Outcome::Ignored => return,
            Outcome::PurchaseSubmitted => {
                self.status_message = "USDC approved, submitting purchase...".to_string();
            }
            Outcome::Succeeded { tx_hash } => {
                self.purchase_component.clear();
                self.status_message = format!("Purchase successful! {tx_hash}");
            }
            Outcome::Failed(error) => {
                self.status_message = error.to_string();
            }
        }
        // Balances and allowance moved
        self.last_refresh = None;
    }

    fn draw_ui(&mut self) -> Result<()> {
        let view = self.current_view();
        let onramp_link = match &view {
            PurchaseView::Screen(screen) => screen.fiat.as_ref().and_then(|fiat| {
                onramp::launch_url(&self.config, &fiat.onramp_amount, &fiat.widget_title)
                    .inspect_err(|e| debug!("On-ramp link unavailable: {}", e))
                    .ok()
            }),
            PurchaseView::ConnectPrompt { .. } => None,
        };
        self.purchase_component.set_view(view, onramp_link);

        let network = self.config.network.name.clone();
        let account = self.controller.account();
        let phase = self.controller.sequencer().phase();
        let status_message = self.status_message.clone();
        let show_help = self.show_help;
        let component = &mut self.purchase_component;

        self.tui.draw(|f| {
            let chunks = Layout::vertical([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Status
            ])
            .split(f.area());

            draw_header(f, chunks[0], &network, account);
            component.draw(f, chunks[1]);
            draw_status(f, chunks[2], &status_message, phase);
            if show_help {
                draw_help(f, chunks[1]);
            }
        })?;
        Ok(())
    }
}

fn short_address(address: Address) -> String {
    let s = address.to_string();
    format!("{}...{}", &s[..6], &s[s.len() - 4..])
}

fn draw_header(f: &mut Frame, area: Rect, network: &str, account: Option<Address>) {
    let account_span = match account {
        Some(address) => Span::styled(short_address(address), Style::default().fg(Color::Green)),
        None => Span::styled("not connected", Style::default().fg(Color::Red)),
    };
    let title = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "MOTRA Presale",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("[{network}]"), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        account_span,
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(title, area);
}

fn draw_status(f: &mut Frame, area: Rect, status_message: &str, phase: Phase) {
    let status = Paragraph::new(vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
        Span::styled(status_message, Style::default().fg(Color::Green)),
        Span::raw("  |  "),
        Span::styled(phase.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw("  |  "),
        Span::styled(
            "[q]Quit [?]Help [r]Refresh [m]Method",
            Style::default().fg(Color::DarkGray),
        ),
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(status, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from("0-9 .      Enter token amount"),
        Line::from("Backspace  Delete last digit"),
        Line::from("c          Clear amount"),
        Line::from("m / ← →    Switch payment method"),
        Line::from("Enter      Purchase (or switch back from fiat)"),
        Line::from("r          Refresh chain state"),
        Line::from("q          Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "[?/Esc] Close help",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let [popup] = Layout::vertical([Constraint::Length(11)])
        .flex(ratatui::layout::Flex::Center)
        .areas(area);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        popup,
    );
}
