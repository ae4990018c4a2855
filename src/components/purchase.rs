//! Purchase screen: token info, payment method, amount entry, cost and the
//! purchase button, plus the fiat on-ramp panel and the error modal.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use motra_presale::domain::{
    sequencer::PaymentMethod,
    view::{CONNECT_PROMPT, CostPanel, FiatPanel, PurchaseScreen, PurchaseView, Tone},
};
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{action::Action, tui::Frame};

use super::Component;

/// Longest amount the input accepts.
const MAX_AMOUNT_LEN: usize = 24;

pub struct PurchaseComponent {
    action_tx: UnboundedSender<Action>,
    pub token_amount: String,
    pub payment_method: PaymentMethod,
    /// Last view built by the app; drives rendering and selector guards.
    pub view: Option<PurchaseView>,
    /// On-ramp launch link for the current fiat panel.
    pub onramp_link: Option<String>,
}

impl PurchaseComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            token_amount: String::new(),
            payment_method: PaymentMethod::Stablecoin,
            view: None,
            onramp_link: None,
        }
    }

    pub fn set_view(&mut self, view: PurchaseView, onramp_link: Option<String>) {
        self.view = Some(view);
        self.onramp_link = onramp_link;
    }

    /// Clear the amount after a successful purchase.
    pub fn clear(&mut self) {
        self.token_amount.clear();
    }

    pub fn paste(&mut self, text: &str) {
        for c in text.trim().chars() {
            self.push_char(c);
        }
    }

    fn push_char(&mut self, c: char) {
        if self.token_amount.len() >= MAX_AMOUNT_LEN {
            return;
        }
        // Only allow digits and decimal point
        if c.is_ascii_digit() || (c == '.' && !self.token_amount.contains('.')) {
            self.token_amount.push(c);
        }
    }

    fn stablecoin_selectable(&self) -> bool {
        match &self.view {
            Some(PurchaseView::Screen(screen)) => screen.stablecoin_selectable,
            _ => false,
        }
    }

    /// Switch payment method. Stablecoin can only be chosen while the
    /// presale accepts it.
    pub fn toggle_payment_method(&mut self) {
        let next = self.payment_method.toggle();
        if next == PaymentMethod::Stablecoin && !self.stablecoin_selectable() {
            return;
        }
        self.payment_method = next;
    }

    pub fn draw_static(f: &mut Frame, area: Rect, view: &PurchaseView, onramp_link: Option<&str>) {
        match view {
            PurchaseView::ConnectPrompt { title } => draw_connect_prompt(f, area, title),
            PurchaseView::Screen(screen) => draw_screen(f, area, screen, onramp_link),
        }
    }
}

impl Component for PurchaseComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.push_char(c),
            KeyCode::Backspace => {
                self.token_amount.pop();
            }
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char('m') | KeyCode::Left | KeyCode::Right => {
                self.action_tx.send(Action::TogglePaymentMethod)?;
            }
            KeyCode::Enter => match self.payment_method {
                PaymentMethod::Stablecoin => {
                    self.action_tx.send(Action::Purchase)?;
                }
                // "Switch to Direct Purchase"
                PaymentMethod::Fiat => {
                    self.action_tx.send(Action::TogglePaymentMethod)?;
                }
            },
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        if let Some(ref view) = self.view {
            Self::draw_static(f, area, view, self.onramp_link.as_deref());
        }
    }
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Normal => Style::default().fg(Color::White),
        Tone::Good => Style::default().fg(Color::Green),
        Tone::Bad => Style::default().fg(Color::Red),
    }
}

fn draw_connect_prompt(f: &mut Frame, area: Rect, title: &str) {
    let prompt = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(CONNECT_PROMPT, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Set {} to a wallet private key and restart",
                motra_presale::config::PRIVATE_KEY_ENV
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(bordered(title));
    f.render_widget(prompt, area);
}

fn draw_screen(f: &mut Frame, area: Rect, screen: &PurchaseScreen, onramp_link: Option<&str>) {
    let outer = bordered(&screen.title);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Length(5), // Token info
        Constraint::Length(3), // Payment method
        Constraint::Length(3), // Amount
        Constraint::Min(5),    // Cost / fiat panel
        Constraint::Length(3), // Purchase button
        Constraint::Length(1), // Total sold
    ])
    .split(inner);

    draw_token_info(f, chunks[0], screen);
    draw_payment_method(f, chunks[1], screen);
    draw_amount(f, chunks[2], &screen.token_amount);

    if let Some(ref cost) = screen.cost {
        draw_cost(f, chunks[3], cost);
    } else if let Some(ref fiat) = screen.fiat {
        draw_fiat(f, chunks[3], fiat, onramp_link);
    }

    if let Some(ref button) = screen.button {
        let style = if button.enabled {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let widget = Paragraph::new(Line::from(Span::styled(
            format!("  [ {} ]  ", button.label),
            style,
        )))
        .alignment(Alignment::Center)
        .block(bordered("Enter"));
        f.render_widget(widget, chunks[4]);
    }

    if let Some(ref sold) = screen.total_sold {
        let widget = Paragraph::new(Line::from(vec![
            Span::styled("Total Sold: ", Style::default().fg(Color::DarkGray)),
            Span::styled(sold.as_str(), Style::default().fg(Color::Cyan)),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(widget, chunks[5]);
    }

    if let Some(ref error) = screen.error {
        draw_error_modal(f, area, error);
    }
}

fn draw_token_info(f: &mut Frame, area: Rect, screen: &PurchaseScreen) {
    if screen.token_rows.is_empty() {
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Gray))
            .block(bordered("Token"));
        f.render_widget(loading, area);
        return;
    }

    // Two columns of three fields
    let columns = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(bordered("Token").inner(area));
    f.render_widget(bordered("Token"), area);

    for (column, rows) in columns.iter().zip(screen.token_rows.chunks(3)) {
        let lines: Vec<Line> = rows
            .iter()
            .map(|row| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<16}", row.label),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(row.value.as_str(), tone_style(row.tone)),
                ])
            })
            .collect();
        f.render_widget(Paragraph::new(lines), *column);
    }
}

fn draw_payment_method(f: &mut Frame, area: Rect, screen: &PurchaseScreen) {
    let option = |method: PaymentMethod, label: &'static str, enabled: bool| {
        let style = if !enabled {
            Style::default().fg(Color::DarkGray)
        } else if screen.payment_method == method {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Span::styled(format!(" {label} "), style)
    };

    let line = Line::from(vec![
        option(
            PaymentMethod::Stablecoin,
            "USDC Payment",
            screen.stablecoin_selectable,
        ),
        Span::raw("   "),
        option(PaymentMethod::Fiat, "Card & Stablecoin", true),
    ]);
    f.render_widget(
        Paragraph::new(line).block(bordered("Payment Method [m]")),
        area,
    );
}

fn draw_amount(f: &mut Frame, area: Rect, amount: &str) {
    let text = if amount.is_empty() {
        Span::styled(
            "Enter amount of tokens to buy",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(format!("{amount}│"), Style::default().fg(Color::Yellow))
    };
    f.render_widget(
        Paragraph::new(Line::from(text)).block(bordered("Token Amount")),
        area,
    );
}

fn draw_cost(f: &mut Frame, area: Rect, cost: &CostPanel) {
    let (mark, balance_color) = if cost.sufficient {
        (" ✅", Color::Green)
    } else {
        (" ❌", Color::Red)
    };
    let note_color = if cost.sufficient {
        Color::Gray
    } else {
        Color::Red
    };

    let lines = vec![
        Line::from(vec![
            Span::raw("Cost: "),
            Span::styled(
                cost.cost.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("Your Balance: "),
            Span::styled(cost.balance.as_str(), Style::default().fg(balance_color)),
            Span::raw(mark),
        ]),
        Line::from(Span::styled(cost.note, Style::default().fg(note_color))),
    ];
    f.render_widget(Paragraph::new(lines).block(bordered("Cost")), area);
}

fn draw_fiat(f: &mut Frame, area: Rect, fiat: &FiatPanel, onramp_link: Option<&str>) {
    let link = onramp_link.unwrap_or("On-ramp unavailable (check onramp.widget_url)");
    let lines = vec![
        Line::from(Span::styled(
            fiat.heading.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Pay with credit cards, bank transfers, or stablecoins",
            Style::default().fg(Color::Gray),
        )),
        Line::from(fiat.estimate.as_str()),
        Line::from(""),
        Line::from(Span::styled(
            format!("Option 1: {}", fiat.widget_title),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(link),
        Line::from(""),
        Line::from(Span::styled(
            "Option 2: [Enter] Switch to Direct Purchase",
            Style::default().fg(Color::Cyan),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(bordered("Buy with Fiat")),
        area,
    );
}

fn draw_error_modal(f: &mut Frame, area: Rect, message: &str) {
    let [modal] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [modal] = Layout::vertical([Constraint::Length(9)])
        .flex(Flex::Center)
        .areas(modal);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "⚠️  Purchase Failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter/Esc] Close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    f.render_widget(Clear, modal);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            ),
        modal,
    );
}
