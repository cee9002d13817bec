//! Companies screen: header, recent strip, and the full list.
//!
//! Exactly one body layout is drawn per frame: a throbber while loading,
//! the error text after a failure, or both lists once data arrived.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph};
use throbber_widgets_tui::{Throbber, ThrobberState};

use companies_core::{Company, ViewPhase, ViewState};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::card;

pub const HEADER_TITLE: &str = "My Companies App";

pub struct CompaniesScreen {
    state: Arc<ViewState>,
    recent_count: usize,
    recent_selected: usize,
    list_selected: usize,
    throbber_state: ThrobberState,
}

impl CompaniesScreen {
    pub fn new(recent_count: usize) -> Self {
        Self {
            state: Arc::new(ViewState::initial()),
            recent_count,
            recent_selected: 0,
            list_selected: 0,
            throbber_state: ThrobberState::default(),
        }
    }

    fn recent(&self) -> &[Company] {
        self.state.recent(self.recent_count)
    }

    /// The large card under the cursor.
    pub fn selected_company(&self) -> Option<&Company> {
        self.state.records.get(self.list_selected)
    }

    fn clamp_selection(&mut self) {
        self.list_selected = clamp(self.list_selected, self.state.records.len());
        self.recent_selected = clamp(self.recent_selected, self.recent().len());
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_header(frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
        frame.render_widget(Block::default().style(theme::header()), area);
        frame.render_widget(
            Paragraph::new(HEADER_TITLE)
                .style(theme::header())
                .alignment(Alignment::Center),
            layout[1],
        );
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);
        let columns = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(24),
            Constraint::Min(0),
        ])
        .split(layout[1]);

        let throbber = Throbber::default()
            .label(" Loading companies...")
            .style(Style::default().fg(theme::NEON_CYAN))
            .throbber_style(Style::default().fg(theme::HEADER_PURPLE));

        frame.render_stateful_widget(throbber, columns[1], &mut self.throbber_state.clone());
    }

    fn render_error(frame: &mut Frame, area: Rect, message: &str) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

        frame.render_widget(
            Paragraph::new(format!("Error: {message}"))
                .style(theme::error())
                .alignment(Alignment::Center),
            layout[1],
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("r ", theme::key_hint_key()),
                Span::styled("re-subscribe", theme::key_hint()),
            ]))
            .alignment(Alignment::Center),
            layout[2],
        );
    }

    fn render_lists(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1), // "Recent List"
            Constraint::Length(4), // small cards
            Constraint::Length(1), // "Lists"
            Constraint::Min(1),    // large cards
        ])
        .split(area);

        frame.render_widget(
            Paragraph::new(Span::styled(" Recent List", theme::section_title())),
            layout[0],
        );
        self.render_recent_strip(frame, layout[1]);

        frame.render_widget(
            Paragraph::new(Span::styled(" Lists", theme::section_title())),
            layout[2],
        );
        self.render_full_list(frame, layout[3]);
    }

    fn render_recent_strip(&self, frame: &mut Frame, area: Rect) {
        let recent = self.recent();
        if recent.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  (no companies)", theme::key_hint())),
                area,
            );
            return;
        }

        // Scroll so the selected card stays visible
        let visible = usize::from(area.width / card::SMALL_CARD_WIDTH).max(1);
        let offset = (self.recent_selected + 1).saturating_sub(visible);

        let mut constraints = vec![Constraint::Length(card::SMALL_CARD_WIDTH); visible];
        constraints.push(Constraint::Min(0));
        let slots = Layout::horizontal(constraints).split(area);

        for (slot, (index, company)) in slots
            .iter()
            .zip(recent.iter().enumerate().skip(offset).take(visible))
        {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if index == self.recent_selected {
                    theme::border_focused()
                } else {
                    theme::border_default()
                });
            let inner = block.inner(*slot);
            frame.render_widget(block, *slot);
            frame.render_widget(Paragraph::new(card::small(company)), inner);
        }
    }

    fn render_full_list(&self, frame: &mut Frame, area: Rect) {
        if self.state.records.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  (no companies)", theme::key_hint())),
                area,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .state
            .records
            .iter()
            .map(|company| ListItem::new(card::large(company)))
            .collect();

        let list = List::new(items)
            .highlight_style(theme::selected())
            .highlight_symbol("▌ ");

        let mut state = ListState::default().with_selected(Some(self.list_selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Keep `index` inside `0..len` (0 when empty).
fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

impl Component for CompaniesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let phase = self.state.phase();
        let action = match key.code {
            KeyCode::Char('r') if phase != ViewPhase::Loading => Some(Action::Resubscribe),
            _ if phase != ViewPhase::Ready => None,

            KeyCode::Left | KeyCode::Char('h') => {
                self.recent_selected = self.recent_selected.saturating_sub(1);
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.recent_selected = clamp(self.recent_selected + 1, self.recent().len());
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_selected = self.list_selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list_selected = clamp(self.list_selected + 1, self.state.records.len());
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.list_selected = 0;
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.list_selected = clamp(usize::MAX, self.state.records.len());
                None
            }
            KeyCode::Enter => self
                .selected_company()
                .map(|company| Action::OpenLink(company.webpage.clone())),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StateUpdated(state) => {
                self.state = Arc::clone(state);
                self.clamp_selection();
            }
            Action::Tick if self.state.loading => {
                self.throbber_state.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).split(area);

        Self::render_header(frame, layout[0]);

        match self.state.phase() {
            ViewPhase::Loading => self.render_loading(frame, layout[1]),
            ViewPhase::Failed => {
                Self::render_error(frame, layout[1], self.state.error.as_deref().unwrap_or(""));
            }
            ViewPhase::Ready => self.render_lists(frame, layout[1]),
        }
    }
}
