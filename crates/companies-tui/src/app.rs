//! Application core: event loop, feed lifecycle, action dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use companies_core::{Feed, LinkOpener, ViewPhase};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader, Rates};
use crate::screens::companies::CompaniesScreen;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays on screen.
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    /// The one screen.
    screen: CompaniesScreen,
    /// Whether the app should keep running.
    running: bool,
    /// Help overlay visibility.
    help_visible: bool,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    /// Last phase seen, for the status bar.
    phase: ViewPhase,
    records: usize,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    feed: Feed,
    opener: Arc<dyn LinkOpener>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(feed: Feed, opener: Arc<dyn LinkOpener>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let recent_count = feed.config().recent_count;

        Self {
            screen: CompaniesScreen::new(recent_count),
            running: true,
            help_visible: false,
            notification: None,
            phase: ViewPhase::Loading,
            records: 0,
            action_tx,
            action_rx,
            feed,
            opener,
            data_cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;

        let bridge = {
            let feed = self.feed.clone();
            let tx = self.action_tx.clone();
            let cancel = self.data_cancel.clone();
            tokio::spawn(crate::data_bridge::spawn_data_bridge(feed, tx, cancel))
        };

        let mut events = EventReader::spawn(Rates::default());

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        self.data_cancel.cancel();
        let _ = bridge.await;
        tui.leave();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Global keys first, then the screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (_, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            _ => {}
        }

        self.screen.handle_key_event(key)
    }

    /// Process a single action, update app state and propagate to the screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Resubscribe => {
                info!("re-subscribing");
                let feed = self.feed.clone();
                tokio::spawn(async move { feed.resubscribe().await });
            }

            Action::OpenLink(target) => {
                let notification = match self.opener.open(target) {
                    Ok(()) => Notification::success(format!("Opened {target}")),
                    Err(e) => {
                        warn!(error = %e, "open failed");
                        Notification::error(e.to_string())
                    }
                };
                self.action_tx.send(Action::Notify(notification))?;
            }

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }

            Action::StateUpdated(state) => {
                self.phase = state.phase();
                self.records = state.records.len();
                self.screen.update(action)?;
            }

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.screen.update(action)?;
            }

            Action::Render | Action::Resize(..) => {}
        }

        Ok(())
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        self.screen.render(frame, layout[0]);
        self.render_status_bar(frame, layout[1]);

        if let Some((ref notification, _)) = self.notification {
            render_notification(frame, area, notification);
        }

        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = match self.phase {
            ViewPhase::Ready => Span::styled(
                format!("● live · {} companies", self.records),
                Style::default().fg(theme::SUCCESS_GREEN),
            ),
            ViewPhase::Loading => {
                Span::styled("◐ loading", Style::default().fg(theme::NEON_CYAN))
            }
            ViewPhase::Failed => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
        };

        let line = Line::from(vec![
            Span::raw(" "),
            indicator,
            Span::styled(" │ ", theme::key_hint()),
            Span::styled("←/→ ", theme::key_hint_key()),
            Span::styled("recent  ", theme::key_hint()),
            Span::styled("↑/↓ ", theme::key_hint_key()),
            Span::styled("list  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("open  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("re-subscribe  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}

fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let msg_len = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16.min(area.height);

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2); // above status bar
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (border_color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme::BG_DARK));

    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(&notification.message, Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 13u16.min(area.height.saturating_sub(4));

    let x = area.width.saturating_sub(help_width) / 2;
    let y = area.height.saturating_sub(help_height) / 2;
    let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let row = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };

    let help_text = vec![
        Line::from(""),
        row("←/→ h/l", "Move in the recent strip"),
        row("↑/↓ j/k", "Move in the list"),
        row("g/G", "Top / bottom"),
        row("Enter", "Open the webpage"),
        row("r", "Re-subscribe"),
        row("?", "This help"),
        row("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("           Esc or ? to close", theme::key_hint())),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use companies_core::{Company, CoreError, FeedConfig, ViewState};

    use super::*;

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, target: &str) -> Result<(), CoreError> {
            if self.fail {
                return Err(CoreError::LinkOpenFailed {
                    target: target.into(),
                    reason: "no handler".into(),
                });
            }
            self.opened.lock().unwrap().push(target.into());
            Ok(())
        }
    }

    fn app(opener: Arc<RecordingOpener>) -> App {
        let config = FeedConfig::new("http://127.0.0.1:9".parse().unwrap());
        App::new(Feed::new(config).unwrap(), opener)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn open_link_passes_target_verbatim_and_notifies() {
        let opener = Arc::new(RecordingOpener::default());
        let mut app = app(Arc::clone(&opener));

        app.process_action(&Action::OpenLink("acme.example/about us".into()))
            .unwrap();

        assert_eq!(
            *opener.opened.lock().unwrap(),
            vec!["acme.example/about us".to_owned()]
        );
        let queued = app.action_rx.try_recv().unwrap();
        assert_eq!(
            queued,
            Action::Notify(Notification::success("Opened acme.example/about us"))
        );
    }

    #[test]
    fn open_failure_becomes_error_toast() {
        let opener = Arc::new(RecordingOpener {
            fail: true,
            ..RecordingOpener::default()
        });
        let mut app = app(opener);

        app.process_action(&Action::OpenLink("https://acme.example".into()))
            .unwrap();

        let Action::Notify(notification) = app.action_rx.try_recv().unwrap() else {
            panic!("expected a notification");
        };
        assert_eq!(notification.level, NotificationLevel::Error);
    }

    #[test]
    fn global_keys() {
        let mut app = app(Arc::new(RecordingOpener::default()));

        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('q'))).unwrap(),
            Some(Action::Quit)
        );
        assert_eq!(
            app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
                .unwrap(),
            Some(Action::Quit)
        );

        app.process_action(&Action::ToggleHelp).unwrap();
        assert!(app.help_visible);
        // While help is open, screen keys are swallowed
        assert_eq!(app.handle_key_event(key(KeyCode::Char('r'))).unwrap(), None);
        assert_eq!(
            app.handle_key_event(key(KeyCode::Esc)).unwrap(),
            Some(Action::ToggleHelp)
        );

        app.process_action(&Action::Quit).unwrap();
        assert!(!app.running);
    }

    #[test]
    fn state_update_feeds_status_bar() {
        let mut app = app(Arc::new(RecordingOpener::default()));
        let state = ViewState {
            loading: false,
            error: None,
            records: Arc::new(vec![Company::default(); 3]),
        };

        app.process_action(&Action::StateUpdated(Arc::new(state)))
            .unwrap();

        assert_eq!(app.phase, ViewPhase::Ready);
        assert_eq!(app.records, 3);
    }
}
