//! Company cards: the small recent-strip card and the large list card.

use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};

use companies_core::Company;

use crate::theme;

/// Shown when the company has a logo URL (images are not drawn).
pub const LOGO: &str = "◉";
/// Shown when `logoUrl` is absent.
pub const LOGO_PLACEHOLDER: &str = "○";

/// Width of one small card, borders included.
pub const SMALL_CARD_WIDTH: u16 = 18;
/// Rows taken by one large card.
pub const LARGE_CARD_HEIGHT: usize = 3;

pub fn logo(company: &Company) -> Span<'static> {
    if company.has_logo() {
        Span::styled(LOGO, Style::default().fg(theme::CORAL))
    } else {
        Span::styled(LOGO_PLACEHOLDER, Style::default().fg(theme::BORDER_GRAY))
    }
}

/// Logo over title, centered.
pub fn small(company: &Company) -> Text<'static> {
    Text::from(vec![
        Line::from(logo(company)),
        Line::from(Span::styled(company.title.clone(), theme::card_title())),
    ])
    .alignment(Alignment::Center)
}

/// Logo and title, then the contact line, then the webpage.
pub fn large(company: &Company) -> Text<'static> {
    Text::from(vec![
        Line::from(vec![
            logo(company),
            Span::raw(" "),
            Span::styled(company.title.clone(), theme::card_title()),
        ]),
        Line::from(Span::styled(
            format!("  {}", company.contact_line()),
            theme::card_subtitle(),
        )),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(company.webpage.clone(), theme::link()),
        ]),
    ])
}
