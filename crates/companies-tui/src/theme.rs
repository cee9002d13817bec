//! Palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const HEADER_PURPLE: Color = Color::Rgb(98, 0, 238); // #6200ee
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const LINK_BLUE: Color = Color::Rgb(139, 233, 253); // #8be9fd
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const WHITE: Color = Color::Rgb(248, 248, 242); // #f8f8f2
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic Styles ───────────────────────────────────────────────────

/// The fixed app header bar.
pub fn header() -> Style {
    Style::default()
        .fg(WHITE)
        .bg(HEADER_PURPLE)
        .add_modifier(Modifier::BOLD)
}

/// Section headings ("Recent List", "Lists").
pub fn section_title() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for the selected card.
pub fn border_focused() -> Style {
    Style::default().fg(HEADER_PURPLE)
}

/// Border for an unselected card.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Company title on a card.
pub fn card_title() -> Style {
    Style::default().fg(WHITE).add_modifier(Modifier::BOLD)
}

/// Card subtitle ("{city} - Phone: {phone}").
pub fn card_subtitle() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Webpage text, rendered like a link.
pub fn link() -> Style {
    Style::default()
        .fg(LINK_BLUE)
        .add_modifier(Modifier::UNDERLINED)
}

/// Selected large card.
pub fn selected() -> Style {
    Style::default().bg(BG_HIGHLIGHT)
}

/// Error text.
pub fn error() -> Style {
    Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD)
}

/// Key hint text (e.g., "q quit").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}
