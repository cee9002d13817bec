//! Command dispatch: bridges CLI args -> core Feed -> output formatting.

pub mod config_cmd;
pub mod list;
pub mod open;
pub mod watch;

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use companies_core::{Company, Feed, SubscriptionError, ViewState};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a database-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, feed: &Feed, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(feed, args, global).await,
        Command::Watch(args) => watch::handle(feed, args, global).await,
        Command::Open(args) => open::handle(feed, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "not a database command".into(),
        }),
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct CompanyRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Webpage")]
    webpage: String,
    #[tabled(rename = "Logo")]
    logo: String,
}

impl From<&Company> for CompanyRow {
    fn from(c: &Company) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            city: c.city.clone(),
            phone: c.phone_or_na().to_owned(),
            webpage: c.webpage.clone(),
            logo: if c.has_logo() { "yes" } else { "-" }.into(),
        }
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Start the feed and wait for its first settled state.
///
/// Returns the records of a ready state. A failed first state becomes an
/// error. Nothing arriving within the connect timeout is a timeout.
pub(crate) async fn first_snapshot(
    feed: &Feed,
    global: &GlobalOpts,
) -> Result<Arc<ViewState>, CliError> {
    let mut stream = feed.state();
    feed.start().await;

    let spinner = spinner(global);
    let timeout = feed.config().connect_timeout;

    let settled = tokio::time::timeout(timeout, async {
        let mut state = stream.latest();
        while state.loading {
            match stream.changed().await {
                Some(next) => state = next,
                None => break,
            }
        }
        state
    })
    .await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let state = settled.map_err(|_| CliError::Timeout {
        seconds: timeout.as_secs(),
    })?;
    match state.error {
        Some(ref message) => Err(failure(feed, message)),
        None => Ok(state),
    }
}

/// The CLI error for a feed whose state shows `message` as its error.
pub(crate) fn failure(feed: &Feed, message: &str) -> CliError {
    match feed.failure() {
        Some(err) => CliError::from(&err),
        None => CliError::Subscription {
            message: message.to_owned(),
        },
    }
}

fn spinner(global: &GlobalOpts) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message("Loading companies...");
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_decides_the_error() {
        let denied = CliError::from(&SubscriptionError::permission_denied("Unauthorized request."));
        assert!(matches!(denied, CliError::PermissionDenied { ref message } if message == "Unauthorized request."));

        // Wording alone never makes an auth failure
        let other = CliError::from(&SubscriptionError::new("Permission denied"));
        assert!(matches!(other, CliError::Subscription { .. }));
    }

    #[test]
    fn row_uses_phone_placeholder() {
        let row = CompanyRow::from(&Company {
            id: 4,
            title: "Acme".into(),
            ..Company::default()
        });
        assert_eq!(row.phone, "N/A");
        assert_eq!(row.logo, "-");
    }
}
