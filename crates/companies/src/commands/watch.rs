//! `watch` command: keep the subscription open and print every new state.
//!
//! Table output prints a timestamped header per change. JSON output prints
//! one compact document per line so it can be piped. YAML output prints one
//! `---` separated document per change.

use chrono::Local;
use owo_colors::OwoColorize;
use serde::Serialize;

use companies_core::{Company, Feed, ViewState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::CompanyRow;

/// One `watch -o json` line or `watch -o yaml` document.
#[derive(Serialize)]
struct Frame<'a> {
    time: String,
    loading: bool,
    error: Option<&'a str>,
    records: &'a [Company],
}

pub async fn handle(feed: &Feed, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut stream = feed.state();
    feed.start().await;

    let color = output::should_color(&global.color);
    let recent = args.recent.then_some(feed.config().recent_count);
    let mut state = stream.latest();

    loop {
        if !state.loading {
            let out = render_frame(&state, recent, &global.output, color)?;
            output::print_output(&out, global.quiet);
        }
        if let Some(ref message) = state.error {
            return Err(super::failure(feed, message));
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, stopping watch");
                return Ok(());
            }
            next = stream.changed() => match next {
                Some(next) => state = next,
                None => return Ok(()),
            },
        }
    }
}

fn render_frame(
    state: &ViewState,
    recent: Option<usize>,
    format: &OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    let records = match recent {
        Some(count) => state.recent(count),
        None => state.records.as_slice(),
    };
    let time = Local::now().format("%H:%M:%S").to_string();

    match format {
        OutputFormat::Table => {
            let mut header = format!("[{time}] {} companies", records.len());
            if color {
                header = header.dimmed().to_string();
            }
            let table = output::render_list(
                format,
                records,
                |c| CompanyRow::from(c),
                |c| c.id.to_string(),
            )?;
            Ok(format!("{header}\n{table}"))
        }
        OutputFormat::Plain => output::render_list(
            format,
            records,
            |c| CompanyRow::from(c),
            |c| c.id.to_string(),
        ),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            let frame = Frame {
                time,
                loading: state.loading,
                error: state.error.as_deref(),
                records,
            };
            if matches!(format, OutputFormat::Yaml) {
                let doc = output::render_yaml(&frame)?;
                Ok(format!("---\n{}", doc.trim_end()))
            } else {
                output::render_json(&frame, true)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn state(ids: &[i64]) -> ViewState {
        ViewState {
            loading: false,
            error: None,
            records: Arc::new(
                ids.iter()
                    .map(|&id| Company {
                        id,
                        ..Company::default()
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn json_frame_is_one_line() {
        let out = render_frame(&state(&[1, 2]), None, &OutputFormat::Json, false).unwrap();
        assert!(!out.contains('\n'));
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["records"].as_array().unwrap().len(), 2);
        assert_eq!(v["loading"], false);
    }

    #[test]
    fn yaml_frame_is_a_separate_document() {
        let out = render_frame(&state(&[1, 2]), None, &OutputFormat::Yaml, false).unwrap();
        assert!(out.starts_with("---\n"), "{out}");
        assert!(!out.trim_start_matches("---\n").starts_with('{'), "{out}");
        let v: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(v["records"].as_sequence().unwrap().len(), 2);
        assert_eq!(v["loading"], serde_yaml::Value::Bool(false));
    }

    #[test]
    fn recent_limits_the_frame() {
        let out = render_frame(&state(&[1, 2, 3]), Some(2), &OutputFormat::Plain, false).unwrap();
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn table_frame_has_header() {
        let out = render_frame(&state(&[7]), None, &OutputFormat::Table, false).unwrap();
        assert!(out.contains("1 companies"));
        assert!(out.contains("Title"));
    }
}
