//! `list` command: one snapshot of the collection, sorted by id.

use companies_core::{Company, Feed};

use crate::cli::{GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

use super::CompanyRow;

pub async fn handle(feed: &Feed, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut companies: Vec<Company> = if args.once {
        feed.fetch_once().await?
    } else {
        let state = super::first_snapshot(feed, global).await?;
        state.records.as_ref().clone()
    };

    if args.recent {
        companies.truncate(feed.config().recent_count);
    }

    let out = output::render_list(
        &global.output,
        &companies,
        |c| CompanyRow::from(c),
        |c| c.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
