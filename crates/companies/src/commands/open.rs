//! `open` command: hand a company's webpage to the default browser.

use companies_core::link::{find_by_id, open_company};
use companies_core::{Feed, SystemOpener};

use crate::cli::{GlobalOpts, OpenArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(feed: &Feed, args: OpenArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let companies = feed.fetch_once().await?;
    let company = find_by_id(&companies, args.id)?;

    if args.print {
        output::print_output(&company.webpage, global.quiet);
        return Ok(());
    }

    open_company(&SystemOpener, company)?;
    if !global.quiet {
        eprintln!("✓ Opened {} ({})", company.title, company.webpage);
    }
    Ok(())
}
