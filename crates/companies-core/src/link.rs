// ── External link opening ──
//
// A company's webpage is handed to the host's URL opener exactly as
// stored. No parsing, no validation.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::CoreError;
use crate::model::Company;

/// Opens a link in an external viewer.
pub trait LinkOpener: Send + Sync {
    fn open(&self, target: &str) -> Result<(), CoreError>;
}

/// Uses the platform's default opener (`xdg-open`, `open`, or `start`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(target: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(target);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }
}

impl LinkOpener for SystemOpener {
    fn open(&self, target: &str) -> Result<(), CoreError> {
        debug!(target, "opening link");
        Self::command(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|mut child| {
                // Reap in the background; the opener may outlive the call.
                std::thread::spawn(move || child.wait());
            })
            .map_err(|e| CoreError::LinkOpenFailed {
                target: target.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Open `company`'s webpage verbatim.
pub fn open_company(opener: &dyn LinkOpener, company: &Company) -> Result<(), CoreError> {
    opener.open(&company.webpage)
}

/// First company carrying `id`, in list order.
pub fn find_by_id(records: &[Company], id: i64) -> Result<&Company, CoreError> {
    records
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| CoreError::CompanyNotFound {
            identifier: id.to_string(),
        })
}
