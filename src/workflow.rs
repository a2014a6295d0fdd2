#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use bon::Builder;

use crate::{
    constants::PREVIEW_LIMIT,
    directory::{DirectoryService, Session},
    report::{self, ReportKind},
    selection::SelectionPolicy,
    user::{SiteRole, UserRecord},
};

/// What a run does once the users are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Write every selected user to a report. Nothing changes.
    Report,
    /// Show and write the first page of users a test update would change.
    Preview,
    /// Assign `role` to the selected users.
    Update {
        /// Role to assign.
        role:    SiteRole,
        /// Only touch the first [`PREVIEW_LIMIT`] selected users.
        limited: bool,
    },
}

impl RunMode {
    /// Maximum number of selected users the mode acts on.
    pub fn limit(&self) -> Option<usize> {
        match self {
            RunMode::Report | RunMode::Update { limited: false, .. } => None,
            RunMode::Preview | RunMode::Update { limited: true, .. } => Some(PREVIEW_LIMIT),
        }
    }

    /// The CSV artifact the mode writes.
    pub fn report_kind(&self) -> ReportKind {
        match self {
            RunMode::Report => ReportKind::Check,
            RunMode::Preview => ReportKind::Preview,
            RunMode::Update { .. } => ReportKind::Update,
        }
    }
}

/// Outcome of the update loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateTally {
    /// Users the server accepted the new role for.
    pub succeeded: usize,
    /// Users whose update failed.
    pub failed:    usize,
}

impl UpdateTally {
    /// Number of updates attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Mode the run executed.
    pub mode:        RunMode,
    /// Users listed on the site.
    pub fetched:     usize,
    /// Users satisfying the selection policy.
    pub matched:     usize,
    /// Users acted on after truncation.
    pub selected:    usize,
    /// CSV artifact written by the run.
    pub report_path: PathBuf,
    /// Update counts, for update runs.
    pub updates:     Option<UpdateTally>,
}

/// Runs one pass over a directory service: sign in, list, select, then
/// report, preview or update, and sign out.
#[derive(Builder)]
pub struct Workflow<'a, S: DirectoryService> {
    /// Service to work against.
    service:    &'a S,
    /// Which users are eligible.
    #[builder(default)]
    policy:     SelectionPolicy,
    /// Directory for CSV artifacts.
    #[builder(into)]
    output_dir: PathBuf,
    /// Stamp embedded in artifact names.
    #[builder(into, default = report::run_stamp())]
    stamp:      String,
}

impl<S: DirectoryService> Workflow<'_, S> {
    /// Executes `mode`.
    ///
    /// Sign-in, listing and report failures end the run with an error;
    /// failures updating single users are counted instead. The session is
    /// signed out exactly once whichever way the run ends, and a sign-out
    /// failure is only logged.
    pub fn run(&self, mode: RunMode) -> Result<RunSummary> {
        let session = Session::open(self.service).context("Could not connect to Tableau Server")?;

        let outcome = self.run_signed_in(&session, mode);
        if let Err(e) = session.close() {
            tracing::warn!("{e}");
        }

        outcome
    }

    /// Everything between sign-in and sign-out.
    fn run_signed_in(&self, session: &Session<'_, S>, mode: RunMode) -> Result<RunSummary> {
        let users = session.list_users().context("Could not list site users")?;
        tracing::info!("Found {} users", users.len());

        let matched = self.policy.select(&users, None);
        tracing::info!("{} users match the selection criteria", matched.len());

        let selected = &matched[..mode.limit().map_or(matched.len(), |n| n.min(matched.len()))];

        let (report_path, updates) = match &mode {
            RunMode::Report => {
                let path = self.write(mode.report_kind(), selected)?;
                tracing::info!("Selected users were saved to {}", path.display());
                tracing::info!(
                    "To review the first {PREVIEW_LIMIT} users a test update would change, run \
                     with --preview"
                );
                (path, None)
            }
            RunMode::Preview => {
                tracing::info!(
                    "First {PREVIEW_LIMIT} users a test update would change:\n{}",
                    report::preview_table(selected)
                );
                let path = self.write(mode.report_kind(), selected)?;
                tracing::info!("The preview was also saved to {}", path.display());
                tracing::info!("To apply a new role to these users, run with --update --role <ROLE> --test");
                (path, None)
            }
            RunMode::Update { role, limited } => {
                if *limited {
                    tracing::info!(
                        "Test mode: changing only the first {} of {} matching users",
                        selected.len(),
                        matched.len()
                    );
                }
                if role == self.policy.sentinel_role() {
                    tracing::warn!("{role} is already the role being replaced; updates will not change it");
                }
                tracing::info!("{} users will be changed to {role}", selected.len());

                let path = self.write(mode.report_kind(), selected)?;
                tracing::info!("Users about to change were saved to {}", path.display());

                let tally = apply_role(session, selected, role);
                (path, Some(tally))
            }
        };

        Ok(RunSummary {
            mode,
            fetched: users.len(),
            matched: matched.len(),
            selected: selected.len(),
            report_path,
            updates,
        })
    }

    /// Writes `users` as a `kind` report into the output directory.
    fn write(&self, kind: ReportKind, users: &[&UserRecord]) -> Result<PathBuf> {
        report::write_report(&self.output_dir, kind, &self.stamp, users)
    }
}

/// Assigns `role` to each user in turn, counting instead of stopping on a
/// failure.
fn apply_role<S: DirectoryService + ?Sized>(
    session: &Session<'_, S>,
    users: &[&UserRecord],
    role: &SiteRole,
) -> UpdateTally {
    let mut tally = UpdateTally::default();

    for user in users {
        match session.update_site_role(user, role) {
            Ok(()) => {
                tally.succeeded += 1;
                tracing::info!("Updated {} ({} -> {role})", user.name(), user.site_role());
                tracing::info!("Display name: {}", user.full_name().unwrap_or_default());
            }
            Err(e) => {
                tally.failed += 1;
                tracing::error!("{e}");
            }
        }
    }

    tracing::info!(
        "Update finished: {} succeeded, {} failed",
        tally.succeeded,
        tally.failed
    );
    tally
}
