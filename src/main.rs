#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # rolesweep
//! ## Introduction
//!
//! Bulk site-role changes for Tableau Server users.
//!
//! A plain run lists every user that qualifies and saves them to a CSV file.
//! `--preview` shows the first ten a test update would touch, and
//! `--update --role <ROLE> [--test]` applies the new role.
//!
//! ## Configuration
//!
//! Connection details come from the environment (a `.env` file in the
//! working directory is read first): `TABLEAU_SERVER`, `TABLEAU_USERNAME`
//! and `TABLEAU_PASSWORD` are required.

use std::path::PathBuf;

use anyhow::Result;
use bpaf::*;
use dotenvy::dotenv;
use rolesweep::{
    config::Config,
    directory::TableauClient,
    logging, report,
    user::SiteRole,
    workflow::{RunMode, Workflow},
};

/// Parsed command line.
#[derive(Debug, Clone)]
struct Options {
    /// Apply the role change.
    update:     bool,
    /// Role to assign.
    role:       Option<SiteRole>,
    /// Limit the update to the first ten users.
    test:       bool,
    /// Preview instead of reporting or updating.
    preview:    bool,
    /// Where to write artifacts.
    output_dir: Option<PathBuf>,
}

impl Options {
    /// The run mode the flags ask for; `--preview` wins over `--update`.
    fn mode(&self) -> RunMode {
        match (self.preview, self.update, &self.role) {
            (true, ..) => RunMode::Preview,
            (false, true, Some(role)) => RunMode::Update {
                role:    role.clone(),
                limited: self.test,
            },
            _ => RunMode::Report,
        }
    }
}

/// Builds the command line parser
fn parser() -> OptionParser<Options> {
    let update = long("update")
        .help("Change the role of every selected user")
        .switch();
    let role = long("role")
        .help("Role to assign, e.g. Explorer, Viewer or Creator")
        .argument::<SiteRole>("ROLE")
        .optional();
    let test = long("test")
        .help("Only change the first 10 selected users")
        .switch();
    let preview = long("preview")
        .help("List the first 10 users a --test update would change")
        .switch();
    let output_dir = long("output-dir")
        .help("Directory for CSV reports and the run log")
        .argument::<PathBuf>("DIR")
        .optional();

    construct!(Options {
        update,
        role,
        test,
        preview,
        output_dir
    })
    .guard(|opts| !opts.update || opts.role.is_some(), "--role is required with --update")
    .to_options()
    .descr("Bulk site-role changes for Tableau Server users")
}

fn main() -> Result<()> {
    dotenv().ok();

    let opts = parser().run();
    let mode = opts.mode();

    let mut config = Config::from_env()?;
    if let Some(dir) = opts.output_dir {
        config = config.with_output_dir(dir);
    }

    let stamp = report::run_stamp();
    let log_file = logging::init(config.output_dir(), &stamp)?;
    tracing::info!("Logging to {}", log_file.display());

    let client = TableauClient::new(config.tableau())?;
    let summary = Workflow::builder()
        .service(&client)
        .policy(config.selection().clone())
        .output_dir(config.output_dir())
        .stamp(stamp)
        .build()
        .run(mode)
        .inspect_err(|e| tracing::error!("{e:#}"))?;

    tracing::info!(
        "Done: {} users listed, {} matched, {} selected",
        summary.fetched,
        summary.matched,
        summary.selected
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, ParseFailure> {
        parser().run_inner(args)
    }

    #[test]
    fn no_flags_is_a_report() {
        assert_eq!(parse(&[]).unwrap().mode(), RunMode::Report);
    }

    #[test]
    fn update_requires_a_role() {
        assert!(parse(&["--update"]).is_err());
        assert!(parse(&["--update", "--role", "Janitor"]).is_err());
    }

    #[test]
    fn update_with_test_is_limited() {
        let opts = parse(&["--update", "--role", "Explorer", "--test"]).unwrap();
        assert_eq!(
            opts.mode(),
            RunMode::Update {
                role:    SiteRole::Explorer,
                limited: true,
            }
        );
    }

    #[test]
    fn preview_wins_over_update() {
        let opts = parse(&["--preview", "--update", "--role", "Viewer"]).unwrap();
        assert_eq!(opts.mode(), RunMode::Preview);
    }
}
