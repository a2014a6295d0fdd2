#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Rows},
};

use crate::{constants::RUN_STAMP_FORMAT, user::UserRecord};

/// The CSV artifacts a run can leave behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Every selected user, written by a plain run.
    Check,
    /// The numbered first page of users a `--test` update would change.
    Preview,
    /// Snapshot taken right before an update is applied.
    Update,
}

impl ReportKind {
    /// File name prefix; the run stamp and `.csv` follow it.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ReportKind::Check => "users_to_check",
            ReportKind::Preview => "test_users_preview",
            ReportKind::Update => "users_to_update",
        }
    }

    /// First line of the file.
    pub fn header(self) -> &'static str {
        match self {
            ReportKind::Preview => "no,name,full_name,site_role,last_login",
            ReportKind::Check | ReportKind::Update => "name,full_name,site_role,last_login",
        }
    }

    /// Whether each row starts with its 1-based position.
    pub fn numbered(self) -> bool {
        matches!(self, ReportKind::Preview)
    }

    /// File name for a run stamped `stamp`.
    pub fn file_name(self, stamp: &str) -> String {
        format!("{}_{stamp}.csv", self.file_prefix())
    }
}

/// Local wall-clock stamp shared by every artifact of one run.
pub fn run_stamp() -> String {
    Local::now().format(RUN_STAMP_FORMAT).to_string()
}

/// Renders the lines of a report: the header, then one row per user in the
/// order given.
pub fn render_lines(kind: ReportKind, users: &[&UserRecord]) -> Vec<String> {
    let mut lines = Vec::with_capacity(users.len() + 1);
    lines.push(kind.header().to_string());

    for (i, user) in users.iter().enumerate() {
        let row = format!(
            "{},{},{},{}",
            user.name(),
            user.full_name().unwrap_or_default(),
            user.site_role(),
            user.last_login_label()
        );
        if kind.numbered() {
            lines.push(format!("{},{row}", i + 1));
        } else {
            lines.push(row);
        }
    }

    lines
}

/// Writes a report into `dir`, replacing any file of the same name, and
/// returns its path.
pub fn write_report(
    dir: &Path,
    kind: ReportKind,
    stamp: &str,
    users: &[&UserRecord],
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Could not create report directory {}", dir.display()))?;

    let path = dir.join(kind.file_name(stamp));
    let file = fs::File::create(&path)
        .with_context(|| format!("Could not create report {}", path.display()))?;
    let mut out = BufWriter::new(file);

    for line in render_lines(kind, users) {
        writeln!(out, "{line}").with_context(|| format!("Could not write to {}", path.display()))?;
    }
    out.flush()
        .with_context(|| format!("Could not write to {}", path.display()))?;

    Ok(path)
}

/// One row of the console preview.
#[derive(Tabled)]
struct PreviewRow {
    /// Position in fetch order, starting at 1.
    #[tabled(rename = "No")]
    no:         usize,
    /// Login name.
    #[tabled(rename = "Name")]
    name:       String,
    /// Display name or empty.
    #[tabled(rename = "Display Name")]
    full_name:  String,
    /// Current role.
    #[tabled(rename = "Site Role")]
    site_role:  String,
    /// Last sign-in or placeholder.
    #[tabled(rename = "Last Login")]
    last_login: String,
}

/// Renders the preview table printed to the console.
pub fn preview_table(users: &[&UserRecord]) -> String {
    let rows: Vec<PreviewRow> = users
        .iter()
        .enumerate()
        .map(|(i, user)| PreviewRow {
            no:         i + 1,
            name:       user.name().to_string(),
            full_name:  user.full_name().unwrap_or_default().to_string(),
            site_role:  user.site_role().to_string(),
            last_login: user.last_login_label(),
        })
        .collect();

    Table::new(&rows)
        .with(Panel::header(format!("First {} users a test update would change", rows.len())))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::user::SiteRole;

    fn sample() -> Vec<UserRecord> {
        vec![
            UserRecord::builder()
                .id("1")
                .name("a@test.com")
                .full_name("Ahn".to_string())
                .site_role(SiteRole::ExplorerCanPublish)
                .last_login(Utc.with_ymd_and_hms(2025, 3, 11, 9, 5, 0).unwrap())
                .build(),
            UserRecord::builder()
                .id("2")
                .name("b@test.com")
                .site_role(SiteRole::ExplorerCanPublish)
                .build(),
        ]
    }

    #[test]
    fn check_lines_have_header_and_plain_rows() {
        let users = sample();
        let refs: Vec<&UserRecord> = users.iter().collect();
        let lines = render_lines(ReportKind::Check, &refs);

        assert_eq!(
            lines,
            [
                "name,full_name,site_role,last_login",
                "a@test.com,Ahn,ExplorerCanPublish,2025-03-11 09:05:00",
                "b@test.com,,ExplorerCanPublish,None",
            ]
        );
    }

    #[test]
    fn preview_lines_are_numbered_from_one() {
        let users = sample();
        let refs: Vec<&UserRecord> = users.iter().collect();
        let lines = render_lines(ReportKind::Preview, &refs);

        assert_eq!(lines[0], "no,name,full_name,site_role,last_login");
        assert!(lines[1].starts_with("1,a@test.com,"));
        assert!(lines[2].starts_with("2,b@test.com,"));
    }

    #[test]
    fn empty_selection_still_writes_header() {
        assert_eq!(render_lines(ReportKind::Update, &[]).len(), 1);
    }

    #[test]
    fn file_names_carry_kind_and_stamp() {
        assert_eq!(
            ReportKind::Check.file_name("20250311_143016"),
            "users_to_check_20250311_143016.csv"
        );
        assert_eq!(
            ReportKind::Preview.file_name("20250311_143016"),
            "test_users_preview_20250311_143016.csv"
        );
        assert_eq!(
            ReportKind::Update.file_name("20250311_143016"),
            "users_to_update_20250311_143016.csv"
        );
    }

    #[test]
    fn run_stamp_is_sortable_digits() {
        let stamp = run_stamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
    }

    #[test]
    fn preview_table_lists_every_user() {
        let users = sample();
        let refs: Vec<&UserRecord> = users.iter().collect();
        let table = preview_table(&refs);

        assert!(table.contains("a@test.com"));
        assert!(table.contains("b@test.com"));
        assert!(table.contains("Display Name"));
    }
}
