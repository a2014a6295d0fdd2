#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow};

use crate::{
    constants::{DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS, MAX_PAGE_SIZE},
    selection::SelectionPolicy,
    user::SiteRole,
};

/// Where and how to reach Tableau Server.
#[derive(Clone)]
pub struct TableauConfig {
    /// Base URL, without a trailing slash.
    server:      String,
    /// Sign-in name.
    username:    String,
    /// Sign-in password.
    password:    String,
    /// Site content URL; empty selects the default site.
    site:        String,
    /// REST API version, discovered from the server when `None`.
    api_version: Option<String>,
    /// Users requested per page.
    page_size:   u32,
    /// Per-request timeout.
    timeout:     Duration,
}

impl TableauConfig {
    /// Builds a configuration with default site, discovery, page size and
    /// timeout.
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server:      server.into().trim_end_matches('/').to_string(),
            username:    username.into(),
            password:    password.into(),
            site:        String::new(),
            api_version: None,
            page_size:   DEFAULT_PAGE_SIZE,
            timeout:     Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Returns a copy bound to another site.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// Returns a copy pinned to a REST API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Server base URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Sign-in name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Sign-in password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Site content URL.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Pinned REST API version, if any.
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Users requested per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for TableauConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableauConfig")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("site", &self.site)
            .field("api_version", &self.api_version)
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Everything a run needs, read once at start-up and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server connection settings.
    tableau:    TableauConfig,
    /// Which users are eligible.
    selection:  SelectionPolicy,
    /// Directory for CSV reports and the run log.
    output_dir: PathBuf,
}

impl Config {
    /// Bundles already-built settings.
    pub fn new(tableau: TableauConfig, selection: SelectionPolicy, output_dir: PathBuf) -> Self {
        Self {
            tableau,
            selection,
            output_dir,
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Values are trimmed and blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let require =
            |key: &str| get(key).ok_or_else(|| anyhow!("{key} must be set to reach Tableau Server"));

        let mut tableau = TableauConfig::new(
            require("TABLEAU_SERVER")?,
            require("TABLEAU_USERNAME")?,
            require("TABLEAU_PASSWORD")?,
        );
        if let Some(site) = get("TABLEAU_SITE") {
            tableau = tableau.with_site(site);
        }
        if let Some(version) = get("TABLEAU_API_VERSION") {
            tableau = tableau.with_api_version(version);
        }
        tableau.page_size = get("TABLEAU_PAGE_SIZE")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        tableau.timeout = read_timeout_secs(get("TABLEAU_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS);

        let sentinel_role = get("ROLESWEEP_SENTINEL_ROLE")
            .map(|name| name.parse::<SiteRole>())
            .transpose()
            .context("ROLESWEEP_SENTINEL_ROLE is not a site role")?;
        let selection = SelectionPolicy::builder()
            .maybe_sentinel_role(sentinel_role)
            .maybe_required_suffix(get("ROLESWEEP_ID_SUFFIX"))
            .maybe_excluded_name(get("ROLESWEEP_EXCLUDE"))
            .build();

        let output_dir = get("ROLESWEEP_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self::new(tableau, selection, output_dir))
    }

    /// Returns a copy writing its artifacts to `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Server connection settings.
    pub fn tableau(&self) -> &TableauConfig {
        &self.tableau
    }

    /// Selection policy.
    pub fn selection(&self) -> &SelectionPolicy {
        &self.selection
    }

    /// Artifact directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Parses a number of seconds into a `Duration`, falling back to
/// `default_secs` when the value is missing or unparsable.
fn read_timeout_secs(value: Option<String>, default_secs: u64) -> Duration {
    value
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}
