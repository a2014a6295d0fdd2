#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Number of users kept by preview runs and `--test` updates.
pub const PREVIEW_LIMIT: usize = 10;

/// Users requested per page when listing a site.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Largest page the REST API serves; bigger requests are rejected.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Request timeout used when `TABLEAU_TIMEOUT_SECS` is unset or unparsable.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// REST API version used to ask a server which version it actually speaks.
pub const SERVER_INFO_API_VERSION: &str = "2.4";

/// Written in place of a last-login timestamp the server did not report.
pub const MISSING_LAST_LOGIN: &str = "None";

/// `strftime` pattern for last-login columns.
pub const LAST_LOGIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `strftime` pattern for the run stamp embedded in artifact names.
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File name prefix of the per-run log.
pub const LOG_FILE_PREFIX: &str = "role_check";

/// Login names must end with this suffix to be selected.
pub const DEFAULT_ID_SUFFIX: &str = "@test.com";

/// Users whose display name contains this are never selected.
pub const DEFAULT_EXCLUDED_NAME: &str = "@tester.com";
