#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, str::FromStr};

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{LAST_LOGIN_FORMAT, MISSING_LAST_LOGIN};

/// A site role as Tableau Server names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteRole {
    /// Full authoring license.
    Creator,
    /// Web authoring without publishing.
    Explorer,
    /// Explorer that may also publish content.
    ExplorerCanPublish,
    /// Server-wide administrator.
    ServerAdministrator,
    /// Site administrator holding a Creator license.
    SiteAdministratorCreator,
    /// Site administrator holding an Explorer license.
    SiteAdministratorExplorer,
    /// Member of the site without a license.
    Unlicensed,
    /// Read-only access.
    ReadOnly,
    /// View and interact only.
    Viewer,
    /// A role this build does not know about, kept verbatim.
    Other(String),
}

impl SiteRole {
    /// Every role that can be named on the command line.
    pub const KNOWN: [SiteRole; 9] = [
        SiteRole::Creator,
        SiteRole::Explorer,
        SiteRole::ExplorerCanPublish,
        SiteRole::ServerAdministrator,
        SiteRole::SiteAdministratorCreator,
        SiteRole::SiteAdministratorExplorer,
        SiteRole::Unlicensed,
        SiteRole::ReadOnly,
        SiteRole::Viewer,
    ];

    /// The name the REST API uses for this role.
    pub fn as_str(&self) -> &str {
        match self {
            SiteRole::Creator => "Creator",
            SiteRole::Explorer => "Explorer",
            SiteRole::ExplorerCanPublish => "ExplorerCanPublish",
            SiteRole::ServerAdministrator => "ServerAdministrator",
            SiteRole::SiteAdministratorCreator => "SiteAdministratorCreator",
            SiteRole::SiteAdministratorExplorer => "SiteAdministratorExplorer",
            SiteRole::Unlicensed => "Unlicensed",
            SiteRole::ReadOnly => "ReadOnly",
            SiteRole::Viewer => "Viewer",
            SiteRole::Other(name) => name,
        }
    }

    /// Maps a role name reported by the server. Unknown names never fail,
    /// they are kept as [`SiteRole::Other`].
    pub fn from_server(value: &str) -> Self {
        value
            .parse()
            .unwrap_or_else(|_| SiteRole::Other(value.to_string()))
    }
}

/// Returns the known role names joined for error messages.
fn known_role_names() -> String {
    SiteRole::KNOWN
        .iter()
        .map(SiteRole::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A role name that is not one of [`SiteRole::KNOWN`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a site role (expected one of: {roles})", roles = known_role_names())]
pub struct UnknownRole(pub String);

impl FromStr for SiteRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        SiteRole::KNOWN
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownRole(name.to_string()))
    }
}

impl fmt::Display for SiteRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SiteRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SiteRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SiteRole::from_server(&raw))
    }
}

/// Snapshot of one site user, taken when the user list is fetched.
///
/// Records are never edited locally; a role change goes through
/// [`crate::directory::DirectoryService::update_site_role`].
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(on(String, into))]
pub struct UserRecord {
    /// Opaque id the server uses to address the user.
    id:         String,
    /// Login name.
    name:       String,
    /// Display name, when the server reports one.
    full_name:  Option<String>,
    /// Site role at fetch time.
    site_role:  SiteRole,
    /// Most recent sign-in, absent for users who never signed in.
    last_login: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Server-side id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Login name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name, if any.
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Site role at fetch time.
    pub fn site_role(&self) -> &SiteRole {
        &self.site_role
    }

    /// Most recent sign-in, if any.
    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    /// Last sign-in formatted for reports, or the missing-value placeholder.
    pub fn last_login_label(&self) -> String {
        match self.last_login {
            Some(at) => at.format(LAST_LOGIN_FORMAT).to_string(),
            None => MISSING_LAST_LOGIN.to_string(),
        }
    }
}
