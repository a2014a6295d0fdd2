#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, str::FromStr, sync::OnceLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{
    StatusCode,
    blocking::{Client, RequestBuilder, Response},
    header::ACCEPT,
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use super::{DirectoryError, DirectoryService, SessionCredentials, UserPage};
use crate::{
    config::TableauConfig,
    constants::SERVER_INFO_API_VERSION,
    user::{SiteRole, UserRecord},
};

/// Header carrying the session token on authenticated requests.
const AUTH_HEADER: &str = "X-Tableau-Auth";

/// Talks to the Tableau Server REST API with JSON payloads.
pub struct TableauClient {
    /// Shared blocking HTTP client.
    http:        Client,
    /// Connection settings.
    config:      TableauConfig,
    /// REST API version, pinned by config or discovered on first use.
    api_version: OnceLock<String>,
}

impl TableauClient {
    /// Builds a client; no request is sent until [`DirectoryService::sign_in`].
    pub fn new(config: &TableauConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to construct HTTP client")?;

        let api_version = config
            .api_version()
            .map(|version| OnceLock::from(version.to_string()))
            .unwrap_or_default();

        Ok(Self {
            http,
            config: config.clone(),
            api_version,
        })
    }

    /// REST API version, asking the server the first time it is needed.
    fn api_version(&self) -> Result<&str, DirectoryError> {
        if let Some(version) = self.api_version.get() {
            return Ok(version);
        }

        let url = format!(
            "{}/api/{SERVER_INFO_API_VERSION}/serverinfo",
            self.config.server()
        );
        let info: ServerInfoResponse = send(self.http.get(&url))
            .and_then(decode)
            .map_err(|reason| DirectoryError::ServerInfo {
                server: self.config.server().to_string(),
                reason,
            })?;

        tracing::info!(
            "Server speaks REST API {}",
            info.server_info.rest_api_version
        );
        Ok(self
            .api_version
            .get_or_init(|| info.server_info.rest_api_version))
    }

    /// Absolute URL for `path` under the versioned API root.
    fn endpoint(&self, version: &str, path: &str) -> String {
        format!("{}/api/{version}/{path}", self.config.server())
    }
}

impl DirectoryService for TableauClient {
    fn sign_in(&self) -> Result<SessionCredentials, DirectoryError> {
        let version = self.api_version()?;
        let body = SignInRequest {
            credentials: SignInCredentials {
                name:     self.config.username(),
                password: self.config.password(),
                site:     SiteRef {
                    content_url: self.config.site(),
                },
            },
        };

        let signed_in: SignInResponse =
            send(self.http.post(self.endpoint(version, "auth/signin")).json(&body))
                .and_then(decode)
                .map_err(|reason| DirectoryError::Authentication {
                    server: self.config.server().to_string(),
                    reason,
                })?;

        let credentials = SessionCredentials::from(signed_in.credentials);
        tracing::info!(
            "Signed in to {} as {} (user id {})",
            self.config.server(),
            self.config.username(),
            credentials.user_id()
        );
        Ok(credentials)
    }

    fn fetch_user_page(
        &self,
        credentials: &SessionCredentials,
        page_number: u32,
        page_size: u32,
    ) -> Result<UserPage, DirectoryError> {
        let fetch_error = |reason| DirectoryError::Fetch {
            page: page_number,
            reason,
        };
        let version = self.api_version()?;
        let url = self.endpoint(version, &format!("sites/{}/users", credentials.site_id()));

        let request = self
            .http
            .get(&url)
            .header(AUTH_HEADER, credentials.token())
            .query(&[
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
                ("fields", "_all_".to_string()),
            ]);
        let response: UsersResponse = send(request).and_then(decode).map_err(fetch_error)?;

        Ok(response.into_page())
    }

    fn update_site_role(
        &self,
        credentials: &SessionCredentials,
        user: &UserRecord,
        role: &SiteRole,
    ) -> Result<(), DirectoryError> {
        let update_error = |reason| DirectoryError::Update {
            user: user.name().to_string(),
            role: role.to_string(),
            reason,
        };
        let version = self.api_version()?;
        let url = self.endpoint(
            version,
            &format!("sites/{}/users/{}", credentials.site_id(), user.id()),
        );
        let body = UpdateUserRequest {
            user: UpdateUserBody { site_role: role },
        };

        send(
            self.http
                .put(&url)
                .header(AUTH_HEADER, credentials.token())
                .json(&body),
        )
        .map_err(update_error)?;

        Ok(())
    }

    fn sign_out(&self, credentials: &SessionCredentials) -> Result<(), DirectoryError> {
        let version = self.api_version()?;
        send(
            self.http
                .post(self.endpoint(version, "auth/signout"))
                .header(AUTH_HEADER, credentials.token()),
        )
        .map_err(DirectoryError::SignOut)?;

        tracing::info!("Signed out of {}", self.config.server());
        Ok(())
    }

    fn page_size(&self) -> u32 {
        self.config.page_size()
    }
}

/// Sends `request` asking for JSON and turns transport failures and non-2xx
/// statuses into a readable reason.
fn send(request: RequestBuilder) -> Result<Response, String> {
    let response = request
        .header(ACCEPT, "application/json")
        .send()
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(describe_failure(status, &body))
    }
}

/// Decodes a JSON response body.
fn decode<T: DeserializeOwned>(response: Response) -> Result<T, String> {
    response
        .json::<T>()
        .map_err(|e| format!("unexpected response body: {e}"))
}

/// Builds a failure reason from a status and the server's error document, if
/// the body holds one.
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => {
            let mut reason = format!("{status} [{}] {}", error.code, error.summary);
            if !error.detail.is_empty() {
                reason.push_str(": ");
                reason.push_str(&error.detail);
            }
            reason
        }
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{status}: {}", body.trim()),
    }
}

/// Accepts a number sent either bare or as a string, as pagination fields
/// are.
fn number_from_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    /// Either JSON shape.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        /// `"42"`
        Text(String),
        /// `42`
        Number(u64),
    }

    let text = match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    };
    text.trim().parse().map_err(serde::de::Error::custom)
}

/// `POST auth/signin` body.
#[derive(Serialize)]
struct SignInRequest<'a> {
    /// Credentials block.
    credentials: SignInCredentials<'a>,
}

/// Username/password credentials.
#[derive(Serialize)]
struct SignInCredentials<'a> {
    /// Sign-in name.
    name:     &'a str,
    /// Password.
    password: &'a str,
    /// Target site.
    site:     SiteRef<'a>,
}

/// Site addressed by content URL.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteRef<'a> {
    /// Content URL; empty for the default site.
    content_url: &'a str,
}

/// `POST auth/signin` response.
#[derive(Deserialize)]
struct SignInResponse {
    /// Issued credentials.
    credentials: IssuedCredentials,
}

/// Token plus the ids it is bound to.
#[derive(Deserialize)]
struct IssuedCredentials {
    /// Session token.
    token: String,
    /// Site the token is bound to.
    site:  IdOnly,
    /// Signed-in user.
    user:  IdOnly,
}

impl From<IssuedCredentials> for SessionCredentials {
    fn from(issued: IssuedCredentials) -> Self {
        SessionCredentials::new(issued.token, issued.site.id, issued.user.id)
    }
}

/// Any object of which only the id matters.
#[derive(Deserialize)]
struct IdOnly {
    /// Server id.
    id: String,
}

/// `GET serverinfo` response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoResponse {
    /// Server details.
    server_info: ServerInfo,
}

/// The part of the server details we use.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    /// Highest REST API version the server supports.
    rest_api_version: String,
}

/// `GET sites/{site}/users` response.
#[derive(Deserialize)]
struct UsersResponse {
    /// Paging information.
    pagination: Pagination,
    /// Users on this page; an empty page omits the list.
    #[serde(default)]
    users:      UserList,
}

impl UsersResponse {
    /// Converts the wire shape into a page of records.
    fn into_page(self) -> UserPage {
        UserPage {
            users:           self.users.user.into_iter().map(UserRecord::from).collect(),
            total_available: self.pagination.total_available,
        }
    }
}

/// Paging information; every field arrives as a string.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    /// Total users in the listing.
    #[serde(deserialize_with = "number_from_string")]
    total_available: usize,
}

/// Wrapper object around the user array.
#[derive(Deserialize, Default)]
struct UserList {
    /// The users.
    #[serde(default)]
    user: Vec<UserPayload>,
}

/// One user as the REST API describes it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload {
    /// Server id.
    id:         String,
    /// Login name.
    name:       String,
    /// Display name.
    #[serde(default)]
    full_name:  Option<String>,
    /// Site role.
    site_role:  SiteRole,
    /// Last sign-in.
    #[serde(default)]
    last_login: Option<DateTime<Utc>>,
}

impl From<UserPayload> for UserRecord {
    fn from(user: UserPayload) -> Self {
        UserRecord::builder()
            .id(user.id)
            .name(user.name)
            .maybe_full_name(user.full_name)
            .site_role(user.site_role)
            .maybe_last_login(user.last_login)
            .build()
    }
}

/// `PUT sites/{site}/users/{user}` body.
#[derive(Serialize)]
struct UpdateUserRequest<'a> {
    /// Fields to change.
    user: UpdateUserBody<'a>,
}

/// The only field we change.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserBody<'a> {
    /// New site role.
    site_role: &'a SiteRole,
}

/// Error document returned with non-2xx statuses.
#[derive(Deserialize)]
struct ErrorResponse {
    /// The error.
    error: ApiError,
}

/// Error details.
#[derive(Deserialize)]
struct ApiError {
    /// Tableau error code, e.g. `401001`.
    #[serde(default)]
    code:    String,
    /// One-line summary.
    #[serde(default)]
    summary: String,
    /// Longer explanation.
    #[serde(default)]
    detail:  String,
}
