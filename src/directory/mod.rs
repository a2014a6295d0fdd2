#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Exactly-once sign-out around a signed-in session
pub mod session;
/// Tableau Server REST implementation of [`DirectoryService`]
pub mod tableau;

pub use session::Session;
pub use tableau::TableauClient;

use crate::{
    constants::DEFAULT_PAGE_SIZE,
    user::{SiteRole, UserRecord},
};

/// What a successful sign-in hands back; every later call needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Value of the auth token header.
    token:   String,
    /// Id of the site the session is bound to.
    site_id: String,
    /// Id of the signed-in user.
    user_id: String,
}

impl SessionCredentials {
    /// Bundles the values returned by a sign-in.
    pub fn new(
        token: impl Into<String>,
        site_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            token:   token.into(),
            site_id: site_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Auth token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Site id.
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Signed-in user id.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// One page of a user listing.
#[derive(Debug, Clone, Default)]
pub struct UserPage {
    /// Users on this page, in server order.
    pub users:           Vec<UserRecord>,
    /// Total number of users the server says the listing holds.
    pub total_available: usize,
}

/// Failures talking to the directory service.
#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    /// The server would not say which REST version it speaks.
    #[error("Could not query server info from {server}: {reason}")]
    ServerInfo {
        /// Server base URL.
        server: String,
        /// What went wrong.
        reason: String,
    },
    /// Sign-in was refused or could not be completed. Fatal.
    #[error("Sign-in to {server} failed: {reason}")]
    Authentication {
        /// Server base URL.
        server: String,
        /// What went wrong.
        reason: String,
    },
    /// A page of the user list could not be fetched. Fatal; partial lists
    /// are never used.
    #[error("Could not fetch page {page} of the user list: {reason}")]
    Fetch {
        /// 1-based page number.
        page:   u32,
        /// What went wrong.
        reason: String,
    },
    /// One user could not be updated. The run carries on with the rest.
    #[error("Could not change `{user}` to {role}: {reason}")]
    Update {
        /// Login name of the user.
        user:   String,
        /// Role that was requested.
        role:   String,
        /// What went wrong.
        reason: String,
    },
    /// Sign-out failed. Only ever logged.
    #[error("Sign-out failed: {0}")]
    SignOut(String),
}

/// The remote calls a run needs from the directory service.
///
/// Every call is blocking and fallible; nothing is retried.
pub trait DirectoryService {
    /// Signs in and returns the session credentials.
    fn sign_in(&self) -> Result<SessionCredentials, DirectoryError>;

    /// Fetches page `page_number` (1-based) of the site's users.
    fn fetch_user_page(
        &self,
        credentials: &SessionCredentials,
        page_number: u32,
        page_size: u32,
    ) -> Result<UserPage, DirectoryError>;

    /// Assigns `role` to `user` on the server.
    fn update_site_role(
        &self,
        credentials: &SessionCredentials,
        user: &UserRecord,
        role: &SiteRole,
    ) -> Result<(), DirectoryError>;

    /// Ends the session.
    fn sign_out(&self, credentials: &SessionCredentials) -> Result<(), DirectoryError>;

    /// Users requested per page by [`DirectoryService::list_users`].
    fn page_size(&self) -> u32 {
        DEFAULT_PAGE_SIZE
    }

    /// Walks every page and returns all users in server order.
    ///
    /// Stops once `total_available` users are collected or a page comes back
    /// empty. Any page failure fails the whole listing.
    fn list_users(&self, credentials: &SessionCredentials) -> Result<Vec<UserRecord>, DirectoryError> {
        let page_size = self.page_size().max(1);
        let mut users = Vec::new();
        let mut page_number = 1;

        loop {
            let page = self.fetch_user_page(credentials, page_number, page_size)?;
            let received = page.users.len();
            users.extend(page.users);
            tracing::debug!(
                "Fetched page {page_number}: {received} users ({} of {})",
                users.len(),
                page.total_available
            );

            if received == 0 || users.len() >= page.total_available {
                break;
            }
            page_number += 1;
        }

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Serves `total` users `per_page` at a time, optionally failing a page.
    struct Paged {
        total:     usize,
        fail_page: Option<u32>,
        requested: RefCell<Vec<u32>>,
    }

    impl DirectoryService for Paged {
        fn sign_in(&self) -> Result<SessionCredentials, DirectoryError> {
            Ok(SessionCredentials::new("t", "s", "u"))
        }

        fn fetch_user_page(
            &self,
            _credentials: &SessionCredentials,
            page_number: u32,
            page_size: u32,
        ) -> Result<UserPage, DirectoryError> {
            self.requested.borrow_mut().push(page_number);
            if self.fail_page == Some(page_number) {
                return Err(DirectoryError::Fetch {
                    page:   page_number,
                    reason: "boom".into(),
                });
            }
            let start = (page_number as usize - 1) * page_size as usize;
            let end = (start + page_size as usize).min(self.total);
            let users = (start..end)
                .map(|i| {
                    UserRecord::builder()
                        .id(i.to_string())
                        .name(format!("user{i}@test.com"))
                        .site_role(SiteRole::Viewer)
                        .build()
                })
                .collect();
            Ok(UserPage {
                users,
                total_available: self.total,
            })
        }

        fn update_site_role(
            &self,
            _credentials: &SessionCredentials,
            _user: &UserRecord,
            _role: &SiteRole,
        ) -> Result<(), DirectoryError> {
            Ok(())
        }

        fn sign_out(&self, _credentials: &SessionCredentials) -> Result<(), DirectoryError> {
            Ok(())
        }

        fn page_size(&self) -> u32 {
            10
        }
    }

    #[test]
    fn list_users_walks_pages_in_order() {
        let service = Paged {
            total:     23,
            fail_page: None,
            requested: RefCell::new(vec![]),
        };
        let creds = service.sign_in().unwrap();
        let users = service.list_users(&creds).unwrap();

        assert_eq!(users.len(), 23);
        assert_eq!(users[0].name(), "user0@test.com");
        assert_eq!(users[22].name(), "user22@test.com");
        assert_eq!(*service.requested.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_site_needs_one_request() {
        let service = Paged {
            total:     0,
            fail_page: None,
            requested: RefCell::new(vec![]),
        };
        let creds = service.sign_in().unwrap();

        assert!(service.list_users(&creds).unwrap().is_empty());
        assert_eq!(*service.requested.borrow(), vec![1]);
    }

    #[test]
    fn failing_page_fails_the_listing() {
        let service = Paged {
            total:     23,
            fail_page: Some(2),
            requested: RefCell::new(vec![]),
        };
        let creds = service.sign_in().unwrap();
        let err = service.list_users(&creds).unwrap_err();

        assert!(matches!(err, DirectoryError::Fetch { page: 2, .. }));
        assert_eq!(*service.requested.borrow(), vec![1, 2]);
    }
}
