#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{DirectoryError, DirectoryService, SessionCredentials};
use crate::user::{SiteRole, UserRecord};

/// A signed-in session that signs out exactly once.
///
/// Call [`Session::close`] to observe the sign-out result; if the session is
/// dropped on an error path instead, the drop guard signs out and logs any
/// failure.
pub struct Session<'a, S: DirectoryService + ?Sized> {
    /// Service the session belongs to.
    service:     &'a S,
    /// Credentials from sign-in.
    credentials: SessionCredentials,
    /// False once sign-out has been attempted.
    active:      bool,
}

impl<'a, S: DirectoryService + ?Sized> Session<'a, S> {
    /// Signs in to `service`.
    pub fn open(service: &'a S) -> Result<Self, DirectoryError> {
        let credentials = service.sign_in()?;
        Ok(Self {
            service,
            credentials,
            active: true,
        })
    }

    /// Credentials of this session.
    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// Lists every user on the site.
    pub fn list_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        self.service.list_users(&self.credentials)
    }

    /// Assigns `role` to `user`.
    pub fn update_site_role(&self, user: &UserRecord, role: &SiteRole) -> Result<(), DirectoryError> {
        self.service.update_site_role(&self.credentials, user, role)
    }

    /// Signs out and reports the result.
    pub fn close(mut self) -> Result<(), DirectoryError> {
        self.release()
    }

    /// Signs out unless that already happened.
    fn release(&mut self) -> Result<(), DirectoryError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.service.sign_out(&self.credentials)
    }
}

impl<S: DirectoryService + ?Sized> Drop for Session<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::directory::UserPage;

    /// Counts sign-ins and sign-outs.
    #[derive(Default)]
    struct Counting {
        sign_ins:      Cell<usize>,
        sign_outs:     Cell<usize>,
        fail_sign_out: bool,
    }

    impl DirectoryService for Counting {
        fn sign_in(&self) -> Result<SessionCredentials, DirectoryError> {
            self.sign_ins.set(self.sign_ins.get() + 1);
            Ok(SessionCredentials::new("token", "site", "me"))
        }

        fn fetch_user_page(
            &self,
            _credentials: &SessionCredentials,
            _page_number: u32,
            _page_size: u32,
        ) -> Result<UserPage, DirectoryError> {
            Ok(UserPage::default())
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
            self.sign_outs.set(self.sign_outs.get() + 1);
            if self.fail_sign_out {
                Err(DirectoryError::SignOut("expired".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn close_signs_out_once() {
        let service = Counting::default();
        let session = Session::open(&service).unwrap();
        assert_eq!(session.credentials().token(), "token");

        session.close().unwrap();
        assert_eq!(service.sign_ins.get(), 1);
        assert_eq!(service.sign_outs.get(), 1);
    }

    #[test]
    fn drop_signs_out_once() {
        let service = Counting::default();
        {
            let _session = Session::open(&service).unwrap();
        }
        assert_eq!(service.sign_outs.get(), 1);
    }

    #[test]
    fn failed_sign_out_is_reported_and_not_repeated() {
        let service = Counting {
            fail_sign_out: true,
            ..Default::default()
        };
        let session = Session::open(&service).unwrap();

        assert!(matches!(session.close(), Err(DirectoryError::SignOut(_))));
        assert_eq!(service.sign_outs.get(), 1);
    }
}
