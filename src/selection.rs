#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;

use crate::{
    constants::{DEFAULT_EXCLUDED_NAME, DEFAULT_ID_SUFFIX},
    user::{SiteRole, UserRecord},
};

/// Which users a run is allowed to touch.
///
/// A user is selected when all of the following hold:
/// * its current role is `sentinel_role`,
/// * its login name ends with `required_suffix` (ignoring case),
/// * its display name does not contain `excluded_name` (ignoring case). A
///   missing display name counts as empty.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(on(String, into))]
pub struct SelectionPolicy {
    /// The only role eligible for a change.
    #[builder(default = SiteRole::ExplorerCanPublish)]
    sentinel_role:   SiteRole,
    /// Suffix every selected login name carries.
    #[builder(default = DEFAULT_ID_SUFFIX.to_string())]
    required_suffix: String,
    /// Display-name fragment that rules a user out. Empty disables the check.
    #[builder(default = DEFAULT_EXCLUDED_NAME.to_string())]
    excluded_name:   String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SelectionPolicy {
    /// The role eligible for a change.
    pub fn sentinel_role(&self) -> &SiteRole {
        &self.sentinel_role
    }

    /// Required login-name suffix.
    pub fn required_suffix(&self) -> &str {
        &self.required_suffix
    }

    /// Excluding display-name fragment.
    pub fn excluded_name(&self) -> &str {
        &self.excluded_name
    }

    /// Returns true when `user` should receive the new role.
    pub fn matches(&self, user: &UserRecord) -> bool {
        if user.site_role() != &self.sentinel_role {
            return false;
        }

        let suffix = self.required_suffix.to_lowercase();
        if !user.name().to_lowercase().ends_with(&suffix) {
            return false;
        }

        if self.excluded_name.is_empty() {
            return true;
        }
        let display_name = user.full_name().unwrap_or_default().to_lowercase();
        !display_name.contains(&self.excluded_name.to_lowercase())
    }

    /// Filters `users` in the order given, keeping at most `limit` matches.
    pub fn select<'a>(&self, users: &'a [UserRecord], limit: Option<usize>) -> Vec<&'a UserRecord> {
        users
            .iter()
            .filter(|user| self.matches(user))
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, full_name: Option<&str>, role: SiteRole) -> UserRecord {
        UserRecord::builder()
            .id(format!("id-{name}"))
            .name(name)
            .maybe_full_name(full_name.map(str::to_string))
            .site_role(role)
            .build()
    }

    #[test]
    fn all_three_conditions_must_hold() {
        let policy = SelectionPolicy::default();

        assert!(policy.matches(&user("kim@test.com", Some("Kim"), SiteRole::ExplorerCanPublish)));
        assert!(!policy.matches(&user("kim@test.com", Some("Kim"), SiteRole::Explorer)));
        assert!(!policy.matches(&user("kim@corp.com", Some("Kim"), SiteRole::ExplorerCanPublish)));
        assert!(!policy.matches(&user(
            "kim@test.com",
            Some("kim@tester.com"),
            SiteRole::ExplorerCanPublish
        )));
    }

    #[test]
    fn suffix_and_exclusion_ignore_case() {
        let policy = SelectionPolicy::default();

        assert!(policy.matches(&user("Lee@TEST.com", None, SiteRole::ExplorerCanPublish)));
        assert!(!policy.matches(&user(
            "lee@test.com",
            Some("Lee <LEE@Tester.COM>"),
            SiteRole::ExplorerCanPublish
        )));
    }

    #[test]
    fn missing_display_name_counts_as_empty() {
        let policy = SelectionPolicy::default();
        assert!(policy.matches(&user("park@test.com", None, SiteRole::ExplorerCanPublish)));
    }

    #[test]
    fn empty_exclusion_disables_the_check() {
        let policy = SelectionPolicy::builder().excluded_name("").build();
        assert!(policy.matches(&user(
            "choi@test.com",
            Some("choi@tester.com"),
            SiteRole::ExplorerCanPublish
        )));
    }

    #[test]
    fn custom_policy_is_honoured() {
        let policy = SelectionPolicy::builder()
            .sentinel_role(SiteRole::Viewer)
            .required_suffix("@corp.example")
            .excluded_name("contractor")
            .build();

        assert!(policy.matches(&user("jo@corp.example", Some("Jo"), SiteRole::Viewer)));
        assert!(!policy.matches(&user("jo@corp.example", Some("Jo (Contractor)"), SiteRole::Viewer)));
        assert!(!policy.matches(&user("jo@corp.example", Some("Jo"), SiteRole::ExplorerCanPublish)));
    }

    #[test]
    fn select_keeps_fetch_order_and_truncates() {
        let policy = SelectionPolicy::default();
        let users: Vec<UserRecord> = (0..15)
            .map(|i| {
                let role = if i % 3 == 0 {
                    SiteRole::Viewer
                } else {
                    SiteRole::ExplorerCanPublish
                };
                user(&format!("u{i:02}@test.com"), None, role)
            })
            .collect();

        let all = policy.select(&users, None);
        assert_eq!(all.len(), 10);

        let first = policy.select(&users, Some(4));
        let names: Vec<&str> = first.iter().map(|u| u.name()).collect();
        assert_eq!(names, ["u01@test.com", "u02@test.com", "u04@test.com", "u05@test.com"]);
    }
}
