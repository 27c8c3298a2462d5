//! Admin allow-list.

use crate::oauth::Identity;

/// Login handles permitted to obtain a dashboard session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    logins: Vec<String>,
}

impl AdminAllowList {
    /// Parse a comma separated list such as `"alice, bob"`. Empty entries are dropped.
    pub fn parse(value: &str) -> Self {
        let logins = value
            .split(',')
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .map(str::to_string)
            .collect();
        Self { logins }
    }

    /// Case-insensitive match of `login` against the list. An empty login never matches.
    pub fn permits(&self, login: &str) -> bool {
        if login.is_empty() {
            return false;
        }
        let login = login.to_lowercase();
        self.logins
            .iter()
            .any(|admin| admin.to_lowercase() == login)
    }

    pub fn authorize(&self, identity: &Identity) -> bool {
        self.permits(&identity.login)
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }
}
