/// Identity of the caller driving an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Catalog user name or id of the acting user
    pub user: String,
    /// Skip access checks; used for internal follow-up calls
    pub ignore_auth: bool,
}

impl RequestContext {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ignore_auth: false,
        }
    }

    /// Same user, access checks bypassed
    pub fn elevated(&self) -> Self {
        Self {
            user: self.user.clone(),
            ignore_auth: true,
        }
    }
}
