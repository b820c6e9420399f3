use ktet_core::model::UserId;

/// Read-only view of who is signed in.
///
/// Quiz services only ever ask for the current user id; signing in and out
/// belongs to the authentication provider.
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;
}

/// Identity fixed for the lifetime of the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl Identity for StaticIdentity {
    fn current_user_id(&self) -> Option<UserId> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_user() {
        assert_eq!(StaticIdentity::anonymous().current_user_id(), None);
        let id = UserId::new("uid-1");
        assert_eq!(
            StaticIdentity::signed_in(id.clone()).current_user_id(),
            Some(id)
        );
    }
}
