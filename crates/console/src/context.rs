use tutaller_auth::{Identity, Role, UserId};

/// Identity of the caller of a guarded page.
///
/// Inserted as a request extension by the session guard; absent on public
/// paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    identity: Identity,
}

impl PrincipalContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn user_id(&self) -> &UserId {
        self.identity.id()
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn role(&self) -> Role {
        self.identity.role()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
