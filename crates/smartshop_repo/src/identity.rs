//! Owner identity for new records.

/// Owner id stamped on records created while no identity is available.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Supplies the owner id stamped on records the repository creates.
///
/// The host application plugs its session or auth layer in here; tests
/// and headless tools use [`FixedIdentity`].
pub trait IdentityProvider: Send + Sync {
    /// The current owner id, or `None` when nobody is signed in.
    fn current_owner(&self) -> Option<String>;
}

/// An identity provider that always answers with the same owner.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    owner: Option<String>,
}

impl FixedIdentity {
    /// An identity for the given owner id.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
        }
    }

    /// The signed-out identity.
    #[must_use]
    pub fn signed_out() -> Self {
        Self { owner: None }
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_owner(&self) -> Option<String> {
        self.owner.clone()
    }
}
