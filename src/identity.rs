//! identity
//!
//! The acting-principal capability.
//!
//! # Design
//!
//! The rich commit-message policy names whoever performed the save. Who
//! that is lives outside this crate (a web session, a job principal), so
//! it is injected as a strategy at construction time rather than read
//! from process-wide state. The provider is consulted at save time, so an
//! implementation backed by a request context sees the right user per
//! call.

/// Provides the display name of the current acting principal.
///
/// Implementations must be `Send + Sync`; a provider is shared across
/// concurrent save operations.
pub trait IdentityProvider: Send + Sync {
    /// Display name of whoever is performing the current save, if known.
    fn current_user(&self) -> Option<String>;
}

/// An identity provider with a fixed display name.
///
/// # Example
///
/// ```
/// use gitmirror::identity::{IdentityProvider, StaticIdentity};
///
/// let identity = StaticIdentity::new("User X");
/// assert_eq!(identity.current_user().as_deref(), Some("User X"));
/// ```
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    name: String,
}

impl StaticIdentity {
    /// Create a provider that always reports `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// An identity provider that never knows who is acting.
///
/// The default for contexts with no principal; message policies render
/// their "Unknown user" fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_user(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_identity_reports_its_name() {
        assert_eq!(
            StaticIdentity::new("User X").current_user().as_deref(),
            Some("User X")
        );
    }

    #[test]
    fn no_identity_reports_none() {
        assert!(NoIdentity.current_user().is_none());
    }
}
