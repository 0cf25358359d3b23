use std::collections::HashSet;

use crate::identity::{Identity, IdentityHandle};
use crate::models::Role;

/// GuardDecision
///
/// The outcome of one per-navigation access check. Consumers either render
/// the requested view (`Allow`) or issue a client-side redirect to the
/// indicated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// No actor is signed in; send them to the login page.
    RedirectToLogin,
    /// An actor is signed in but their role is outside the allowed set.
    RedirectToUnauthorized,
}

impl GuardDecision {
    /// The app-wide redirect target for this decision, if any. The targets
    /// are fixed here once so every page denies consistently.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin => Some("/login"),
            GuardDecision::RedirectToUnauthorized => Some("/unauthorized"),
        }
    }
}

/// RoutePolicy
///
/// The declarative access requirement of one route: a set of allowed
/// roles. An empty set means "any authenticated actor", which still
/// excludes anonymous visitors; routes with no access requirement at all
/// simply carry no policy and are never evaluated.
#[derive(Debug, Clone, Default)]
pub struct RoutePolicy {
    allowed: HashSet<Role>,
}

impl RoutePolicy {
    /// Any signed-in actor, regardless of role. Demo actors included.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Exactly one allowed role.
    pub fn role(role: Role) -> Self {
        Self {
            allowed: HashSet::from([role]),
        }
    }

    /// An explicit allowed-role set.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }

    /// evaluate
    ///
    /// The access decision for the given identity:
    /// - anonymous, any policy: redirect to login
    /// - actor present, empty set: allow
    /// - actor's role in the set: allow
    /// - otherwise: redirect to the unauthorized page
    ///
    /// Demo actors are judged purely by their role, exactly like real ones.
    pub fn evaluate(&self, identity: &Identity) -> GuardDecision {
        let Some(role) = identity.role() else {
            return GuardDecision::RedirectToLogin;
        };

        if self.allowed.is_empty() || self.allowed.contains(&role) {
            GuardDecision::Allow
        } else {
            GuardDecision::RedirectToUnauthorized
        }
    }
}

/// RouteGuard
///
/// A policy bound to the live identity handle, consumed as a wrapper
/// around a route: check before mounting the view, then either render or
/// redirect. Each `check` re-reads the current identity, so entering demo
/// mode or signing out between navigations is always observed; the
/// decision is never cached.
#[derive(Clone)]
pub struct RouteGuard {
    identity: IdentityHandle,
    policy: RoutePolicy,
}

impl RouteGuard {
    pub fn new(identity: IdentityHandle, policy: RoutePolicy) -> Self {
        Self { identity, policy }
    }

    /// The decision for the current navigation.
    pub fn check(&self) -> GuardDecision {
        self.policy.evaluate(&self.identity.snapshot().identity)
    }
}
