use std::sync::Arc;

use skillport_client::{
    Actor, GuardDecision, Identity, IdentityResolver, MemoryProvider, MemorySessionStore, Role,
    RouteGuard, RoutePolicy,
};

fn authenticated(role: Role) -> Identity {
    Identity::Authenticated {
        actor: Actor {
            id: "42".to_string(),
            role,
            ..Actor::default()
        },
        token: "token-42".to_string(),
    }
}

fn demo(role: Role) -> Identity {
    Identity::Demo {
        actor: Actor::demo(role),
    }
}

async fn live_resolver() -> IdentityResolver {
    let resolver = IdentityResolver::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(MemoryProvider::new()),
    );
    resolver.init().await;
    resolver
}

// --- Decision Matrix ---

#[test]
fn anonymous_is_sent_to_login_by_any_guarded_route() {
    assert_eq!(
        RoutePolicy::authenticated().evaluate(&Identity::Anonymous),
        GuardDecision::RedirectToLogin
    );
    assert_eq!(
        RoutePolicy::role(Role::Student).evaluate(&Identity::Anonymous),
        GuardDecision::RedirectToLogin
    );
    assert_eq!(
        RoutePolicy::roles([Role::Recruiter, Role::Admin]).evaluate(&Identity::Anonymous),
        GuardDecision::RedirectToLogin
    );
}

#[test]
fn empty_role_set_allows_any_signed_in_actor() {
    let policy = RoutePolicy::authenticated();

    for role in Role::ALL {
        assert_eq!(policy.evaluate(&authenticated(role)), GuardDecision::Allow);
        assert_eq!(policy.evaluate(&demo(role)), GuardDecision::Allow);
    }
}

#[test]
fn matching_role_is_allowed() {
    assert_eq!(
        RoutePolicy::role(Role::Admin).evaluate(&authenticated(Role::Admin)),
        GuardDecision::Allow
    );
    assert_eq!(
        RoutePolicy::roles([Role::Student, Role::Recruiter]).evaluate(&demo(Role::Recruiter)),
        GuardDecision::Allow
    );
}

#[test]
fn recruiter_is_never_allowed_into_an_admin_only_route() {
    let policy = RoutePolicy::role(Role::Admin);

    assert_eq!(
        policy.evaluate(&authenticated(Role::Recruiter)),
        GuardDecision::RedirectToUnauthorized
    );
    assert_eq!(
        policy.evaluate(&demo(Role::Recruiter)),
        GuardDecision::RedirectToUnauthorized
    );
}

#[test]
fn redirect_targets_are_fixed_app_wide() {
    assert_eq!(GuardDecision::Allow.redirect_path(), None);
    assert_eq!(GuardDecision::RedirectToLogin.redirect_path(), Some("/login"));
    assert_eq!(
        GuardDecision::RedirectToUnauthorized.redirect_path(),
        Some("/unauthorized")
    );
}

// --- Live Guard Behavior ---

#[tokio::test]
async fn demo_admin_is_gated_by_role_like_a_real_admin() {
    let resolver = live_resolver().await;
    resolver.enter_demo_mode(Role::Admin).await;

    let student_area = RouteGuard::new(resolver.handle(), RoutePolicy::role(Role::Student));
    let admin_area = RouteGuard::new(resolver.handle(), RoutePolicy::role(Role::Admin));

    assert_eq!(student_area.check(), GuardDecision::RedirectToUnauthorized);
    assert_eq!(admin_area.check(), GuardDecision::Allow);
}

#[tokio::test]
async fn guard_reevaluates_on_every_navigation() {
    let resolver = live_resolver().await;
    let guard = RouteGuard::new(resolver.handle(), RoutePolicy::role(Role::Recruiter));

    assert_eq!(guard.check(), GuardDecision::RedirectToLogin);

    resolver.enter_demo_mode(Role::Recruiter).await;
    assert_eq!(guard.check(), GuardDecision::Allow);

    // Identity changes between navigations must be observed; a cached
    // decision here would let a signed-out user straight through.
    resolver.sign_out().await;
    assert_eq!(guard.check(), GuardDecision::RedirectToLogin);
}

#[tokio::test]
async fn no_session_at_all_redirects_every_guarded_route_to_login() {
    let resolver = live_resolver().await;

    for policy in [
        RoutePolicy::authenticated(),
        RoutePolicy::role(Role::Student),
        RoutePolicy::roles(Role::ALL),
    ] {
        let guard = RouteGuard::new(resolver.handle(), policy);
        assert_eq!(guard.check(), GuardDecision::RedirectToLogin);
    }
}
