//! Guard and navigation behavior driven through the real session engine:
//! snapshots come from a SessionManager, not hand-built fixtures.

use std::sync::Arc;

use fitgate::nav::{self, NavContext, NavVariant};
use fitgate::{
    AuthError, AuthResult, GuardDecision, Identity, IdentityApi, MemoryCredentialStore, Role, RouteGuard,
    SessionManager,
};

/// Fixed-response endpoint: every credential exchange yields the configured
/// identity.
struct FixedApi(Identity);

impl IdentityApi for FixedApi {
    async fn login(&self, _: &str, _: &str) -> AuthResult<(String, Identity)> {
        Ok(("tok".into(), self.0.clone()))
    }
    async fn register(&self, _: &str, _: &str, _: &str) -> AuthResult<(String, Identity)> {
        Ok(("tok".into(), self.0.clone()))
    }
    async fn me(&self, _: &str) -> AuthResult<Identity> {
        Ok(self.0.clone())
    }
}

struct DeadApi;

impl IdentityApi for DeadApi {
    async fn login(&self, _: &str, _: &str) -> AuthResult<(String, Identity)> {
        Err(AuthError::network("down"))
    }
    async fn register(&self, _: &str, _: &str, _: &str) -> AuthResult<(String, Identity)> {
        Err(AuthError::network("down"))
    }
    async fn me(&self, _: &str) -> AuthResult<Identity> {
        Err(AuthError::network("down"))
    }
}

fn identity(role: &str) -> Identity {
    serde_json::from_str(&format!(r#"{{"id": 1, "username": "t", "role": "{role}"}}"#)).unwrap()
}

async fn signed_in(role: &str) -> fitgate::Session {
    let manager = SessionManager::new(Arc::new(MemoryCredentialStore::new()), FixedApi(identity(role)));
    manager.hydrate();
    manager.login("t@studio.fit", "pw").await.unwrap()
}

#[tokio::test]
async fn member_on_admin_route_gets_member_landing_not_unauthorized() {
    let guard = RouteGuard::default();
    let session = signed_in("user").await;
    let decision = guard.evaluate(&[Role::Admin], &session, "/admin/orders");
    assert_eq!(decision, GuardDecision::Redirect(guard.member_landing.clone()));
    assert_ne!(decision, GuardDecision::Redirect(guard.unauthorized_path.clone()));
}

#[tokio::test]
async fn admin_renders_admin_routes_and_gets_admin_nav() {
    let guard = RouteGuard::default();
    let session = signed_in("admin").await;
    assert_eq!(guard.evaluate(&[Role::Admin], &session, "/admin/orders"), GuardDecision::Render);
    assert_eq!(nav::dispatch(&session), NavVariant::AdminConsole);
}

#[tokio::test]
async fn anonymous_visitor_carries_destination_through_login_redirect() {
    let manager = SessionManager::new(Arc::new(MemoryCredentialStore::new()), DeadApi);
    let session = manager.start().await;

    let guard = RouteGuard::default();
    match guard.evaluate(&[], &session, "/booking?slot=7am") {
        GuardDecision::Redirect(target) => {
            assert!(target.starts_with("/login?next="));
            assert!(target.contains("%2Fbooking%3Fslot%3D7am"));
        }
        other => panic!("expected redirect, got {other:?}"),
    }
    assert_eq!(nav::dispatch(&session), NavVariant::PublicSurface);
}

#[tokio::test]
async fn hydrating_session_waits_and_shows_public_chrome() {
    let manager = SessionManager::new(Arc::new(MemoryCredentialStore::new()), DeadApi);
    let session = manager.snapshot(); // before hydrate: still loading

    let guard = RouteGuard::default();
    assert_eq!(guard.evaluate(&[Role::Member], &session, "/profile"), GuardDecision::Wait);
    assert_eq!(nav::dispatch(&session), NavVariant::PublicSurface);
}

#[tokio::test]
async fn member_nav_marks_booking_section_active() {
    let session = signed_in("user").await;
    assert_eq!(nav::dispatch(&session), NavVariant::MemberSurface);

    let items = nav::items(NavVariant::MemberSurface, &NavContext::at("/booking/free"));
    let active: Vec<_> = items.iter().filter(|i| i.active).map(|i| i.label).collect();
    assert_eq!(active, vec!["Book a Session"]);

    // Root item is only active at the root itself.
    let items = nav::items(NavVariant::MemberSurface, &NavContext::at("/"));
    let active: Vec<_> = items.iter().filter(|i| i.active).map(|i| i.label).collect();
    assert_eq!(active, vec!["Home"]);
}
