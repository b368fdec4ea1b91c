//! Route gating: a pure decision over (required roles, session snapshot,
//! requested path). Holds no state and is safe to re-evaluate on every
//! navigation. All role logic for protected areas lives here — the nav
//! dispatcher only selects a surface.

use crate::identity::Role;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected content.
    Render,
    /// Session still hydrating: show a neutral waiting indicator, never
    /// redirect — avoids redirect flicker racing the cold-start verification.
    Wait,
    Redirect(String),
}

/// Redirect surface paths for the app. `Default` matches the studio app's
/// standard layout; hosts with a different route map inject their own.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    pub login_path: String,
    pub admin_landing: String,
    pub member_landing: String,
    pub unauthorized_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            login_path: "/login".into(),
            admin_landing: "/admin".into(),
            member_landing: "/profile".into(),
            unauthorized_path: "/unauthorized".into(),
        }
    }
}

impl RouteGuard {
    /// An empty `required` set means "any authenticated identity".
    pub fn evaluate(&self, required: &[Role], session: &Session, requested_path: &str) -> GuardDecision {
        if session.is_loading {
            return GuardDecision::Wait;
        }
        if !session.is_authenticated {
            // Carry the destination so it can be restored after login.
            return GuardDecision::Redirect(format!(
                "{}?next={}",
                self.login_path,
                urlencoding::encode(requested_path)
            ));
        }
        if required.is_empty() {
            return GuardDecision::Render;
        }
        let role = session.role();
        if required.contains(&role) {
            return GuardDecision::Render;
        }
        // Role-aware fallback: send the visitor somewhere their role can use.
        match role {
            Role::Admin => GuardDecision::Redirect(self.admin_landing.clone()),
            Role::Member => GuardDecision::Redirect(self.member_landing.clone()),
            Role::Guest => GuardDecision::Redirect(self.unauthorized_path.clone()),
        }
    }
}
