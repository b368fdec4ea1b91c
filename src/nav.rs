//! Navigation surface selection. Pure presentational dispatch: exactly one
//! of three variants as a function of the session snapshot. No business data
//! and no authorization decisions here (the guard owns those); each variant
//! only computes which of its items is active for the current path.

use crate::identity::Role;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavVariant {
    AdminConsole,
    MemberSurface,
    PublicSurface,
}

/// Cosmetic inputs the chrome needs besides the session: current path and
/// whether the page has scrolled past the hero banner.
#[derive(Debug, Clone, Default)]
pub struct NavContext {
    pub path: String,
    pub scrolled: bool,
}

impl NavContext {
    pub fn at(path: &str) -> Self { Self { path: path.into(), scrolled: false } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Exhaustive: adding a role is a compile-time-checked change here.
pub fn dispatch(session: &Session) -> NavVariant {
    if session.is_loading || !session.is_authenticated {
        return NavVariant::PublicSurface;
    }
    match session.role() {
        Role::Admin => NavVariant::AdminConsole,
        Role::Member => NavVariant::MemberSurface,
        Role::Guest => NavVariant::PublicSurface,
    }
}

/// Longest-prefix match: the root path matches only exactly, every other
/// item path matches any current path underneath it.
pub fn is_active(current_path: &str, item_path: &str) -> bool {
    if item_path == "/" {
        return current_path == "/";
    }
    current_path.starts_with(item_path)
}

/// The item set for a variant, with `active` computed from the context.
pub fn items(variant: NavVariant, ctx: &NavContext) -> Vec<NavItem> {
    let raw: &[(&'static str, &'static str)] = match variant {
        NavVariant::AdminConsole => &[
            ("Dashboard", "/admin"),
            ("Memberships", "/admin/memberships"),
            ("Trainers", "/admin/trainers"),
            ("Orders", "/admin/orders"),
            ("Payments", "/admin/payments"),
            ("Coach Applications", "/admin/coaches"),
        ],
        NavVariant::MemberSurface => &[
            ("Home", "/"),
            ("Classes", "/classes"),
            ("Trainers", "/trainers"),
            ("Book a Session", "/booking"),
            ("My Profile", "/profile"),
        ],
        NavVariant::PublicSurface => &[
            ("Home", "/"),
            ("Memberships", "/memberships"),
            ("Trainers", "/trainers"),
            ("Free Session", "/booking/free"),
            ("Sign In", "/login"),
        ],
    };
    raw.iter()
        .map(|(label, path)| NavItem { label, path, active: is_active(&ctx.path, path) })
        .collect()
}
