//! Identity and role types shared by the session manager and its consumers.
//! Role is a closed enumeration: adding a privilege class is a compile-time
//! checked change everywhere it is matched.

use serde::{Deserialize, Deserializer, Serialize};

/// Privilege classes. Wire values are `admin` and `user`; anything absent or
/// unrecognized lands on the least-privileged authenticated role. `Guest` is
/// local-only and never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(rename = "user")]
    Member,
    Guest,
}

impl Role {
    pub fn from_wire(s: &str) -> Role {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            _ => Role::Member,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "user",
            Role::Guest => "guest",
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Role::from_wire(&s))
    }
}

/// Two-phase hydration marker: `Cached` means the identity was restored from
/// the durable store and has not yet been confirmed by the server this
/// process lifetime; `Verified` means the server copy is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Cached,
    Verified,
}

/// The authenticated principal as the backend describes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    #[serde(deserialize_with = "id_from_wire")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Identity {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Shallow patch applied to an identity after a profile edit elsewhere,
/// without a full re-verification round trip. Only provided fields move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl IdentityPatch {
    pub fn apply(&self, identity: &mut Identity) {
        if let Some(u) = &self.username { identity.username = u.clone(); }
        if let Some(e) = &self.email { identity.email = Some(e.clone()); }
        if let Some(n) = &self.name { identity.name = Some(n.clone()); }
        if let Some(a) = &self.avatar { identity.avatar = Some(a.clone()); }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.name.is_none() && self.avatar.is_none()
    }
}

// Backends disagree about whether ids are numbers or strings; accept both.
fn id_from_wire<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    match v {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id value: {}", other))),
    }
}
