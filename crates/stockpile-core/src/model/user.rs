// ── User profile domain types ──

use serde::{Deserialize, Serialize};

/// Role stored on a profile. Gates CLI visibility only -- the backend
/// enforces nothing based on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Manager,
    Employee,
}

impl UserRole {
    pub fn is_manager(self) -> bool {
        matches!(self, Self::Manager)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manager => write!(f, "Manager"),
            Self::Employee => write!(f, "Employee"),
        }
    }
}

/// Advisory per-employee limits. Data only; nothing enforces them here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLimits {
    pub max_sale_value: f64,
}

/// The role/limits record associated with an authenticated identity,
/// stored in the `users` collection under the identity's account id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<SaleLimits>,
}

/// Input for registering a new employee identity + profile.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub password: secrecy::SecretString,
    pub role: UserRole,
    pub limits: Option<SaleLimits>,
}
