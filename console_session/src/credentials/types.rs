use serde::{Deserialize, Serialize};

/// Denormalized operator record shown in the console shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub label: String,
    pub email: String,
    pub is_admin: bool,
    #[serde(default)]
    pub allowed_pages: Vec<String>,
}

/// The committed session credential: the signed token and the profile it
/// belongs to. The two are written and cleared together; no caller ever
/// observes one without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub profile: UserProfile,
}
