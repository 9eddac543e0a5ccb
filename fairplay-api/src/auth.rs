use crate::{Role, Time, UserId};

/// Session key handed out by the server, sent back as a bearer token
#[derive(Clone, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct AuthToken(pub String);

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub email_or_username: String,
    pub password: String,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct RegisterBody {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub role: Role,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub expires_at: Time,
    #[serde(default)]
    pub device_info: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Response to both login and registration
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    pub user: AuthUser,
    pub session_key: AuthToken,
    pub session: Session,
}

/// One of the logged-in user's sessions, as listed on the account screen
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub session_key: AuthToken,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub device_info: Option<String>,
    pub created_at: Time,
    pub last_used_at: Time,
    pub expires_at: Time,
    pub is_current: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SessionsList {
    pub sessions: Vec<SessionInfo>,
    pub total: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsRevoked {
    #[serde(default)]
    pub message: String,
    pub sessions_logged_out: u64,
}

/// Response carrying nothing but a confirmation message
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}
