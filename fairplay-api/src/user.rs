use std::fmt;

use crate::{Pagination, Time};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author snapshot embedded in comments
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Name to show for this user, falling back to the username
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

wire_enum! {
    Role {
        User => "user",
        Moderator => "moderator",
        Admin => "admin",
    }
}

impl Role {
    /// Whether this role may review the moderation queue
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

/// The authenticated user, as returned by `/auth/me`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewer {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub role: Role,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub follower_count: u64,
    pub following_count: u64,
    pub video_count: u64,
    pub created_at: Time,

    /// Only present when the request was authenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FollowersPage {
    pub followers: Vec<UserSummary>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FollowingPage {
    pub following: Vec<UserSummary>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings() {
        assert_eq!("moderator".parse::<Role>(), Ok(Role::Moderator));
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        let err = "root".parse::<Role>().unwrap_err();
        assert_eq!(err, "unknown value `root`, expected one of: user, moderator, admin");
        assert!(Role::Admin.is_staff() && !Role::User.is_staff());
    }
}
