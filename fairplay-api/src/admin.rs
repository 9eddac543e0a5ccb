use crate::{Pagination, Role, Time, UserId};

/// A user as seen from the admin console
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_banned: bool,
    #[serde(default)]
    pub ban_reason_public: Option<String>,
    pub created_at: Time,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_views: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AdminUsersPage {
    pub users: Vec<AdminUser>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AdminUsersQuery {
    /// Case-insensitive match on username or email
    pub search: Option<String>,
    pub is_banned: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,

    /// `username` sorts alphabetically, anything else by creation date
    pub sort: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanUpdate {
    pub is_banned: bool,

    /// Shown to the banned user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_reason: Option<String>,

    /// Only visible to staff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_reason: Option<String>,
}

impl BanUpdate {
    pub fn ban(public_reason: Option<String>, private_reason: Option<String>) -> BanUpdate {
        BanUpdate {
            is_banned: true,
            public_reason,
            private_reason,
        }
    }

    pub fn unban() -> BanUpdate {
        BanUpdate {
            is_banned: false,
            public_reason: None,
            private_reason: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AdminUserUpdated {
    #[serde(default)]
    pub message: String,
    pub user: AdminUser,
}
