use chrono::Utc;

/// A fieldless enum serialized as one of the given strings, also parsed from and displayed
/// as that string
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<$name, String> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let expected = $name::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>();
                        format!("unknown value `{s}`, expected one of: {}", expected.join(", "))
                    })
            }
        }
    };
}

mod admin;
pub use admin::{AdminUser, AdminUserUpdated, AdminUsersPage, AdminUsersQuery, BanUpdate, RoleUpdate};

mod api;
pub use api::Api;

mod auth;
pub use auth::{
    Ack, AuthResponse, AuthToken, AuthUser, LoginBody, RegisterBody, Session, SessionInfo,
    SessionsList, SessionsRevoked,
};

mod comment;
pub use comment::{
    Comment, CommentCount, CommentCreated, CommentId, CommentsPage, CommentsQuery, LikeResponse,
    NewComment, RepliesPage,
};

mod error;
pub use error::Error;

mod moderation;
pub use moderation::{
    ModVideo, ModVideosPage, ModeratedVideo, ModerationAction, ModerationBody, ModerationQuery,
    ModerationResponse,
};

mod pagination;
pub use pagination::Pagination;

pub mod paths;

mod user;
pub use user::{FollowersPage, FollowingPage, PublicUser, Role, UserId, UserSummary, Viewer};

mod video;
pub use video::{
    HlsInfo, ModerationStatus, MyVideo, MyVideosPage, ProcessingStatus, UpdatedVideo, UserVideo,
    UserVideosPage, VideoDetails, VideoId, VideoListItem, VideoUpdate, VideoUpdated,
    VideoUploader, VideosPage, Visibility,
};

pub type Time = chrono::DateTime<Utc>;
