use async_trait::async_trait;

use crate::{
    Ack, AdminUser, AdminUserUpdated, AdminUsersPage, AdminUsersQuery, AuthResponse, BanUpdate,
    CommentCreated, CommentId, CommentsPage, CommentsQuery, Error, FollowersPage, FollowingPage,
    LikeResponse, LoginBody, ModVideosPage, ModerationAction, ModerationQuery,
    ModerationResponse, MyVideosPage, NewComment, PublicUser, RegisterBody, RepliesPage, Role,
    SessionsList, SessionsRevoked, UserId, UserVideosPage, VideoDetails, VideoId, VideoUpdate,
    VideoUpdated, VideosPage, Viewer,
};

/// The REST endpoints the client consumes. Implementations attach the current session, if
/// any, to every call.
#[async_trait]
pub trait Api: Send + Sync {
    async fn login(&self, body: &LoginBody) -> Result<AuthResponse, Error>;
    async fn register(&self, body: &RegisterBody) -> Result<AuthResponse, Error>;
    async fn me(&self) -> Result<Viewer, Error>;

    async fn sessions(&self) -> Result<SessionsList, Error>;
    async fn revoke_session(&self, session: &str) -> Result<Ack, Error>;

    /// Logs out every session, the current one included
    async fn revoke_all_sessions(&self) -> Result<SessionsRevoked, Error>;
    async fn revoke_other_sessions(&self) -> Result<SessionsRevoked, Error>;

    async fn user(&self, id_or_username: &str) -> Result<PublicUser, Error>;
    async fn follow_user(&self, id_or_username: &str) -> Result<(), Error>;
    async fn unfollow_user(&self, id_or_username: &str) -> Result<(), Error>;
    async fn user_videos(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<UserVideosPage, Error>;
    async fn followers(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<FollowersPage, Error>;
    async fn following(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<FollowingPage, Error>;

    async fn videos(&self, page: u32, limit: u32) -> Result<VideosPage, Error>;
    async fn my_videos(&self, page: u32, limit: u32) -> Result<MyVideosPage, Error>;
    async fn video(&self, video: &VideoId) -> Result<VideoDetails, Error>;
    async fn update_video(&self, video: &VideoId, body: &VideoUpdate)
        -> Result<VideoUpdated, Error>;
    async fn video_comments(
        &self,
        video: &VideoId,
        query: &CommentsQuery,
    ) -> Result<CommentsPage, Error>;
    async fn add_comment(&self, video: &VideoId, body: &NewComment)
        -> Result<CommentCreated, Error>;

    async fn like_comment(&self, comment: &CommentId) -> Result<LikeResponse, Error>;
    async fn unlike_comment(&self, comment: &CommentId) -> Result<LikeResponse, Error>;
    async fn comment_replies(
        &self,
        comment: &CommentId,
        page: u32,
        limit: u32,
    ) -> Result<RepliesPage, Error>;

    async fn moderator_videos(&self, query: &ModerationQuery) -> Result<ModVideosPage, Error>;
    async fn moderate_video(
        &self,
        video: &VideoId,
        action: ModerationAction,
    ) -> Result<ModerationResponse, Error>;

    async fn admin_users(&self, query: &AdminUsersQuery) -> Result<AdminUsersPage, Error>;
    async fn admin_user(&self, user: &UserId) -> Result<AdminUser, Error>;
    async fn set_user_role(&self, user: &UserId, role: Role) -> Result<AdminUserUpdated, Error>;
    async fn set_user_ban(&self, user: &UserId, body: &BanUpdate)
        -> Result<AdminUserUpdated, Error>;
}
