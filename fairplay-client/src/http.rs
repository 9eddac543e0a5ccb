use async_trait::async_trait;
use reqwest::Method;

use crate::{
    api::{
        paths, Ack, AdminUser, AdminUserUpdated, AdminUsersPage, AdminUsersQuery, Api,
        AuthResponse, BanUpdate, CommentCreated, CommentId, CommentsPage, CommentsQuery, Error,
        FollowersPage, FollowingPage, LikeResponse, LoginBody, ModVideosPage, ModerationAction,
        ModerationBody, ModerationQuery, ModerationResponse, MyVideosPage, NewComment,
        PublicUser, RegisterBody, RepliesPage, Role, RoleUpdate, SessionsList, SessionsRevoked,
        UserId, UserVideosPage, VideoDetails, VideoId, VideoUpdate, VideoUpdated, VideosPage,
        Viewer,
    },
    TokenStore,
};

/// `Api` over HTTP. Every request carries the stored session key as a bearer token, if there
/// is one.
pub struct HttpApi {
    client: reqwest::Client,
    host: String,
    tokens: TokenStore,
}

impl HttpApi {
    pub fn new(host: &str, tokens: TokenStore) -> HttpApi {
        HttpApi {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn logout(&self) -> std::io::Result<()> {
        self.tokens.clear()
    }

    fn url(&self, path: &str) -> String {
        match path.starts_with('/') {
            true => format!("{}{}", self.host, path),
            false => format!("{}/{}", self.host, path),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, Error> {
        let mut req = self.client.request(method.clone(), self.url(path));
        if let Some(token) = self.tokens.get() {
            req = req.bearer_auth(&token.0);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !status.is_success() {
            let err = Error::from_response(status.as_u16(), &bytes);
            tracing::debug!(%method, path, %err, "request failed");
            return Err(err);
        }
        Ok(bytes.to_vec())
    }

    async fn call<R>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<R, Error>
    where
        R: for<'de> serde::Deserialize<'de>,
    {
        let bytes = self.send(method, path, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Parse(e.to_string()))
    }

    async fn authenticate(&self, path: &str, body: serde_json::Value) -> Result<AuthResponse, Error> {
        let res: AuthResponse = self.call(Method::POST, path, Some(body)).await?;
        if let Err(err) = self.tokens.set(res.session_key.clone()) {
            tracing::warn!(?err, "failed saving session key");
        }
        Ok(res)
    }
}

fn to_json<B: serde::Serialize>(body: &B) -> Result<serde_json::Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Parse(e.to_string()))
}

#[async_trait]
impl Api for HttpApi {
    async fn login(&self, body: &LoginBody) -> Result<AuthResponse, Error> {
        self.authenticate(paths::AUTH_LOGIN, to_json(body)?).await
    }

    async fn register(&self, body: &RegisterBody) -> Result<AuthResponse, Error> {
        self.authenticate(paths::AUTH_REGISTER, to_json(body)?).await
    }

    async fn me(&self) -> Result<Viewer, Error> {
        self.call(Method::GET, paths::AUTH_ME, None).await
    }

    async fn sessions(&self) -> Result<SessionsList, Error> {
        self.call(Method::GET, paths::AUTH_SESSIONS, None).await
    }

    async fn revoke_session(&self, session: &str) -> Result<Ack, Error> {
        self.call(Method::DELETE, &paths::auth_session(session), None)
            .await
    }

    async fn revoke_all_sessions(&self) -> Result<SessionsRevoked, Error> {
        let res = self
            .call(Method::DELETE, paths::AUTH_SESSIONS_ALL, None)
            .await?;
        if let Err(err) = self.tokens.clear() {
            tracing::warn!(?err, "failed removing revoked session key");
        }
        Ok(res)
    }

    async fn revoke_other_sessions(&self) -> Result<SessionsRevoked, Error> {
        self.call(Method::DELETE, paths::AUTH_SESSIONS_OTHERS, None)
            .await
    }

    async fn user(&self, id_or_username: &str) -> Result<PublicUser, Error> {
        self.call(Method::GET, &paths::user(id_or_username), None)
            .await
    }

    async fn follow_user(&self, id_or_username: &str) -> Result<(), Error> {
        self.send(Method::POST, &paths::user_follow(id_or_username), None)
            .await
            .map(|_| ())
    }

    async fn unfollow_user(&self, id_or_username: &str) -> Result<(), Error> {
        self.send(Method::DELETE, &paths::user_follow(id_or_username), None)
            .await
            .map(|_| ())
    }

    async fn user_videos(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<UserVideosPage, Error> {
        self.call(
            Method::GET,
            &paths::user_videos(id_or_username, page, limit),
            None,
        )
        .await
    }

    async fn followers(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<FollowersPage, Error> {
        self.call(
            Method::GET,
            &paths::user_followers(id_or_username, page, limit),
            None,
        )
        .await
    }

    async fn following(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<FollowingPage, Error> {
        self.call(
            Method::GET,
            &paths::user_following(id_or_username, page, limit),
            None,
        )
        .await
    }

    async fn videos(&self, page: u32, limit: u32) -> Result<VideosPage, Error> {
        self.call(Method::GET, &paths::videos(page, limit), None)
            .await
    }

    async fn my_videos(&self, page: u32, limit: u32) -> Result<MyVideosPage, Error> {
        self.call(Method::GET, &paths::my_videos(page, limit), None)
            .await
    }

    async fn video(&self, video: &VideoId) -> Result<VideoDetails, Error> {
        self.call(Method::GET, &paths::video(video), None).await
    }

    async fn update_video(
        &self,
        video: &VideoId,
        body: &VideoUpdate,
    ) -> Result<VideoUpdated, Error> {
        self.call(Method::PATCH, &paths::video(video), Some(to_json(body)?))
            .await
    }

    async fn video_comments(
        &self,
        video: &VideoId,
        query: &CommentsQuery,
    ) -> Result<CommentsPage, Error> {
        self.call(Method::GET, &paths::video_comments_query(video, query), None)
            .await
    }

    async fn add_comment(
        &self,
        video: &VideoId,
        body: &NewComment,
    ) -> Result<CommentCreated, Error> {
        self.call(
            Method::POST,
            &paths::video_comments(video),
            Some(to_json(body)?),
        )
        .await
    }

    async fn like_comment(&self, comment: &CommentId) -> Result<LikeResponse, Error> {
        self.call(Method::POST, &paths::comment_like(comment), None)
            .await
    }

    async fn unlike_comment(&self, comment: &CommentId) -> Result<LikeResponse, Error> {
        self.call(Method::DELETE, &paths::comment_like(comment), None)
            .await
    }

    async fn comment_replies(
        &self,
        comment: &CommentId,
        page: u32,
        limit: u32,
    ) -> Result<RepliesPage, Error> {
        self.call(
            Method::GET,
            &paths::comment_replies(comment, page, limit),
            None,
        )
        .await
    }

    async fn moderator_videos(&self, query: &ModerationQuery) -> Result<ModVideosPage, Error> {
        self.call(Method::GET, &paths::moderator_videos(query), None)
            .await
    }

    async fn moderate_video(
        &self,
        video: &VideoId,
        action: ModerationAction,
    ) -> Result<ModerationResponse, Error> {
        self.call(
            Method::PATCH,
            &paths::moderator_video_moderation(video),
            Some(to_json(&ModerationBody { action })?),
        )
        .await
    }

    async fn admin_users(&self, query: &AdminUsersQuery) -> Result<AdminUsersPage, Error> {
        self.call(Method::GET, &paths::admin_users(query), None)
            .await
    }

    async fn admin_user(&self, user: &UserId) -> Result<AdminUser, Error> {
        self.call(Method::GET, &paths::admin_user(user), None).await
    }

    async fn set_user_role(&self, user: &UserId, role: Role) -> Result<AdminUserUpdated, Error> {
        self.call(
            Method::PATCH,
            &paths::admin_user_role(user),
            Some(to_json(&RoleUpdate { role })?),
        )
        .await
    }

    async fn set_user_ban(
        &self,
        user: &UserId,
        body: &BanUpdate,
    ) -> Result<AdminUserUpdated, Error> {
        self.call(
            Method::PATCH,
            &paths::admin_user_ban(user),
            Some(to_json(body)?),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthToken;

    #[test]
    fn host_is_normalized() {
        let api = HttpApi::new("https://fairplay.example/api/", TokenStore::default());
        assert_eq!(api.host(), "https://fairplay.example/api");
        assert_eq!(
            api.url("/videos/v1"),
            "https://fairplay.example/api/videos/v1"
        );
        assert_eq!(api.url("auth/me"), "https://fairplay.example/api/auth/me");
    }

    #[test]
    fn logout_clears_token() {
        let api = HttpApi::new(
            "http://localhost:3000",
            TokenStore::in_memory(Some(AuthToken(String::from("k")))),
        );
        assert!(api.tokens().get().is_some());
        api.logout().expect("clearing in-memory token");
        assert!(api.tokens().get().is_none());
    }
}
