use async_trait::async_trait;
use fairplay_api::{
    paths, Ack, AdminUser, AdminUserUpdated, AdminUsersPage, AdminUsersQuery, Api, AuthResponse,
    BanUpdate, CommentCreated, CommentId, CommentsPage, CommentsQuery, Error, FollowersPage,
    FollowingPage, HlsInfo, LikeResponse, LoginBody, ModVideo, ModVideosPage, ModeratedVideo,
    ModerationAction, ModerationQuery, ModerationResponse, MyVideo, MyVideosPage, NewComment,
    PublicUser, RegisterBody, RepliesPage, Role, SessionInfo, SessionsList, SessionsRevoked,
    UpdatedVideo, UserId, UserVideo, UserVideosPage, VideoDetails, VideoId, VideoListItem,
    VideoUpdate, VideoUpdated, VideosPage, Viewer,
};

use crate::{
    db::{bad_request, forbidden, paginate, Auth},
    MockServer,
};

fn contains_ignoring_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Api for MockServer {
    async fn login(&self, body: &LoginBody) -> Result<AuthResponse, Error> {
        let mut db = self.db.lock();
        db.receive("POST", String::from(paths::AUTH_LOGIN))?;
        let id = db
            .users
            .iter()
            .find(|(_, u)| {
                (u.username == body.email_or_username || u.email == body.email_or_username)
                    && u.password == body.password
            })
            .map(|(id, _)| id.clone())
            .ok_or_else(|| Error::Http {
                status: 401,
                message: String::from("Invalid credentials"),
            })?;
        if db.users[&id].is_banned {
            return Err(forbidden("Your account is banned"));
        }
        Ok(db.auth_response(&id))
    }

    async fn register(&self, body: &RegisterBody) -> Result<AuthResponse, Error> {
        let mut db = self.db.lock();
        db.receive("POST", String::from(paths::AUTH_REGISTER))?;
        if body.username.trim().is_empty() || body.password.is_empty() {
            return Err(bad_request("Username and password are required"));
        }
        if db
            .users
            .values()
            .any(|u| u.username == body.username || u.email == body.email)
        {
            return Err(Error::Http {
                status: 409,
                message: String::from("Username or email already taken"),
            });
        }
        let id = db.add_user(&body.email, &body.username, &body.password);
        Ok(db.auth_response(&id))
    }

    async fn me(&self) -> Result<Viewer, Error> {
        let mut db = self.db.lock();
        db.receive("GET", String::from(paths::AUTH_ME))?;
        let id = db.session(&self.auth)?;
        let u = &db.users[&id];
        Ok(Viewer {
            id,
            email: u.email.clone(),
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            avatar_url: u.avatar_url.clone(),
            banner_url: None,
            bio: None,
            role: u.role,
        })
    }

    async fn sessions(&self) -> Result<SessionsList, Error> {
        let mut db = self.db.lock();
        db.receive("GET", String::from(paths::AUTH_SESSIONS))?;
        let user = db.session(&self.auth)?;
        let sessions = db
            .sessions
            .iter()
            .filter(|s| s.user == user)
            .map(|s| SessionInfo {
                id: s.id.clone(),
                session_key: s.token.clone(),
                ip_address: None,
                device_info: None,
                created_at: s.created_at,
                last_used_at: s.created_at,
                expires_at: s.expires_at,
                is_current: matches!(&self.auth, Auth::Token(t) if *t == s.token),
            })
            .collect::<Vec<_>>();
        Ok(SessionsList {
            total: sessions.len() as u64,
            sessions,
        })
    }

    async fn revoke_session(&self, session: &str) -> Result<Ack, Error> {
        let mut db = self.db.lock();
        db.receive("DELETE", paths::auth_session(session))?;
        let user = db.session(&self.auth)?;
        let idx = db
            .sessions
            .iter()
            .position(|s| s.id == session && s.user == user)
            .ok_or_else(|| Error::not_found("Session"))?;
        db.sessions.remove(idx);
        Ok(Ack {
            message: String::from("Session logged out"),
        })
    }

    async fn revoke_all_sessions(&self) -> Result<SessionsRevoked, Error> {
        let mut db = self.db.lock();
        db.receive("DELETE", String::from(paths::AUTH_SESSIONS_ALL))?;
        let user = db.session(&self.auth)?;
        let before = db.sessions.len();
        db.sessions.retain(|s| s.user != user);
        Ok(SessionsRevoked {
            message: String::from("Logged out of all sessions"),
            sessions_logged_out: (before - db.sessions.len()) as u64,
        })
    }

    async fn revoke_other_sessions(&self) -> Result<SessionsRevoked, Error> {
        let mut db = self.db.lock();
        db.receive("DELETE", String::from(paths::AUTH_SESSIONS_OTHERS))?;
        let user = db.session(&self.auth)?;
        let current = match &self.auth {
            Auth::Token(t) => Some(t.clone()),
            _ => None,
        };
        let before = db.sessions.len();
        db.sessions
            .retain(|s| s.user != user || Some(&s.token) == current.as_ref());
        Ok(SessionsRevoked {
            message: String::from("Logged out of other sessions"),
            sessions_logged_out: (before - db.sessions.len()) as u64,
        })
    }

    async fn user(&self, id_or_username: &str) -> Result<PublicUser, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::user(id_or_username))?;
        let id = db.existing_user(id_or_username)?;
        let viewer = db.resolve(&self.auth);
        Ok(db.public_user(&id, viewer.as_ref()))
    }

    async fn follow_user(&self, id_or_username: &str) -> Result<(), Error> {
        self.set_follow(id_or_username, true)
    }

    async fn unfollow_user(&self, id_or_username: &str) -> Result<(), Error> {
        self.set_follow(id_or_username, false)
    }

    async fn user_videos(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<UserVideosPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::user_videos(id_or_username, page, limit))?;
        let owner = db.existing_user(id_or_username)?;
        let ids = db.videos_newest_first(|v| v.owner == owner && db.is_listed(v));
        let (ids, pagination) = paginate(ids, Some(page), Some(limit));
        let videos = ids
            .into_iter()
            .map(|id| {
                let v = &db.videos[&id];
                UserVideo {
                    title: v.title.clone(),
                    description: v.description.clone(),
                    created_at: v.created_at,
                    view_count: v.views.to_string(),
                    thumbnail_url: None,
                    id,
                }
            })
            .collect();
        Ok(UserVideosPage { videos, pagination })
    }

    async fn followers(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<FollowersPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::user_followers(id_or_username, page, limit))?;
        let id = db.existing_user(id_or_username)?;
        let (ids, pagination) = paginate(db.followers_of(&id), Some(page), Some(limit));
        Ok(FollowersPage {
            followers: ids.iter().map(|f| db.summary(f)).collect(),
            pagination,
        })
    }

    async fn following(
        &self,
        id_or_username: &str,
        page: u32,
        limit: u32,
    ) -> Result<FollowingPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::user_following(id_or_username, page, limit))?;
        let id = db.existing_user(id_or_username)?;
        let (ids, pagination) = paginate(db.following_of(&id), Some(page), Some(limit));
        Ok(FollowingPage {
            following: ids.iter().map(|f| db.summary(f)).collect(),
            pagination,
        })
    }

    async fn videos(&self, page: u32, limit: u32) -> Result<VideosPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::videos(page, limit))?;
        let ids = db.videos_newest_first(|v| db.is_listed(v));
        let (ids, pagination) = paginate(ids, Some(page), Some(limit));
        let videos = ids
            .into_iter()
            .map(|id| {
                let v = &db.videos[&id];
                VideoListItem {
                    title: v.title.clone(),
                    thumbnail_url: None,
                    view_count: v.views.to_string(),
                    avg_rating: 0.0,
                    ratings_count: 0,
                    created_at: Some(v.created_at),
                    user: db.uploader(&v.owner),
                    id,
                }
            })
            .collect();
        Ok(VideosPage { videos, pagination })
    }

    async fn my_videos(&self, page: u32, limit: u32) -> Result<MyVideosPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::my_videos(page, limit))?;
        let owner = db.session(&self.auth)?;
        let ids = db.videos_newest_first(|v| v.owner == owner);
        let (ids, pagination) = paginate(ids, Some(page), Some(limit));
        let videos = ids
            .into_iter()
            .map(|id| {
                let v = &db.videos[&id];
                MyVideo {
                    title: v.title.clone(),
                    description: v.description.clone(),
                    thumbnail_url: None,
                    view_count: v.views.to_string(),
                    avg_rating: 0.0,
                    ratings_count: 0,
                    visibility: v.visibility,
                    processing_status: v.processing,
                    moderation_status: v.moderation,
                    id,
                }
            })
            .collect();
        Ok(MyVideosPage { videos, pagination })
    }

    async fn video(&self, video: &VideoId) -> Result<VideoDetails, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::video(video))?;
        let viewer = db.resolve(&self.auth);
        let v = db
            .videos
            .get(video)
            .filter(|v| db.can_open(v, viewer.as_ref()))
            .ok_or_else(|| Error::not_found("Video"))?;
        Ok(VideoDetails {
            id: video.clone(),
            title: v.title.clone(),
            hls: HlsInfo::default(),
            thumbnail_url: None,
            view_count: v.views.to_string(),
            avg_rating: 0.0,
            ratings_count: 0,
            description: v.description.clone(),
            user: Some(db.uploader(&v.owner)),
        })
    }

    async fn update_video(
        &self,
        video: &VideoId,
        body: &VideoUpdate,
    ) -> Result<VideoUpdated, Error> {
        let mut db = self.db.lock();
        db.receive("PATCH", paths::video(video))?;
        let user = db.session(&self.auth)?;
        let v = db
            .videos
            .get_mut(video)
            .ok_or_else(|| Error::not_found("Video"))?;
        if v.owner != user {
            return Err(forbidden("You can only edit your own videos"));
        }
        if let Some(title) = &body.title {
            if title.trim().is_empty() {
                return Err(bad_request("Title cannot be empty"));
            }
            v.title = String::from(title.trim());
        }
        if let Some(description) = &body.description {
            v.description = Some(description.clone());
        }
        if let Some(visibility) = body.visibility {
            v.visibility = visibility;
        }
        Ok(VideoUpdated {
            message: String::from("Video updated"),
            video: UpdatedVideo {
                id: video.clone(),
                title: v.title.clone(),
                description: v.description.clone(),
                thumbnail_url: None,
            },
        })
    }

    async fn video_comments(
        &self,
        video: &VideoId,
        query: &CommentsQuery,
    ) -> Result<CommentsPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::video_comments_query(video, query))?;
        if !db.videos.contains_key(video) {
            return Err(Error::not_found("Video"));
        }
        let mut top = db
            .comments
            .iter()
            .filter(|(_, c)| c.video == *video && c.parent.is_none())
            .map(|(id, c)| (c.created_at, id.clone()))
            .collect::<Vec<_>>();
        // newest first
        top.sort_unstable_by(|a, b| b.cmp(a));
        let (top, pagination) = paginate(top, query.page, query.limit);
        let embed = [
            query.replies_limit.unwrap_or(0),
            query.child_replies_limit.unwrap_or(0),
        ];
        let viewer = db.resolve(&self.auth);
        let comments = top
            .iter()
            .map(|(_, id)| db.render(id, viewer.as_ref(), &embed))
            .collect();
        Ok(CommentsPage {
            comments,
            pagination,
        })
    }

    async fn add_comment(
        &self,
        video: &VideoId,
        body: &NewComment,
    ) -> Result<CommentCreated, Error> {
        let mut db = self.db.lock();
        db.receive("POST", paths::video_comments(video))?;
        let author = db.session(&self.auth)?;
        let content = body.content.trim();
        if content.is_empty() {
            return Err(bad_request("Content is required"));
        }
        let id = db.insert_comment(video, author.clone(), body.parent_id.as_ref(), content)?;
        let mut comment = db.render(&id, Some(&author), &[]);
        // the creation response only carries the author's id and username
        comment.user.display_name = None;
        comment.user.avatar_url = None;
        Ok(CommentCreated {
            message: String::from("Comment added"),
            comment,
        })
    }

    async fn like_comment(&self, comment: &CommentId) -> Result<LikeResponse, Error> {
        self.set_like(comment, true)
    }

    async fn unlike_comment(&self, comment: &CommentId) -> Result<LikeResponse, Error> {
        self.set_like(comment, false)
    }

    async fn comment_replies(
        &self,
        comment: &CommentId,
        page: u32,
        limit: u32,
    ) -> Result<RepliesPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::comment_replies(comment, page, limit))?;
        let c = db
            .comments
            .get(comment)
            .ok_or_else(|| Error::not_found("Comment"))?;
        let (ids, pagination) = paginate(c.replies.clone(), Some(page), Some(limit));
        let viewer = db.resolve(&self.auth);
        let replies = ids
            .iter()
            .map(|id| db.render(id, viewer.as_ref(), &[]))
            .collect();
        Ok(RepliesPage {
            replies,
            pagination,
        })
    }

    async fn moderator_videos(&self, q: &ModerationQuery) -> Result<ModVideosPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::moderator_videos(q))?;
        db.staff(&self.auth)?;
        let mut ids = db.videos_newest_first(|v| {
            q.processing_status.map_or(true, |s| v.processing == s)
                && q.moderation_status.map_or(true, |s| v.moderation == s)
                && q.visibility.map_or(true, |s| v.visibility == s)
                && q.user_id.as_ref().map_or(true, |u| v.owner == *u)
                && q.search
                    .as_deref()
                    .map_or(true, |s| contains_ignoring_case(&v.title, s))
        });
        if q.sort.as_deref() == Some("oldest") {
            ids.reverse();
        }
        let (ids, pagination) = paginate(ids, q.page, q.limit);
        let videos = ids
            .into_iter()
            .map(|id| {
                let v = &db.videos[&id];
                ModVideo {
                    title: v.title.clone(),
                    thumbnail_url: None,
                    processing_status: v.processing,
                    moderation_status: v.moderation,
                    visibility: v.visibility,
                    user: db.summary(&v.owner),
                    created_at: v.created_at,
                    id,
                }
            })
            .collect();
        Ok(ModVideosPage { videos, pagination })
    }

    async fn moderate_video(
        &self,
        video: &VideoId,
        action: ModerationAction,
    ) -> Result<ModerationResponse, Error> {
        let mut db = self.db.lock();
        db.receive("PATCH", paths::moderator_video_moderation(video))?;
        db.staff(&self.auth)?;
        let v = db
            .videos
            .get_mut(video)
            .ok_or_else(|| Error::not_found("Video"))?;
        v.moderation = action.outcome();
        let message = match action {
            ModerationAction::Approve => "Video approved",
            ModerationAction::Reject => "Video rejected",
        };
        Ok(ModerationResponse {
            message: String::from(message),
            video: ModeratedVideo {
                id: video.clone(),
                title: v.title.clone(),
                moderation_status: v.moderation,
                processing_status: v.processing,
            },
        })
    }

    async fn admin_users(&self, q: &AdminUsersQuery) -> Result<AdminUsersPage, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::admin_users(q))?;
        db.admin(&self.auth)?;
        let mut ids = db
            .users
            .iter()
            .filter(|(_, u)| {
                q.is_banned.map_or(true, |b| u.is_banned == b)
                    && q.search.as_deref().map_or(true, |s| {
                        contains_ignoring_case(&u.username, s) || contains_ignoring_case(&u.email, s)
                    })
            })
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();
        match q.sort.as_deref() {
            Some("username") => {
                ids.sort_by(|a, b| db.users[a].username.cmp(&db.users[b].username))
            }
            // newest accounts first
            _ => ids.sort_by(|a, b| db.users[b].created_at.cmp(&db.users[a].created_at)),
        }
        let (ids, pagination) = paginate(ids, q.page, q.limit);
        Ok(AdminUsersPage {
            users: ids.iter().map(|id| db.admin_user(id)).collect(),
            pagination,
        })
    }

    async fn admin_user(&self, user: &UserId) -> Result<AdminUser, Error> {
        let mut db = self.db.lock();
        db.receive("GET", paths::admin_user(user))?;
        db.admin(&self.auth)?;
        if !db.users.contains_key(user) {
            return Err(Error::not_found("User"));
        }
        Ok(db.admin_user(user))
    }

    async fn set_user_role(&self, user: &UserId, role: Role) -> Result<AdminUserUpdated, Error> {
        let mut db = self.db.lock();
        db.receive("PATCH", paths::admin_user_role(user))?;
        let admin = db.admin(&self.auth)?;
        if *user == admin {
            return Err(bad_request("You cannot change your own role"));
        }
        db.users
            .get_mut(user)
            .ok_or_else(|| Error::not_found("User"))?
            .role = role;
        Ok(AdminUserUpdated {
            message: format!("Role set to {role}"),
            user: db.admin_user(user),
        })
    }

    async fn set_user_ban(
        &self,
        user: &UserId,
        body: &BanUpdate,
    ) -> Result<AdminUserUpdated, Error> {
        let mut db = self.db.lock();
        db.receive("PATCH", paths::admin_user_ban(user))?;
        let admin = db.admin(&self.auth)?;
        if *user == admin {
            return Err(bad_request("You cannot ban yourself"));
        }
        let u = db
            .users
            .get_mut(user)
            .ok_or_else(|| Error::not_found("User"))?;
        u.is_banned = body.is_banned;
        u.ban_reason_public = body.public_reason.clone().filter(|_| body.is_banned);
        u.ban_reason_private = body.private_reason.clone().filter(|_| body.is_banned);
        if body.is_banned {
            db.sessions.retain(|s| s.user != *user);
        }
        let message = match body.is_banned {
            true => "User banned",
            false => "User unbanned",
        };
        Ok(AdminUserUpdated {
            message: String::from(message),
            user: db.admin_user(user),
        })
    }
}
