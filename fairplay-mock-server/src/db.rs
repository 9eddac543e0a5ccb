use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Duration;
use fairplay_api::{
    AdminUser, AuthResponse, AuthToken, AuthUser, Comment, CommentCount, CommentId, Error,
    ModerationStatus, Pagination, ProcessingStatus, PublicUser, Role, Session, Time, UserId,
    UserSummary, VideoId, VideoUploader, Visibility,
};

pub(crate) const DEFAULT_LIMIT: u32 = 20;

/// Who a `MockServer` handle acts as
#[derive(Clone, Debug)]
pub(crate) enum Auth {
    Anonymous,
    User(UserId),

    /// Resolved on every request, so that revoking the session logs the handle out
    Token(AuthToken),
}

#[derive(Debug)]
pub(crate) struct Db {
    pub users: BTreeMap<UserId, DbUser>,
    pub videos: BTreeMap<VideoId, DbVideo>,
    pub comments: HashMap<CommentId, DbComment>,
    pub sessions: Vec<DbSession>,
    pub next_id: u64,
    pub epoch: Time,
    pub fail_next: usize,
    pub omit_comment_avatars: bool,
    pub requests: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct DbUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: Time,
    pub following: HashSet<UserId>,
    pub is_banned: bool,
    pub ban_reason_public: Option<String>,
    pub ban_reason_private: Option<String>,
}

#[derive(Debug)]
pub(crate) struct DbVideo {
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub processing: ProcessingStatus,
    pub moderation: ModerationStatus,
    pub created_at: Time,
    pub views: u64,
}

#[derive(Debug)]
pub(crate) struct DbComment {
    pub video: VideoId,
    pub parent: Option<CommentId>,
    pub author: UserId,
    pub content: String,
    pub created_at: Time,
    pub likes: HashSet<UserId>,

    /// Replies, oldest first
    pub replies: Vec<CommentId>,
}

#[derive(Debug)]
pub(crate) struct DbSession {
    pub id: String,
    pub token: AuthToken,
    pub user: UserId,
    pub created_at: Time,
    pub expires_at: Time,
}

pub(crate) fn unauthorized() -> Error {
    Error::Http {
        status: 401,
        message: String::from("Unauthorized"),
    }
}

pub(crate) fn forbidden(message: &str) -> Error {
    Error::Http {
        status: 403,
        message: String::from(message),
    }
}

pub(crate) fn bad_request(message: &str) -> Error {
    Error::Http {
        status: 400,
        message: String::from(message),
    }
}

/// Cuts `page` (1-based) out of `items`, with `limit` falling back to the server default
pub(crate) fn paginate<T>(
    items: Vec<T>,
    page: Option<u32>,
    limit: Option<u32>,
) -> (Vec<T>, Pagination) {
    let page = page.filter(|p| *p != 0).unwrap_or(1);
    let limit = limit.filter(|l| *l != 0).unwrap_or(DEFAULT_LIMIT);
    let pagination = Pagination::for_page(page, limit, items.len() as u64);
    let skip = ((page - 1) as usize).saturating_mul(pagination.limit as usize);
    let items = items
        .into_iter()
        .skip(skip)
        .take(pagination.limit as usize)
        .collect();
    (items, pagination)
}

impl Db {
    pub fn new() -> Db {
        Db {
            users: BTreeMap::new(),
            videos: BTreeMap::new(),
            comments: HashMap::new(),
            sessions: Vec::new(),
            next_id: 0,
            epoch: "2024-01-01T00:00:00Z"
                .parse()
                .expect("parsing mock server epoch"),
            fail_next: 0,
            omit_comment_avatars: false,
            requests: Vec::new(),
        }
    }

    /// Logs the request, then checks whether it should fail
    pub fn receive(&mut self, method: &str, path: String) -> Result<(), Error> {
        self.requests.push(format!("{method} {path}"));
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(Error::Network(String::from("injected failure")));
        }
        Ok(())
    }

    pub fn now(&mut self) -> Time {
        self.next_id += 1;
        self.epoch + Duration::seconds(self.next_id as i64)
    }

    pub fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    pub fn add_user(&mut self, email: &str, username: &str, password: &str) -> UserId {
        let id = UserId(self.fresh_id("u"));
        let created_at = self.now();
        self.users.insert(
            id.clone(),
            DbUser {
                email: String::from(email),
                username: String::from(username),
                password: String::from(password),
                display_name: None,
                avatar_url: None,
                role: Role::User,
                created_at,
                following: HashSet::new(),
                is_banned: false,
                ban_reason_public: None,
                ban_reason_private: None,
            },
        );
        id
    }

    pub fn user_id(&self, id_or_username: &str) -> Option<UserId> {
        self.users
            .iter()
            .find(|(id, u)| id.0 == id_or_username || u.username == id_or_username)
            .map(|(id, _)| id.clone())
    }

    pub fn existing_user(&self, id_or_username: &str) -> Result<UserId, Error> {
        self.user_id(id_or_username)
            .ok_or_else(|| Error::not_found("User"))
    }

    /// The user behind `auth`, if any, without checking bans
    pub fn resolve(&self, auth: &Auth) -> Option<UserId> {
        match auth {
            Auth::Anonymous => None,
            Auth::User(id) => self.users.contains_key(id).then(|| id.clone()),
            Auth::Token(token) => self
                .sessions
                .iter()
                .find(|s| s.token == *token)
                .map(|s| s.user.clone()),
        }
    }

    pub fn session(&self, auth: &Auth) -> Result<UserId, Error> {
        let id = self.resolve(auth).ok_or_else(unauthorized)?;
        if self.users[&id].is_banned {
            return Err(forbidden("Your account is banned"));
        }
        Ok(id)
    }

    pub fn staff(&self, auth: &Auth) -> Result<UserId, Error> {
        let id = self.session(auth)?;
        match self.users[&id].role.is_staff() {
            true => Ok(id),
            false => Err(forbidden("Moderator access required")),
        }
    }

    pub fn admin(&self, auth: &Auth) -> Result<UserId, Error> {
        let id = self.session(auth)?;
        match self.users[&id].role {
            Role::Admin => Ok(id),
            _ => Err(forbidden("Admin access required")),
        }
    }

    pub fn summary(&self, id: &UserId) -> UserSummary {
        let u = &self.users[id];
        UserSummary {
            id: id.clone(),
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            avatar_url: u.avatar_url.clone(),
        }
    }

    pub fn uploader(&self, id: &UserId) -> VideoUploader {
        let s = self.summary(id);
        VideoUploader {
            id: Some(s.id),
            username: s.username,
            display_name: s.display_name,
            avatar_url: s.avatar_url,
        }
    }

    pub fn public_user(&self, id: &UserId, viewer: Option<&UserId>) -> PublicUser {
        let u = &self.users[id];
        PublicUser {
            id: id.clone(),
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            avatar_url: u.avatar_url.clone(),
            banner_url: None,
            bio: None,
            follower_count: self.followers_of(id).len() as u64,
            following_count: u.following.len() as u64,
            video_count: self.videos.values().filter(|v| v.owner == *id).count() as u64,
            created_at: u.created_at,
            is_following: viewer
                .and_then(|v| self.users.get(v))
                .map(|v| v.following.contains(id)),
        }
    }

    pub fn admin_user(&self, id: &UserId) -> AdminUser {
        let u = &self.users[id];
        let public = self.public_user(id, None);
        let views = self
            .videos
            .values()
            .filter(|v| v.owner == *id)
            .map(|v| v.views)
            .sum::<u64>();
        AdminUser {
            id: id.clone(),
            email: u.email.clone(),
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            role: u.role,
            is_active: true,
            is_verified: false,
            is_banned: u.is_banned,
            ban_reason_public: u.ban_reason_public.clone(),
            created_at: u.created_at,
            follower_count: Some(public.follower_count),
            following_count: Some(public.following_count),
            video_count: Some(public.video_count),
            total_views: Some(views.to_string()),
        }
    }

    /// Followers of `id`, sorted by username
    pub fn followers_of(&self, id: &UserId) -> Vec<UserId> {
        let mut res = self
            .users
            .iter()
            .filter(|(_, u)| u.following.contains(id))
            .map(|(f, _)| f.clone())
            .collect::<Vec<_>>();
        res.sort_by(|a, b| self.users[a].username.cmp(&self.users[b].username));
        res
    }

    /// Users `id` follows, sorted by username
    pub fn following_of(&self, id: &UserId) -> Vec<UserId> {
        let mut res = self.users[id].following.iter().cloned().collect::<Vec<_>>();
        res.sort_by(|a, b| self.users[a].username.cmp(&self.users[b].username));
        res
    }

    /// Whether the video shows up in public listings
    pub fn is_listed(&self, v: &DbVideo) -> bool {
        v.visibility == Visibility::Public
            && v.moderation == ModerationStatus::Approved
            && v.processing == ProcessingStatus::Done
    }

    /// Whether `viewer` may open the video directly
    pub fn can_open(&self, v: &DbVideo, viewer: Option<&UserId>) -> bool {
        if v.visibility != Visibility::Private {
            return true;
        }
        viewer.map_or(false, |viewer| {
            *viewer == v.owner
                || self
                    .users
                    .get(viewer)
                    .map_or(false, |u| u.role.is_staff())
        })
    }

    /// Ids of the videos matching `filter`, newest first
    pub fn videos_newest_first<F>(&self, filter: F) -> Vec<VideoId>
    where
        F: Fn(&DbVideo) -> bool,
    {
        let mut res = self
            .videos
            .iter()
            .filter(|(_, v)| filter(v))
            .map(|(id, v)| (v.created_at, id.clone()))
            .collect::<Vec<_>>();
        res.sort_unstable_by(|a, b| b.cmp(a));
        res.into_iter().map(|(_, id)| id).collect()
    }

    /// Serializes comment `id`, embedding up to `embed[0]` replies, each embedding up to
    /// `embed[1]` replies, and so on
    pub fn render(&self, id: &CommentId, viewer: Option<&UserId>, embed: &[u32]) -> Comment {
        let c = &self.comments[id];
        let replies = match embed.split_first() {
            Some((&n, rest)) => c
                .replies
                .iter()
                .take(n as usize)
                .map(|r| self.render(r, viewer, rest))
                .collect(),
            None => Vec::new(),
        };
        let mut user = self.summary(&c.author);
        if self.omit_comment_avatars {
            user.avatar_url = None;
        }
        Comment {
            id: id.clone(),
            content: c.content.clone(),
            created_at: c.created_at,
            updated_at: c.created_at,
            like_count: c.likes.len() as u64,
            liked_by_me: viewer.map(|v| c.likes.contains(v)).unwrap_or(false),
            user,
            count: Some(CommentCount {
                replies: c.replies.len() as u64,
            }),
            replies,
        }
    }

    pub fn insert_comment(
        &mut self,
        video: &VideoId,
        author: UserId,
        parent: Option<&CommentId>,
        content: &str,
    ) -> Result<CommentId, Error> {
        if !self.videos.contains_key(video) {
            return Err(Error::not_found("Video"));
        }
        if let Some(parent) = parent {
            match self.comments.get(parent) {
                Some(p) if p.video == *video => (),
                _ => return Err(Error::not_found("Parent comment")),
            }
        }
        let id = CommentId(self.fresh_id("c"));
        let created_at = self.now();
        self.comments.insert(
            id.clone(),
            DbComment {
                video: video.clone(),
                parent: parent.cloned(),
                author,
                content: String::from(content),
                created_at,
                likes: HashSet::new(),
                replies: Vec::new(),
            },
        );
        if let Some(p) = parent.and_then(|p| self.comments.get_mut(p)) {
            p.replies.push(id.clone());
        }
        Ok(id)
    }

    pub fn auth_response(&mut self, id: &UserId) -> AuthResponse {
        let token = AuthToken(self.fresh_id("session-"));
        let session_id = self.fresh_id("s");
        let created_at = self.now();
        let expires_at = created_at + Duration::days(30);
        self.sessions.push(DbSession {
            id: session_id.clone(),
            token: token.clone(),
            user: id.clone(),
            created_at,
            expires_at,
        });
        let u = &self.users[id];
        AuthResponse {
            message: String::from("Logged in"),
            user: AuthUser {
                id: id.clone(),
                email: u.email.clone(),
                username: u.username.clone(),
                role: u.role,
            },
            session_key: token,
            session: Session {
                id: session_id,
                expires_at,
                device_info: None,
                ip_address: None,
            },
        }
    }
}
