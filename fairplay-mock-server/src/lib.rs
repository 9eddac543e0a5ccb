use std::sync::Arc;

use fairplay_api::{
    paths, AuthToken, CommentId, Error, LikeResponse, ModerationStatus, ProcessingStatus, Role,
    UserId, VideoId, Visibility,
};
use parking_lot::Mutex;

mod api;
mod db;

use db::{bad_request, Auth, Db, DbVideo};

/// In-memory stand-in for the FairPlay API.
///
/// Clones share the same data. Each clone acts on behalf of one session, chosen with
/// `as_user`, `anonymous` or `with_token`.
#[derive(Clone)]
pub struct MockServer {
    db: Arc<Mutex<Db>>,
    auth: Auth,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            db: Arc::new(Mutex::new(Db::new())),
            auth: Auth::Anonymous,
        }
    }

    fn expect_user(&self, username: &str) -> UserId {
        self.db
            .lock()
            .user_id(username)
            .unwrap_or_else(|| panic!("no mock user named {username}"))
    }

    /// A handle to the same data, acting as `username`
    pub fn as_user(&self, username: &str) -> MockServer {
        MockServer {
            db: self.db.clone(),
            auth: Auth::User(self.expect_user(username)),
        }
    }

    /// A handle to the same data, without a session
    pub fn anonymous(&self) -> MockServer {
        MockServer {
            db: self.db.clone(),
            auth: Auth::Anonymous,
        }
    }

    /// A handle to the same data, acting as whoever `token` was issued to for as long as
    /// that session lives
    pub fn with_token(&self, token: &AuthToken) -> MockServer {
        MockServer {
            db: self.db.clone(),
            auth: Auth::Token(token.clone()),
        }
    }

    pub fn test_add_user(
        &self,
        username: &str,
        password: &str,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> UserId {
        let mut db = self.db.lock();
        let id = db.add_user(&format!("{username}@fairplay.test"), username, password);
        let u = db.users.get_mut(&id).expect("user was just added");
        u.display_name = display_name.map(String::from);
        u.avatar_url = avatar_url.map(String::from);
        id
    }

    pub fn test_set_profile(&self, username: &str, display_name: &str, avatar_url: &str) {
        let id = self.expect_user(username);
        let mut db = self.db.lock();
        let u = db.users.get_mut(&id).expect("user was just found");
        u.display_name = Some(String::from(display_name));
        u.avatar_url = Some(String::from(avatar_url));
    }

    pub fn test_set_role(&self, username: &str, role: Role) {
        let id = self.expect_user(username);
        self.db.lock().users.get_mut(&id).expect("user was just found").role = role;
    }

    /// Public and private ban reasons of `username`
    pub fn test_ban_reasons(&self, username: &str) -> (Option<String>, Option<String>) {
        let id = self.expect_user(username);
        let db = self.db.lock();
        let u = &db.users[&id];
        (u.ban_reason_public.clone(), u.ban_reason_private.clone())
    }

    /// Adds a public, processed and approved video
    pub fn test_add_video(&self, owner: &str, title: &str) -> VideoId {
        let owner = self.expect_user(owner);
        let mut db = self.db.lock();
        let id = VideoId(db.fresh_id("v"));
        let created_at = db.now();
        db.videos.insert(
            id.clone(),
            DbVideo {
                owner,
                title: String::from(title),
                description: None,
                visibility: Visibility::Public,
                processing: ProcessingStatus::Done,
                moderation: ModerationStatus::Approved,
                created_at,
                views: 0,
            },
        );
        id
    }

    pub fn test_set_moderation(&self, video: &VideoId, status: ModerationStatus) {
        self.db
            .lock()
            .videos
            .get_mut(video)
            .unwrap_or_else(|| panic!("no mock video {video}"))
            .moderation = status;
    }

    pub fn test_set_visibility(&self, video: &VideoId, visibility: Visibility) {
        self.db
            .lock()
            .videos
            .get_mut(video)
            .unwrap_or_else(|| panic!("no mock video {video}"))
            .visibility = visibility;
    }

    /// Adds a comment directly, bypassing the request log and failure injection
    pub fn test_add_comment(
        &self,
        video: &VideoId,
        author: &str,
        parent: Option<&CommentId>,
        content: &str,
    ) -> CommentId {
        let author = self.expect_user(author);
        self.db
            .lock()
            .insert_comment(video, author, parent, content)
            .unwrap_or_else(|e| panic!("adding mock comment: {e}"))
    }

    /// Makes the next `n` requests fail with a network error
    pub fn test_fail_next(&self, n: usize) {
        self.db.lock().fail_next = n;
    }

    /// Leaves author avatars out of listed and paged comments, as some listings do
    pub fn test_omit_comment_avatars(&self, omit: bool) {
        self.db.lock().omit_comment_avatars = omit;
    }

    /// Paths of the requests received so far, in order
    pub fn test_requests(&self) -> Vec<String> {
        self.db.lock().requests.clone()
    }

    pub fn test_like_count(&self, comment: &CommentId) -> usize {
        self.db.lock().comments[comment].likes.len()
    }

    pub fn test_num_comments(&self, video: &VideoId) -> usize {
        self.db
            .lock()
            .comments
            .values()
            .filter(|c| c.video == *video)
            .count()
    }

    fn set_like(&self, comment: &CommentId, liked: bool) -> Result<LikeResponse, Error> {
        let mut db = self.db.lock();
        let method = if liked { "POST" } else { "DELETE" };
        db.receive(method, paths::comment_like(comment))?;
        let user = db.session(&self.auth)?;
        let c = db
            .comments
            .get_mut(comment)
            .ok_or_else(|| Error::not_found("Comment"))?;
        let message = match liked {
            true => {
                c.likes.insert(user);
                "Comment liked"
            }
            false => {
                c.likes.remove(&user);
                "Comment unliked"
            }
        };
        Ok(LikeResponse {
            message: String::from(message),
            like_count: c.likes.len() as u64,
        })
    }

    fn set_follow(&self, id_or_username: &str, follow: bool) -> Result<(), Error> {
        let mut db = self.db.lock();
        let method = if follow { "POST" } else { "DELETE" };
        db.receive(method, paths::user_follow(id_or_username))?;
        let user = db.session(&self.auth)?;
        let target = db.existing_user(id_or_username)?;
        if target == user {
            return Err(bad_request("You cannot follow yourself"));
        }
        let following = &mut db
            .users
            .get_mut(&user)
            .expect("session user exists")
            .following;
        match follow {
            true => following.insert(target),
            false => following.remove(&target),
        };
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

#[cfg(test)]
mod tests {
    use fairplay_api::{
        AdminUsersQuery, Api, BanUpdate, CommentsQuery, LoginBody, ModerationAction,
        ModerationQuery, NewComment, VideoUpdate,
    };

    use super::*;

    fn setup() -> (MockServer, VideoId) {
        let server = MockServer::new();
        server.test_add_user("ada", "pw", Some("Ada"), Some("/avatars/ada.png"));
        server.test_add_user("bob", "pw", None, None);
        let video = server.test_add_video("ada", "Intro");
        (server, video)
    }

    #[tokio::test]
    async fn lists_newest_first_with_embedded_replies() {
        let (server, video) = setup();
        let first = server.test_add_comment(&video, "ada", None, "first");
        let second = server.test_add_comment(&video, "bob", None, "second");
        for i in 0..3 {
            server.test_add_comment(&video, "bob", Some(&first), &format!("reply {i}"));
        }
        let page = server
            .video_comments(
                &video,
                &CommentsQuery {
                    replies_limit: Some(2),
                    ..CommentsQuery::default()
                },
            )
            .await
            .expect("listing comments");
        let ids = page.comments.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(page.comments[1].reply_count(), 3);
        assert_eq!(page.comments[1].replies.len(), 2);
        assert_eq!(page.comments[1].replies[0].content, "reply 0");
        assert_eq!(page.pagination.total_items, 2);
    }

    #[tokio::test]
    async fn replies_are_paginated() {
        let (server, video) = setup();
        let parent = server.test_add_comment(&video, "ada", None, "parent");
        for i in 0..3 {
            server.test_add_comment(&video, "bob", Some(&parent), &format!("reply {i}"));
        }
        let p1 = server.comment_replies(&parent, 1, 2).await.unwrap();
        let p2 = server.comment_replies(&parent, 2, 2).await.unwrap();
        let p3 = server.comment_replies(&parent, 3, 2).await.unwrap();
        assert_eq!(p1.replies.len(), 2);
        assert_eq!(p2.replies.len(), 1);
        assert_eq!(p2.replies[0].content, "reply 2");
        assert!(p3.replies.is_empty());
        assert_eq!(p1.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn writes_need_a_session() {
        let (server, video) = setup();
        let c = server.test_add_comment(&video, "ada", None, "hi");
        let body = NewComment::top_level("hello").unwrap();
        assert!(server
            .anonymous()
            .add_comment(&video, &body)
            .await
            .unwrap_err()
            .is_unauthorized());
        assert!(server.like_comment(&c).await.unwrap_err().is_unauthorized());

        let bob = server.as_user("bob");
        assert_eq!(bob.like_comment(&c).await.unwrap().like_count, 1);
        assert_eq!(bob.like_comment(&c).await.unwrap().like_count, 1);
        assert_eq!(bob.unlike_comment(&c).await.unwrap().like_count, 0);
        let created = bob.add_comment(&video, &body).await.unwrap();
        assert_eq!(created.comment.user.username, "bob");
        assert_eq!(created.comment.user.avatar_url, None);
    }

    #[tokio::test]
    async fn login_and_follow() {
        let (server, _) = setup();
        let res = server
            .login(&LoginBody {
                email_or_username: String::from("bob@fairplay.test"),
                password: String::from("pw"),
            })
            .await
            .expect("logging in");
        let bob = server.with_token(&res.session_key);
        assert_eq!(bob.me().await.unwrap().username, "bob");

        bob.follow_user("ada").await.expect("following");
        let ada = bob.user("ada").await.unwrap();
        assert_eq!((ada.follower_count, ada.is_following), (1, Some(true)));
        assert_eq!(server.anonymous().user("ada").await.unwrap().is_following, None);
        assert!(bob.follow_user("bob").await.is_err());

        let bad = server
            .login(&LoginBody {
                email_or_username: String::from("bob"),
                password: String::from("nope"),
            })
            .await;
        assert!(bad.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn failure_injection_is_logged() {
        let (server, video) = setup();
        server.test_fail_next(1);
        assert_eq!(
            server.video(&video).await.unwrap_err(),
            Error::Network(String::from("injected failure"))
        );
        assert_eq!(server.video(&video).await.unwrap().title, "Intro");
        let path = format!("GET {}", paths::video(&video));
        assert_eq!(server.test_requests(), vec![path.clone(), path]);
    }

    async fn login(server: &MockServer, username: &str) -> (MockServer, AuthToken) {
        let res = server
            .login(&LoginBody {
                email_or_username: String::from(username),
                password: String::from("pw"),
            })
            .await
            .expect("logging in");
        (server.with_token(&res.session_key), res.session_key)
    }

    #[tokio::test]
    async fn listings_only_show_published_videos() {
        let (server, intro) = setup();
        let draft = server.test_add_video("ada", "Draft");
        let private = server.test_add_video("ada", "Private");
        let later = server.test_add_video("bob", "Later");
        server.test_set_moderation(&draft, ModerationStatus::Pending);
        server.test_set_visibility(&private, Visibility::Private);

        let listed = server.anonymous().videos(1, 20).await.unwrap();
        let titles = listed.videos.iter().map(|v| v.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Later", "Intro"]);
        assert_eq!(listed.pagination.total_items, 2);

        let ada_videos = server.anonymous().user_videos("ada", 1, 20).await.unwrap();
        assert_eq!(ada_videos.videos.len(), 1);
        assert_eq!(ada_videos.videos[0].id, intro);

        let mine = server.as_user("ada").my_videos(1, 2).await.unwrap();
        assert_eq!(mine.videos.len(), 2);
        assert_eq!(mine.pagination.total_items, 3);
        assert!(server.anonymous().my_videos(1, 20).await.unwrap_err().is_unauthorized());

        assert_eq!(server.anonymous().video(&private).await.unwrap_err().status_code(), Some(404));
        assert_eq!(server.as_user("ada").video(&private).await.unwrap().title, "Private");
        assert_eq!(server.anonymous().video(&later).await.unwrap().title, "Later");
    }

    #[tokio::test]
    async fn only_owner_edits_a_video() {
        let (server, video) = setup();
        let edit = VideoUpdate::new(Some("Intro, again"), Some("Now with sound"), None);
        let err = server.as_user("bob").update_video(&video, &edit).await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));

        let res = server.as_user("ada").update_video(&video, &edit).await.unwrap();
        assert_eq!(res.video.title, "Intro, again");
        assert_eq!(res.video.description.as_deref(), Some("Now with sound"));

        let blank = VideoUpdate {
            title: Some(String::from("  ")),
            ..VideoUpdate::default()
        };
        let err = server.as_user("ada").update_video(&video, &blank).await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(server.video(&video).await.unwrap().title, "Intro, again");
    }

    #[tokio::test]
    async fn moderators_work_the_pending_queue() {
        let (server, _) = setup();
        let first = server.test_add_video("bob", "First upload");
        let second = server.test_add_video("bob", "Second upload");
        server.test_set_moderation(&first, ModerationStatus::Pending);
        server.test_set_moderation(&second, ModerationStatus::Pending);
        server.test_set_role("ada", Role::Moderator);

        let bob = server.as_user("bob");
        let err = bob.moderator_videos(&ModerationQuery::pending()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));

        let ada = server.as_user("ada");
        let queue = ada.moderator_videos(&ModerationQuery::pending()).await.unwrap();
        let ids = queue.videos.iter().map(|v| v.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![first.clone(), second.clone()]);

        let searched = ada
            .moderator_videos(&ModerationQuery {
                search: Some(String::from("SECOND")),
                ..ModerationQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.videos.len(), 1);
        assert_eq!(searched.videos[0].id, second);

        let res = ada.moderate_video(&first, ModerationAction::Approve).await.unwrap();
        assert_eq!(res.video.moderation_status, ModerationStatus::Approved);
        let queue = ada.moderator_videos(&ModerationQuery::pending()).await.unwrap();
        assert_eq!(queue.pagination.total_items, 1);
        assert!(server.videos(1, 20).await.unwrap().videos.iter().any(|v| v.id == first));
    }

    #[tokio::test]
    async fn admins_set_roles_and_bans() {
        let (server, _) = setup();
        let ada_id = server.expect_user("ada");
        let bob_id = server.expect_user("bob");
        server.test_set_role("ada", Role::Admin);
        let ada = server.as_user("ada");
        let (bob, _) = login(&server, "bob").await;

        let err = bob.admin_users(&AdminUsersQuery::default()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        let err = ada.set_user_role(&ada_id, Role::User).await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));

        let res = ada.set_user_role(&bob_id, Role::Moderator).await.unwrap();
        assert_eq!(res.user.role, Role::Moderator);

        let ban = BanUpdate::ban(Some(String::from("spam")), Some(String::from("bot farm")));
        let res = ada.set_user_ban(&bob_id, &ban).await.unwrap();
        assert!(res.user.is_banned);
        assert_eq!(res.user.ban_reason_public.as_deref(), Some("spam"));
        assert_eq!(
            server.test_ban_reasons("bob"),
            (Some(String::from("spam")), Some(String::from("bot farm")))
        );
        // the ban ends bob's sessions, and a banned user cannot log back in
        assert!(bob.me().await.unwrap_err().is_unauthorized());
        let relog = server
            .login(&LoginBody {
                email_or_username: String::from("bob"),
                password: String::from("pw"),
            })
            .await;
        assert_eq!(relog.unwrap_err().status_code(), Some(403));

        let banned = ada
            .admin_users(&AdminUsersQuery {
                is_banned: Some(true),
                ..AdminUsersQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(banned.users.len(), 1);
        assert_eq!(banned.users[0].username, "bob");

        let res = ada.set_user_ban(&bob_id, &BanUpdate::unban()).await.unwrap();
        assert!(!res.user.is_banned);
        assert_eq!(server.test_ban_reasons("bob"), (None, None));
        login(&server, "bob").await;
    }

    #[tokio::test]
    async fn sessions_can_be_revoked() {
        let (server, _) = setup();
        let (phone, phone_key) = login(&server, "bob").await;
        let (laptop, _) = login(&server, "bob").await;
        let (tablet, _) = login(&server, "bob").await;
        login(&server, "ada").await;

        let list = phone.sessions().await.unwrap();
        assert_eq!(list.total, 3);
        let current = list.sessions.iter().filter(|s| s.is_current).collect::<Vec<_>>();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].session_key, phone_key);

        let laptop_id = laptop
            .sessions()
            .await
            .unwrap()
            .sessions
            .into_iter()
            .find(|s| s.is_current)
            .map(|s| s.id)
            .expect("laptop session is listed");
        phone.revoke_session(&laptop_id).await.unwrap();
        assert!(laptop.me().await.unwrap_err().is_unauthorized());
        let err = phone.revoke_session(&laptop_id).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));

        let res = phone.revoke_other_sessions().await.unwrap();
        assert_eq!(res.sessions_logged_out, 1);
        assert!(tablet.me().await.unwrap_err().is_unauthorized());
        assert_eq!(phone.me().await.unwrap().username, "bob");

        let res = phone.revoke_all_sessions().await.unwrap();
        assert_eq!(res.sessions_logged_out, 1);
        assert!(phone.me().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn followers_are_listed_by_username() {
        let (server, _) = setup();
        server.test_add_user("cy", "pw", None, None);
        server.as_user("cy").follow_user("ada").await.unwrap();
        server.as_user("bob").follow_user("ada").await.unwrap();
        server.as_user("bob").follow_user("cy").await.unwrap();

        let followers = server.followers("ada", 1, 20).await.unwrap();
        let names = followers.followers.iter().map(|u| u.username.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["bob", "cy"]);

        let following = server.following("bob", 1, 1).await.unwrap();
        assert_eq!(following.following[0].username, "ada");
        assert!(following.pagination.has_more());
        assert_eq!(server.followers("nobody", 1, 20).await.unwrap_err().status_code(), Some(404));
    }
}
