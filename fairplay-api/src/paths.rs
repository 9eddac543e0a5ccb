//! Endpoint paths, relative to the API base URL.
//!
//! Path segments are escaped the way `encodeURIComponent` does, and query parameters are
//! emitted in a fixed order, so that the same request always maps to the same string.

use std::fmt::Write;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{AdminUsersQuery, CommentId, CommentsQuery, ModerationQuery, UserId, VideoId};

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_REGISTER: &str = "/auth/register";
pub const AUTH_ME: &str = "/auth/me";
pub const AUTH_SESSIONS: &str = "/auth/sessions";
pub const AUTH_SESSIONS_ALL: &str = "/auth/sessions/all";
pub const AUTH_SESSIONS_OTHERS: &str = "/auth/sessions/others/all";

fn segment(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Appends the set parameters to `path`, in the order given
fn with_query<I>(mut path: String, params: I) -> String
where
    I: IntoIterator<Item = (&'static str, Option<String>)>,
{
    let mut sep = '?';
    for (name, value) in params {
        if let Some(value) = value {
            write!(path, "{sep}{name}={}", segment(&value)).expect("writing to a string");
            sep = '&';
        }
    }
    path
}

/// Zero counts as unset, like an absent parameter
fn number(n: Option<u32>) -> Option<String> {
    n.filter(|n| *n != 0).map(|n| n.to_string())
}

fn page_query(path: String, page: u32, limit: u32) -> String {
    with_query(
        path,
        [
            ("page", Some(page.to_string())),
            ("limit", Some(limit.to_string())),
        ],
    )
}

pub fn videos(page: u32, limit: u32) -> String {
    page_query(String::from("/videos"), page, limit)
}

/// The logged-in user's own videos
pub fn my_videos(page: u32, limit: u32) -> String {
    page_query(String::from("/videos/my"), page, limit)
}

pub fn video(id: &VideoId) -> String {
    format!("/videos/{}", segment(&id.0))
}

/// Target of `POST` for new comments and replies
pub fn video_comments(id: &VideoId) -> String {
    format!("/videos/{}/comments", segment(&id.0))
}

pub fn video_comments_query(id: &VideoId, q: &CommentsQuery) -> String {
    with_query(
        video_comments(id),
        [
            ("page", number(q.page)),
            ("limit", number(q.limit)),
            ("repliesLimit", number(q.replies_limit)),
            ("childRepliesLimit", number(q.child_replies_limit)),
        ],
    )
}

pub fn comment_like(id: &CommentId) -> String {
    format!("/comments/{}/like", segment(&id.0))
}

pub fn comment_replies(id: &CommentId, page: u32, limit: u32) -> String {
    page_query(format!("/comments/{}/replies", segment(&id.0)), page, limit)
}

pub fn user(id_or_username: &str) -> String {
    format!("/user/{}", segment(id_or_username))
}

pub fn user_follow(id_or_username: &str) -> String {
    format!("/user/{}/follow", segment(id_or_username))
}

pub fn user_videos(id_or_username: &str, page: u32, limit: u32) -> String {
    page_query(format!("/user/{}/videos", segment(id_or_username)), page, limit)
}

pub fn user_followers(id_or_username: &str, page: u32, limit: u32) -> String {
    page_query(format!("/user/{}/followers", segment(id_or_username)), page, limit)
}

pub fn user_following(id_or_username: &str, page: u32, limit: u32) -> String {
    page_query(format!("/user/{}/following", segment(id_or_username)), page, limit)
}

pub fn moderator_videos(q: &ModerationQuery) -> String {
    with_query(
        String::from("/moderator/videos"),
        [
            ("page", number(q.page)),
            ("limit", number(q.limit)),
            ("processingStatus", q.processing_status.map(|s| s.to_string())),
            ("moderationStatus", q.moderation_status.map(|s| s.to_string())),
            ("visibility", q.visibility.map(|v| v.to_string())),
            ("userId", q.user_id.as_ref().map(|u| u.0.clone())),
            ("search", q.search.clone().filter(|s| !s.is_empty())),
            ("sort", q.sort.clone().filter(|s| !s.is_empty())),
        ],
    )
}

/// Target of `PATCH` for approving or rejecting a video
pub fn moderator_video_moderation(id: &VideoId) -> String {
    format!("/moderator/videos/{}/moderation", segment(&id.0))
}

pub fn admin_users(q: &AdminUsersQuery) -> String {
    with_query(
        String::from("/admin/users"),
        [
            ("search", q.search.clone().filter(|s| !s.is_empty())),
            ("isBanned", q.is_banned.map(|b| b.to_string())),
            ("page", number(q.page)),
            ("limit", number(q.limit)),
            ("sort", q.sort.clone().filter(|s| !s.is_empty())),
        ],
    )
}

pub fn admin_user(id: &UserId) -> String {
    format!("/admin/users/{}", segment(&id.0))
}

pub fn admin_user_role(id: &UserId) -> String {
    format!("{}/role", admin_user(id))
}

pub fn admin_user_ban(id: &UserId) -> String {
    format!("{}/ban", admin_user(id))
}

pub fn auth_session(id: &str) -> String {
    format!("{AUTH_SESSIONS}/{}", segment(id))
}
