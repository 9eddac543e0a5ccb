use std::fmt;

use crate::{Pagination, Time, UserSummary};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl From<&str> for CommentId {
    fn from(id: &str) -> CommentId {
        CommentId(String::from(id))
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
    pub like_count: u64,
    #[serde(default)]
    pub liked_by_me: bool,
    pub user: UserSummary,

    /// Number of replies known to the server, whether loaded or not
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CommentCount>,

    /// The subset of replies that came along with this comment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn reply_count(&self) -> u64 {
        self.count.map(|c| c.replies).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentCount {
    pub replies: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    /// Returns None if `content` is blank
    pub fn top_level(content: &str) -> Option<NewComment> {
        Self::build(content, None)
    }

    /// Returns None if `content` is blank
    pub fn reply(content: &str, parent_id: CommentId) -> Option<NewComment> {
        Self::build(content, Some(parent_id))
    }

    fn build(content: &str, parent_id: Option<CommentId>) -> Option<NewComment> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(NewComment {
            content: String::from(content),
            parent_id,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentCreated {
    #[serde(default)]
    pub message: String,
    pub comment: Comment,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    #[serde(default)]
    pub message: String,
    pub like_count: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentsPage {
    pub comments: Vec<Comment>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RepliesPage {
    pub replies: Vec<Comment>,
    pub pagination: Pagination,
}

/// Query parameters for listing a video's comments. Unset (or zero) parameters are left to
/// the server's defaults.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CommentsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub replies_limit: Option<u32>,
    pub child_replies_limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_comment() {
        let c: Comment = serde_json::from_str(
            r#"{
                "id": "c1",
                "content": "first!",
                "createdAt": "2024-03-01T10:00:00.000Z",
                "updatedAt": "2024-03-01T10:00:00.000Z",
                "likeCount": 2,
                "user": { "id": "u1", "username": "ada", "displayName": null, "avatarUrl": null },
                "_count": { "replies": 4 },
                "replies": [{
                    "id": "c2",
                    "content": "second",
                    "createdAt": "2024-03-01T10:05:00.000Z",
                    "updatedAt": "2024-03-01T10:05:00.000Z",
                    "likeCount": 0,
                    "likedByMe": true,
                    "user": { "id": "u2", "username": "bob", "displayName": "Bob", "avatarUrl": "/a/bob.png" }
                }]
            }"#,
        )
        .expect("parsing comment");
        assert_eq!(c.id, CommentId::from("c1"));
        assert!(!c.liked_by_me);
        assert_eq!(c.reply_count(), 4);
        assert_eq!(c.user.label(), "ada");
        assert_eq!(c.replies.len(), 1);
        assert!(c.replies[0].liked_by_me);
        assert_eq!(c.replies[0].reply_count(), 0);
        assert_eq!(c.replies[0].user.label(), "Bob");
    }

    #[test]
    fn new_comment_is_trimmed() {
        assert_eq!(NewComment::top_level("   \n"), None);
        let reply = NewComment::reply("  hello ", CommentId::from("p")).unwrap();
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({ "content": "hello", "parentId": "p" })
        );
        let top = NewComment::top_level("hi").unwrap();
        assert_eq!(
            serde_json::to_value(&top).unwrap(),
            serde_json::json!({ "content": "hi" })
        );
    }
}
