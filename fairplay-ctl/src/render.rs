use std::fmt::Write;

use fairplay_client::{
    api::{
        AdminUsersPage, ModVideosPage, MyVideosPage, Pagination, SessionsList, UserSummary,
        UserVideosPage, VideosPage,
    },
    Forest, Node,
};

const INDENT: &str = "    ";

/// Renders the thread as indented text, one block per comment in display order
pub fn thread(forest: &Forest) -> String {
    let mut res = String::new();
    if forest.is_empty() {
        res.push_str("No comments yet\n");
        return res;
    }
    for node in forest.roots() {
        node_into(&mut res, forest, 0, node);
    }
    res
}

fn node_into(out: &mut String, forest: &Forest, depth: usize, n: &Node) {
    let indent = INDENT.repeat(depth);
    let heart = if n.like.on { '♥' } else { '♡' };
    writeln!(
        out,
        "{indent}{} • @{}  {heart} {}  [{}]",
        n.author.label(),
        n.author.username,
        n.like.count,
        n.id,
    )
    .expect("writing to a string");
    for line in n.content.lines() {
        writeln!(out, "{indent}  {line}").expect("writing to a string");
    }
    for reply in forest.replies(&n.id) {
        node_into(out, forest, depth + 1, reply);
    }
    if n.has_more_replies() {
        let more = n.reply_count - n.replies.len() as u64;
        writeln!(
            out,
            "{indent}{INDENT}… {more} more {}",
            if more == 1 { "reply" } else { "replies" },
        )
        .expect("writing to a string");
    }
}

fn footer(out: &mut String, p: &Pagination, noun: &str) {
    writeln!(
        out,
        "page {}/{}, {} {noun} in total",
        p.page,
        p.total_pages.max(1),
        p.total_items
    )
    .expect("writing to a string");
}

/// One line per listed video, newest first
pub fn videos(page: &VideosPage) -> String {
    let mut res = String::new();
    for v in page.videos.iter() {
        writeln!(
            res,
            "[{}] {} • @{}  {} views",
            v.id, v.title, v.user.username, v.view_count
        )
        .expect("writing to a string");
    }
    footer(&mut res, &page.pagination, "videos");
    res
}

pub fn my_videos(page: &MyVideosPage) -> String {
    let mut res = String::new();
    for v in page.videos.iter() {
        writeln!(
            res,
            "[{}] {}  {}, {}, {}",
            v.id, v.title, v.visibility, v.processing_status, v.moderation_status
        )
        .expect("writing to a string");
    }
    footer(&mut res, &page.pagination, "videos");
    res
}

pub fn user_videos(page: &UserVideosPage) -> String {
    let mut res = String::new();
    for v in page.videos.iter() {
        writeln!(res, "[{}] {}  {} views", v.id, v.title, v.view_count)
            .expect("writing to a string");
    }
    footer(&mut res, &page.pagination, "videos");
    res
}

/// Followers or followed users
pub fn users(users: &[UserSummary], pagination: &Pagination) -> String {
    let mut res = String::new();
    for u in users {
        writeln!(res, "{} • @{}", u.label(), u.username).expect("writing to a string");
    }
    footer(&mut res, pagination, "users");
    res
}

pub fn mod_queue(page: &ModVideosPage) -> String {
    let mut res = String::new();
    for v in page.videos.iter() {
        writeln!(
            res,
            "[{}] {} • @{}  {}, {}, {}",
            v.id,
            v.title,
            v.user.username,
            v.moderation_status,
            v.processing_status,
            v.visibility
        )
        .expect("writing to a string");
    }
    footer(&mut res, &page.pagination, "videos");
    res
}

pub fn admin_users(page: &AdminUsersPage) -> String {
    let mut res = String::new();
    for u in page.users.iter() {
        write!(res, "[{}] @{} <{}>  {}", u.id, u.username, u.email, u.role)
            .expect("writing to a string");
        if u.is_banned {
            res.push_str("  banned");
            if let Some(reason) = &u.ban_reason_public {
                write!(res, ": {reason}").expect("writing to a string");
            }
        }
        res.push('\n');
    }
    footer(&mut res, &page.pagination, "users");
    res
}

pub fn sessions(list: &SessionsList) -> String {
    let mut res = String::new();
    for s in list.sessions.iter() {
        write!(
            res,
            "[{}] {}  since {}, expires {}",
            s.id,
            s.device_info.as_deref().unwrap_or("unknown device"),
            s.created_at.format("%Y-%m-%d %H:%M"),
            s.expires_at.format("%Y-%m-%d"),
        )
        .expect("writing to a string");
        if s.is_current {
            res.push_str("  (current)");
        }
        res.push('\n');
    }
    res
}

#[cfg(test)]
mod tests {
    use fairplay_client::api::{
        AdminUser, AuthToken, Comment, CommentCount, Role, SessionInfo, UserId,
    };

    use super::*;

    fn comment(id: &str, content: &str, replies: u64, liked: bool) -> Comment {
        let at = "2024-03-01T10:00:00Z".parse().unwrap();
        Comment {
            id: id.into(),
            content: String::from(content),
            created_at: at,
            updated_at: at,
            like_count: u64::from(liked),
            liked_by_me: liked,
            user: UserSummary {
                id: UserId(String::from("u1")),
                username: String::from("ada"),
                display_name: Some(String::from("Ada")),
                avatar_url: None,
            },
            count: Some(CommentCount { replies }),
            replies: Vec::new(),
        }
    }

    #[test]
    fn renders_nested_thread() {
        let mut parent = comment("c1", "first\nsecond line", 3, true);
        parent.replies.push(comment("c2", "reply", 0, false));
        let forest = Forest::from_comments(vec![parent, comment("c3", "other", 0, false)]);
        assert_eq!(
            thread(&forest),
            "Ada • @ada  ♥ 1  [c1]\n\
             \x20 first\n\
             \x20 second line\n\
             \x20   Ada • @ada  ♡ 0  [c2]\n\
             \x20     reply\n\
             \x20   … 2 more replies\n\
             Ada • @ada  ♡ 0  [c3]\n\
             \x20 other\n"
        );
    }

    #[test]
    fn renders_empty_thread() {
        assert_eq!(thread(&Forest::new()), "No comments yet\n");
    }

    #[test]
    fn renders_banned_users() {
        let at = "2024-03-01T10:00:00Z".parse().unwrap();
        let user = |id: &str, name: &str, banned: Option<&str>| AdminUser {
            id: UserId(String::from(id)),
            email: format!("{name}@fairplay.test"),
            username: String::from(name),
            display_name: None,
            role: Role::User,
            is_active: true,
            is_verified: false,
            is_banned: banned.is_some(),
            ban_reason_public: banned.filter(|r| !r.is_empty()).map(String::from),
            created_at: at,
            follower_count: None,
            following_count: None,
            video_count: None,
            total_views: None,
        };
        let page = AdminUsersPage {
            users: vec![user("u1", "ada", None), user("u2", "bob", Some("spam"))],
            pagination: Pagination::for_page(1, 20, 2),
        };
        assert_eq!(
            admin_users(&page),
            "[u1] @ada <ada@fairplay.test>  user\n\
             [u2] @bob <bob@fairplay.test>  user  banned: spam\n\
             page 1/1, 2 users in total\n"
        );
    }

    #[test]
    fn marks_current_session() {
        let at = "2024-03-01T10:00:00Z".parse().unwrap();
        let list = SessionsList {
            sessions: vec![SessionInfo {
                id: String::from("s1"),
                session_key: AuthToken(String::from("k")),
                ip_address: None,
                device_info: Some(String::from("phone")),
                created_at: at,
                last_used_at: at,
                expires_at: at,
                is_current: true,
            }],
            total: 1,
        };
        assert_eq!(
            sessions(&list),
            "[s1] phone  since 2024-03-01 10:00, expires 2024-03-01  (current)\n"
        );
    }
}
