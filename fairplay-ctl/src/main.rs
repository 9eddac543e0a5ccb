use std::path::PathBuf;

use anyhow::Context;
use fairplay_client::{
    api::{
        AdminUsersQuery, Api, AuthToken, BanUpdate, CommentId, CommentsQuery, LoginBody,
        ModerationAction, ModerationQuery, ModerationStatus, RegisterBody, Role, UserId,
        VideoId, VideoUpdate, Viewer, Visibility,
    },
    CommentThread, FollowState, HttpApi, ThreadConfig, TokenStore,
};

mod render;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base URL of the API
    #[structopt(short, long, env = "FAIRPLAY_HOST", default_value = "http://localhost:3000")]
    host: String,

    /// File the session key is kept in between runs
    #[structopt(long, parse(from_os_str))]
    session_file: Option<PathBuf>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
struct Paging {
    #[structopt(long, default_value = "1")]
    page: u32,

    #[structopt(long, default_value = "20")]
    limit: u32,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Log in and save the session key
    Login {
        /// Email or username
        user: String,

        password: String,
    },

    /// Create an account and save the session key
    Register {
        email: String,
        username: String,
        password: String,
    },

    /// Forget the saved session key
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Print the comments of a video
    Thread {
        video: String,

        /// How many times to load more replies of each comment that has some left
        #[structopt(long, default_value = "0")]
        expand: usize,

        /// Page size when loading more replies
        #[structopt(long, default_value = "10")]
        replies_limit: u32,
    },

    /// Post a top-level comment
    Comment { video: String, content: String },

    /// Reply to a comment
    Reply {
        video: String,
        parent: String,
        content: String,
    },

    /// Like a comment, or unlike it if it was already liked
    Like { video: String, comment: String },

    /// Follow a user, or unfollow them if they were already followed
    Follow { user: String },

    /// List published videos, newest first
    Videos {
        #[structopt(flatten)]
        paging: Paging,
    },

    /// List the logged-in user's videos, published or not
    MyVideos {
        #[structopt(flatten)]
        paging: Paging,
    },

    /// List the published videos of a user
    UserVideos {
        user: String,

        #[structopt(flatten)]
        paging: Paging,
    },

    Followers {
        user: String,

        #[structopt(flatten)]
        paging: Paging,
    },

    Following {
        user: String,

        #[structopt(flatten)]
        paging: Paging,
    },

    /// Change the title, description or visibility of one of your videos
    EditVideo {
        video: String,

        #[structopt(long)]
        title: Option<String>,

        #[structopt(long)]
        description: Option<String>,

        /// public, unlisted or private
        #[structopt(long)]
        visibility: Option<Visibility>,
    },

    /// List videos awaiting moderation, oldest first
    ModQueue {
        /// Moderation status to list instead of pending
        #[structopt(long)]
        status: Option<ModerationStatus>,

        #[structopt(long)]
        search: Option<String>,

        #[structopt(flatten)]
        paging: Paging,
    },

    /// Approve or reject a video
    Moderate {
        video: String,
        action: ModerationAction,
    },

    /// List user accounts
    AdminUsers {
        #[structopt(long)]
        search: Option<String>,

        /// Only list banned users
        #[structopt(long)]
        banned: bool,

        #[structopt(flatten)]
        paging: Paging,
    },

    SetRole { user_id: String, role: Role },

    Ban {
        user_id: String,

        /// Shown to the banned user
        #[structopt(long)]
        reason: Option<String>,

        /// Only visible to staff
        #[structopt(long)]
        private_reason: Option<String>,
    },

    Unban { user_id: String },

    /// List the logged-in user's sessions
    Sessions,

    RevokeSession { session: String },

    /// Log out every session, or every other session with --others
    RevokeSessions {
        #[structopt(long)]
        others: bool,
    },
}

fn token_store(session_file: Option<PathBuf>) -> anyhow::Result<TokenStore> {
    if let Ok(tok) = std::env::var("FAIRPLAY_TOKEN") {
        return Ok(TokenStore::in_memory(Some(AuthToken(tok))));
    }
    match session_file {
        Some(file) => TokenStore::from_file(file.clone())
            .with_context(|| format!("reading session file {file:?}")),
        None => Ok(TokenStore::in_memory(None)),
    }
}

/// The logged-in user, or None if there is no session key or the server rejects it
async fn viewer(api: &HttpApi) -> anyhow::Result<Option<Viewer>> {
    if api.tokens().get().is_none() {
        return Ok(None);
    }
    match api.me().await {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_unauthorized() => {
            tracing::warn!("session key was rejected, continuing logged out");
            Ok(None)
        }
        Err(e) => Err(e).context("fetching logged-in user"),
    }
}

/// Loads the thread with embedded replies, so that replies can be targeted too
async fn thread_with_replies<A>(
    api: &A,
    viewer: Option<&Viewer>,
    video: &str,
) -> anyhow::Result<CommentThread>
where
    A: Api + ?Sized,
{
    let config = ThreadConfig {
        comments: CommentsQuery {
            replies_limit: Some(50),
            child_replies_limit: Some(50),
            ..CommentsQuery::default()
        },
        ..ThreadConfig::default()
    };
    CommentThread::load(api, viewer, VideoId::from(video), config)
        .await
        .with_context(|| format!("loading comments of video {video}"))
}

/// Loads more replies until `id` is in the thread or no comment has any left to load
async fn find_comment<A>(
    api: &A,
    viewer: Option<&Viewer>,
    thread: &mut CommentThread,
    id: &CommentId,
) -> anyhow::Result<()>
where
    A: Api + ?Sized,
{
    while !thread.forest().contains(id) {
        let targets = thread
            .forest()
            .iter()
            .filter(|n| n.has_more_replies())
            .map(|n| n.id.clone())
            .collect::<Vec<_>>();
        if targets.is_empty() {
            break;
        }
        let cursors = thread.cursors().clone();
        for target in targets {
            thread
                .load_more_replies(api, viewer, &target)
                .await
                .with_context(|| format!("loading replies of comment {target}"))?;
        }
        // every page came back empty
        if *thread.cursors() == cursors {
            break;
        }
    }
    require_comment(thread, id)
}

fn require_comment(thread: &CommentThread, id: &CommentId) -> anyhow::Result<()> {
    if !thread.forest().contains(id) {
        anyhow::bail!("comment {id} is not in the thread of video {}", thread.video());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let api = HttpApi::new(&opt.host, token_store(opt.session_file)?);

    match opt.cmd {
        Command::Login { user, password } => {
            let res = api
                .login(&LoginBody {
                    email_or_username: user,
                    password,
                })
                .await
                .context("logging in")?;
            println!("Logged in as @{}", res.user.username);
        }
        Command::Register {
            email,
            username,
            password,
        } => {
            let res = api
                .register(&RegisterBody {
                    email,
                    username,
                    password,
                })
                .await
                .context("registering")?;
            println!("Registered as @{}", res.user.username);
        }
        Command::Logout => {
            api.logout().context("removing session key")?;
        }
        Command::Whoami => match viewer(&api).await? {
            Some(v) => println!(
                "{} • @{} ({})",
                v.display_name.as_deref().unwrap_or(&v.username),
                v.username,
                v.email
            ),
            None => println!("Not logged in"),
        },
        Command::Thread {
            video,
            expand,
            replies_limit,
        } => {
            let viewer = viewer(&api).await?;
            let config = ThreadConfig {
                replies_limit,
                ..ThreadConfig::default()
            };
            let details = api
                .video(&VideoId::from(&*video))
                .await
                .with_context(|| format!("fetching video {video}"))?;
            let mut thread =
                CommentThread::load(&api, viewer.as_ref(), details.id.clone(), config)
                    .await
                    .with_context(|| format!("loading comments of video {video}"))?;
            for _ in 0..expand {
                let targets = thread
                    .forest()
                    .iter()
                    .filter(|n| n.has_more_replies())
                    .map(|n| n.id.clone())
                    .collect::<Vec<_>>();
                for id in targets {
                    thread
                        .load_more_replies(&api, viewer.as_ref(), &id)
                        .await
                        .with_context(|| format!("loading replies of comment {id}"))?;
                }
            }
            thread.resolve_profiles(&api).await;
            println!("{}\n", details.title);
            print!("{}", render::thread(thread.forest()));
        }
        Command::Comment { video, content } => {
            let viewer = viewer(&api).await?;
            let mut thread = CommentThread::new(VideoId::from(&*video), ThreadConfig::default());
            let id = thread
                .post_top_level(&api, viewer.as_ref(), &content)
                .await
                .context("posting comment")?;
            println!("Posted comment {id}");
        }
        Command::Reply {
            video,
            parent,
            content,
        } => {
            let viewer = viewer(&api).await?;
            let mut thread = thread_with_replies(&api, viewer.as_ref(), &video).await?;
            let parent = CommentId(parent);
            find_comment(&api, viewer.as_ref(), &mut thread, &parent).await?;
            let id = thread
                .post_reply(&api, viewer.as_ref(), &parent, &content)
                .await
                .context("posting reply")?;
            if let Some(id) = id {
                println!("Posted reply {id}");
            }
        }
        Command::Like { video, comment } => {
            let viewer = viewer(&api).await?;
            let mut thread = thread_with_replies(&api, viewer.as_ref(), &video).await?;
            let comment = CommentId(comment);
            find_comment(&api, viewer.as_ref(), &mut thread, &comment).await?;
            thread
                .toggle_like(&api, viewer.as_ref(), &comment)
                .await
                .context("toggling like")?;
            if let Some(n) = thread.forest().get(&comment) {
                let verb = if n.like.on { "Liked" } else { "Unliked" };
                println!("{verb} comment {comment}, now at {} likes", n.like.count);
            }
        }
        Command::Follow { user } => {
            let viewer = viewer(&api).await?;
            let mut state = FollowState::load(&api, &user)
                .await
                .with_context(|| format!("fetching profile of {user}"))?;
            state
                .toggle(&api, viewer.as_ref())
                .await
                .context("toggling follow")?;
            let verb = if state.is_following() {
                "Following"
            } else {
                "Not following"
            };
            println!(
                "{verb} @{}, who has {} followers",
                state.username(),
                state.follower_count()
            );
        }
        Command::Videos { paging } => {
            let page = api
                .videos(paging.page, paging.limit)
                .await
                .context("listing videos")?;
            print!("{}", render::videos(&page));
        }
        Command::MyVideos { paging } => {
            let page = api
                .my_videos(paging.page, paging.limit)
                .await
                .context("listing your videos")?;
            print!("{}", render::my_videos(&page));
        }
        Command::UserVideos { user, paging } => {
            let page = api
                .user_videos(&user, paging.page, paging.limit)
                .await
                .with_context(|| format!("listing videos of {user}"))?;
            print!("{}", render::user_videos(&page));
        }
        Command::Followers { user, paging } => {
            let page = api
                .followers(&user, paging.page, paging.limit)
                .await
                .with_context(|| format!("listing followers of {user}"))?;
            print!("{}", render::users(&page.followers, &page.pagination));
        }
        Command::Following { user, paging } => {
            let page = api
                .following(&user, paging.page, paging.limit)
                .await
                .with_context(|| format!("listing users followed by {user}"))?;
            print!("{}", render::users(&page.following, &page.pagination));
        }
        Command::EditVideo {
            video,
            title,
            description,
            visibility,
        } => {
            let update = VideoUpdate::new(title.as_deref(), description.as_deref(), visibility);
            if update.is_empty() {
                anyhow::bail!("nothing to change, pass --title, --description or --visibility");
            }
            let video = VideoId(video);
            let mut details = api
                .video(&video)
                .await
                .with_context(|| format!("fetching video {video}"))?;
            let res = api
                .update_video(&video, &update)
                .await
                .with_context(|| format!("editing video {video}"))?;
            details.apply(&res.video);
            println!("{}", details.title);
            if let Some(description) = &details.description {
                println!("{description}");
            }
        }
        Command::ModQueue {
            status,
            search,
            paging,
        } => {
            let mut query = ModerationQuery::pending();
            if status.is_some() {
                query.moderation_status = status;
            }
            query.search = search;
            query.page = Some(paging.page);
            query.limit = Some(paging.limit);
            let page = api
                .moderator_videos(&query)
                .await
                .context("listing moderation queue")?;
            print!("{}", render::mod_queue(&page));
        }
        Command::Moderate { video, action } => {
            let res = api
                .moderate_video(&VideoId(video), action)
                .await
                .context("moderating video")?;
            println!("{} is now {}", res.video.title, res.video.moderation_status);
        }
        Command::AdminUsers {
            search,
            banned,
            paging,
        } => {
            let query = AdminUsersQuery {
                search,
                is_banned: banned.then_some(true),
                page: Some(paging.page),
                limit: Some(paging.limit),
                sort: None,
            };
            let page = api.admin_users(&query).await.context("listing users")?;
            print!("{}", render::admin_users(&page));
        }
        Command::SetRole { user_id, role } => {
            let res = api
                .set_user_role(&UserId(user_id), role)
                .await
                .context("setting role")?;
            println!("@{} is now {}", res.user.username, res.user.role);
        }
        Command::Ban {
            user_id,
            reason,
            private_reason,
        } => {
            let res = api
                .set_user_ban(&UserId(user_id), &BanUpdate::ban(reason, private_reason))
                .await
                .context("banning user")?;
            println!("Banned @{}", res.user.username);
        }
        Command::Unban { user_id } => {
            let res = api
                .set_user_ban(&UserId(user_id), &BanUpdate::unban())
                .await
                .context("unbanning user")?;
            println!("Unbanned @{}", res.user.username);
        }
        Command::Sessions => {
            let list = api.sessions().await.context("listing sessions")?;
            print!("{}", render::sessions(&list));
        }
        Command::RevokeSession { session } => {
            api.revoke_session(&session)
                .await
                .with_context(|| format!("logging out session {session}"))?;
        }
        Command::RevokeSessions { others } => {
            let res = match others {
                true => api.revoke_other_sessions().await,
                false => api.revoke_all_sessions().await,
            }
            .context("logging out sessions")?;
            println!("Logged out {} sessions", res.sessions_logged_out);
        }
    }

    Ok(())
}
