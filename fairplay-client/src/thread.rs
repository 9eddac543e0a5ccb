use std::collections::{BTreeSet, HashMap};

use crate::{
    api::{self, Api, CommentId, CommentsQuery, LikeResponse, NewComment, VideoId, Viewer},
    Error, Forest, Pending, ReplyCursors,
};

pub type PendingLike = Pending<CommentId>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThreadConfig {
    /// Parameters of the initial top-level comment request
    pub comments: CommentsQuery,

    /// Page size when loading more replies of a comment
    pub replies_limit: u32,
}

impl Default for ThreadConfig {
    fn default() -> ThreadConfig {
        ThreadConfig {
            comments: CommentsQuery::default(),
            replies_limit: 10,
        }
    }
}

/// The comment section of one video.
///
/// Every operation takes the thread mutably, so no two of them interleave. Dropping an
/// operation's future drops its result along with it.
#[derive(Clone, Debug)]
pub struct CommentThread {
    video: VideoId,
    config: ThreadConfig,
    forest: Forest,
    cursors: ReplyCursors,

    /// Bumped on every (re)load, so that likes begun against an older forest settle as no-ops
    generation: u64,

    /// Authors still missing an avatar after normalization
    unresolved: BTreeSet<String>,

    /// Profiles fetched by `resolve_profiles`, applied to every comment arriving afterwards
    profiles: HashMap<String, api::PublicUser>,
}

impl CommentThread {
    /// An empty thread for `video`, before anything was loaded
    pub fn new(video: VideoId, config: ThreadConfig) -> CommentThread {
        CommentThread {
            video,
            config,
            forest: Forest::new(),
            cursors: ReplyCursors::new(),
            generation: 0,
            unresolved: BTreeSet::new(),
            profiles: HashMap::new(),
        }
    }

    pub async fn load<A>(
        api: &A,
        viewer: Option<&Viewer>,
        video: VideoId,
        config: ThreadConfig,
    ) -> Result<CommentThread, Error>
    where
        A: Api + ?Sized,
    {
        let mut res = CommentThread::new(video, config);
        res.reload(api, viewer).await?;
        Ok(res)
    }

    /// Replaces the whole forest with the first page of comments. On failure, the current
    /// forest is kept as-is.
    pub async fn reload<A>(&mut self, api: &A, viewer: Option<&Viewer>) -> Result<(), Error>
    where
        A: Api + ?Sized,
    {
        let page = api
            .video_comments(&self.video, &self.config.comments)
            .await
            .map_err(Error::Load)?;
        self.unresolved.clear();
        let comments = page
            .comments
            .into_iter()
            .map(|c| self.normalize(c, viewer))
            .collect();
        self.forest = Forest::from_comments(comments);
        self.cursors.clear();
        self.generation += 1;
        tracing::info!(
            video = %self.video,
            comments = self.forest.len(),
            total = page.pagination.total_items,
            "loaded comment thread"
        );
        Ok(())
    }

    pub fn video(&self) -> &VideoId {
        &self.video
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn cursors(&self) -> &ReplyCursors {
        &self.cursors
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Usernames queued for a profile fetch by `resolve_profiles`
    pub fn unresolved_authors(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(|u| u.as_str())
    }

    /// Posts a new top-level comment and puts it first in the thread
    pub async fn post_top_level<A>(
        &mut self,
        api: &A,
        viewer: Option<&Viewer>,
        content: &str,
    ) -> Result<CommentId, Error>
    where
        A: Api + ?Sized,
    {
        let viewer = viewer.ok_or(Error::AuthRequired)?;
        let body = NewComment::top_level(content).ok_or(Error::EmptyContent)?;
        let created = api
            .add_comment(&self.video, &body)
            .await
            .map_err(Error::Submit)?;
        let comment = self.normalize(created.comment, Some(viewer));
        let id = comment.id.clone();
        if self.forest.prepend_root(comment).is_none() {
            tracing::debug!(comment = %id, "posted comment was already in thread");
        }
        Ok(id)
    }

    /// Posts a reply to `parent` and puts it first among its replies. Returns None without
    /// doing anything if `parent` is not in the thread.
    pub async fn post_reply<A>(
        &mut self,
        api: &A,
        viewer: Option<&Viewer>,
        parent: &CommentId,
        content: &str,
    ) -> Result<Option<CommentId>, Error>
    where
        A: Api + ?Sized,
    {
        let viewer = viewer.ok_or(Error::AuthRequired)?;
        let body = NewComment::reply(content, parent.clone()).ok_or(Error::EmptyContent)?;
        if !self.forest.contains(parent) {
            tracing::debug!(%parent, "not replying to comment absent from thread");
            return Ok(None);
        }
        let created = api
            .add_comment(&self.video, &body)
            .await
            .map_err(Error::Submit)?;
        let comment = self.normalize(created.comment, Some(viewer));
        Ok(self.forest.prepend_reply(parent, comment))
    }

    /// Flips the like state of `id` locally. The returned pending toggle must be settled with
    /// the result of the matching request: `like_comment` if `turns_on()`, `unlike_comment`
    /// otherwise. Returns None if `id` is not in the thread.
    pub fn begin_like(
        &mut self,
        viewer: Option<&Viewer>,
        id: &CommentId,
    ) -> Result<Option<PendingLike>, Error> {
        viewer.ok_or(Error::AuthRequired)?;
        let current = match self.forest.get(id) {
            Some(node) => node.like,
            None => {
                tracing::debug!(comment = %id, "not liking comment absent from thread");
                return Ok(None);
            }
        };
        let pending = Pending::begin(id.clone(), self.generation, current);
        let after = pending.after;
        self.forest.update(id, move |n| n.like = after);
        Ok(Some(pending))
    }

    /// Reconciles a like toggle with the server's answer. A failed request reverts the
    /// toggle and is returned as `Submit`.
    pub fn settle_like(
        &mut self,
        pending: &PendingLike,
        result: Result<LikeResponse, api::Error>,
    ) -> Result<(), Error> {
        if pending.generation != self.generation {
            tracing::debug!(comment = %pending.key, "ignoring like result from a previous load");
            return Ok(());
        }
        let current = self.forest.get(&pending.key).map(|n| n.like);
        match result {
            Ok(resp) => {
                if let Some(next) =
                    current.and_then(|cur| pending.confirmed(cur, Some(resp.like_count)))
                {
                    self.forest.update(&pending.key, move |n| n.like = next);
                }
                Ok(())
            }
            Err(err) => {
                match current.and_then(|cur| pending.reverted(cur)) {
                    Some(prev) => {
                        tracing::warn!(comment = %pending.key, %err, "like request failed, reverting");
                        self.forest.update(&pending.key, move |n| n.like = prev);
                    }
                    None => tracing::debug!(
                        comment = %pending.key,
                        %err,
                        "like request failed after a newer toggle, keeping local state"
                    ),
                }
                Err(Error::Submit(err))
            }
        }
    }

    /// Likes or unlikes `id`, optimistically
    pub async fn toggle_like<A>(
        &mut self,
        api: &A,
        viewer: Option<&Viewer>,
        id: &CommentId,
    ) -> Result<(), Error>
    where
        A: Api + ?Sized,
    {
        let pending = match self.begin_like(viewer, id)? {
            Some(p) => p,
            None => return Ok(()),
        };
        let result = match pending.turns_on() {
            true => api.like_comment(id).await,
            false => api.unlike_comment(id).await,
        };
        self.settle_like(&pending, result)
    }

    /// Fetches the next page of replies of `id` and appends it to the replies already loaded.
    /// Returns the number of comments added.
    pub async fn load_more_replies<A>(
        &mut self,
        api: &A,
        viewer: Option<&Viewer>,
        id: &CommentId,
    ) -> Result<usize, Error>
    where
        A: Api + ?Sized,
    {
        if !self.forest.contains(id) {
            tracing::debug!(comment = %id, "not loading replies of comment absent from thread");
            return Ok(0);
        }
        let page = self.cursors.next_page(id);
        let res = api
            .comment_replies(id, page, self.config.replies_limit)
            .await
            .map_err(Error::Load)?;
        if res.replies.is_empty() {
            tracing::debug!(comment = %id, page, "no more replies");
            return Ok(0);
        }
        let replies = res
            .replies
            .into_iter()
            .map(|c| self.normalize(c, viewer))
            .collect();
        let added = self.forest.append_replies(id, replies);
        self.cursors.advance(id, page);
        Ok(added)
    }

    /// Fetches the profile of every queued author and patches their comments with it.
    /// Authors whose fetch failed stay queued for the next call. Returns the number of
    /// comments patched.
    pub async fn resolve_profiles<A>(&mut self, api: &A) -> usize
    where
        A: Api + ?Sized,
    {
        let mut patched = 0;
        for username in std::mem::take(&mut self.unresolved) {
            match api.user(&username).await {
                Ok(profile) => {
                    patched += self.patch_author(&profile);
                    self.profiles.insert(username, profile);
                }
                Err(err) => {
                    tracing::warn!(%username, %err, "failed fetching author profile");
                    self.unresolved.insert(username);
                }
            }
        }
        patched
    }

    fn patch_author(&mut self, profile: &api::PublicUser) -> usize {
        if profile.avatar_url.is_none() {
            return 0;
        }
        let targets = self
            .forest
            .iter()
            .filter(|n| n.author.username == profile.username && n.author.avatar_url.is_none())
            .map(|n| n.id.clone())
            .collect::<Vec<_>>();
        for id in targets.iter() {
            self.forest.update(id, |n| {
                n.author.avatar_url = profile.avatar_url.clone();
                n.author.display_name = profile.display_name.clone();
            });
        }
        targets.len()
    }

    /// Fills in author details the server omitted. The viewer's own comments take them from
    /// the viewer profile, then from already fetched profiles. Authors still missing an
    /// avatar with no fetched profile get queued.
    fn normalize(&mut self, mut c: api::Comment, viewer: Option<&Viewer>) -> api::Comment {
        if let Some(v) = viewer.filter(|v| v.id == c.user.id) {
            if c.user.avatar_url.is_none() {
                c.user.avatar_url = v.avatar_url.clone();
            }
            if c.user.display_name.is_none() {
                c.user.display_name = v.display_name.clone();
            }
        }
        if c.user.avatar_url.is_none() {
            match self.profiles.get(&c.user.username) {
                Some(p) => {
                    c.user.avatar_url = p.avatar_url.clone();
                    if c.user.display_name.is_none() {
                        c.user.display_name = p.display_name.clone();
                    }
                }
                None => {
                    self.unresolved.insert(c.user.username.clone());
                }
            }
        }
        c.replies = std::mem::take(&mut c.replies)
            .into_iter()
            .map(|r| self.normalize(r, viewer))
            .collect();
        c
    }
}
