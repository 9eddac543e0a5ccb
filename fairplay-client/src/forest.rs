use std::sync::Arc;

use crate::{
    api::{self, CommentId, Time, UserSummary},
    Toggle,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub id: CommentId,
    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
    pub author: UserSummary,

    /// Whether the viewer likes this comment, and the like count
    pub like: Toggle,

    /// Number of replies the server knows about. Always at least `replies.len()`.
    pub reply_count: u64,

    pub parent: Option<CommentId>,

    /// Loaded replies, in display order
    pub replies: im::Vector<CommentId>,
}

impl Node {
    pub fn has_more_replies(&self) -> bool {
        (self.replies.len() as u64) < self.reply_count
    }
}

/// The comments of one video, stored as an arena of nodes with parent pointers.
///
/// Nodes are behind `Arc`s. Mutating a node gives it and each of its ancestors a fresh `Arc`,
/// while every other node keeps its identity, so that a renderer holding an older snapshot
/// can skip the subtrees for which `Arc::ptr_eq` still holds. Cloning a forest is cheap.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    nodes: im::HashMap<CommentId, Arc<Node>>,
    roots: im::Vector<CommentId>,
}

impl Forest {
    pub fn new() -> Forest {
        Forest::default()
    }

    pub fn from_comments(comments: Vec<api::Comment>) -> Forest {
        let mut res = Forest::new();
        for c in comments {
            if let Some(id) = res.attach(None, c) {
                res.roots.push_back(id);
            }
        }
        res
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &CommentId) -> Option<&Arc<Node>> {
        self.nodes.get(id)
    }

    pub fn root_ids(&self) -> &im::Vector<CommentId> {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Loaded replies of `id`, empty if `id` is not in the forest
    pub fn replies<'a>(&'a self, id: &CommentId) -> impl Iterator<Item = &'a Arc<Node>> + 'a {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.replies.iter())
            .filter_map(|id| self.nodes.get(id))
    }

    /// All nodes, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.values()
    }

    /// Nodes in display order, each with its depth (0 for top-level comments)
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            forest: self,
            stack: self.roots.iter().rev().map(|id| (0, id)).collect(),
        }
    }

    /// Ids from the top-level comment down to `id`, inclusive
    pub fn path_to(&self, id: &CommentId) -> Option<Vec<CommentId>> {
        let mut res = Vec::new();
        let mut cur = Some(id.clone());
        while let Some(id) = cur {
            cur = self.nodes.get(&id)?.parent.clone();
            res.push(id);
        }
        res.reverse();
        Some(res)
    }

    /// Adds `c` at the front of the top-level comments. Returns None if its id is already
    /// in the forest.
    pub fn prepend_root(&mut self, c: api::Comment) -> Option<CommentId> {
        let id = self.attach(None, c)?;
        self.roots.push_front(id.clone());
        Some(id)
    }

    /// Adds `c` at the front of `parent`'s replies. Returns None if `parent` is not in the
    /// forest or `c` already is.
    pub fn prepend_reply(&mut self, parent: &CommentId, c: api::Comment) -> Option<CommentId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.attach(Some(parent), c)?;
        let new_id = id.clone();
        self.update(parent, move |p| {
            p.replies.push_front(new_id);
            p.reply_count += 1;
        });
        Some(id)
    }

    /// Appends `page` after the replies `parent` already has, returning the number of nodes
    /// added. Comments already in the forest are skipped.
    pub fn append_replies(&mut self, parent: &CommentId, page: Vec<api::Comment>) -> usize {
        if !self.contains(parent) {
            return 0;
        }
        let added = page
            .into_iter()
            .filter_map(|c| self.attach(Some(parent), c))
            .collect::<im::Vector<_>>();
        let num_added = added.len();
        if num_added > 0 {
            self.update(parent, move |p| {
                p.replies.append(added);
                p.reply_count = p.reply_count.max(p.replies.len() as u64);
            });
        }
        num_added
    }

    /// Applies `f` to node `id` and rebuilds the chain of its ancestors. Returns false if
    /// `id` is not in the forest.
    pub fn update<F>(&mut self, id: &CommentId, f: F) -> bool
    where
        F: FnOnce(&mut Node),
    {
        let parent = match self.nodes.get_mut(id) {
            None => return false,
            Some(node) => {
                let node = Arc::make_mut(node);
                f(node);
                node.parent.clone()
            }
        };
        self.rebuild_path(parent);
        true
    }

    /// Gives a fresh identity to `from` and all its ancestors
    fn rebuild_path(&mut self, from: Option<CommentId>) {
        let mut cur = from;
        while let Some(id) = cur {
            cur = match self.nodes.get_mut(&id) {
                None => None,
                Some(node) => {
                    *node = Arc::new(Node::clone(node));
                    node.parent.clone()
                }
            };
        }
    }

    /// Inserts `c` and the replies it carries as nodes, without linking `c` from its
    /// parent. Returns None if `c` was already present.
    fn attach(&mut self, parent: Option<&CommentId>, c: api::Comment) -> Option<CommentId> {
        if self.nodes.contains_key(&c.id) {
            tracing::debug!(comment = %c.id, "skipping comment already in thread");
            return None;
        }
        let reply_count = c.reply_count();
        let api::Comment {
            id,
            content,
            created_at,
            updated_at,
            like_count,
            liked_by_me,
            user,
            replies,
            ..
        } = c;
        self.nodes.insert(
            id.clone(),
            Arc::new(Node {
                id: id.clone(),
                content,
                created_at,
                updated_at,
                author: user,
                like: Toggle::new(liked_by_me, like_count),
                reply_count,
                parent: parent.cloned(),
                replies: im::Vector::new(),
            }),
        );
        let children = replies
            .into_iter()
            .filter_map(|r| self.attach(Some(&id), r))
            .collect::<im::Vector<_>>();
        if let Some(node) = self.nodes.get_mut(&id) {
            let node = Arc::make_mut(node);
            node.reply_count = node.reply_count.max(children.len() as u64);
            node.replies = children;
        }
        Some(id)
    }
}

pub struct DepthFirst<'a> {
    forest: &'a Forest,
    stack: Vec<(usize, &'a CommentId)>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (usize, &'a Arc<Node>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, id)) = self.stack.pop() {
            if let Some(node) = self.forest.nodes.get(id) {
                self.stack
                    .extend(node.replies.iter().rev().map(|r| (depth + 1, r)));
                return Some((depth, node));
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{CommentCount, UserId};

    pub fn comment(id: &str, reply_count: u64, replies: Vec<api::Comment>) -> api::Comment {
        let date: Time = "2024-03-01T10:00:00Z".parse().expect("parsing date");
        api::Comment {
            id: CommentId::from(id),
            content: format!("content of {id}"),
            created_at: date,
            updated_at: date,
            like_count: 0,
            liked_by_me: false,
            user: UserSummary {
                id: UserId(String::from("u1")),
                username: String::from("ada"),
                display_name: None,
                avatar_url: None,
            },
            count: Some(CommentCount {
                replies: reply_count,
            }),
            replies,
        }
    }

    fn id(s: &str) -> CommentId {
        CommentId::from(s)
    }

    fn sample() -> Forest {
        Forest::from_comments(vec![
            comment(
                "a",
                2,
                vec![comment("a1", 1, vec![comment("a1x", 0, vec![])]), comment("a2", 0, vec![])],
            ),
            comment("b", 1, vec![comment("b1", 0, vec![])]),
        ])
    }

    #[test]
    fn builds_arena_in_order() {
        let f = sample();
        assert_eq!(f.len(), 6);
        let order = f
            .depth_first()
            .map(|(d, n)| (d, n.id.0.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![(0, "a"), (1, "a1"), (2, "a1x"), (1, "a2"), (0, "b"), (1, "b1")]
        );
        assert_eq!(f.path_to(&id("a1x")), Some(vec![id("a"), id("a1"), id("a1x")]));
        assert_eq!(f.path_to(&id("zzz")), None);
    }

    #[test]
    fn rejects_duplicates() {
        let f = Forest::from_comments(vec![
            comment("a", 1, vec![comment("a", 0, vec![])]),
            comment("a", 0, vec![]),
        ]);
        assert_eq!(f.len(), 1);
        assert_eq!(f.root_ids().len(), 1);
        assert!(f.get(&id("a")).unwrap().replies.is_empty());
    }

    #[test]
    fn reply_count_covers_loaded_replies() {
        let f = Forest::from_comments(vec![comment(
            "a",
            0,
            vec![comment("a1", 0, vec![]), comment("a2", 0, vec![])],
        )]);
        assert_eq!(f.get(&id("a")).unwrap().reply_count, 2);
    }

    #[test]
    fn update_rebuilds_only_ancestors() {
        let before = sample();
        let mut after = before.clone();
        assert!(after.update(&id("a1x"), |n| n.content = String::from("edited")));
        let same = |i: &str| Arc::ptr_eq(before.get(&id(i)).unwrap(), after.get(&id(i)).unwrap());
        assert!(!same("a1x"));
        assert!(!same("a1"));
        assert!(!same("a"));
        assert!(same("a2"));
        assert!(same("b"));
        assert!(same("b1"));
        assert_eq!(before.get(&id("a1x")).unwrap().content, "content of a1x");
        assert_eq!(after.get(&id("a1x")).unwrap().content, "edited");
        assert!(!after.update(&id("nope"), |_| panic!("called on absent node")));
    }

    #[test]
    fn prepend_and_append() {
        let mut f = sample();
        assert_eq!(f.prepend_root(comment("c", 0, vec![])), Some(id("c")));
        assert_eq!(f.root_ids().iter().cloned().collect::<Vec<_>>(), vec![id("c"), id("a"), id("b")]);

        assert_eq!(f.prepend_reply(&id("b1"), comment("b1a", 0, vec![])), Some(id("b1a")));
        let b1 = f.get(&id("b1")).unwrap();
        assert_eq!(b1.replies.iter().cloned().collect::<Vec<_>>(), vec![id("b1a")]);
        assert_eq!(b1.reply_count, 1);
        assert_eq!(f.prepend_reply(&id("gone"), comment("x", 0, vec![])), None);
        assert!(!f.contains(&id("x")));

        let added = f.append_replies(
            &id("a"),
            vec![comment("a3", 0, vec![]), comment("a1", 0, vec![]), comment("a4", 0, vec![])],
        );
        assert_eq!(added, 2);
        let a = f.get(&id("a")).unwrap();
        assert_eq!(
            a.replies.iter().cloned().collect::<Vec<_>>(),
            vec![id("a1"), id("a2"), id("a3"), id("a4")]
        );
        assert_eq!(a.reply_count, 4);
        assert_eq!(f.get(&id("a3")).unwrap().parent, Some(id("a")));
    }

    #[test]
    fn every_node_reachable_once() {
        bolero::check!()
            .with_type::<Vec<(u8, u8)>>()
            .cloned()
            .for_each(|ops| {
                let mut f = Forest::new();
                for (i, (target, kind)) in ops.into_iter().enumerate() {
                    let new = comment(&format!("n{}", i % 32), 0, vec![]);
                    let ids = f.iter().map(|n| n.id.clone()).collect::<Vec<_>>();
                    if ids.is_empty() || kind % 3 == 0 {
                        f.prepend_root(new);
                    } else {
                        let parent = ids[target as usize % ids.len()].clone();
                        if kind % 3 == 1 {
                            f.prepend_reply(&parent, new);
                        } else {
                            f.append_replies(&parent, vec![new]);
                        }
                    }
                }
                let visited = f.depth_first().map(|(_, n)| n.id.clone()).collect::<Vec<_>>();
                assert_eq!(visited.len(), f.len());
                let unique = visited.iter().collect::<std::collections::HashSet<_>>();
                assert_eq!(unique.len(), f.len());
                for n in f.iter() {
                    assert!(n.replies.len() as u64 <= n.reply_count);
                    for r in n.replies.iter() {
                        assert_eq!(f.get(r).unwrap().parent.as_ref(), Some(&n.id));
                    }
                }
            })
    }
}
