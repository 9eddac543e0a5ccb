mod cursor;
pub use cursor::ReplyCursors;

mod error;
pub use error::Error;

mod follow;
pub use follow::FollowState;

mod forest;
pub use forest::{DepthFirst, Forest, Node};

mod http;
pub use http::HttpApi;

mod thread;
pub use thread::{CommentThread, PendingLike, ThreadConfig};

mod toggle;
pub use toggle::{Pending, Toggle};

mod token;
pub use token::TokenStore;

pub mod api {
    pub use fairplay_api::*;
}
