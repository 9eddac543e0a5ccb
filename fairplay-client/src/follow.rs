use crate::{
    api::{self, Api, PublicUser, Viewer},
    Error, Pending, Toggle,
};

/// Whether the viewer follows a creator, along with the creator's follower count
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FollowState {
    username: String,
    state: Toggle,
}

impl FollowState {
    pub fn from_profile(profile: &PublicUser) -> FollowState {
        FollowState {
            username: profile.username.clone(),
            state: Toggle::new(profile.is_following.unwrap_or(false), profile.follower_count),
        }
    }

    pub async fn load<A>(api: &A, id_or_username: &str) -> Result<FollowState, Error>
    where
        A: Api + ?Sized,
    {
        let profile = api.user(id_or_username).await.map_err(Error::Load)?;
        Ok(FollowState::from_profile(&profile))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_following(&self) -> bool {
        self.state.on
    }

    pub fn follower_count(&self) -> u64 {
        self.state.count
    }

    pub fn begin(&mut self, viewer: Option<&Viewer>) -> Result<Pending<String>, Error> {
        viewer.ok_or(Error::AuthRequired)?;
        let pending = Pending::begin(self.username.clone(), 0, self.state);
        self.state = pending.after;
        Ok(pending)
    }

    /// Reconciles a follow toggle with the server's answer, reverting it on failure
    pub fn settle(
        &mut self,
        pending: &Pending<String>,
        result: Result<(), api::Error>,
    ) -> Result<(), Error> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(prev) = pending.reverted(self.state) {
                    tracing::warn!(user = %self.username, %err, "follow request failed, reverting");
                    self.state = prev;
                }
                Err(Error::Submit(err))
            }
        }
    }

    /// Follows or unfollows, optimistically
    pub async fn toggle<A>(&mut self, api: &A, viewer: Option<&Viewer>) -> Result<(), Error>
    where
        A: Api + ?Sized,
    {
        let pending = self.begin(viewer)?;
        let result = match pending.turns_on() {
            true => api.follow_user(&pending.key).await,
            false => api.unfollow_user(&pending.key).await,
        };
        self.settle(&pending, result)
    }
}

#[cfg(test)]
mod tests {
    use fairplay_mock_server::MockServer;

    use super::*;

    #[tokio::test]
    async fn follow_toggle_and_revert() {
        let server = MockServer::new();
        server.test_add_user("ada", "pw", Some("Ada"), None);
        server.test_add_user("bob", "pw", None, None);
        let api = server.as_user("bob");
        let viewer = api.me().await.unwrap();

        let mut state = FollowState::load(&api, "ada").await.expect("loading profile");
        assert!(!state.is_following());
        assert_eq!(state.follower_count(), 0);

        assert!(matches!(
            state.toggle(&api, None).await,
            Err(Error::AuthRequired)
        ));
        assert!(!state.is_following());

        state.toggle(&api, Some(&viewer)).await.expect("following");
        assert!(state.is_following());
        assert_eq!(state.follower_count(), 1);
        assert_eq!(api.user("ada").await.unwrap().follower_count, 1);

        server.test_fail_next(1);
        let err = state.toggle(&api, Some(&viewer)).await.unwrap_err();
        assert!(matches!(err, Error::Submit(_)));
        assert!(state.is_following());
        assert_eq!(state.follower_count(), 1);

        state.toggle(&api, Some(&viewer)).await.expect("unfollowing");
        assert_eq!(
            FollowState::load(&api, "ada").await.unwrap(),
            FollowState {
                username: String::from("ada"),
                state: Toggle::new(false, 0),
            }
        );
    }

    #[tokio::test]
    async fn unknown_user_fails_to_load() {
        let server = MockServer::new();
        let err = FollowState::load(&server, "nobody").await.unwrap_err();
        assert_eq!(err.api_error().and_then(|e| e.status_code()), Some(404));
    }
}
