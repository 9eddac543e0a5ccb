use crate::{
    ModerationStatus, Pagination, ProcessingStatus, Time, UserId, UserSummary, VideoId,
    Visibility,
};

/// Entry of the moderator video queue
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModVideo {
    pub id: VideoId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub processing_status: ProcessingStatus,
    pub moderation_status: ModerationStatus,
    pub visibility: Visibility,
    pub user: UserSummary,
    pub created_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ModVideosPage {
    pub videos: Vec<ModVideo>,
    pub pagination: Pagination,
}

/// Filters of the moderator video queue. Unset filters match everything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModerationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub processing_status: Option<ProcessingStatus>,
    pub moderation_status: Option<ModerationStatus>,
    pub visibility: Option<Visibility>,
    pub user_id: Option<UserId>,

    /// Case-insensitive match on the title
    pub search: Option<String>,

    /// `oldest` lists oldest first, anything else newest first
    pub sort: Option<String>,
}

impl ModerationQuery {
    /// The pending queue, oldest first
    pub fn pending() -> ModerationQuery {
        ModerationQuery {
            moderation_status: Some(ModerationStatus::Pending),
            sort: Some(String::from("oldest")),
            ..ModerationQuery::default()
        }
    }
}

wire_enum! {
    ModerationAction {
        Approve => "approve",
        Reject => "reject",
    }
}

impl ModerationAction {
    /// Status of the video once the action went through
    pub fn outcome(self) -> ModerationStatus {
        match self {
            ModerationAction::Approve => ModerationStatus::Approved,
            ModerationAction::Reject => ModerationStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ModerationBody {
    pub action: ModerationAction,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratedVideo {
    pub id: VideoId,
    pub title: String,
    pub moderation_status: ModerationStatus,
    pub processing_status: ProcessingStatus,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ModerationResponse {
    #[serde(default)]
    pub message: String,
    pub video: ModeratedVideo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_body() {
        let body = ModerationBody {
            action: ModerationAction::Reject,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"action":"reject"}"#);
        assert_eq!(body.action.outcome(), ModerationStatus::Rejected);
    }
}
