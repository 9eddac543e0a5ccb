use std::{collections::HashMap, fmt};

use crate::{Pagination, Time, UserId};

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl From<&str> for VideoId {
    fn from(id: &str) -> VideoId {
        VideoId(String::from(id))
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct HlsInfo {
    pub master: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<HashMap<String, Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUploader {
    #[serde(default)]
    pub id: Option<UserId>,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: VideoId,
    pub title: String,
    pub hls: HlsInfo,
    pub thumbnail_url: Option<String>,
    // the server serializes this bigint as a string
    pub view_count: String,
    pub avg_rating: f64,
    pub ratings_count: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user: Option<VideoUploader>,
}

wire_enum! {
    Visibility {
        Public => "public",
        Unlisted => "unlisted",
        Private => "private",
    }
}

wire_enum! {
    ProcessingStatus {
        Uploading => "uploading",
        Processing => "processing",
        Done => "done",
        Failed => "failed",
    }
}

wire_enum! {
    ModerationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// Entry of the public video listing
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: VideoId,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub view_count: String,
    pub avg_rating: f64,
    pub ratings_count: u64,
    #[serde(default)]
    pub created_at: Option<Time>,
    pub user: VideoUploader,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VideosPage {
    pub videos: Vec<VideoListItem>,
    pub pagination: Pagination,
}

/// Entry of the logged-in user's own video listing, including unpublished videos
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVideo {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub view_count: String,
    pub avg_rating: f64,
    pub ratings_count: u64,
    pub visibility: Visibility,
    pub processing_status: ProcessingStatus,
    pub moderation_status: ModerationStatus,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MyVideosPage {
    pub videos: Vec<MyVideo>,
    pub pagination: Pagination,
}

/// Entry of a creator's profile video listing
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVideo {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: Time,
    pub view_count: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserVideosPage {
    pub videos: Vec<UserVideo>,
    pub pagination: Pagination,
}

/// Edit of a video by its owner. Unset fields are left unchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl VideoUpdate {
    /// Trims `title` and `description`, leaving blank ones unset
    pub fn new(
        title: Option<&str>,
        description: Option<&str>,
        visibility: Option<Visibility>,
    ) -> VideoUpdate {
        let clean = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        VideoUpdate {
            title: clean(title),
            description: clean(description),
            visibility,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.visibility.is_none()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedVideo {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VideoUpdated {
    #[serde(default)]
    pub message: String,
    pub video: UpdatedVideo,
}

impl VideoDetails {
    /// Applies the server's answer to an edit of this video
    pub fn apply(&mut self, updated: &UpdatedVideo) {
        if updated.id != self.id {
            return;
        }
        self.title = updated.title.clone();
        self.description = updated.description.clone();
        if updated.thumbnail_url.is_some() {
            self.thumbnail_url = updated.thumbnail_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_skips_blank_fields() {
        let u = VideoUpdate::new(Some("  New title "), Some("   "), Some(Visibility::Unlisted));
        assert_eq!(u.title.as_deref(), Some("New title"));
        assert_eq!(u.description, None);
        assert_eq!(
            serde_json::to_string(&u).unwrap(),
            r#"{"title":"New title","visibility":"unlisted"}"#
        );
        assert!(VideoUpdate::new(Some(""), None, None).is_empty());
    }

    #[test]
    fn parses_listing_entry() {
        let v: VideoListItem = serde_json::from_str(
            r#"{
                "id": "v1",
                "title": "Intro",
                "thumbnailUrl": null,
                "viewCount": "12345678901234",
                "avgRating": 4.5,
                "ratingsCount": 2,
                "user": { "username": "ada", "displayName": null }
            }"#,
        )
        .expect("parsing listing entry");
        assert_eq!(v.view_count, "12345678901234");
        assert_eq!(v.user.username, "ada");
        assert_eq!(v.created_at, None);
    }

    #[test]
    fn edit_is_applied_to_details() {
        let mut d = VideoDetails {
            id: VideoId::from("v1"),
            title: String::from("Old"),
            hls: HlsInfo::default(),
            thumbnail_url: Some(String::from("/t.png")),
            view_count: String::from("0"),
            avg_rating: 0.0,
            ratings_count: 0,
            description: None,
            user: None,
        };
        d.apply(&UpdatedVideo {
            id: VideoId::from("v1"),
            title: String::from("New"),
            description: Some(String::from("desc")),
            thumbnail_url: None,
        });
        assert_eq!((d.title.as_str(), d.description.as_deref()), ("New", Some("desc")));
        assert_eq!(d.thumbnail_url.as_deref(), Some("/t.png"));
    }
}
