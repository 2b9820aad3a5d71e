/// Response envelope and cache-tag invalidation header
///
/// Every successful response has the shape
///
/// ```json
/// { "success": true, "message": "Tasks retrieved", "meta": { "page": 1, "limit": 10, "total": 42 }, "data": [] }
/// ```
///
/// where `meta` is only present on paginated lists. Mutations also carry an
/// `X-Invalidate-Tags` header naming the client cache entries that are now
/// stale, for example `Tasks, Task:8a1f..., Dashboard`.

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use planboard_shared::pagination::{Page, PageMeta};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Header listing stale cache tags
pub const INVALIDATE_TAGS_HEADER: HeaderName = HeaderName::from_static("x-invalidate-tags");

/// Client-side cache tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTag {
    Tasks,
    Task(Uuid),
    Projects,
    Project(Uuid),
    Teams,
    Team(Uuid),
    Users,
    User(Uuid),
    TeamMembers,
    ProjectTeams,
    Dashboard,
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTag::Tasks => f.write_str("Tasks"),
            CacheTag::Task(id) => write!(f, "Task:{}", id),
            CacheTag::Projects => f.write_str("Projects"),
            CacheTag::Project(id) => write!(f, "Project:{}", id),
            CacheTag::Teams => f.write_str("Teams"),
            CacheTag::Team(id) => write!(f, "Team:{}", id),
            CacheTag::Users => f.write_str("Users"),
            CacheTag::User(id) => write!(f, "User:{}", id),
            CacheTag::TeamMembers => f.write_str("TeamMembers"),
            CacheTag::ProjectTeams => f.write_str("ProjectTeams"),
            CacheTag::Dashboard => f.write_str("Dashboard"),
        }
    }
}

#[derive(Debug, Serialize)]
struct Body<'a, T> {
    success: bool,
    message: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<PageMeta>,

    data: T,
}

/// Successful response in the standard envelope
#[derive(Debug)]
pub struct Envelope<T> {
    status: StatusCode,
    message: String,
    meta: Option<PageMeta>,
    data: T,
    tags: Vec<CacheTag>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            meta: None,
            data,
            tags: Vec::new(),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }

    /// Marks cache tags stale in the client
    pub fn invalidates(mut self, tags: impl IntoIterator<Item = CacheTag>) -> Self {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    fn tags_header(&self) -> Option<HeaderValue> {
        if self.tags.is_empty() {
            return None;
        }

        let joined = self
            .tags
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        HeaderValue::from_str(&joined).ok()
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// One page of a list, with `meta`
    pub fn page(message: impl Into<String>, page: Page<T>) -> Self {
        Self {
            meta: Some(page.meta),
            ..Self::ok(message, page.data)
        }
    }
}

impl Envelope<()> {
    /// Envelope with `data: null`
    pub fn message(message: impl Into<String>) -> Self {
        Self::ok(message, ())
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let tags = self.tags_header();

        let body = Json(Body {
            success: true,
            message: &self.message,
            meta: self.meta,
            data: &self.data,
        });

        let mut response = (self.status, body).into_response();
        if let Some(tags) = tags {
            response.headers_mut().insert(INVALIDATE_TAGS_HEADER, tags);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use planboard_shared::pagination::ListParams;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_tag_display() {
        let id = Uuid::nil();
        assert_eq!(CacheTag::Tasks.to_string(), "Tasks");
        assert_eq!(
            CacheTag::Task(id).to_string(),
            "Task:00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn test_ok_envelope() {
        let response = Envelope::ok("Fetched", serde_json::json!({ "id": 1 })).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(INVALIDATE_TAGS_HEADER).is_none());

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Fetched");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("meta").is_none());
    }

    #[tokio::test]
    async fn test_created_with_tags() {
        let id = Uuid::new_v4();
        let response = Envelope::created("Task created", "x")
            .invalidates([CacheTag::Tasks, CacheTag::Task(id), CacheTag::Tasks])
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(INVALIDATE_TAGS_HEADER).unwrap(),
            format!("Tasks, Task:{}", id).as_str()
        );
    }

    #[tokio::test]
    async fn test_page_envelope() {
        let params = ListParams {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };
        let response = Envelope::page("Listed", Page::new(vec![1, 2], &params, 5)).into_response();

        let json = body_json(response).await;
        assert_eq!(json["meta"]["page"], 2);
        assert_eq!(json["meta"]["limit"], 2);
        assert_eq!(json["meta"]["total"], 5);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn test_message_envelope_has_null_data() {
        let json = body_json(Envelope::message("Logged out").into_response()).await;
        assert!(json["data"].is_null());
    }
}
