//! Types modelling the JSON bodies of the backend API

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A registered user of the site
///
/// The backend omits empty optional fields, so the profile strings default to
/// empty when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    /// Server-assigned id
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Display name, may be empty
    #[serde(default)]
    pub fullname: String,
    /// Free-form profile text
    #[serde(default)]
    pub bio: String,
    /// LinkedIn profile URL
    #[serde(default)]
    pub linked_in_url: String,
    /// GitHub profile URL
    #[serde(default)]
    pub github_url: String,
    /// Avatar URL
    #[serde(default)]
    pub photo_url: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Whether the user has admin rights
    #[serde(default)]
    pub is_admin: bool,
}

/// A forum post, optionally carrying its comments and the viewer's vote
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    /// Server-assigned id
    pub id: i64,
    /// Id of the submitting user
    pub user_id: i64,
    /// Post title
    pub title: String,
    /// Text body, empty for pure link posts
    #[serde(default)]
    pub content: String,
    /// External link, empty for pure text posts
    #[serde(default)]
    pub url: String,
    /// Net score from votes
    pub score: i64,
    /// When the post was submitted
    pub created_at: DateTime<Utc>,
    /// Submitting user, present in list and detail responses
    #[serde(default)]
    pub user: Option<User>,
    /// Comments, present in detail responses only
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// `Some(1)` when the current viewer has up-voted this post
    #[serde(default)]
    pub vote_status: Option<i64>,
}

impl Post {
    /// Whether the current viewer has up-voted this post
    pub fn upvoted(&self) -> bool {
        self.vote_status.is_some()
    }

    /// Username of the submitter, if the response carried it
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.username.as_str())
    }
}

/// A comment on a forum post
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    /// Server-assigned id
    pub id: i64,
    /// Id of the post this comment belongs to
    pub post_id: i64,
    /// Id of the commenting user
    pub user_id: i64,
    /// Comment text
    pub content: String,
    /// When the comment was posted
    pub created_at: DateTime<Utc>,
    /// Commenting user
    #[serde(default)]
    pub user: Option<User>,
}

impl Comment {
    /// Username of the commenter, if the response carried it
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.username.as_str())
    }
}

/// Feed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Highest score first
    Top,
    /// Most recently submitted first
    Newest,
}

impl SortMode {
    /// The query parameter value the backend expects
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Top => "top",
            SortMode::Newest => "newest",
        }
    }
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::Top
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(SortMode::Top),
            "newest" => Ok(SortMode::Newest),
            other => Err(Error::Validation(format!(
                "'{}' is not a sort mode. Options are: top, newest",
                other
            ))),
        }
    }
}

/// Request body for creating a forum post
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPost {
    /// Post title, required
    pub title: String,
    /// Text body, optional when a url is given
    pub content: String,
    /// External link, optional when content is given
    pub url: String,
}

impl NewPost {
    /// Pre-flight validation, applied before any request is made
    ///
    /// A title is required, at least one of content/url must be present, and
    /// a given url must parse as an absolute URL.
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Title is required".to_string()));
        }
        if self.content.trim().is_empty() && self.url.trim().is_empty() {
            return Err(Error::Validation(
                "Either content or URL is required".to_string(),
            ));
        }
        if !self.url.trim().is_empty() {
            self.url.trim().parse::<url::Url>().map_err(|_| {
                Error::Validation(format!("'{}' is not a valid URL", self.url.trim()))
            })?;
        }
        Ok(())
    }
}

/// Request body for commenting on a post
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    /// Comment text
    pub content: String,
}

/// A budget category owned by the viewer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    /// Server-assigned id
    pub id: i64,
    /// Owning user id
    pub user_id: i64,
    /// Category name, unique per user
    pub name: String,
    /// When the category was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An imported budget transaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    /// Server-assigned id
    pub id: i64,
    /// Owning user id
    pub user_id: i64,
    /// Transaction day as an ISO `YYYY-MM-DD` key
    pub date: String,
    /// Signed amount, negative for spending
    pub amount: f64,
    /// Free-form description
    pub description: String,
    /// Assigned category, if any
    pub category_id: Option<i64>,
    /// When the transaction was imported
    pub created_at: DateTime<Utc>,
    /// Resolved category name, empty when unassigned
    #[serde(default)]
    pub category_name: String,
}

/// A single parsed line of a bulk import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkTransaction {
    /// ISO `YYYY-MM-DD` day key
    pub date: String,
    /// Signed amount
    pub amount: f64,
    /// Description, the remainder of the line
    pub description: String,
}

/// Backend acknowledgement of a bulk import
#[derive(Debug, Deserialize)]
pub struct BulkImportReceipt {
    /// Human-readable outcome
    #[serde(default)]
    pub message: String,
    /// Number of transactions inserted
    pub count: usize,
}

/// Request body for registration
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registration {
    /// Desired login name
    pub username: String,
    /// Password
    pub password: String,
    /// Must match `password`
    pub confirm_password: String,
    /// Profile text
    pub bio: String,
    /// LinkedIn profile URL
    pub linked_in_url: String,
    /// GitHub profile URL
    pub github_url: String,
    /// Avatar URL
    pub photo_url: String,
}

/// Request body for a profile update
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    /// Profile text
    pub bio: String,
    /// LinkedIn profile URL
    pub linked_in_url: String,
    /// GitHub profile URL
    pub github_url: String,
    /// Avatar URL
    pub photo_url: String,
}

/// Request body for an admin user update
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminUserUpdate {
    /// New login name, empty to leave unchanged
    pub username: String,
    /// Display name
    pub fullname: String,
    /// Profile text
    pub bio: String,
    /// LinkedIn profile URL
    pub linked_in_url: String,
    /// GitHub profile URL
    pub github_url: String,
    /// Avatar URL
    pub photo_url: String,
    /// Grant or revoke admin rights
    pub is_admin: bool,
}

/// One page of the admin user listing
#[derive(Debug, Deserialize)]
pub struct UserPage {
    /// Users on this page
    pub users: Vec<User>,
    /// Paging details
    pub pagination: Pagination,
}

/// Paging details of an admin user listing
#[derive(Debug, Deserialize)]
pub struct Pagination {
    /// Total number of users
    pub total: u32,
    /// 1-based page number
    pub page: u32,
    /// Requested page size
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    /// Total number of pages
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

/// A password-less login link owned by the viewer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MagicLink {
    /// Server-assigned id
    pub id: i64,
    /// Owning user id
    pub user_id: i64,
    /// Single-use bearer token
    pub token: String,
    /// When the link was created
    pub created_at: DateTime<Utc>,
    /// When the link stops working
    pub expires_at: DateTime<Utc>,
    /// Where the site sends the bearer after redeeming
    #[serde(default)]
    pub redirect_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_deserializes_list_shape() {
        // The list endpoint omits comments and vote_status
        let json = r#"{
            "id": 5,
            "user_id": 2,
            "title": "Show: a thing",
            "url": "https://example.com/thing",
            "score": 7,
            "created_at": "2025-03-10T12:00:00Z",
            "user": {
                "id": 2,
                "username": "mara",
                "photo_url": "",
                "created_at": "2024-01-01T00:00:00Z",
                "is_admin": false
            }
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, 5);
        assert_eq!(post.score, 7);
        assert_eq!(post.content, "");
        assert_eq!(post.author(), Some("mara"));
        assert!(post.comments.is_empty());
        assert!(!post.upvoted());
    }

    #[test]
    fn post_deserializes_detail_shape() {
        let json = r#"{
            "id": 5,
            "user_id": 2,
            "title": "Ask: how?",
            "content": "like this",
            "score": 3,
            "created_at": "2025-03-10T12:00:00Z",
            "vote_status": 1,
            "comments": [{
                "id": 9,
                "post_id": 5,
                "user_id": 4,
                "content": "nice",
                "created_at": "2025-03-10T13:00:00Z"
            }]
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.upvoted());
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].content, "nice");
    }

    #[test]
    fn new_post_requires_title() {
        let post = NewPost {
            title: "  ".to_string(),
            content: "body".to_string(),
            url: String::new(),
        };
        assert!(matches!(post.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn new_post_requires_content_or_url() {
        let post = NewPost {
            title: "a title".to_string(),
            ..NewPost::default()
        };
        assert!(matches!(post.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn new_post_rejects_relative_url() {
        let post = NewPost {
            title: "a title".to_string(),
            content: String::new(),
            url: "not-absolute".to_string(),
        };
        assert!(matches!(post.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn new_post_accepts_link_only() {
        let post = NewPost {
            title: "a title".to_string(),
            content: String::new(),
            url: "https://example.com".to_string(),
        };
        assert!(post.validate().is_ok());
    }

    #[test]
    fn sort_mode_round_trips() {
        assert_eq!("top".parse::<SortMode>().unwrap(), SortMode::Top);
        assert_eq!("newest".parse::<SortMode>().unwrap(), SortMode::Newest);
        assert!("hot".parse::<SortMode>().is_err());
    }
}
