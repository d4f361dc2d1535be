use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreationRow {
    pub id: Uuid,
    pub user_id: String,
    pub prompt: String,
    pub content: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub creation_type: String,
    pub publish: bool,
    /// Principal ids, in the order they liked the creation.
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationType {
    Article,
    BlogTitle,
    Image,
    ResumeReview,
}

impl CreationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationType::Article => "article",
            CreationType::BlogTitle => "blog-title",
            CreationType::Image => "image",
            CreationType::ResumeReview => "resume-review",
        }
    }
}

/// Insert payload; id, likes and created_at are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCreation {
    pub user_id: String,
    pub prompt: String,
    pub content: String,
    pub creation_type: CreationType,
    pub publish: bool,
}
