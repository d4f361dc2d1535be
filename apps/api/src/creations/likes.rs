//! Like toggling.
//!
//! The whole likes set is read, edited and written back. Concurrent toggles by
//! different principals on one creation can lose an update (last writer wins).

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::store::CreationStore;
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes: Vec<String>,
}

impl LikeToggle {
    pub fn message(&self) -> &'static str {
        if self.liked {
            "Creation liked"
        } else {
            "Like removed"
        }
    }
}

/// Adds `user_id` to `likes` if absent, removes every occurrence otherwise.
fn toggle_membership(likes: &[String], user_id: &str) -> LikeToggle {
    if likes.iter().any(|l| l == user_id) {
        LikeToggle {
            liked: false,
            likes: likes.iter().filter(|l| *l != user_id).cloned().collect(),
        }
    } else {
        let mut likes = likes.to_vec();
        likes.push(user_id.to_string());
        LikeToggle { liked: true, likes }
    }
}

pub async fn toggle_like(
    store: &dyn CreationStore,
    id: Uuid,
    user_id: &str,
) -> Result<LikeToggle, AppError> {
    let creation = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Creation not found".to_string()))?;

    let toggle = toggle_membership(&creation.likes, user_id);
    store.set_likes(id, &toggle.likes).await?;

    debug!("{} on creation {id} by {user_id}", toggle.message());
    Ok(toggle)
}
