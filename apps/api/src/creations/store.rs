use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::creation::{CreationRow, NewCreation};

/// Persistence seam for creations. Carried in `AppState` as `Arc<dyn CreationStore>`.
#[async_trait]
pub trait CreationStore: Send + Sync {
    async fn insert(&self, creation: NewCreation) -> Result<CreationRow, sqlx::Error>;

    /// Newest first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CreationRow>, sqlx::Error>;

    /// Newest first, `publish = true` only.
    async fn list_published(&self) -> Result<Vec<CreationRow>, sqlx::Error>;

    async fn get(&self, id: Uuid) -> Result<Option<CreationRow>, sqlx::Error>;

    /// Replaces the whole likes set.
    async fn set_likes(&self, id: Uuid, likes: &[String]) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgCreationStore {
    pool: PgPool,
}

impl PgCreationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreationStore for PgCreationStore {
    async fn insert(&self, creation: NewCreation) -> Result<CreationRow, sqlx::Error> {
        let row = sqlx::query_as::<_, CreationRow>(
            r#"
            INSERT INTO creations (user_id, prompt, content, type, publish)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&creation.user_id)
        .bind(&creation.prompt)
        .bind(&creation.content)
        .bind(creation.creation_type.as_str())
        .bind(creation.publish)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Recorded {} creation {} for user {}",
            row.creation_type, row.id, row.user_id
        );
        Ok(row)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CreationRow>, sqlx::Error> {
        sqlx::query_as::<_, CreationRow>(
            "SELECT * FROM creations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_published(&self) -> Result<Vec<CreationRow>, sqlx::Error> {
        sqlx::query_as::<_, CreationRow>(
            "SELECT * FROM creations WHERE publish = true ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get(&self, id: Uuid) -> Result<Option<CreationRow>, sqlx::Error> {
        sqlx::query_as::<_, CreationRow>("SELECT * FROM creations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn set_likes(&self, id: Uuid, likes: &[String]) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE creations SET likes = $1 WHERE id = $2")
            .bind(likes)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
