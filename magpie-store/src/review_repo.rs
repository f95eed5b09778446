use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use magpie_core::repository::{ReviewRepository, StoreError, StoreResult};
use magpie_core::review::{Review, ReviewAuthor};
use magpie_core::{TargetKind, TargetRef};

use crate::database::{backend, corrupt, target_from_columns};

const REVIEW_COLUMNS: &str = "id, target_type, tour_package_id, hiking_id, user_id, user_name, user_email, rating, \
     title, comment, verified, helpful, created_at, updated_at";

pub struct StoreReviewRepository {
    pool: PgPool,
}

impl StoreReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    target_type: String,
    tour_package_id: Option<Uuid>,
    hiking_id: Option<Uuid>,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    rating: i16,
    title: String,
    comment: String,
    verified: bool,
    helpful: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let target = target_from_columns(row.tour_package_id, row.hiking_id)?
            .ok_or_else(|| corrupt("target", "null"))?;
        if target.kind().as_str() != row.target_type {
            return Err(corrupt("target_type", &row.target_type));
        }
        Ok(Review {
            id: row.id,
            target,
            author: ReviewAuthor {
                user_id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
            rating: row.rating.clamp(0, 5) as u8,
            title: row.title,
            comment: row.comment,
            verified: row.verified,
            helpful: row.helpful.max(0) as u32,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn reviews(rows: Vec<ReviewRow>) -> StoreResult<Vec<Review>> {
    rows.into_iter().map(Review::try_from).collect()
}

#[async_trait]
impl ReviewRepository for StoreReviewRepository {
    async fn create_review(&self, review: &Review) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, target_type, tour_package_id, hiking_id, user_id, user_name, user_email, rating,
                                 title, comment, verified, helpful, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(review.id)
        .bind(review.target.kind().as_str())
        .bind(review.target.tour_package_id())
        .bind(review.target.hiking_id())
        .bind(review.author.user_id)
        .bind(&review.author.name)
        .bind(&review.author.email)
        .bind(review.rating as i16)
        .bind(&review.title)
        .bind(&review.comment)
        .bind(review.verified)
        .bind(review.helpful as i32)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn list_reviews_for_target(&self, target: TargetRef) -> StoreResult<Vec<Review>> {
        let column = match target.kind() {
            TargetKind::Package => "tour_package_id",
            TargetKind::Hiking => "hiking_id",
        };
        let rows = sqlx::query_as::<_, ReviewRow>(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE {column} = $1"))
            .bind(target.id())
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        reviews(rows)
    }

    async fn list_recent_reviews(&self, id: Uuid, limit: Option<usize>) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE tour_package_id = $1 OR hiking_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(id)
        .bind(limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        reviews(rows)
    }
}
