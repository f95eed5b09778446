use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use magpie_core::catalog::{Activity, Difficulty, GalleryImage, HikingTrail, TourPackage};
use magpie_core::repository::{HikingRepository, StoreError, StoreResult, TourPackageRepository};
use magpie_core::review::RatingAggregate;

use crate::database::{backend, corrupt};

const TOUR_PACKAGE_COLUMNS: &str = "id, title, description, image_url, gallery, stars, reviews, price, duration, \
     location, max_group_size, included, excluded, highlights, featured, active, created_at, updated_at";

const HIKING_COLUMNS: &str = "id, title, description, image_url, gallery, stars, reviews, location, difficulty, \
     activity, duration, price, distance, elevation, best_time, features, tips, featured, active, created_at, updated_at";

pub struct StoreTourPackageRepository {
    pool: PgPool,
}

impl StoreTourPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct StoreHikingRepository {
    pool: PgPool,
}

impl StoreHikingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TourPackageRow {
    id: Uuid,
    title: String,
    description: String,
    image_url: String,
    gallery: Json<Vec<GalleryImage>>,
    stars: i16,
    reviews: i32,
    price: Decimal,
    duration: Option<String>,
    location: Option<String>,
    max_group_size: Option<i32>,
    included: Vec<String>,
    excluded: Vec<String>,
    highlights: Vec<String>,
    featured: bool,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TourPackageRow> for TourPackage {
    fn from(row: TourPackageRow) -> Self {
        TourPackage {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            gallery: row.gallery.0,
            stars: row.stars.clamp(0, 5) as u8,
            reviews: row.reviews.max(0) as u32,
            price: row.price,
            duration: row.duration,
            location: row.location,
            max_group_size: row.max_group_size.map(|n| n.max(1) as u32),
            included: row.included,
            excluded: row.excluded,
            highlights: row.highlights,
            featured: row.featured,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HikingRow {
    id: Uuid,
    title: String,
    description: String,
    image_url: Option<String>,
    gallery: Json<Vec<GalleryImage>>,
    stars: i16,
    reviews: i32,
    location: String,
    difficulty: String,
    activity: String,
    duration: Option<String>,
    price: Option<Decimal>,
    distance: Option<String>,
    elevation: Option<String>,
    best_time: Option<String>,
    features: Vec<String>,
    tips: Vec<String>,
    featured: bool,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HikingRow> for HikingTrail {
    type Error = StoreError;

    fn try_from(row: HikingRow) -> Result<Self, Self::Error> {
        let difficulty = Difficulty::parse(&row.difficulty).ok_or_else(|| corrupt("difficulty", &row.difficulty))?;
        let activity = Activity::parse(&row.activity).ok_or_else(|| corrupt("activity", &row.activity))?;
        Ok(HikingTrail {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            gallery: row.gallery.0,
            stars: row.stars.clamp(0, 5) as u8,
            reviews: row.reviews.max(0) as u32,
            location: row.location,
            difficulty,
            activity,
            duration: row.duration,
            price: row.price,
            distance: row.distance,
            elevation: row.elevation,
            best_time: row.best_time,
            features: row.features,
            tips: row.tips,
            featured: row.featured,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn hiking_trails(rows: Vec<HikingRow>) -> StoreResult<Vec<HikingTrail>> {
    rows.into_iter().map(HikingTrail::try_from).collect()
}

#[async_trait]
impl TourPackageRepository for StoreTourPackageRepository {
    async fn get_tour_package(&self, id: Uuid) -> StoreResult<Option<TourPackage>> {
        let row = sqlx::query_as::<_, TourPackageRow>(&format!(
            "SELECT {TOUR_PACKAGE_COLUMNS} FROM tour_packages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(TourPackage::from))
    }

    async fn list_related_tour_packages(
        &self,
        exclude: Uuid,
        location: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<TourPackage>> {
        let rows = sqlx::query_as::<_, TourPackageRow>(&format!(
            "SELECT {TOUR_PACKAGE_COLUMNS} FROM tour_packages \
             WHERE id <> $1 AND active AND (location = $2 OR featured) \
             ORDER BY featured DESC, created_at DESC LIMIT $3"
        ))
        .bind(exclude)
        .bind(location)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(TourPackage::from).collect())
    }

    async fn list_active_tour_packages(&self, limit: usize) -> StoreResult<Vec<TourPackage>> {
        let rows = sqlx::query_as::<_, TourPackageRow>(&format!(
            "SELECT {TOUR_PACKAGE_COLUMNS} FROM tour_packages WHERE active \
             ORDER BY featured DESC, created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(TourPackage::from).collect())
    }

    async fn update_tour_package_rating(&self, id: Uuid, aggregate: RatingAggregate) -> StoreResult<()> {
        let result = sqlx::query("UPDATE tour_packages SET stars = $1, reviews = $2, updated_at = NOW() WHERE id = $3")
            .bind(aggregate.stars as i16)
            .bind(aggregate.reviews as i32)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("tour package {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl HikingRepository for StoreHikingRepository {
    async fn get_hiking_trail(&self, id: Uuid) -> StoreResult<Option<HikingTrail>> {
        let row = sqlx::query_as::<_, HikingRow>(&format!("SELECT {HIKING_COLUMNS} FROM hiking_trails WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(HikingTrail::try_from).transpose()
    }

    async fn list_related_hiking_trails(
        &self,
        exclude: Uuid,
        location: &str,
        limit: usize,
    ) -> StoreResult<Vec<HikingTrail>> {
        let rows = sqlx::query_as::<_, HikingRow>(&format!(
            "SELECT {HIKING_COLUMNS} FROM hiking_trails \
             WHERE id <> $1 AND active AND (location = $2 OR featured) \
             ORDER BY featured DESC, created_at DESC LIMIT $3"
        ))
        .bind(exclude)
        .bind(location)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        hiking_trails(rows)
    }

    async fn list_active_hiking_trails(&self) -> StoreResult<Vec<HikingTrail>> {
        let rows = sqlx::query_as::<_, HikingRow>(&format!(
            "SELECT {HIKING_COLUMNS} FROM hiking_trails WHERE active ORDER BY featured DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        hiking_trails(rows)
    }

    async fn update_hiking_rating(&self, id: Uuid, aggregate: RatingAggregate) -> StoreResult<()> {
        let result = sqlx::query("UPDATE hiking_trails SET stars = $1, reviews = $2, updated_at = NOW() WHERE id = $3")
            .bind(aggregate.stars as i16)
            .bind(aggregate.reviews as i32)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(format!("hiking trail {id}")));
        }
        Ok(())
    }
}
