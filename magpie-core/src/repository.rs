use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::Booking;
use crate::catalog::{HikingTrail, TourPackage};
use crate::payment::{PaymentRequest, PaymentSettings};
use crate::review::{RatingAggregate, Review};
use crate::TargetRef;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Booking number already exists: {0}")]
    DuplicateBookingNumber(String),
    #[error("Record does not exist: {0}")]
    Missing(String),
    #[error("Storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the tour package catalog plus the two derived rating fields.
#[async_trait]
pub trait TourPackageRepository: Send + Sync {
    async fn get_tour_package(&self, id: Uuid) -> StoreResult<Option<TourPackage>>;

    /// Active packages other than `exclude` that share `location` or are
    /// featured, ordered featured first, then newest first.
    async fn list_related_tour_packages(
        &self,
        exclude: Uuid,
        location: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<TourPackage>>;

    /// Active packages, featured first, then newest first.
    async fn list_active_tour_packages(&self, limit: usize) -> StoreResult<Vec<TourPackage>>;

    async fn update_tour_package_rating(&self, id: Uuid, aggregate: RatingAggregate) -> StoreResult<()>;
}

/// Read access to the hiking trail catalog plus the two derived rating fields.
#[async_trait]
pub trait HikingRepository: Send + Sync {
    async fn get_hiking_trail(&self, id: Uuid) -> StoreResult<Option<HikingTrail>>;

    async fn list_related_hiking_trails(
        &self,
        exclude: Uuid,
        location: &str,
        limit: usize,
    ) -> StoreResult<Vec<HikingTrail>>;

    /// All active trails, featured first, then newest first.
    async fn list_active_hiking_trails(&self) -> StoreResult<Vec<HikingTrail>>;

    async fn update_hiking_rating(&self, id: Uuid, aggregate: RatingAggregate) -> StoreResult<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `StoreError::DuplicateBookingNumber` when the booking number
    /// is already taken. The existing booking is left untouched.
    async fn create_booking(&self, booking: &Booking) -> StoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// A user's bookings, newest first, optionally only those updated at or
    /// after `since`.
    async fn list_bookings(&self, user_id: Uuid, since: Option<DateTime<Utc>>) -> StoreResult<Vec<Booking>>;
}

#[async_trait]
pub trait PaymentRequestRepository: Send + Sync {
    /// Persists a payment request together with its companion booking, if
    /// any. Either both records are stored or neither is.
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
        companion: Option<&Booking>,
    ) -> StoreResult<()>;

    async fn list_payment_requests(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<PaymentRequest>>;
}

/// Read-only view of the bank transfer details shown on the payment page.
#[async_trait]
pub trait PaymentSettingsRepository: Send + Sync {
    async fn get_payment_settings(&self) -> StoreResult<Option<PaymentSettings>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, review: &Review) -> StoreResult<()>;

    /// Every review whose foreign key matches `target`, in no particular order.
    async fn list_reviews_for_target(&self, target: TargetRef) -> StoreResult<Vec<Review>>;

    /// Reviews whose package id or hiking id equals `id`, newest first.
    async fn list_recent_reviews(&self, id: Uuid, limit: Option<usize>) -> StoreResult<Vec<Review>>;
}
