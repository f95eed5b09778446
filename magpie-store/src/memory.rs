use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use magpie_core::booking::Booking;
use magpie_core::catalog::{HikingTrail, TourPackage};
use magpie_core::payment::{PaymentRequest, PaymentSettings};
use magpie_core::repository::{
    BookingRepository, HikingRepository, PaymentRequestRepository, PaymentSettingsRepository, ReviewRepository,
    StoreError, StoreResult, TourPackageRepository,
};
use magpie_core::review::{RatingAggregate, Review};
use magpie_core::TargetRef;

/// Process-local store implementing every repository trait.
///
/// Backs the test suites and `storage.backend = "memory"`. Each collection
/// sits behind its own lock; there are no cross-collection transactions
/// except the booking + payment request pair.
#[derive(Default)]
pub struct MemoryStore {
    tour_packages: RwLock<HashMap<Uuid, TourPackage>>,
    hiking_trails: RwLock<HashMap<Uuid, HikingTrail>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    payment_requests: RwLock<HashMap<Uuid, PaymentRequest>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
    payment_settings: RwLock<Option<PaymentSettings>>,
    catalog_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stands in for the admin panel writing catalog data.
    pub async fn insert_tour_package(&self, package: TourPackage) {
        self.tour_packages.write().await.insert(package.id, package);
    }

    pub async fn insert_hiking_trail(&self, trail: HikingTrail) {
        self.hiking_trails.write().await.insert(trail.id, trail);
    }

    pub async fn set_payment_settings(&self, settings: PaymentSettings) {
        *self.payment_settings.write().await = Some(settings);
    }

    /// Number of single-record catalog lookups served so far.
    pub fn catalog_lookups(&self) -> usize {
        self.catalog_lookups.load(Ordering::SeqCst)
    }

    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn payment_request_count(&self) -> usize {
        self.payment_requests.read().await.len()
    }

    pub async fn all_payment_requests(&self) -> Vec<PaymentRequest> {
        self.payment_requests.read().await.values().cloned().collect()
    }
}

fn related_order<T>(items: &mut [T], featured: impl Fn(&T) -> bool, created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by(|a, b| {
        featured(b)
            .cmp(&featured(a))
            .then_with(|| created_at(b).cmp(&created_at(a)))
    });
}

fn ensure_unique_number(bookings: &HashMap<Uuid, Booking>, booking: &Booking) -> StoreResult<()> {
    if bookings.values().any(|b| b.booking_number == booking.booking_number) {
        return Err(StoreError::DuplicateBookingNumber(booking.booking_number.clone()));
    }
    Ok(())
}

fn updated_since(updated_at: DateTime<Utc>, since: Option<DateTime<Utc>>) -> bool {
    since.map_or(true, |since| updated_at >= since)
}

#[async_trait]
impl TourPackageRepository for MemoryStore {
    async fn get_tour_package(&self, id: Uuid) -> StoreResult<Option<TourPackage>> {
        self.catalog_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.tour_packages.read().await.get(&id).cloned())
    }

    async fn list_related_tour_packages(
        &self,
        exclude: Uuid,
        location: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<TourPackage>> {
        let packages = self.tour_packages.read().await;
        let mut related: Vec<TourPackage> = packages
            .values()
            .filter(|p| p.id != exclude && p.active)
            .filter(|p| p.featured || (location.is_some() && p.location.as_deref() == location))
            .cloned()
            .collect();
        related_order(&mut related, |p| p.featured, |p| p.created_at);
        related.truncate(limit);
        Ok(related)
    }

    async fn list_active_tour_packages(&self, limit: usize) -> StoreResult<Vec<TourPackage>> {
        let packages = self.tour_packages.read().await;
        let mut active: Vec<TourPackage> = packages.values().filter(|p| p.active).cloned().collect();
        related_order(&mut active, |p| p.featured, |p| p.created_at);
        active.truncate(limit);
        Ok(active)
    }

    async fn update_tour_package_rating(&self, id: Uuid, aggregate: RatingAggregate) -> StoreResult<()> {
        let mut packages = self.tour_packages.write().await;
        let package = packages
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("tour package {id}")))?;
        package.stars = aggregate.stars;
        package.reviews = aggregate.reviews;
        package.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl HikingRepository for MemoryStore {
    async fn get_hiking_trail(&self, id: Uuid) -> StoreResult<Option<HikingTrail>> {
        self.catalog_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.hiking_trails.read().await.get(&id).cloned())
    }

    async fn list_related_hiking_trails(
        &self,
        exclude: Uuid,
        location: &str,
        limit: usize,
    ) -> StoreResult<Vec<HikingTrail>> {
        let trails = self.hiking_trails.read().await;
        let mut related: Vec<HikingTrail> = trails
            .values()
            .filter(|t| t.id != exclude && t.active)
            .filter(|t| t.featured || t.location == location)
            .cloned()
            .collect();
        related_order(&mut related, |t| t.featured, |t| t.created_at);
        related.truncate(limit);
        Ok(related)
    }

    async fn list_active_hiking_trails(&self) -> StoreResult<Vec<HikingTrail>> {
        let trails = self.hiking_trails.read().await;
        let mut active: Vec<HikingTrail> = trails.values().filter(|t| t.active).cloned().collect();
        related_order(&mut active, |t| t.featured, |t| t.created_at);
        Ok(active)
    }

    async fn update_hiking_rating(&self, id: Uuid, aggregate: RatingAggregate) -> StoreResult<()> {
        let mut trails = self.hiking_trails.write().await;
        let trail = trails
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("hiking trail {id}")))?;
        trail.stars = aggregate.stars;
        trail.reviews = aggregate.reviews;
        trail.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;
        ensure_unique_number(&bookings, booking)?;
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_bookings(&self, user_id: Uuid, since: Option<DateTime<Utc>>) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id && updated_since(b.updated_at, since))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[async_trait]
impl PaymentRequestRepository for MemoryStore {
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
        companion: Option<&Booking>,
    ) -> StoreResult<()> {
        // Lock order: bookings, then payment requests.
        let mut bookings = self.bookings.write().await;
        let mut requests = self.payment_requests.write().await;

        if let Some(booking) = companion {
            ensure_unique_number(&bookings, booking)?;
            bookings.insert(booking.id, booking.clone());
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn list_payment_requests(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<PaymentRequest>> {
        let requests = self.payment_requests.read().await;
        let mut found: Vec<PaymentRequest> = requests
            .values()
            .filter(|r| r.user_id == user_id && updated_since(r.updated_at, since))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[async_trait]
impl PaymentSettingsRepository for MemoryStore {
    async fn get_payment_settings(&self) -> StoreResult<Option<PaymentSettings>> {
        Ok(self.payment_settings.read().await.clone())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: &Review) -> StoreResult<()> {
        self.reviews.write().await.insert(review.id, review.clone());
        Ok(())
    }

    async fn list_reviews_for_target(&self, target: TargetRef) -> StoreResult<Vec<Review>> {
        let reviews = self.reviews.read().await;
        Ok(reviews.values().filter(|r| r.target == target).cloned().collect())
    }

    async fn list_recent_reviews(&self, id: Uuid, limit: Option<usize>) -> StoreResult<Vec<Review>> {
        let reviews = self.reviews.read().await;
        let mut found: Vec<Review> = reviews.values().filter(|r| r.target.id() == id).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use magpie_core::booking::{
        BookingStatus, CustomerInfo, PaymentInfo, PaymentStatus, TravelInfo,
    };
    use magpie_core::catalog::GalleryImage;
    use magpie_core::payment::PaymentRequestStatus;
    use rust_decimal::Decimal;

    fn package(location: &str, featured: bool, age_days: i64) -> TourPackage {
        let created = Utc::now() - Duration::days(age_days);
        TourPackage {
            id: Uuid::new_v4(),
            title: format!("{location} tour"),
            description: "Guided tour".into(),
            image_url: "/uploads/tour.jpg".into(),
            gallery: vec![GalleryImage { url: "/uploads/1.jpg".into(), caption: String::new(), alt: String::new() }],
            stars: 4,
            reviews: 0,
            price: Decimal::new(500, 0),
            duration: Some("5 days".into()),
            location: Some(location.into()),
            max_group_size: Some(12),
            included: vec![],
            excluded: vec![],
            highlights: vec![],
            featured,
            active: true,
            created_at: created,
            updated_at: created,
        }
    }

    fn booking(number: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            target: None,
            booking_number: number.into(),
            customer_info: CustomerInfo {
                first_name: "A".into(),
                last_name: "B".into(),
                email: "a@b.co".to_string().into(),
                phone: "1".to_string().into(),
                nationality: "PK".into(),
                emergency_contact: None,
            },
            travel_info: TravelInfo {
                departure_date: now,
                return_date: now + Duration::days(2),
                number_of_travelers: 1,
                special_requests: String::new(),
            },
            payment_info: PaymentInfo {
                amount: Decimal::new(100, 0),
                currency: "USD".into(),
                payment_intent_id: String::new(),
                charge_id: String::new(),
                payment_status: PaymentStatus::Pending,
                payment_date: now,
            },
            booking_status: BookingStatus::Pending,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn request(booking_id: Option<Uuid>) -> PaymentRequest {
        let now = Utc::now();
        PaymentRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_email: "a@b.co".into(),
            user_name: String::new(),
            target: None,
            booking_id,
            amount: Decimal::new(250, 0),
            currency: "USD".into(),
            payment_method: "bank_transfer".into(),
            transaction_id: String::new(),
            proof_image_url: String::new(),
            notes: String::new(),
            status: PaymentRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_related_packages_prefer_featured_then_recent() {
        let store = MemoryStore::new();
        let current = package("Hunza", false, 0);
        let same_place_old = package("Hunza", false, 10);
        let same_place_new = package("Hunza", false, 1);
        let featured_elsewhere = package("Skardu", true, 30);
        let unrelated = package("Lahore", false, 0);
        let mut inactive = package("Hunza", true, 0);
        inactive.active = false;

        for p in [&current, &same_place_old, &same_place_new, &featured_elsewhere, &unrelated, &inactive] {
            store.insert_tour_package(p.clone()).await;
        }

        let related = store
            .list_related_tour_packages(current.id, current.location.as_deref(), 4)
            .await
            .unwrap();
        let ids: Vec<Uuid> = related.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![featured_elsewhere.id, same_place_new.id, same_place_old.id]);
    }

    #[tokio::test]
    async fn test_duplicate_booking_number_is_rejected_and_first_kept() {
        let store = MemoryStore::new();
        let first = booking("MTT123456007");
        let second = booking("MTT123456007");

        store.create_booking(&first).await.unwrap();
        let err = store.create_booking(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateBookingNumber(_)));

        let kept = store.get_booking(first.id).await.unwrap().unwrap();
        assert_eq!(kept.id, first.id);
        assert_eq!(store.booking_count().await, 1);
    }

    #[tokio::test]
    async fn test_payment_request_pair_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.create_booking(&booking("MTT000001001")).await.unwrap();

        let clash = booking("MTT000001001");
        let err = store
            .create_payment_request(&request(Some(clash.id)), Some(&clash))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateBookingNumber(_)));
        assert_eq!(store.booking_count().await, 1);
        assert_eq!(store.payment_request_count().await, 0);
    }

    #[tokio::test]
    async fn test_rating_update_on_missing_target_reports_missing() {
        let store = MemoryStore::new();
        let err = store
            .update_hiking_rating(Uuid::new_v4(), RatingAggregate { stars: 4, reviews: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));
    }
}
