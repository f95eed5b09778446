pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
#[cfg(feature = "fixtures")]
pub mod fixtures;
pub mod memory;
pub mod payment_repo;
pub mod review_repo;

use std::sync::Arc;

use magpie_core::repository::{
    BookingRepository, HikingRepository, PaymentRequestRepository, PaymentSettingsRepository, ReviewRepository,
    TourPackageRepository,
};

pub use database::DbClient;
pub use memory::MemoryStore;

/// One handle per collection, as consumed by the catalog and booking services.
#[derive(Clone)]
pub struct Repositories {
    pub tour_packages: Arc<dyn TourPackageRepository>,
    pub hiking_trails: Arc<dyn HikingRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payment_requests: Arc<dyn PaymentRequestRepository>,
    pub payment_settings: Arc<dyn PaymentSettingsRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    pub fn postgres(db: &DbClient) -> Self {
        Self {
            tour_packages: Arc::new(catalog_repo::StoreTourPackageRepository::new(db.pool.clone())),
            hiking_trails: Arc::new(catalog_repo::StoreHikingRepository::new(db.pool.clone())),
            bookings: Arc::new(booking_repo::StoreBookingRepository::new(db.pool.clone())),
            payment_requests: Arc::new(payment_repo::StorePaymentRequestRepository::new(db.pool.clone())),
            payment_settings: Arc::new(payment_repo::StorePaymentSettingsRepository::new(db.pool.clone())),
            reviews: Arc::new(review_repo::StoreReviewRepository::new(db.pool.clone())),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            tour_packages: store.clone(),
            hiking_trails: store.clone(),
            bookings: store.clone(),
            payment_requests: store.clone(),
            payment_settings: store.clone(),
            reviews: store,
        }
    }
}
