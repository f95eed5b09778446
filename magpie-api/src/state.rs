use std::sync::Arc;

use magpie_booking::{BookingManager, BookingNumberSource, ManualPaymentWorkflow, RatingAggregator};
use magpie_catalog::TargetResolver;
use magpie_store::app_config::UploadsConfig;
use magpie_store::Repositories;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<TargetResolver>,
    pub bookings: Arc<BookingManager>,
    pub payments: Arc<ManualPaymentWorkflow>,
    pub ratings: Arc<RatingAggregator>,
    pub auth: AuthConfig,
    pub uploads: UploadsConfig,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        numbers: Arc<dyn BookingNumberSource>,
        auth: AuthConfig,
        uploads: UploadsConfig,
    ) -> Self {
        let catalog = Arc::new(TargetResolver::new(
            repos.tour_packages.clone(),
            repos.hiking_trails.clone(),
            repos.reviews.clone(),
        ));
        Self {
            bookings: Arc::new(BookingManager::new(catalog.clone(), repos.bookings, numbers.clone())),
            payments: Arc::new(ManualPaymentWorkflow::new(
                catalog.clone(),
                repos.payment_requests,
                repos.payment_settings,
                numbers,
            )),
            ratings: Arc::new(RatingAggregator::new(
                catalog.clone(),
                repos.tour_packages,
                repos.hiking_trails,
                repos.reviews,
            )),
            catalog,
            auth,
            uploads,
        }
    }
}
