use std::sync::Arc;
use uuid::Uuid;

use magpie_catalog::TargetResolver;
use magpie_core::booking::CustomerInfo;
use magpie_core::pii::Masked;
use magpie_core::{AuthenticatedUser, Role};
use magpie_store::MemoryStore;

use crate::number::{BookingNumberSource, RandomBookingNumbers};
use crate::requests::TravelInfoInput;
use crate::{BookingManager, ManualPaymentWorkflow, RatingAggregator};

/// Every service wired to one in-memory store.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub bookings: BookingManager,
    pub payments: ManualPaymentWorkflow,
    pub ratings: RatingAggregator,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_numbers(Arc::new(RandomBookingNumbers))
    }

    pub fn with_numbers(numbers: Arc<dyn BookingNumberSource>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let resolver = Arc::new(TargetResolver::new(store.clone(), store.clone(), store.clone()));
        Self {
            bookings: BookingManager::new(resolver.clone(), store.clone(), numbers.clone()),
            payments: ManualPaymentWorkflow::new(resolver.clone(), store.clone(), store.clone(), numbers),
            ratings: RatingAggregator::new(resolver, store.clone(), store.clone(), store.clone()),
            store,
        }
    }
}

pub fn user(role: Role) -> AuthenticatedUser {
    let id = Uuid::new_v4();
    AuthenticatedUser {
        id,
        email: format!("{}@magpie.test", id.simple()),
        display_name: "Amina Baig".into(),
        role,
    }
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        first_name: "Amina".into(),
        last_name: "Baig".into(),
        email: Masked("amina@example.com".into()),
        phone: Masked("+92 300 1234567".into()),
        nationality: "Pakistani".into(),
        emergency_contact: None,
    }
}

pub fn travel(departure: &str, ret: &str) -> TravelInfoInput {
    TravelInfoInput {
        departure_date: departure.into(),
        return_date: ret.into(),
        number_of_travelers: 2,
        special_requests: None,
    }
}
