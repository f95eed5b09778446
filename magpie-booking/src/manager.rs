use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use magpie_catalog::{TargetResolver, TargetSummary, TargetView};
use magpie_core::booking::{
    Booking, BookingStatus, CustomerInfo, PaymentInfo, PaymentStatus, TravelInfo, DEFAULT_CURRENCY,
};
use magpie_core::identity::require_user;
use magpie_core::repository::BookingRepository;
use magpie_core::{AuthenticatedUser, CoreError, CoreResult, TargetRef};

use crate::number::BookingNumberSource;
use crate::requests::{parse_timestamp, target_from_fields, CreateBookingRequest, TravelInfoInput};

/// A booking with the target it points at, resolved for display.
///
/// `target_details` is `None` when the target has since been removed from
/// its catalog.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithTarget<T> {
    #[serde(flatten)]
    pub booking: Booking,
    pub target_details: Option<T>,
}

/// Creates and reads bookings tied to a user and a resolved target.
pub struct BookingManager {
    resolver: Arc<TargetResolver>,
    bookings: Arc<dyn BookingRepository>,
    numbers: Arc<dyn BookingNumberSource>,
}

impl BookingManager {
    pub fn new(
        resolver: Arc<TargetResolver>,
        bookings: Arc<dyn BookingRepository>,
        numbers: Arc<dyn BookingNumberSource>,
    ) -> Self {
        Self {
            resolver,
            bookings,
            numbers,
        }
    }

    /// Direct booking path. The payment is treated as already settled, so the
    /// booking is stored `confirmed` with payment status `completed`.
    pub async fn create_booking(
        &self,
        user: Option<&AuthenticatedUser>,
        request: CreateBookingRequest,
    ) -> CoreResult<BookingWithTarget<TargetView>> {
        let user = require_user(user)?;

        let target = target_from_fields(request.tour_package_id.as_deref(), request.hiking_id.as_deref())?
            .ok_or_else(|| CoreError::validation("target", "a tour_package_id or hiking_id is required"))?;
        let customer = request
            .customer_info
            .ok_or_else(|| CoreError::validation("customer_info", "is required"))?;
        let travel = request
            .travel_info
            .ok_or_else(|| CoreError::validation("travel_info", "is required"))?;
        let payment = request
            .payment_info
            .ok_or_else(|| CoreError::validation("payment_info", "is required"))?;

        let resolved = self.resolver.resolve_ref(target).await?;

        validate_customer(&customer)?;
        let travel = travel_info(&travel)?;
        validate_amount("payment_info.amount", payment.amount)?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: user.id,
            target: Some(target),
            booking_number: self.numbers.next_number(),
            customer_info: customer,
            travel_info: travel,
            payment_info: PaymentInfo {
                amount: payment.amount,
                currency: currency_or_default(payment.currency),
                payment_intent_id: payment.payment_intent_id.unwrap_or_default(),
                charge_id: payment.charge_id.unwrap_or_default(),
                payment_status: PaymentStatus::Completed,
                payment_date: now,
            },
            booking_status: BookingStatus::Confirmed,
            notes: request.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.bookings.create_booking(&booking).await {
            warn!("Booking {} for user {} not stored: {}", booking.booking_number, user.id, err);
            return Err(err.into());
        }

        info!(
            "Created booking {} ({}) for user {} on {}",
            booking.booking_number, booking.id, user.id, target
        );

        Ok(BookingWithTarget {
            booking,
            target_details: Some(resolved.view()),
        })
    }

    /// The user's bookings, newest first, optionally only those updated since
    /// the given instant.
    pub async fn list_bookings(
        &self,
        user: Option<&AuthenticatedUser>,
        since: Option<DateTime<Utc>>,
    ) -> CoreResult<Vec<BookingWithTarget<TargetSummary>>> {
        let user = require_user(user)?;
        let bookings = self.bookings.list_bookings(user.id, since).await?;

        let mut summaries: HashMap<TargetRef, Option<TargetSummary>> = HashMap::new();
        let mut listed = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let target_details = match booking.target {
                Some(target) => {
                    if !summaries.contains_key(&target) {
                        let summary = self.summary(target).await?;
                        summaries.insert(target, summary);
                    }
                    summaries.get(&target).cloned().flatten()
                }
                None => None,
            };
            listed.push(BookingWithTarget { booking, target_details });
        }
        Ok(listed)
    }

    /// Only the owner or an admin may read a booking.
    pub async fn get_booking(
        &self,
        user: Option<&AuthenticatedUser>,
        id: Uuid,
    ) -> CoreResult<BookingWithTarget<TargetSummary>> {
        let user = require_user(user)?;
        let booking = self
            .bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", id))?;

        if !user.can_access(booking.user_id) {
            warn!("User {} denied access to booking {}", user.id, id);
            return Err(CoreError::Forbidden);
        }

        let target_details = match booking.target {
            Some(target) => self.summary(target).await?,
            None => None,
        };
        Ok(BookingWithTarget { booking, target_details })
    }

    async fn summary(&self, target: TargetRef) -> CoreResult<Option<TargetSummary>> {
        match self.resolver.resolve_ref(target).await {
            Ok(resolved) => Ok(Some(TargetSummary::from(&resolved.view()))),
            Err(CoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

pub(crate) fn validate_customer(customer: &CustomerInfo) -> CoreResult<()> {
    let required = [
        ("customer_info.first_name", customer.first_name.as_str()),
        ("customer_info.last_name", customer.last_name.as_str()),
        ("customer_info.email", customer.email.as_str()),
        ("customer_info.phone", customer.phone.as_str()),
        ("customer_info.nationality", customer.nationality.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(CoreError::validation(field, "is required"));
        }
    }
    Ok(())
}

/// Parses and checks travel dates and party size.
pub(crate) fn travel_info(input: &TravelInfoInput) -> CoreResult<TravelInfo> {
    let departure_date = parse_timestamp("travel_info.departure_date", &input.departure_date)?;
    let return_date = parse_timestamp("travel_info.return_date", &input.return_date)?;
    if departure_date >= return_date {
        return Err(CoreError::validation(
            "travel_info.return_date",
            "Return date must be after departure date",
        ));
    }
    if input.number_of_travelers < 1 {
        return Err(CoreError::validation(
            "travel_info.number_of_travelers",
            "at least one traveler is required",
        ));
    }
    Ok(TravelInfo {
        departure_date,
        return_date,
        number_of_travelers: input.number_of_travelers,
        special_requests: input.special_requests.clone().unwrap_or_default(),
    })
}

pub(crate) fn validate_amount(field: &'static str, amount: Decimal) -> CoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(CoreError::validation(field, "must not be negative"));
    }
    Ok(())
}

pub(crate) fn currency_or_default(currency: Option<String>) -> String {
    currency
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}
