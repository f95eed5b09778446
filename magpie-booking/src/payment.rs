use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use magpie_catalog::TargetResolver;
use magpie_core::booking::{Booking, BookingStatus, PaymentInfo, PaymentStatus, MANUAL_PAYMENT_REFERENCE};
use magpie_core::identity::require_user;
use magpie_core::payment::{PaymentRequest, PaymentRequestStatus, PaymentSettings, DEFAULT_PAYMENT_METHOD};
use magpie_core::repository::{PaymentRequestRepository, PaymentSettingsRepository};
use magpie_core::{AuthenticatedUser, CoreError, CoreResult};

use crate::manager::{currency_or_default, travel_info, validate_amount, validate_customer};
use crate::number::BookingNumberSource;
use crate::requests::{target_from_fields, ManualPaymentSubmission};

/// Ids of the records a manual payment submission created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManualPaymentReceipt {
    pub request_id: Uuid,
    pub booking_id: Option<Uuid>,
}

/// Records "I paid offline, please verify" claims, optionally reserving the
/// dates with a pending booking.
pub struct ManualPaymentWorkflow {
    resolver: Arc<TargetResolver>,
    payment_requests: Arc<dyn PaymentRequestRepository>,
    settings: Arc<dyn PaymentSettingsRepository>,
    numbers: Arc<dyn BookingNumberSource>,
}

impl ManualPaymentWorkflow {
    pub fn new(
        resolver: Arc<TargetResolver>,
        payment_requests: Arc<dyn PaymentRequestRepository>,
        settings: Arc<dyn PaymentSettingsRepository>,
        numbers: Arc<dyn BookingNumberSource>,
    ) -> Self {
        Self {
            resolver,
            payment_requests,
            settings,
            numbers,
        }
    }

    /// Bank transfer details to show before a manual payment, if the admin
    /// panel has configured any.
    pub async fn payment_settings(&self) -> CoreResult<Option<PaymentSettings>> {
        Ok(self.settings.get_payment_settings().await?)
    }

    /// Either both records are written or neither is. All validation and
    /// target lookups finish before the single write.
    pub async fn submit_manual_payment(
        &self,
        user: Option<&AuthenticatedUser>,
        submission: ManualPaymentSubmission,
    ) -> CoreResult<ManualPaymentReceipt> {
        let user = require_user(user)?;

        let amount = submission
            .amount
            .ok_or_else(|| CoreError::validation("amount", "Amount is required"))?;
        validate_amount("amount", amount)?;
        let target = target_from_fields(submission.tour_package_id.as_deref(), submission.hiking_id.as_deref())?;
        let currency = currency_or_default(submission.currency);
        let now = Utc::now();

        let companion = match (submission.customer_info, submission.travel_info) {
            (Some(customer), Some(travel)) => {
                let target = target.ok_or_else(|| {
                    CoreError::validation("target", "a tour_package_id or hiking_id is required to reserve dates")
                })?;
                self.resolver.resolve_ref(target).await?;
                validate_customer(&customer)?;
                let travel = travel_info(&travel)?;

                Some(Booking {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    target: Some(target),
                    booking_number: self.numbers.next_number(),
                    customer_info: customer,
                    travel_info: travel,
                    payment_info: PaymentInfo {
                        amount,
                        currency: currency.clone(),
                        payment_intent_id: MANUAL_PAYMENT_REFERENCE.to_string(),
                        charge_id: MANUAL_PAYMENT_REFERENCE.to_string(),
                        payment_status: PaymentStatus::Pending,
                        payment_date: now,
                    },
                    booking_status: BookingStatus::Pending,
                    notes: String::new(),
                    created_at: now,
                    updated_at: now,
                })
            }
            _ => {
                if let Some(target) = target {
                    self.resolver.resolve_ref(target).await?;
                }
                None
            }
        };

        let request = PaymentRequest {
            id: Uuid::new_v4(),
            user_id: user.id,
            user_email: user.email.clone(),
            user_name: user.display_name.clone(),
            target,
            booking_id: companion.as_ref().map(|b| b.id),
            amount,
            currency,
            payment_method: submission
                .payment_method
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            transaction_id: submission.transaction_id.unwrap_or_default(),
            proof_image_url: submission.proof_image_url.unwrap_or_default(),
            notes: submission.notes.unwrap_or_default(),
            status: PaymentRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self
            .payment_requests
            .create_payment_request(&request, companion.as_ref())
            .await
        {
            warn!("Manual payment from user {} not stored: {}", user.id, err);
            return Err(err.into());
        }

        match &companion {
            Some(booking) => info!(
                "Payment request {} submitted by {} with pending booking {}",
                request.id, user.id, booking.booking_number
            ),
            None => info!("Payment request {} submitted by {}", request.id, user.id),
        }
        if request.proof_image_url.is_empty() {
            warn!("Payment request {} has no proof image", request.id);
        }

        Ok(ManualPaymentReceipt {
            request_id: request.id,
            booking_id: request.booking_id,
        })
    }

    /// The user's payment requests, newest first.
    pub async fn list_payment_requests(
        &self,
        user: Option<&AuthenticatedUser>,
        since: Option<DateTime<Utc>>,
    ) -> CoreResult<Vec<PaymentRequest>> {
        let user = require_user(user)?;
        Ok(self.payment_requests.list_payment_requests(user.id, since).await?)
    }
}
