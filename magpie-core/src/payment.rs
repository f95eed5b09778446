use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::TargetRef;

pub const DEFAULT_PAYMENT_METHOD: &str = "bank_transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRequestStatus::Pending => "pending",
            PaymentRequestStatus::Approved => "approved",
            PaymentRequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentRequestStatus::Pending),
            "approved" => Some(PaymentRequestStatus::Approved),
            "rejected" => Some(PaymentRequestStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's claim of an offline payment, waiting for admin review.
///
/// `booking_id` is a soft link to the pending booking created alongside the
/// request, if any. Approval and rejection happen in the admin panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub target: Option<TargetRef>,
    pub booking_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub transaction_id: String,
    pub proof_image_url: String,
    pub notes: String,
    pub status: PaymentRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where customers should send an offline payment. Maintained by the admin
/// panel; a single record at most.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSettings {
    pub qr_image_url: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub iban: String,
    pub swift: String,
    pub instructions: String,
    pub updated_at: Option<DateTime<Utc>>,
}
