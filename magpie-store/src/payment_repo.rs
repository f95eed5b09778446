use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use magpie_core::booking::Booking;
use magpie_core::payment::{PaymentRequest, PaymentRequestStatus, PaymentSettings};
use magpie_core::repository::{PaymentRequestRepository, PaymentSettingsRepository, StoreResult};

use crate::booking_repo::insert_booking;
use crate::database::{backend, corrupt, target_from_columns};

pub struct StorePaymentRequestRepository {
    pool: PgPool,
}

impl StorePaymentRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct StorePaymentSettingsRepository {
    pool: PgPool,
}

impl StorePaymentSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentSettingsRow {
    qr_image_url: String,
    bank_name: String,
    account_name: String,
    account_number: String,
    iban: String,
    swift: String,
    instructions: String,
    updated_at: DateTime<Utc>,
}

impl From<PaymentSettingsRow> for PaymentSettings {
    fn from(row: PaymentSettingsRow) -> Self {
        PaymentSettings {
            qr_image_url: row.qr_image_url,
            bank_name: row.bank_name,
            account_name: row.account_name,
            account_number: row.account_number,
            iban: row.iban,
            swift: row.swift,
            instructions: row.instructions,
            updated_at: Some(row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRequestRow {
    id: Uuid,
    user_id: Uuid,
    user_email: String,
    user_name: String,
    tour_package_id: Option<Uuid>,
    hiking_id: Option<Uuid>,
    booking_id: Option<Uuid>,
    amount: Decimal,
    currency: String,
    payment_method: String,
    transaction_id: String,
    proof_image_url: String,
    notes: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRequestRow> for PaymentRequest {
    type Error = magpie_core::StoreError;

    fn try_from(row: PaymentRequestRow) -> Result<Self, Self::Error> {
        let status = PaymentRequestStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        Ok(PaymentRequest {
            id: row.id,
            user_id: row.user_id,
            user_email: row.user_email,
            user_name: row.user_name,
            target: target_from_columns(row.tour_package_id, row.hiking_id)?,
            booking_id: row.booking_id,
            amount: row.amount,
            currency: row.currency,
            payment_method: row.payment_method,
            transaction_id: row.transaction_id,
            proof_image_url: row.proof_image_url,
            notes: row.notes,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentRequestRepository for StorePaymentRequestRepository {
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
        companion: Option<&Booking>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        if let Some(booking) = companion {
            insert_booking(&mut *tx, booking).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO payment_requests (id, user_id, user_email, user_name, tour_package_id, hiking_id, booking_id,
                                          amount, currency, payment_method, transaction_id, proof_image_url, notes,
                                          status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(request.id)
        .bind(request.user_id)
        .bind(&request.user_email)
        .bind(&request.user_name)
        .bind(request.target.and_then(|t| t.tour_package_id()))
        .bind(request.target.and_then(|t| t.hiking_id()))
        .bind(request.booking_id)
        .bind(request.amount)
        .bind(&request.currency)
        .bind(&request.payment_method)
        .bind(&request.transaction_id)
        .bind(&request.proof_image_url)
        .bind(&request.notes)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        info!(
            "Stored payment request {} (booking: {:?}, proof: {})",
            request.id,
            request.booking_id,
            !request.proof_image_url.is_empty()
        );
        Ok(())
    }

    async fn list_payment_requests(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<PaymentRequest>> {
        let rows = sqlx::query_as::<_, PaymentRequestRow>(
            r#"
            SELECT id, user_id, user_email, user_name, tour_package_id, hiking_id, booking_id, amount, currency,
                   payment_method, transaction_id, proof_image_url, notes, status, created_at, updated_at
            FROM payment_requests
            WHERE user_id = $1 AND ($2::timestamptz IS NULL OR updated_at >= $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(PaymentRequest::try_from).collect()
    }
}

#[async_trait]
impl PaymentSettingsRepository for StorePaymentSettingsRepository {
    async fn get_payment_settings(&self) -> StoreResult<Option<PaymentSettings>> {
        let row = sqlx::query_as::<_, PaymentSettingsRow>(
            r#"
            SELECT qr_image_url, bank_name, account_name, account_number, iban, swift, instructions, updated_at
            FROM payment_settings
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(PaymentSettings::from))
    }
}
