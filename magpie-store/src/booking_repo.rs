use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use tracing::info;
use uuid::Uuid;

use magpie_core::booking::{Booking, BookingStatus, CustomerInfo, PaymentInfo, TravelInfo};
use magpie_core::repository::{BookingRepository, StoreResult};

use crate::database::{backend, corrupt, store_error, target_from_columns};

const BOOKING_COLUMNS: &str = "id, user_id, tour_package_id, hiking_id, booking_number, customer_info, travel_info, \
     payment_info, booking_status, notes, created_at, updated_at";

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    tour_package_id: Option<Uuid>,
    hiking_id: Option<Uuid>,
    booking_number: String,
    customer_info: Json<CustomerInfo>,
    travel_info: Json<TravelInfo>,
    payment_info: Json<PaymentInfo>,
    booking_status: String,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = magpie_core::StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let booking_status =
            BookingStatus::parse(&row.booking_status).ok_or_else(|| corrupt("booking_status", &row.booking_status))?;
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            target: target_from_columns(row.tour_package_id, row.hiking_id)?,
            booking_number: row.booking_number,
            customer_info: row.customer_info.0,
            travel_info: row.travel_info.0,
            payment_info: row.payment_info.0,
            booking_status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Shared by the plain booking insert and the payment request transaction.
pub(crate) async fn insert_booking<'e, E>(executor: E, booking: &Booking) -> StoreResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO bookings (id, user_id, tour_package_id, hiking_id, booking_number, customer_info, travel_info,
                              payment_info, booking_status, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(booking.id)
    .bind(booking.user_id)
    .bind(booking.target.and_then(|t| t.tour_package_id()))
    .bind(booking.target.and_then(|t| t.hiking_id()))
    .bind(&booking.booking_number)
    .bind(Json(&booking.customer_info))
    .bind(Json(&booking.travel_info))
    .bind(Json(&booking.payment_info))
    .bind(booking.booking_status.as_str())
    .bind(&booking.notes)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(executor)
    .await
    .map_err(|e| store_error(e, Some(&booking.booking_number)))?;

    Ok(())
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> StoreResult<()> {
        insert_booking(&self.pool, booking).await?;
        info!("Stored booking {} ({})", booking.id, booking.booking_number);
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(&self, user_id: Uuid, since: Option<DateTime<Utc>>) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE user_id = $1 AND ($2::timestamptz IS NULL OR updated_at >= $2) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
