use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

use magpie_core::StoreError;

const BOOKING_NUMBER_CONSTRAINT: &str = "bookings_booking_number_key";

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps a driver error onto the storage taxonomy.
///
/// A unique violation on the booking number constraint becomes
/// `DuplicateBookingNumber`; everything else is a backend failure.
pub(crate) fn store_error(err: sqlx::Error, booking_number: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some(BOOKING_NUMBER_CONSTRAINT) {
            return StoreError::DuplicateBookingNumber(booking_number.unwrap_or_default().to_string());
        }
    }
    error!("Database error: {}", err);
    StoreError::Backend(Box::new(err))
}

pub(crate) fn backend(err: sqlx::Error) -> StoreError {
    store_error(err, None)
}

/// Rows carry enums as text; an unknown value means the admin panel wrote
/// something this service does not understand.
pub(crate) fn corrupt(column: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unexpected value `{value}` in column `{column}`").into())
}

pub(crate) fn target_from_columns(
    tour_package_id: Option<uuid::Uuid>,
    hiking_id: Option<uuid::Uuid>,
) -> Result<Option<magpie_core::TargetRef>, StoreError> {
    magpie_core::TargetRef::from_ids(tour_package_id, hiking_id)
        .map_err(|e| StoreError::Backend(e.to_string().into()))
}
