pub mod booking;
pub mod catalog;
pub mod identity;
pub mod payment;
pub mod pii;
pub mod repository;
pub mod review;
pub mod target;

pub use identity::{AuthenticatedUser, Role};
pub use repository::StoreError;
pub use target::{TargetKind, TargetRef};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed for `{field}`: {message}")]
    ValidationError {
        field: &'static str,
        message: String,
    },
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },
    #[error("Booking number already in use: {0}")]
    DuplicateBookingNumber(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Access denied")]
    Forbidden,
    #[error("Storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateBookingNumber(number) => Self::DuplicateBookingNumber(number),
            other => Self::Storage(other),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_booking_number_keeps_its_own_variant() {
        let err: CoreError = StoreError::DuplicateBookingNumber("MTT123456007".into()).into();
        assert!(matches!(err, CoreError::DuplicateBookingNumber(ref n) if n == "MTT123456007"));

        let err: CoreError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[test]
    fn test_validation_message_names_the_field() {
        let err = CoreError::validation("travel_info.return_date", "must be after departure");
        assert_eq!(
            err.to_string(),
            "Validation failed for `travel_info.return_date`: must be after departure"
        );
    }
}
