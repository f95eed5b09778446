pub mod manager;
pub mod number;
pub mod payment;
pub mod rating;
pub mod requests;

#[cfg(test)]
mod test_support;

pub use manager::{BookingManager, BookingWithTarget};
pub use number::{BookingNumberSource, PinnedBookingNumbers, RandomBookingNumbers};
pub use payment::{ManualPaymentReceipt, ManualPaymentWorkflow};
pub use rating::RatingAggregator;
