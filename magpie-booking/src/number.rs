use chrono::Utc;
use rand::Rng;
use std::sync::Mutex;

pub const BOOKING_NUMBER_PREFIX: &str = "MTT";

/// `MTT` + the last six digits of the epoch millis + a three digit draw.
pub fn format_booking_number(epoch_millis: i64, draw: u16) -> String {
    format!(
        "{}{:06}{:03}",
        BOOKING_NUMBER_PREFIX,
        epoch_millis.rem_euclid(1_000_000),
        draw % 1000
    )
}

/// Source of human-shareable booking references.
///
/// Numbers are not guaranteed unique; storage rejects collisions.
pub trait BookingNumberSource: Send + Sync {
    fn next_number(&self) -> String;
}

/// Wall clock plus a uniform draw from 000-999.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBookingNumbers;

impl BookingNumberSource for RandomBookingNumbers {
    fn next_number(&self) -> String {
        let draw = rand::thread_rng().gen_range(0..1000);
        format_booking_number(Utc::now().timestamp_millis(), draw)
    }
}

/// Replays a fixed clock reading and a queue of draws.
///
/// Once the queue is exhausted the last draw repeats.
#[derive(Debug)]
pub struct PinnedBookingNumbers {
    epoch_millis: i64,
    draws: Mutex<Vec<u16>>,
    last: Mutex<u16>,
}

impl PinnedBookingNumbers {
    pub fn new(epoch_millis: i64, draws: impl IntoIterator<Item = u16>) -> Self {
        let mut draws: Vec<u16> = draws.into_iter().collect();
        draws.reverse();
        Self {
            epoch_millis,
            draws: Mutex::new(draws),
            last: Mutex::new(0),
        }
    }
}

impl BookingNumberSource for PinnedBookingNumbers {
    fn next_number(&self) -> String {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(draw) = self.draws.lock().unwrap_or_else(|e| e.into_inner()).pop() {
            *last = draw;
        }
        format_booking_number(self.epoch_millis, *last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_layout() {
        assert_eq!(format_booking_number(1_718_000_123_456, 7), "MTT123456007");
        assert_eq!(format_booking_number(42, 999), "MTT000042999");
    }

    #[test]
    fn test_random_numbers_have_fixed_shape() {
        let number = RandomBookingNumbers.next_number();
        assert_eq!(number.len(), 12);
        assert!(number.starts_with(BOOKING_NUMBER_PREFIX));
        assert!(number[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_pinned_source_repeats_last_draw() {
        let source = PinnedBookingNumbers::new(1_000_123_456, [7, 7]);
        assert_eq!(source.next_number(), "MTT123456007");
        assert_eq!(source.next_number(), "MTT123456007");
        assert_eq!(source.next_number(), "MTT123456007");
    }
}
