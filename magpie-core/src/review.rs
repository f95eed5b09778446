use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TargetRef;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_COMMENT_CHARS: usize = 500;

/// Snapshot of the reviewer taken when the review was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub target: TargetRef,
    pub author: ReviewAuthor,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub verified: bool,
    pub helpful: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived rating fields written back onto a tour package or hiking trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub stars: u8,
    pub reviews: u32,
}
