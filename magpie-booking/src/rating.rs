use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use magpie_catalog::TargetResolver;
use magpie_core::identity::require_user;
use magpie_core::repository::{HikingRepository, ReviewRepository, StoreError, TourPackageRepository};
use magpie_core::review::{
    RatingAggregate, Review, ReviewAuthor, MAX_COMMENT_CHARS, MAX_RATING, MAX_TITLE_CHARS, MIN_RATING,
};
use magpie_core::{AuthenticatedUser, CoreError, CoreResult, TargetRef};

use crate::requests::{parse_id, NewReviewRequest};

pub const DEFAULT_REVIEW_TITLE: &str = "Review";
pub const DEFAULT_REVIEW_COMMENT: &str = "No comment provided";
const ANONYMOUS_AUTHOR: &str = "Anonymous";

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern");
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Mean of the ratings rounded half up. `None` for an empty set.
pub fn rounded_mean(ratings: &[u8]) -> Option<u8> {
    if ratings.is_empty() {
        return None;
    }
    let n = ratings.len() as u64;
    let sum: u64 = ratings.iter().map(|r| u64::from(*r)).sum();
    Some(((2 * sum + n) / (2 * n)) as u8)
}

/// Persists reviews and keeps the reviewed target's `stars` and `reviews`
/// fields in line with them.
///
/// Aggregates are recomputed from the full review set after every write.
/// Concurrent writes race and the last one wins; the next recompute
/// converges.
pub struct RatingAggregator {
    resolver: Arc<TargetResolver>,
    tours: Arc<dyn TourPackageRepository>,
    hikes: Arc<dyn HikingRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl RatingAggregator {
    pub fn new(
        resolver: Arc<TargetResolver>,
        tours: Arc<dyn TourPackageRepository>,
        hikes: Arc<dyn HikingRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            resolver,
            tours,
            hikes,
            reviews,
        }
    }

    pub async fn submit_review(
        &self,
        user: Option<&AuthenticatedUser>,
        request: NewReviewRequest,
    ) -> CoreResult<Review> {
        let user = require_user(user)?;

        let target_id = match parse_id("tour_package_id", request.tour_package_id.as_deref())? {
            Some(id) => id,
            None => parse_id("hiking_id", request.hiking_id.as_deref())?
                .ok_or_else(|| CoreError::validation("target", "a tour_package_id or hiking_id is required"))?,
        };
        let email = request
            .user_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| CoreError::validation("user_email", "Email is required"))?;
        if !is_valid_email(email) {
            warn!("Review from user {} rejected: malformed email", user.id);
            return Err(CoreError::validation("user_email", "Please enter a valid email address"));
        }
        let rating = request
            .rating
            .ok_or_else(|| CoreError::validation("rating", "Rating is required"))?;
        if !(i64::from(MIN_RATING)..=i64::from(MAX_RATING)).contains(&rating) {
            warn!("Review from user {} rejected: rating {}", user.id, rating);
            return Err(CoreError::validation("rating", "Rating must be between 1 and 5"));
        }
        let title = bounded_text("title", request.title, DEFAULT_REVIEW_TITLE, MAX_TITLE_CHARS)?;
        let comment = bounded_text("comment", request.comment, DEFAULT_REVIEW_COMMENT, MAX_COMMENT_CHARS)?;

        let target = self.resolver.resolve(target_id).await?.target();

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            target,
            author: ReviewAuthor {
                user_id: user.id,
                name: first_non_blank([Some(user.display_name.as_str()), request.user_name.as_deref()])
                    .unwrap_or(ANONYMOUS_AUTHOR)
                    .to_string(),
                email: first_non_blank([Some(user.email.as_str()), Some(email)])
                    .unwrap_or(email)
                    .to_string(),
            },
            rating: rating as u8,
            title,
            comment,
            verified: false,
            helpful: 0,
            created_at: now,
            updated_at: now,
        };

        self.reviews.create_review(&review).await?;
        info!("Review {} ({} stars) stored for {}", review.id, review.rating, target);

        self.recompute_aggregate(target).await?;
        Ok(review)
    }

    /// Rewrites `stars` and `reviews` on the target from all of its reviews.
    /// Leaves the target untouched when it has none.
    pub async fn recompute_aggregate(&self, target: TargetRef) -> CoreResult<Option<RatingAggregate>> {
        let reviews = self.reviews.list_reviews_for_target(target).await?;
        let ratings: Vec<u8> = reviews.iter().map(|r| r.rating).collect();
        let Some(stars) = rounded_mean(&ratings) else {
            return Ok(None);
        };
        let aggregate = RatingAggregate {
            stars,
            reviews: ratings.len() as u32,
        };

        let written = match target {
            TargetRef::TourPackage(id) => self.tours.update_tour_package_rating(id, aggregate).await,
            TargetRef::Hiking(id) => self.hikes.update_hiking_rating(id, aggregate).await,
        };
        match written {
            Ok(()) => Ok(Some(aggregate)),
            Err(StoreError::Missing(_)) => Err(CoreError::not_found(target.kind().entity(), target.id())),
            Err(err) => {
                error!("Failed to write rating aggregate for {}: {}", target, err);
                Err(err.into())
            }
        }
    }

    /// Reviews for either kind of target, newest first.
    pub async fn reviews_for(&self, id: Uuid) -> CoreResult<Vec<Review>> {
        Ok(self.reviews.list_recent_reviews(id, None).await?)
    }
}

fn bounded_text(field: &'static str, value: Option<String>, default: &str, max_chars: usize) -> CoreResult<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    match value {
        None => Ok(default.to_string()),
        Some(v) if v.chars().count() > max_chars => Err(CoreError::validation(
            field,
            format!("must be at most {max_chars} characters"),
        )),
        Some(v) => Ok(v),
    }
}

fn first_non_blank<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{user, Fixture};
    use magpie_core::Role;
    use magpie_store::fixtures;

    fn review_for(target: &str, rating: i64) -> NewReviewRequest {
        NewReviewRequest {
            tour_package_id: Some(target.to_string()),
            user_email: Some("trekker@example.com".into()),
            rating: Some(rating),
            ..Default::default()
        }
    }

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(rounded_mean(&[]), None);
        assert_eq!(rounded_mean(&[3, 4]), Some(4));
        assert_eq!(rounded_mean(&[2, 3]), Some(3));
        assert_eq!(rounded_mean(&[1, 1, 2]), Some(1));
        assert_eq!(rounded_mean(&[1, 2, 2]), Some(2));
        assert_eq!(rounded_mean(&[5; 40]), Some(5));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[tokio::test]
    async fn test_sequential_reviews_converge_on_rounded_mean() {
        let fx = Fixture::new();
        let package = fixtures::tour_package("Deosai Plains", "Skardu");
        fx.store.insert_tour_package(package.clone()).await;
        let reviewer = user(Role::User);

        let ratings = [5, 4, 4, 2, 3, 5, 1];
        for rating in ratings {
            fx.ratings
                .submit_review(Some(&reviewer), review_for(&package.id.to_string(), rating))
                .await
                .unwrap();
        }

        let stored = fx.store.get_tour_package(package.id).await.unwrap().unwrap();
        let sum: i64 = ratings.iter().sum();
        let n = ratings.len() as i64;
        assert_eq!(i64::from(stored.stars), (2 * sum + n) / (2 * n));
        assert_eq!(stored.reviews, ratings.len() as u32);
    }

    #[tokio::test]
    async fn test_rating_out_of_range_is_rejected() {
        let fx = Fixture::new();
        let package = fixtures::tour_package("Naltar", "Gilgit");
        fx.store.insert_tour_package(package.clone()).await;
        let reviewer = user(Role::User);

        for rating in [0, 6] {
            let err = fx
                .ratings
                .submit_review(Some(&reviewer), review_for(&package.id.to_string(), rating))
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::ValidationError { field: "rating", .. }));
        }
        assert!(fx.ratings.reviews_for(package.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hiking_review_applies_defaults_and_updates_trail() {
        let fx = Fixture::new();
        let trail = fixtures::hiking_trail("Rakaposhi Base Camp", "Nagar");
        fx.store.insert_hiking_trail(trail.clone()).await;
        let reviewer = user(Role::User);

        let review = fx
            .ratings
            .submit_review(
                Some(&reviewer),
                NewReviewRequest {
                    hiking_id: Some(trail.id.to_string()),
                    user_name: Some("Someone Else".into()),
                    user_email: Some("other@example.com".into()),
                    rating: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(review.target, TargetRef::Hiking(trail.id));
        assert_eq!(review.title, DEFAULT_REVIEW_TITLE);
        assert_eq!(review.comment, DEFAULT_REVIEW_COMMENT);
        assert_eq!(review.author.name, reviewer.display_name);
        assert_eq!(review.author.email, reviewer.email);

        let stored = fx.store.get_hiking_trail(trail.id).await.unwrap().unwrap();
        assert_eq!((stored.stars, stored.reviews), (3, 1));
    }

    #[tokio::test]
    async fn test_missing_email_and_bad_target() {
        let fx = Fixture::new();
        let reviewer = user(Role::User);

        let mut no_email = review_for(&Uuid::new_v4().to_string(), 4);
        no_email.user_email = None;
        let err = fx.ratings.submit_review(Some(&reviewer), no_email).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError { field: "user_email", .. }));

        let err = fx
            .ratings
            .submit_review(Some(&reviewer), review_for(&Uuid::new_v4().to_string(), 4))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_overlong_title_is_rejected() {
        let fx = Fixture::new();
        let package = fixtures::tour_package("Kalash", "Chitral");
        fx.store.insert_tour_package(package.clone()).await;
        let mut request = review_for(&package.id.to_string(), 4);
        request.title = Some("x".repeat(MAX_TITLE_CHARS + 1));

        let err = fx.ratings.submit_review(Some(&user(Role::User)), request).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError { field: "title", .. }));
    }

    #[tokio::test]
    async fn test_recompute_without_reviews_leaves_target_alone() {
        let fx = Fixture::new();
        let package = fixtures::tour_package("Shandur", "Ghizer");
        fx.store.insert_tour_package(package.clone()).await;

        let aggregate = fx.ratings.recompute_aggregate(package.target()).await.unwrap();
        assert_eq!(aggregate, None);
        let stored = fx.store.get_tour_package(package.id).await.unwrap().unwrap();
        assert_eq!((stored.stars, stored.reviews), (package.stars, package.reviews));
    }
}
