use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use magpie_core::catalog::{HikingTrail, TourPackage};
use magpie_core::repository::{HikingRepository, ReviewRepository, TourPackageRepository};
use magpie_core::review::Review;
use magpie_core::{CoreError, CoreResult, TargetRef};

use crate::view::{RelatedItem, TargetView};

pub const RELATED_LIMIT: usize = 4;
pub const DETAIL_REVIEW_LIMIT: usize = 10;
pub const LISTED_PACKAGE_LIMIT: usize = 6;

/// A target looked up in its own catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTarget {
    TourPackage(TourPackage),
    Hiking(HikingTrail),
}

impl ResolvedTarget {
    pub fn target(&self) -> TargetRef {
        match self {
            ResolvedTarget::TourPackage(p) => p.target(),
            ResolvedTarget::Hiking(h) => h.target(),
        }
    }

    pub fn view(&self) -> TargetView {
        match self {
            ResolvedTarget::TourPackage(p) => TargetView::from(p),
            ResolvedTarget::Hiking(h) => TargetView::from(h),
        }
    }
}

/// Everything the payment page shows for one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetDetail {
    pub target: TargetView,
    pub related: Vec<RelatedItem>,
    pub reviews: Vec<Review>,
}

/// Resolves opaque ids against the tour package and hiking catalogs.
pub struct TargetResolver {
    tours: Arc<dyn TourPackageRepository>,
    hikes: Arc<dyn HikingRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl TargetResolver {
    pub fn new(
        tours: Arc<dyn TourPackageRepository>,
        hikes: Arc<dyn HikingRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self { tours, hikes, reviews }
    }

    /// Tour packages are tried first, then hiking trails. At most two lookups.
    pub async fn resolve(&self, id: Uuid) -> CoreResult<ResolvedTarget> {
        if let Some(package) = self.tours.get_tour_package(id).await? {
            return Ok(ResolvedTarget::TourPackage(package));
        }
        if let Some(trail) = self.hikes.get_hiking_trail(id).await? {
            debug!("Resolved {} as hiking trail", id);
            return Ok(ResolvedTarget::Hiking(trail));
        }
        Err(CoreError::not_found("Target", id))
    }

    /// Looks only in the catalog the reference names.
    pub async fn resolve_ref(&self, target: TargetRef) -> CoreResult<ResolvedTarget> {
        let found = match target {
            TargetRef::TourPackage(id) => self.tours.get_tour_package(id).await?.map(ResolvedTarget::TourPackage),
            TargetRef::Hiking(id) => self.hikes.get_hiking_trail(id).await?.map(ResolvedTarget::Hiking),
        };
        found.ok_or_else(|| CoreError::not_found(target.kind().entity(), target.id()))
    }

    /// Up to four other active items from the same catalog sharing the
    /// location or marked featured.
    pub async fn related(&self, resolved: &ResolvedTarget) -> CoreResult<Vec<RelatedItem>> {
        let related = match resolved {
            ResolvedTarget::TourPackage(p) => self
                .tours
                .list_related_tour_packages(p.id, p.location.as_deref(), RELATED_LIMIT)
                .await?
                .iter()
                .map(|p| RelatedItem::from(TargetView::from(p)))
                .collect(),
            ResolvedTarget::Hiking(h) => self
                .hikes
                .list_related_hiking_trails(h.id, &h.location, RELATED_LIMIT)
                .await?
                .iter()
                .map(|h| RelatedItem::from(TargetView::from(h)))
                .collect(),
        };
        Ok(related)
    }

    pub async fn detail(&self, id: Uuid) -> CoreResult<TargetDetail> {
        let resolved = self.resolve(id).await?;
        let related = self.related(&resolved).await?;
        let reviews = self.reviews.list_recent_reviews(id, Some(DETAIL_REVIEW_LIMIT)).await?;

        debug!(
            "Target {} ({}) detail: {} gallery items, {} related, {} reviews",
            id,
            resolved.target().kind(),
            resolved.view().gallery.len(),
            related.len(),
            reviews.len()
        );

        Ok(TargetDetail {
            target: resolved.view(),
            related,
            reviews,
        })
    }

    /// The first `limit` active packages, featured first, then newest first.
    pub async fn active_tour_packages(&self, limit: usize) -> CoreResult<Vec<TourPackage>> {
        Ok(self.tours.list_active_tour_packages(limit).await?)
    }

    pub async fn active_hiking(&self) -> CoreResult<Vec<HikingTrail>> {
        Ok(self.hikes.list_active_hiking_trails().await?)
    }
}
