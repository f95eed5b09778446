use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use magpie_core::catalog::{GalleryImage, HikingTrail, TourPackage};
use magpie_core::TargetRef;

/// Star rating shown for trails that have not been rated yet.
pub const UNRATED_STARS: u8 = 5;

/// Tour-package-shaped view of either kind of target, so booking and payment
/// screens never branch on the catalog a target came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub image_url: String,
    pub gallery: Vec<GalleryImage>,
    pub stars: u8,
    pub reviews: u32,
    pub price: Decimal,
    pub featured: bool,
    pub is_hiking: bool,
}

impl TargetView {
    pub fn target(&self) -> TargetRef {
        if self.is_hiking {
            TargetRef::Hiking(self.id)
        } else {
            TargetRef::TourPackage(self.id)
        }
    }
}

impl From<&TourPackage> for TargetView {
    fn from(package: &TourPackage) -> Self {
        TargetView {
            id: package.id,
            title: package.title.clone(),
            description: package.description.clone(),
            location: package.location.clone(),
            duration: package.duration.clone(),
            image_url: package.image_url.clone(),
            gallery: package.gallery.clone(),
            stars: package.stars,
            reviews: package.reviews,
            price: package.price,
            featured: package.featured,
            is_hiking: false,
        }
    }
}

impl From<&HikingTrail> for TargetView {
    fn from(trail: &HikingTrail) -> Self {
        TargetView {
            id: trail.id,
            title: trail.title.clone(),
            description: trail.description.clone(),
            location: Some(trail.location.clone()),
            duration: trail.duration.clone(),
            image_url: trail.image_url.clone().unwrap_or_default(),
            gallery: trail.gallery.clone(),
            stars: if trail.stars == 0 { UNRATED_STARS } else { trail.stars },
            reviews: trail.reviews,
            price: trail.price.unwrap_or(Decimal::ZERO),
            featured: trail.featured,
            is_hiking: true,
        }
    }
}

/// Compact card for the "you may also like" strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedItem {
    pub id: Uuid,
    pub title: String,
    pub location: Option<String>,
    pub price: Decimal,
    pub image_url: String,
    pub featured: bool,
    pub stars: u8,
}

impl From<TargetView> for RelatedItem {
    fn from(view: TargetView) -> Self {
        RelatedItem {
            id: view.id,
            title: view.title,
            location: view.location,
            price: view.price,
            image_url: view.image_url,
            featured: view.featured,
            stars: view.stars,
        }
    }
}

/// The fields a booking list shows for its target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub id: Uuid,
    pub title: String,
    pub location: Option<String>,
    pub image_url: String,
    pub price: Decimal,
    pub is_hiking: bool,
}

impl From<&TargetView> for TargetSummary {
    fn from(view: &TargetView) -> Self {
        TargetSummary {
            id: view.id,
            title: view.title.clone(),
            location: view.location.clone(),
            image_url: view.image_url.clone(),
            price: view.price,
            is_hiking: view.is_hiking,
        }
    }
}
