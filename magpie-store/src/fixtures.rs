//! Catalog records for seeding a [`MemoryStore`](crate::MemoryStore) in tests
//! and local demos.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use magpie_core::catalog::{Activity, Difficulty, GalleryImage, HikingTrail, TourPackage};

pub fn tour_package(title: &str, location: &str) -> TourPackage {
    let now = Utc::now();
    TourPackage {
        id: Uuid::new_v4(),
        title: title.into(),
        description: format!("{title} with local guides"),
        image_url: format!("/uploads/{}.jpg", slug(title)),
        gallery: vec![GalleryImage {
            url: format!("/uploads/{}-1.jpg", slug(title)),
            caption: title.into(),
            alt: String::new(),
        }],
        stars: 5,
        reviews: 0,
        price: Decimal::new(450, 0),
        duration: Some("6 days".into()),
        location: Some(location.into()),
        max_group_size: Some(12),
        included: vec!["Transport".into(), "Meals".into()],
        excluded: vec!["Flights".into()],
        highlights: vec![],
        featured: false,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn hiking_trail(title: &str, location: &str) -> HikingTrail {
    let now = Utc::now();
    HikingTrail {
        id: Uuid::new_v4(),
        title: title.into(),
        description: format!("{title} trek"),
        image_url: None,
        gallery: Vec::new(),
        stars: 0,
        reviews: 0,
        location: location.into(),
        difficulty: Difficulty::Hard,
        activity: Activity::Trekking,
        duration: Some("3 days".into()),
        price: None,
        distance: Some("24 km".into()),
        elevation: Some("4,200 m".into()),
        best_time: Some("June to September".into()),
        features: vec![],
        tips: vec![],
        featured: false,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

fn slug(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}
