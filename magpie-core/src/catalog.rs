use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::TargetRef;

/// One picture in a target's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    Expert,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Moderate
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Difficulty::Easy),
            "moderate" => Some(Difficulty::Moderate),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Hiking,
    Trekking,
    Photography,
    #[serde(rename = "trophy hunting")]
    TrophyHunting,
    Camping,
    Cultural,
    Sports,
    #[serde(rename = "adventure sports")]
    AdventureSports,
}

impl Default for Activity {
    fn default() -> Self {
        Activity::Hiking
    }
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Hiking => "hiking",
            Activity::Trekking => "trekking",
            Activity::Photography => "photography",
            Activity::TrophyHunting => "trophy hunting",
            Activity::Camping => "camping",
            Activity::Cultural => "cultural",
            Activity::Sports => "sports",
            Activity::AdventureSports => "adventure sports",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hiking" => Some(Activity::Hiking),
            "trekking" => Some(Activity::Trekking),
            "photography" => Some(Activity::Photography),
            "trophy hunting" => Some(Activity::TrophyHunting),
            "camping" => Some(Activity::Camping),
            "cultural" => Some(Activity::Cultural),
            "sports" => Some(Activity::Sports),
            "adventure sports" => Some(Activity::AdventureSports),
            _ => None,
        }
    }
}

/// A tour package as administered by the admin panel.
///
/// `stars` and `reviews` are derived from the review collection and are the
/// only fields this service writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPackage {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub gallery: Vec<GalleryImage>,
    pub stars: u8,
    pub reviews: u32,
    pub price: Decimal,
    pub duration: Option<String>,
    pub location: Option<String>,
    pub max_group_size: Option<u32>,
    pub included: Vec<String>,
    pub excluded: Vec<String>,
    pub highlights: Vec<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TourPackage {
    pub fn target(&self) -> TargetRef {
        TargetRef::TourPackage(self.id)
    }
}

/// A hiking trail as administered by the admin panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikingTrail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub gallery: Vec<GalleryImage>,
    pub stars: u8,
    pub reviews: u32,
    pub location: String,
    pub difficulty: Difficulty,
    pub activity: Activity,
    pub duration: Option<String>,
    pub price: Option<Decimal>,
    pub distance: Option<String>,
    pub elevation: Option<String>,
    pub best_time: Option<String>,
    pub features: Vec<String>,
    pub tips: Vec<String>,
    pub featured: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HikingTrail {
    pub fn target(&self) -> TargetRef {
        TargetRef::Hiking(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_names_match_admin_panel_values() {
        for activity in [
            Activity::Hiking,
            Activity::Trekking,
            Activity::Photography,
            Activity::TrophyHunting,
            Activity::Camping,
            Activity::Cultural,
            Activity::Sports,
            Activity::AdventureSports,
        ] {
            let json = serde_json::to_value(activity).unwrap();
            assert_eq!(json, activity.as_str());
            assert_eq!(Activity::parse(activity.as_str()), Some(activity));
        }
    }

    #[test]
    fn test_gallery_caption_and_alt_default_to_empty() {
        let image: GalleryImage = serde_json::from_str(r#"{"url":"/uploads/a.jpg"}"#).unwrap();
        assert_eq!(image.caption, "");
        assert_eq!(image.alt, "");
    }
}
