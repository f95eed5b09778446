use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;

use magpie_core::booking::CustomerInfo;
use magpie_core::{CoreError, CoreResult, TargetRef};

/// Body of the direct booking endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub tour_package_id: Option<String>,
    #[serde(default)]
    pub hiking_id: Option<String>,
    pub customer_info: Option<CustomerInfo>,
    pub travel_info: Option<TravelInfoInput>,
    pub payment_info: Option<PaymentInfoInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Travel dates as submitted. Parsed by [`parse_timestamp`].
#[derive(Debug, Clone, Deserialize)]
pub struct TravelInfoInput {
    pub departure_date: String,
    pub return_date: String,
    pub number_of_travelers: u32,
    #[serde(default)]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInfoInput {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub charge_id: Option<String>,
}

/// A "please verify my offline payment" submission.
#[derive(Debug, Clone, Default)]
pub struct ManualPaymentSubmission {
    pub tour_package_id: Option<String>,
    pub hiking_id: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    /// Public path of the uploaded payment screenshot.
    pub proof_image_url: Option<String>,
    pub customer_info: Option<CustomerInfo>,
    pub travel_info: Option<TravelInfoInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReviewRequest {
    #[serde(default)]
    pub tour_package_id: Option<String>,
    #[serde(default)]
    pub hiking_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Review forms post the star value as a string.
    #[serde(default, deserialize_with = "whole_number")]
    pub rating: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("`{text}` is not a whole number")))
        }
    }
}

/// Parses an optional id field. Blank strings count as absent.
pub fn parse_id(field: &'static str, value: Option<&str>) -> CoreResult<Option<Uuid>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| CoreError::validation(field, format!("`{raw}` is not a valid id"))),
    }
}

/// The target named by a `tour_package_id` / `hiking_id` pair, if any.
pub fn target_from_fields(tour_package_id: Option<&str>, hiking_id: Option<&str>) -> CoreResult<Option<TargetRef>> {
    TargetRef::from_ids(
        parse_id("tour_package_id", tour_package_id)?,
        parse_id("hiking_id", hiking_id)?,
    )
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) and `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(field: &'static str, value: &str) -> CoreResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(CoreError::validation(field, format!("`{value}` is not a valid date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("d", "2025-07-01").unwrap(), expected);
        assert_eq!(parse_timestamp("d", "2025-07-01T00:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("d", "2025-07-01T05:00:00+05:00").unwrap(), expected);
        assert_eq!(parse_timestamp("d", "2025-07-01T00:00:00.000Z").unwrap(), expected);
    }

    #[test]
    fn test_unparseable_date_names_field() {
        let err = parse_timestamp("travel_info.return_date", "next tuesday").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError { field: "travel_info.return_date", .. }));
    }

    #[test]
    fn test_review_rating_accepts_numbers_and_numeric_strings() {
        let parse = |body: &str| serde_json::from_str::<NewReviewRequest>(body).map(|r| r.rating);
        assert_eq!(parse(r#"{"rating": 4}"#).unwrap(), Some(4));
        assert_eq!(parse(r#"{"rating": " 3 "}"#).unwrap(), Some(3));
        assert_eq!(parse(r#"{"rating": ""}"#).unwrap(), None);
        assert_eq!(parse("{}").unwrap(), None);
        assert!(parse(r#"{"rating": "five"}"#).is_err());
    }

    #[test]
    fn test_blank_ids_are_absent() {
        assert_eq!(parse_id("hiking_id", Some("  ")).unwrap(), None);
        assert!(parse_id("hiking_id", Some("abc")).is_err());
        let id = Uuid::new_v4();
        assert_eq!(
            target_from_fields(None, Some(&id.to_string())).unwrap(),
            Some(TargetRef::Hiking(id))
        );
    }
}
