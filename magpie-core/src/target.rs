use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Which catalog a bookable target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Package,
    Hiking,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Package => "package",
            TargetKind::Hiking => "hiking",
        }
    }

    /// Human readable collection name, used in not-found errors.
    pub fn entity(&self) -> &'static str {
        match self {
            TargetKind::Package => "Tour package",
            TargetKind::Hiking => "Hiking trail",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to exactly one bookable target.
///
/// Records that point at a tour package or a hiking trail carry one of these
/// instead of two optional foreign keys plus a type flag, so the flag and the
/// populated key can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TargetRefWire", into = "TargetRefWire")]
pub enum TargetRef {
    TourPackage(Uuid),
    Hiking(Uuid),
}

impl TargetRef {
    pub fn id(&self) -> Uuid {
        match self {
            TargetRef::TourPackage(id) | TargetRef::Hiking(id) => *id,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetRef::TourPackage(_) => TargetKind::Package,
            TargetRef::Hiking(_) => TargetKind::Hiking,
        }
    }

    pub fn tour_package_id(&self) -> Option<Uuid> {
        match self {
            TargetRef::TourPackage(id) => Some(*id),
            TargetRef::Hiking(_) => None,
        }
    }

    pub fn hiking_id(&self) -> Option<Uuid> {
        match self {
            TargetRef::Hiking(id) => Some(*id),
            TargetRef::TourPackage(_) => None,
        }
    }

    /// Builds a reference from the optional id pair submitted by clients.
    ///
    /// Returns `Ok(None)` when neither id is present and a validation error
    /// when both are.
    pub fn from_ids(tour_package_id: Option<Uuid>, hiking_id: Option<Uuid>) -> CoreResult<Option<Self>> {
        match (tour_package_id, hiking_id) {
            (Some(_), Some(_)) => Err(CoreError::validation(
                "target",
                "supply either tour_package_id or hiking_id, not both",
            )),
            (Some(id), None) => Ok(Some(TargetRef::TourPackage(id))),
            (None, Some(id)) => Ok(Some(TargetRef::Hiking(id))),
            (None, None) => Ok(None),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TargetRefWire {
    target_type: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tour_package_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hiking_id: Option<Uuid>,
}

impl From<TargetRef> for TargetRefWire {
    fn from(target: TargetRef) -> Self {
        Self {
            target_type: target.kind(),
            tour_package_id: target.tour_package_id(),
            hiking_id: target.hiking_id(),
        }
    }
}

impl TryFrom<TargetRefWire> for TargetRef {
    type Error = String;

    fn try_from(wire: TargetRefWire) -> Result<Self, Self::Error> {
        match (wire.target_type, wire.tour_package_id, wire.hiking_id) {
            (TargetKind::Package, Some(id), None) => Ok(TargetRef::TourPackage(id)),
            (TargetKind::Hiking, None, Some(id)) => Ok(TargetRef::Hiking(id)),
            (kind, _, _) => Err(format!(
                "target_type `{kind}` does not match the populated target id"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ids_rejects_both() {
        let result = TargetRef::from_ids(Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        assert!(matches!(result, Err(CoreError::ValidationError { field: "target", .. })));
    }

    #[test]
    fn test_from_ids_picks_the_populated_side() {
        let id = Uuid::new_v4();
        assert_eq!(TargetRef::from_ids(None, Some(id)).unwrap(), Some(TargetRef::Hiking(id)));
        assert_eq!(TargetRef::from_ids(Some(id), None).unwrap(), Some(TargetRef::TourPackage(id)));
        assert_eq!(TargetRef::from_ids(None, None).unwrap(), None);
    }

    #[test]
    fn test_wire_format_carries_discriminant_and_single_key() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(TargetRef::Hiking(id)).unwrap();
        assert_eq!(json["target_type"], "hiking");
        assert_eq!(json["hiking_id"], id.to_string());
        assert!(json.get("tour_package_id").is_none());
    }

    #[test]
    fn test_mismatched_discriminant_is_rejected() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({ "target_type": "package", "hiking_id": id });
        assert!(serde_json::from_value::<TargetRef>(json).is_err());
    }
}
