use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PlateId);

/// A menu item as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    pub id: PlateId,
    pub name: String,
    pub image: String,
    /// Decimal text exactly as the backend returns it.
    pub price: String,
    pub description: String,
    pub available: bool,
}

impl Plate {
    /// Editable fields of this plate, as an edit form would be pre-populated.
    pub fn draft(&self) -> DraftPlate {
        DraftPlate {
            name: self.name.clone(),
            image: self.image.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
        }
    }
}

/// Plate fields collected by the add/edit forms. Identity and availability
/// are never part of a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPlate {
    pub name: String,
    pub image: String,
    pub price: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&PlateId(42)).expect("serialize");
        assert_eq!(json, "42");
        assert_eq!(PlateId(42).to_string(), "42");
    }

    #[test]
    fn draft_drops_identity_and_availability() {
        let plate = Plate {
            id: PlateId(3),
            name: "A".into(),
            image: "i1".into(),
            price: "4.50".into(),
            description: "d".into(),
            available: false,
        };

        let draft = plate.draft();
        assert_eq!(draft.name, "A");
        assert_eq!(draft.price, "4.50");

        let value = serde_json::to_value(&draft).expect("serialize");
        assert!(value.get("id").is_none());
        assert!(value.get("available").is_none());
    }
}
