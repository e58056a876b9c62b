use serde::{Deserialize, Serialize};

use crate::domain::{DraftPlate, Plate, PlateId};

/// Body of `POST /foods`: the draft fields, flattened, plus availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlateRequest {
    #[serde(flatten)]
    pub draft: DraftPlate,
    pub available: bool,
}

impl CreatePlateRequest {
    /// New plates always start out available.
    pub fn new(draft: DraftPlate) -> Self {
        Self {
            draft,
            available: true,
        }
    }
}

/// Body of `POST /foods/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlateRequest {
    pub food: DraftPlate,
    pub available: bool,
}

/// Fields the backend echoes back after an update. Anything else in the
/// payload (id, available, ...) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedPlateFields {
    pub name: String,
    pub image: String,
    pub price: String,
    pub description: String,
}

impl UpdatedPlateFields {
    pub fn into_plate(self, id: PlateId, available: bool) -> Plate {
        Plate {
            id,
            name: self.name,
            image: self.image,
            price: self.price,
            description: self.description,
            available,
        }
    }
}
