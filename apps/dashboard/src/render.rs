//! Text rendering for plate cards and controller events.

use std::fmt::Write as _;

use client_core::{PlateListEvent, PlateListState};
use shared::domain::Plate;

pub fn render_card(plate: &Plate) -> String {
    let availability = if plate.available {
        "available"
    } else {
        "unavailable"
    };
    let mut card = format!(
        "#{} {}  {}  [{availability}]\n",
        plate.id, plate.name, plate.price
    );
    let _ = writeln!(card, "    image: {}", plate.image);
    if !plate.description.is_empty() {
        let _ = writeln!(card, "    {}", plate.description);
    }
    card
}

pub fn render_list(state: &PlateListState) -> String {
    let mut out = String::new();
    if let Some(failure) = &state.last_error {
        let _ = writeln!(out, "error: {}", failure.message);
    }
    if state.plates.is_empty() {
        out.push_str("No plates yet.\n");
        return out;
    }
    for plate in &state.plates {
        out.push_str(&render_card(plate));
    }
    out
}

/// One-line status for events a user cares about; form and selection
/// changes are silent.
pub fn describe_event(event: &PlateListEvent) -> Option<String> {
    match event {
        PlateListEvent::Loaded { count } => Some(format!("loaded {count} plate(s)")),
        PlateListEvent::Created(plate) => Some(format!("created plate {} ({})", plate.id, plate.name)),
        PlateListEvent::Updated(plate) => Some(format!("updated plate {} ({})", plate.id, plate.name)),
        PlateListEvent::Deleted(id) => Some(format!("deleted plate {id}")),
        PlateListEvent::StaleResponseDiscarded { operation, .. } => {
            Some(format!("ignored an outdated {operation} response"))
        }
        PlateListEvent::OperationFailed(failure) => Some(format!("failed: {}", failure.message)),
        PlateListEvent::FormsChanged { .. } | PlateListEvent::EditSelectionChanged(_) => None,
    }
}
