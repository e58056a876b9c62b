//! Plate list view state and the CRUD operations that reconcile it with the
//! foods backend.
//!
//! Every operation issues at most one request and applies the response when
//! it arrives. Several operations may be in flight at once; responses for the
//! same plate are sequenced with per-plate tickets so that an older response
//! never overwrites a newer one.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use shared::{
    domain::{DraftPlate, Plate, PlateId},
    protocol::{CreatePlateRequest, UpdatePlateRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    api::FoodsApi,
    error::{Operation, OperationFailure, PlateListError},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateListState {
    pub plates: Vec<Plate>,
    pub editing_plate: Option<Plate>,
    pub add_form_visible: bool,
    pub edit_form_visible: bool,
    pub last_error: Option<OperationFailure>,
}

/// Emitted after every state change; front-ends re-render on receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlateListEvent {
    Loaded {
        count: usize,
    },
    Created(Plate),
    Updated(Plate),
    Deleted(PlateId),
    FormsChanged {
        add_form_visible: bool,
        edit_form_visible: bool,
    },
    EditSelectionChanged(Option<PlateId>),
    StaleResponseDiscarded {
        operation: Operation,
        plate_id: Option<PlateId>,
    },
    OperationFailed(OperationFailure),
}

#[derive(Default)]
struct Inner {
    state: PlateListState,
    mounted: bool,
    load_generation: u64,
    next_ticket: u64,
    latest_tickets: HashMap<PlateId, u64>,
}

impl Inner {
    fn issue_ticket(&mut self, plate_id: PlateId) -> u64 {
        self.next_ticket += 1;
        self.latest_tickets.insert(plate_id, self.next_ticket);
        self.next_ticket
    }

    fn is_latest(&self, plate_id: PlateId, ticket: u64) -> bool {
        self.latest_tickets.get(&plate_id) == Some(&ticket)
    }

    fn release_ticket(&mut self, plate_id: PlateId, ticket: u64) {
        if self.is_latest(plate_id, ticket) {
            self.latest_tickets.remove(&plate_id);
        }
    }
}

#[derive(Clone)]
pub struct PlateListController {
    api: Arc<dyn FoodsApi>,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<PlateListEvent>,
}

impl PlateListController {
    pub fn new(api: Arc<dyn FoodsApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlateListEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> PlateListState {
        self.inner.lock().await.state.clone()
    }

    pub async fn plates(&self) -> Vec<Plate> {
        self.inner.lock().await.state.plates.clone()
    }

    /// Initial load. Once a load has succeeded, later calls return the
    /// current plate count without touching the network; after a failed
    /// load the next call fetches again.
    pub async fn mount(&self) -> Result<usize, PlateListError> {
        {
            let inner = self.inner.lock().await;
            if inner.mounted {
                return Ok(inner.state.plates.len());
            }
        }
        self.load().await
    }

    /// Re-fetches the list regardless of mount state.
    pub async fn reload(&self) -> Result<usize, PlateListError> {
        self.load().await
    }

    async fn load(&self) -> Result<usize, PlateListError> {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.load_generation += 1;
            inner.load_generation
        };

        let result = self.api.list_plates().await;

        let mut inner = self.inner.lock().await;
        if generation != inner.load_generation {
            debug!(generation, "foods: discarding superseded list response");
            self.emit(PlateListEvent::StaleResponseDiscarded {
                operation: Operation::Load,
                plate_id: None,
            });
            // A newer load owns the list and the error surface.
            return match result {
                Ok(_) => Ok(inner.state.plates.len()),
                Err(source) => Err(PlateListError::request(Operation::Load, source)),
            };
        }

        let plates = match result {
            Ok(plates) => plates,
            Err(source) => {
                return Err(self.record_failure(
                    &mut inner.state,
                    PlateListError::request(Operation::Load, source),
                ));
            }
        };
        inner.mounted = true;

        inner.state.plates = dedupe_by_id(plates);
        let count = inner.state.plates.len();
        info!(count, "foods: plate list loaded");
        self.emit(PlateListEvent::Loaded { count });
        Ok(count)
    }

    /// Creates a plate from the add form's fields. New plates are always
    /// available. On success the server's plate is appended.
    pub async fn create(&self, draft: DraftPlate) -> Result<Plate, PlateListError> {
        let request = CreatePlateRequest::new(draft);
        let result = self.api.create_plate(&request).await;

        let mut inner = self.inner.lock().await;
        let plate = match result {
            Ok(plate) => plate,
            Err(source) => {
                return Err(self.record_failure(
                    &mut inner.state,
                    PlateListError::request(Operation::Create, source),
                ));
            }
        };

        match inner.state.plates.iter_mut().find(|p| p.id == plate.id) {
            Some(existing) => {
                // A reload already picked it up.
                warn!(plate_id = plate.id.0, "foods: created plate already listed");
                *existing = plate.clone();
            }
            None => inner.state.plates.push(plate.clone()),
        }
        info!(plate_id = plate.id.0, "foods: plate created");
        self.emit(PlateListEvent::Created(plate.clone()));
        Ok(plate)
    }

    /// Selects `plate` as the edit target and opens the edit form.
    pub async fn request_edit(&self, plate: Plate) {
        let mut inner = self.inner.lock().await;
        let plate_id = plate.id;
        inner.state.editing_plate = Some(plate);
        inner.state.edit_form_visible = true;
        self.emit(PlateListEvent::EditSelectionChanged(Some(plate_id)));
        self.emit_forms(&inner.state);
    }

    /// Edit form submit handler: updates the currently selected plate.
    pub async fn submit_edit(&self, draft: DraftPlate) -> Result<Plate, PlateListError> {
        let target_id = {
            let mut inner = self.inner.lock().await;
            let editing_id = inner.state.editing_plate.as_ref().map(|plate| plate.id);
            match editing_id {
                Some(id) => id,
                None => {
                    return Err(
                        self.record_failure(&mut inner.state, PlateListError::NoEditTarget)
                    );
                }
            }
        };
        self.update(target_id, draft).await
    }

    /// Sends `draft` as the new contents of plate `target_id`.
    ///
    /// Availability is carried over from the edit selection (or the listed
    /// plate) and never changed. The list entry is rebuilt from the fields in
    /// the server's response, not from `draft`. A response that was
    /// superseded by a later update or delete of the same plate is returned
    /// but not applied.
    pub async fn update(
        &self,
        target_id: PlateId,
        draft: DraftPlate,
    ) -> Result<Plate, PlateListError> {
        let (available, ticket) = {
            let mut inner = self.inner.lock().await;
            let snapshot = inner
                .state
                .editing_plate
                .as_ref()
                .filter(|plate| plate.id == target_id)
                .or_else(|| inner.state.plates.iter().find(|plate| plate.id == target_id))
                .map(|plate| plate.available);
            let Some(available) = snapshot else {
                return Err(self.record_failure(
                    &mut inner.state,
                    PlateListError::UnknownPlate(target_id),
                ));
            };
            (available, inner.issue_ticket(target_id))
        };

        let request = UpdatePlateRequest {
            food: draft,
            available,
        };
        let result = self.api.update_plate(target_id, &request).await;

        let mut inner = self.inner.lock().await;
        let fields = match result {
            Ok(fields) => fields,
            Err(source) => {
                inner.release_ticket(target_id, ticket);
                return Err(self.record_failure(
                    &mut inner.state,
                    PlateListError::request(Operation::Update, source),
                ));
            }
        };
        let plate = fields.into_plate(target_id, available);

        if !inner.is_latest(target_id, ticket) {
            debug!(plate_id = target_id.0, ticket, "foods: discarding superseded update");
            self.emit(PlateListEvent::StaleResponseDiscarded {
                operation: Operation::Update,
                plate_id: Some(target_id),
            });
            return Ok(plate);
        }
        inner.release_ticket(target_id, ticket);

        match inner.state.plates.iter_mut().find(|p| p.id == target_id) {
            Some(slot) => *slot = plate.clone(),
            None => {
                warn!(plate_id = target_id.0, "foods: updated plate no longer listed");
                return Ok(plate);
            }
        }
        if let Some(editing) = inner
            .state
            .editing_plate
            .as_mut()
            .filter(|editing| editing.id == target_id)
        {
            *editing = plate.clone();
        }
        info!(plate_id = target_id.0, "foods: plate updated");
        self.emit(PlateListEvent::Updated(plate.clone()));
        Ok(plate)
    }

    /// Deletes plate `id` and drops it from the list. The response body is
    /// ignored. Returns whether a listed plate was removed.
    pub async fn delete(&self, id: PlateId) -> Result<bool, PlateListError> {
        let result = self.api.delete_plate(id).await;

        let mut inner = self.inner.lock().await;
        if let Err(source) = result {
            return Err(self.record_failure(
                &mut inner.state,
                PlateListError::request(Operation::Delete, source),
            ));
        }
        // Updates for this plate still in flight must not land afterwards.
        inner.latest_tickets.remove(&id);

        let before = inner.state.plates.len();
        inner.state.plates.retain(|plate| plate.id != id);
        let removed = inner.state.plates.len() != before;

        if inner.state.editing_plate.as_ref().map(|p| p.id) == Some(id) {
            inner.state.editing_plate = None;
            self.emit(PlateListEvent::EditSelectionChanged(None));
        }
        info!(plate_id = id.0, removed, "foods: plate deleted");
        self.emit(PlateListEvent::Deleted(id));
        Ok(removed)
    }

    /// Returns the new visibility of the add form.
    pub async fn toggle_add_form(&self) -> bool {
        let mut inner = self.inner.lock().await;
        inner.state.add_form_visible = !inner.state.add_form_visible;
        self.emit_forms(&inner.state);
        inner.state.add_form_visible
    }

    /// Returns the new visibility of the edit form. Closing it drops the
    /// edit selection.
    pub async fn toggle_edit_form(&self) -> bool {
        let mut inner = self.inner.lock().await;
        inner.state.edit_form_visible = !inner.state.edit_form_visible;
        if !inner.state.edit_form_visible && inner.state.editing_plate.take().is_some() {
            self.emit(PlateListEvent::EditSelectionChanged(None));
        }
        self.emit_forms(&inner.state);
        inner.state.edit_form_visible
    }

    pub async fn clear_error(&self) {
        self.inner.lock().await.state.last_error = None;
    }

    fn record_failure(&self, state: &mut PlateListState, error: PlateListError) -> PlateListError {
        warn!(operation = %error.operation(), "foods: {error}");
        let failure = OperationFailure::from(&error);
        state.last_error = Some(failure.clone());
        self.emit(PlateListEvent::OperationFailed(failure));
        error
    }

    fn emit_forms(&self, state: &PlateListState) {
        self.emit(PlateListEvent::FormsChanged {
            add_form_visible: state.add_form_visible,
            edit_form_visible: state.edit_form_visible,
        });
    }

    fn emit(&self, event: PlateListEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn dedupe_by_id(plates: Vec<Plate>) -> Vec<Plate> {
    let mut seen = HashSet::new();
    plates
        .into_iter()
        .filter(|plate| {
            let first = seen.insert(plate.id);
            if !first {
                warn!(plate_id = plate.id.0, "foods: dropping duplicate plate in list response");
            }
            first
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
