//! Headless client for the plate dashboard: the foods API boundary and the
//! plate list controller that keeps local view state in step with it.

pub mod api;
pub mod controller;
pub mod error;

pub use api::{FoodsApi, HttpFoodsApi};
pub use controller::{PlateListController, PlateListEvent, PlateListState};
pub use error::{Operation, OperationFailure, PlateListError};
