//! Client-side draft lifecycle for a research-data deposit form.
//!
//! [`DepositController`] runs save, publish, review, preview, delete and PID
//! operations against a [`DepositApi`], reporting progress as
//! [`DepositAction`]s to a [`DepositDispatch`] store. [`error_labels`] turns
//! the backend's validation-error documents into labelled messages, and
//! [`feedback`] derives user-facing status from the store.

pub mod backend;
pub mod community;
mod controller;
pub mod error;
pub mod error_labels;
pub mod feedback;
pub mod navigation;
pub mod store;

pub use backend::{DepositApi, DraftResponse, RequestData, RequestResponse, RestDepositApi};
pub use community::{CommunitySelection, ReviewAction};
pub use controller::{DeleteOptions, DepositController};
pub use error::{DepositError, Operation};
pub use navigation::{Destination, LoggingNavigator, Navigator};
pub use store::{
    ActionState, DepositAction, DepositDispatch, DepositState, DepositStore, Generation,
    Ticket,
};
