//! The `deposit` state slice, its lifecycle events and the reducer.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{Community, Draft},
    validation::ErrorNode,
};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::{community::CommunitySelection, error::Operation};

/// Counts the starts of one operation family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

/// Tag carried by the follow-up events of one started operation.
///
/// A ticket goes stale once another operation of the same family starts.
/// Operations of other families never invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub operation: Operation,
    pub generation: Generation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActionState {
    #[default]
    Idle,
    DraftSaveStarted,
    DraftSaveSucceeded,
    DraftSaveFailed,
    DraftHasValidationErrors,
    DraftPublishStarted,
    DraftPublishFailed,
    DraftSubmitReviewStarted,
    DraftSubmitReviewFailed,
    DraftPreviewStarted,
    DraftPreviewFailed,
    DraftDeleteStarted,
    DraftDeleteFailed,
    ReservePidStarted,
    ReservePidSucceeded,
    ReservePidFailed,
    DiscardPidStarted,
    DiscardPidSucceeded,
    DiscardPidFailed,
}

impl ActionState {
    pub fn started(operation: Operation) -> Self {
        match operation {
            Operation::Save => Self::DraftSaveStarted,
            Operation::Publish => Self::DraftPublishStarted,
            Operation::SubmitReview => Self::DraftSubmitReviewStarted,
            Operation::Preview => Self::DraftPreviewStarted,
            Operation::Delete => Self::DraftDeleteStarted,
            Operation::ReservePid => Self::ReservePidStarted,
            Operation::DiscardPid => Self::DiscardPidStarted,
        }
    }

    pub fn failed(operation: Operation) -> Self {
        match operation {
            Operation::Save => Self::DraftSaveFailed,
            Operation::Publish => Self::DraftPublishFailed,
            Operation::SubmitReview => Self::DraftSubmitReviewFailed,
            Operation::Preview => Self::DraftPreviewFailed,
            Operation::Delete => Self::DraftDeleteFailed,
            Operation::ReservePid => Self::ReservePidFailed,
            Operation::DiscardPid => Self::DiscardPidFailed,
        }
    }

    pub fn is_started(self) -> bool {
        matches!(
            self,
            Self::DraftSaveStarted
                | Self::DraftPublishStarted
                | Self::DraftSubmitReviewStarted
                | Self::DraftPreviewStarted
                | Self::DraftDeleteStarted
                | Self::ReservePidStarted
                | Self::DiscardPidStarted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::DraftSaveStarted => "DRAFT_SAVE_STARTED",
            Self::DraftSaveSucceeded => "DRAFT_SAVE_SUCCEEDED",
            Self::DraftSaveFailed => "DRAFT_SAVE_FAILED",
            Self::DraftHasValidationErrors => "DRAFT_HAS_VALIDATION_ERRORS",
            Self::DraftPublishStarted => "DRAFT_PUBLISH_STARTED",
            Self::DraftPublishFailed => "DRAFT_PUBLISH_FAILED",
            Self::DraftSubmitReviewStarted => "DRAFT_SUBMIT_REVIEW_STARTED",
            Self::DraftSubmitReviewFailed => "DRAFT_SUBMIT_REVIEW_FAILED",
            Self::DraftPreviewStarted => "DRAFT_PREVIEW_STARTED",
            Self::DraftPreviewFailed => "DRAFT_PREVIEW_FAILED",
            Self::DraftDeleteStarted => "DRAFT_DELETE_STARTED",
            Self::DraftDeleteFailed => "DRAFT_DELETE_FAILED",
            Self::ReservePidStarted => "RESERVE_PID_STARTED",
            Self::ReservePidSucceeded => "RESERVE_PID_SUCCEEDED",
            Self::ReservePidFailed => "RESERVE_PID_FAILED",
            Self::DiscardPidStarted => "DISCARD_PID_STARTED",
            Self::DiscardPidSucceeded => "DISCARD_PID_SUCCEEDED",
            Self::DiscardPidFailed => "DISCARD_PID_FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DepositAction {
    Started(Operation),
    Failed {
        operation: Operation,
        errors: ErrorNode,
    },
    DraftSaveSucceeded {
        data: Draft,
    },
    ReservePidSucceeded {
        data: Draft,
    },
    DiscardPidSucceeded {
        data: Draft,
    },
    DraftHasValidationErrors {
        data: Draft,
        errors: ErrorNode,
    },
    DraftFetched {
        data: Draft,
    },
    SetCommunity {
        community: Option<Community>,
    },
}

impl DepositAction {
    /// The `action_state` this event moves the store into, if it moves it at all.
    pub fn action_state(&self) -> Option<ActionState> {
        match self {
            Self::Started(operation) => Some(ActionState::started(*operation)),
            Self::Failed { operation, .. } => Some(ActionState::failed(*operation)),
            Self::DraftSaveSucceeded { .. } => Some(ActionState::DraftSaveSucceeded),
            Self::ReservePidSucceeded { .. } => Some(ActionState::ReservePidSucceeded),
            Self::DiscardPidSucceeded { .. } => Some(ActionState::DiscardPidSucceeded),
            Self::DraftHasValidationErrors { .. } => Some(ActionState::DraftHasValidationErrors),
            Self::DraftFetched { .. } | Self::SetCommunity { .. } => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DraftFetched { .. } => "DRAFT_FETCHED",
            Self::SetCommunity { .. } => "SET_COMMUNITY",
            other => other
                .action_state()
                .map(ActionState::as_str)
                .unwrap_or("UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepositState {
    pub record: Draft,
    pub action_state: ActionState,
    pub errors: ErrorNode,
    pub community: CommunitySelection,
    pub generations: HashMap<Operation, Generation>,
}

impl DepositState {
    pub fn new(record: Draft, selected: Option<Community>) -> Self {
        let community = CommunitySelection::for_record(&record, selected);
        Self {
            record,
            community,
            ..Self::default()
        }
    }

    /// Start count of `operation`'s family; zero before its first start.
    pub fn generation(&self, operation: Operation) -> Generation {
        self.generations.get(&operation).copied().unwrap_or_default()
    }

    fn ticket(&self, operation: Operation) -> Ticket {
        Ticket {
            operation,
            generation: self.generation(operation),
        }
    }

    fn merge_record(&mut self, data: &Draft) {
        self.record.merge(data.clone());
        self.refresh_community();
    }

    fn refresh_community(&mut self) {
        let selected = self.community.selected.take();
        self.community = CommunitySelection::for_record(&self.record, selected);
    }
}

/// Applies one event. Every branch replaces whole fields of the slice.
pub fn reduce(state: &mut DepositState, action: &DepositAction) {
    match action {
        DepositAction::Started(operation) => {
            state.generations.entry(*operation).or_default().0 += 1;
        }
        DepositAction::Failed { errors, .. } => {
            state.errors = errors.clone();
        }
        DepositAction::DraftSaveSucceeded { data }
        | DepositAction::ReservePidSucceeded { data }
        | DepositAction::DiscardPidSucceeded { data } => {
            state.merge_record(data);
            state.errors = ErrorNode::empty();
        }
        DepositAction::DraftHasValidationErrors { data, errors } => {
            state.merge_record(data);
            state.errors = errors.clone();
        }
        DepositAction::DraftFetched { data } => {
            // Reads replace the review linkage wholesale.
            state.record.parent = data.parent.clone();
            state.merge_record(data);
        }
        DepositAction::SetCommunity { community } => {
            state.community.selected = community.clone();
            state.refresh_community();
        }
    }

    if let Some(action_state) = action.action_state() {
        state.action_state = action_state;
    }
}

/// Read access to the `deposit` slice plus the only way to change it.
#[async_trait]
pub trait DepositDispatch: Send + Sync {
    async fn deposit(&self) -> DepositState;

    async fn dispatch(&self, action: DepositAction);

    /// Dispatches `operation`'s STARTED event and returns the ticket for its follow-ups.
    async fn start(&self, operation: Operation) -> Ticket;

    /// Applies the event only while `ticket` is the latest start of its family.
    async fn dispatch_for(&self, ticket: Ticket, action: DepositAction) -> bool;
}

pub struct DepositStore {
    state: RwLock<DepositState>,
    events: broadcast::Sender<DepositAction>,
}

impl DepositStore {
    pub fn new(initial: DepositState) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            state: RwLock::new(initial),
            events,
        })
    }

    /// Every applied event, in application order. Dropped stale events are not sent.
    pub fn subscribe(&self) -> broadcast::Receiver<DepositAction> {
        self.events.subscribe()
    }

    fn apply(&self, state: &mut DepositState, action: DepositAction) {
        reduce(state, &action);
        debug!(action = action.type_name(), "applied deposit action");
        let _ = self.events.send(action);
    }
}

#[async_trait]
impl DepositDispatch for DepositStore {
    async fn deposit(&self) -> DepositState {
        self.state.read().await.clone()
    }

    async fn dispatch(&self, action: DepositAction) {
        let mut guard = self.state.write().await;
        self.apply(&mut guard, action);
    }

    async fn start(&self, operation: Operation) -> Ticket {
        let mut guard = self.state.write().await;
        self.apply(&mut guard, DepositAction::Started(operation));
        guard.ticket(operation)
    }

    async fn dispatch_for(&self, ticket: Ticket, action: DepositAction) -> bool {
        let mut guard = self.state.write().await;
        let current = guard.generation(ticket.operation);
        if current != ticket.generation {
            debug!(
                action = action.type_name(),
                operation = %ticket.operation,
                stale = ticket.generation.0,
                current = current.0,
                "dropping stale deposit action"
            );
            return false;
        }
        self.apply(&mut guard, action);
        true
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
