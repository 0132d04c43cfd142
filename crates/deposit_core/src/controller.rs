use std::sync::Arc;

use shared::{
    domain::{Community, Draft},
    error::BackendError,
};
use tracing::{info, warn};

use crate::{
    backend::{DepositApi, DraftResponse, RequestResponse},
    community::ReviewAction,
    error::{DepositError, Operation},
    navigation::{Destination, Navigator},
    store::{DepositAction, DepositDispatch, Ticket},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// The draft is a new version of a published record rather than a first upload.
    pub is_discarding_version: bool,
}

/// Drives draft operations against the backend and reports their progress to the store.
///
/// Each operation dispatches its STARTED event, then either a terminal event
/// or its FAILED event. Follow-up events carry the ticket the STARTED event
/// produced, so a newer operation of the same family supersedes an older one
/// still in flight. Every failure is also returned to the caller.
pub struct DepositController {
    api: Arc<dyn DepositApi>,
    store: Arc<dyn DepositDispatch>,
    navigator: Arc<dyn Navigator>,
}

impl DepositController {
    pub fn new(
        api: Arc<dyn DepositApi>,
        store: Arc<dyn DepositDispatch>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            store,
            navigator,
        }
    }

    pub async fn save(&self, draft: &Draft) -> Result<DraftResponse, DepositError> {
        let ticket = self.start(Operation::Save).await;
        let response = self
            .persist_draft(draft, Operation::Save, ticket)
            .await?;
        self.store
            .dispatch_for(
                ticket,
                DepositAction::DraftSaveSucceeded {
                    data: response.data.clone(),
                },
            )
            .await;
        Ok(response)
    }

    pub async fn publish(&self, draft: &Draft) -> Result<DraftResponse, DepositError> {
        let operation = Operation::Publish;
        let ticket = self.start(operation).await;
        let saved = self.persist_draft(draft, operation, ticket).await?;
        let published = self
            .settle(operation, ticket, self.api.publish(&saved.data.links).await)
            .await?;

        match published.data.links.self_html() {
            Some(url) => self.navigator.navigate(url),
            None => warn!("published record has no self_html link"),
        }
        Ok(published)
    }

    pub async fn submit_review(&self, draft: &Draft) -> Result<RequestResponse, DepositError> {
        let operation = Operation::SubmitReview;
        let ticket = self.start(operation).await;
        let saved = self.persist_draft(draft, operation, ticket).await?;
        let request = self
            .settle(
                operation,
                ticket,
                self.api.submit_review(&saved.data.links).await,
            )
            .await?;

        self.navigator
            .navigate(&Destination::request(&request.data.id));
        Ok(request)
    }

    pub async fn preview(&self, draft: &Draft) -> Result<(), DepositError> {
        let operation = Operation::Preview;
        let ticket = self.start(operation).await;
        let saved = self.persist_draft(draft, operation, ticket).await?;

        match saved.data.id.as_ref().or(draft.id.as_ref()) {
            Some(id) => self.navigator.navigate(&Destination::preview(id)),
            None => warn!("cannot preview a draft without an id"),
        }
        Ok(())
    }

    /// Deletes the draft currently held by the store.
    pub async fn delete(&self, options: DeleteOptions) -> Result<(), DepositError> {
        let operation = Operation::Delete;
        let ticket = self.start(operation).await;
        let record = self.store.deposit().await.record;

        if record.is_new() {
            info!("draft was never saved; nothing to delete");
        } else {
            self.settle(operation, ticket, self.api.delete(&record.links).await)
                .await?;
        }

        let target = if options.is_discarding_version {
            record
                .links
                .record_html()
                .map(str::to_string)
                .or_else(|| record.id.as_ref().map(Destination::record))
                .unwrap_or_else(|| Destination::UPLOADS.to_string())
        } else {
            Destination::UPLOADS.to_string()
        };
        self.navigator.navigate(&target);
        Ok(())
    }

    pub async fn reserve_pid(
        &self,
        draft: &Draft,
        pid_type: &str,
    ) -> Result<DraftResponse, DepositError> {
        let operation = Operation::ReservePid;
        let ticket = self.start(operation).await;
        let saved = self
            .persist_draft_without_review_sync(draft, operation, ticket)
            .await?;
        let response = self
            .settle(
                operation,
                ticket,
                self.api.reserve_pid(&saved.data.links, pid_type).await,
            )
            .await?;

        self.store
            .dispatch_for(
                ticket,
                DepositAction::ReservePidSucceeded {
                    data: response.data.clone(),
                },
            )
            .await;
        Ok(response)
    }

    pub async fn discard_pid(
        &self,
        draft: &Draft,
        pid_type: &str,
    ) -> Result<DraftResponse, DepositError> {
        let operation = Operation::DiscardPid;
        let ticket = self.start(operation).await;
        let saved = self
            .persist_draft_without_review_sync(draft, operation, ticket)
            .await?;
        let response = self
            .settle(
                operation,
                ticket,
                self.api.discard_pid(&saved.data.links, pid_type).await,
            )
            .await?;

        self.store
            .dispatch_for(
                ticket,
                DepositAction::DiscardPidSucceeded {
                    data: response.data.clone(),
                },
            )
            .await;
        Ok(response)
    }

    pub async fn change_selected_community(&self, community: Option<Community>) {
        self.store
            .dispatch(DepositAction::SetCommunity { community })
            .await;
    }

    async fn start(&self, operation: Operation) -> Ticket {
        info!(%operation, "deposit operation started");
        self.store.start(operation).await
    }

    /// Maps a backend rejection onto the operation's FAILED event.
    async fn settle<T>(
        &self,
        operation: Operation,
        ticket: Ticket,
        result: Result<T, BackendError>,
    ) -> Result<T, DepositError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(%operation, error = %err, "deposit operation failed");
                self.store
                    .dispatch_for(
                        ticket,
                        DepositAction::Failed {
                            operation,
                            errors: err.errors.clone(),
                        },
                    )
                    .await;
                Err(DepositError::backend(operation, err))
            }
        }
    }

    async fn save_with_url_update(&self, draft: &Draft) -> Result<DraftResponse, BackendError> {
        let had_id = !draft.is_new();
        let response = self.api.save(draft).await?;
        if !had_id {
            if let Some(url) = response.data.links.self_html() {
                self.navigator.replace(url);
            }
        }
        Ok(response)
    }

    /// Create-or-update only: no validation short-circuit, no review sync.
    async fn persist_draft_without_review_sync(
        &self,
        draft: &Draft,
        operation: Operation,
        ticket: Ticket,
    ) -> Result<DraftResponse, DepositError> {
        self.settle(operation, ticket, self.save_with_url_update(draft).await)
            .await
    }

    async fn persist_draft(
        &self,
        draft: &Draft,
        operation: Operation,
        ticket: Ticket,
    ) -> Result<DraftResponse, DepositError> {
        let response = self
            .persist_draft_without_review_sync(draft, operation, ticket)
            .await?;

        if response.has_validation_errors() {
            warn!(%operation, "draft saved with validation errors");
            self.store
                .dispatch_for(
                    ticket,
                    DepositAction::DraftHasValidationErrors {
                        data: response.data.clone(),
                        errors: response.errors.clone(),
                    },
                )
                .await;
            return Err(DepositError::Validation {
                data: Box::new(response.data),
                errors: response.errors,
            });
        }

        let community = self.store.deposit().await.community;
        let links = &response.data.links;
        match community.review_action() {
            ReviewAction::CreateOrUpdate(community_id) => {
                self.settle(
                    operation,
                    ticket,
                    self.api.create_or_update_review(links, community_id).await,
                )
                .await?;
            }
            ReviewAction::Delete => {
                self.settle(operation, ticket, self.api.delete_review(links).await)
                    .await?;
            }
            ReviewAction::None => return Ok(response),
        }

        let refreshed = self
            .settle(operation, ticket, self.api.read(links).await)
            .await?;
        self.store
            .dispatch_for(
                ticket,
                DepositAction::DraftFetched {
                    data: refreshed.data.clone(),
                },
            )
            .await;
        Ok(refreshed)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
