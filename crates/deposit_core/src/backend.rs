//! The deposit backend seam and its REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::{CommunityId, Draft, Links, RequestId},
    error::{ApiErrorBody, BackendError, ErrorCode},
    validation::ErrorNode,
};
use tracing::{info, warn};

const REVIEW_REQUEST_TYPE: &str = "community-submission";

/// A draft body as returned by the backend, split from its validation feedback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftResponse {
    pub data: Draft,
    pub errors: ErrorNode,
}

impl DraftResponse {
    pub fn new(data: Draft) -> Self {
        Self {
            data,
            errors: ErrorNode::empty(),
        }
    }

    pub fn with_errors(mut self, errors: ErrorNode) -> Self {
        self.errors = errors;
        self
    }

    pub fn has_validation_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResponse {
    pub data: RequestData,
}

#[async_trait]
pub trait DepositApi: Send + Sync {
    /// Creates the draft when it has no id yet, otherwise updates it.
    async fn save(&self, draft: &Draft) -> Result<DraftResponse, BackendError>;
    async fn read(&self, links: &Links) -> Result<DraftResponse, BackendError>;
    async fn delete(&self, links: &Links) -> Result<(), BackendError>;
    async fn publish(&self, links: &Links) -> Result<DraftResponse, BackendError>;
    async fn submit_review(&self, links: &Links) -> Result<RequestResponse, BackendError>;
    async fn reserve_pid(&self, links: &Links, pid_type: &str)
        -> Result<DraftResponse, BackendError>;
    async fn discard_pid(&self, links: &Links, pid_type: &str)
        -> Result<DraftResponse, BackendError>;
    async fn create_or_update_review(
        &self,
        links: &Links,
        community_id: CommunityId,
    ) -> Result<(), BackendError>;
    async fn delete_review(&self, links: &Links) -> Result<(), BackendError>;
}

#[derive(Debug, Serialize)]
struct ReviewReceiverPayload {
    community: CommunityId,
}

#[derive(Debug, Serialize)]
struct ReviewPayload {
    receiver: ReviewReceiverPayload,
    #[serde(rename = "type")]
    request_type: &'static str,
}

pub struct RestDepositApi {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl RestDepositApi {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_options(
        api_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| BackendError::transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn records_url(&self) -> String {
        format!("{}/records", self.api_url)
    }

    fn link<'a>(url: Option<&'a str>, rel: &str) -> Result<&'a str, BackendError> {
        url.ok_or_else(|| {
            BackendError::new(
                ErrorCode::Validation,
                format!("draft has no `{rel}` link"),
            )
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|err| BackendError::transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            message = body.message.as_deref().unwrap_or(""),
            "deposit backend rejected request"
        );
        Err(BackendError::from_body(status.as_u16(), body))
    }

    async fn draft_response(response: Response) -> Result<DraftResponse, BackendError> {
        let mut body: Value = response
            .json()
            .await
            .map_err(|err| BackendError::transport(format!("unreadable draft response: {err}")))?;
        let errors = body
            .as_object_mut()
            .and_then(|fields| fields.remove("errors"))
            .map(ErrorNode::from_response_errors)
            .unwrap_or_default();
        let data: Draft = serde_json::from_value(body).map_err(|err| {
            BackendError::new(ErrorCode::Internal, format!("malformed draft response: {err}"))
        })?;
        Ok(DraftResponse { data, errors })
    }
}

#[async_trait]
impl DepositApi for RestDepositApi {
    async fn save(&self, draft: &Draft) -> Result<DraftResponse, BackendError> {
        let builder = match (&draft.id, draft.links.self_api()) {
            (None, _) => {
                info!("creating draft");
                self.request(Method::POST, &self.records_url())
            }
            (Some(id), Some(url)) => {
                info!(record_id = %id, "updating draft");
                self.request(Method::PUT, url)
            }
            (Some(id), None) => {
                info!(record_id = %id, "updating draft via records endpoint");
                let url = format!("{}/{id}/draft", self.records_url());
                self.request(Method::PUT, &url)
            }
        };
        let response = self.send(builder.json(draft)).await?;
        Self::draft_response(response).await
    }

    async fn read(&self, links: &Links) -> Result<DraftResponse, BackendError> {
        let url = Self::link(links.self_api(), Links::SELF)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Self::draft_response(response).await
    }

    async fn delete(&self, links: &Links) -> Result<(), BackendError> {
        let url = Self::link(links.self_api(), Links::SELF)?;
        info!(url, "deleting draft");
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn publish(&self, links: &Links) -> Result<DraftResponse, BackendError> {
        let url = Self::link(links.publish(), Links::PUBLISH)?;
        info!(url, "publishing draft");
        let response = self.send(self.request(Method::POST, url)).await?;
        Self::draft_response(response).await
    }

    async fn submit_review(&self, links: &Links) -> Result<RequestResponse, BackendError> {
        let url = Self::link(links.submit_review(), Links::SUBMIT_REVIEW)?;
        info!(url, "submitting draft for review");
        let response = self
            .send(self.request(Method::POST, url).json(&serde_json::json!({})))
            .await?;
        let data: RequestData = response.json().await.map_err(|err| {
            BackendError::new(ErrorCode::Internal, format!("malformed request response: {err}"))
        })?;
        Ok(RequestResponse { data })
    }

    async fn reserve_pid(
        &self,
        links: &Links,
        pid_type: &str,
    ) -> Result<DraftResponse, BackendError> {
        let url = Self::link(links.reserve_pid(pid_type), &Links::reserve_rel(pid_type))?;
        info!(url, pid_type, "reserving pid");
        let response = self.send(self.request(Method::POST, url)).await?;
        Self::draft_response(response).await
    }

    async fn discard_pid(
        &self,
        links: &Links,
        pid_type: &str,
    ) -> Result<DraftResponse, BackendError> {
        let url = Self::link(links.reserve_pid(pid_type), &Links::reserve_rel(pid_type))?;
        info!(url, pid_type, "discarding pid");
        let response = self.send(self.request(Method::DELETE, url)).await?;
        Self::draft_response(response).await
    }

    async fn create_or_update_review(
        &self,
        links: &Links,
        community_id: CommunityId,
    ) -> Result<(), BackendError> {
        let url = Self::link(links.review(), Links::REVIEW)?;
        info!(url, community = %community_id, "creating or updating review request");
        let payload = ReviewPayload {
            receiver: ReviewReceiverPayload {
                community: community_id,
            },
            request_type: REVIEW_REQUEST_TYPE,
        };
        self.send(self.request(Method::PUT, url).json(&payload))
            .await?;
        Ok(())
    }

    async fn delete_review(&self, links: &Links) -> Result<(), BackendError> {
        let url = Self::link(links.review(), Links::REVIEW)?;
        info!(url, "deleting review request");
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
