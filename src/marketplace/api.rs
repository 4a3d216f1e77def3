//! Marketplace HTTP client.
//!
//! Unlike [`crate::registry::Registry`] this client works on full endpoint URLs
//! built by the caller (usually taken from previous responses, e.g.
//! `reviewsUrl`) and keeps a cookie store so a registry session is sent along
//! with every request. Requests that act on behalf of a user additionally carry
//! the personal access token as `token` query parameter, the same way the
//! publish endpoint receives it.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::api::{
    check_payload_error, Extension, ExtensionReference, ExtensionReview, ExtensionReviewList,
    SearchResult, UserState,
};
use crate::error::RegistryError;
use crate::registry::json_response;

#[derive(Debug, Clone)]
pub struct ExtensionRegistryApi {
    http_client: Client,
    token: Option<String>,
}

impl ExtensionRegistryApi {
    pub fn new() -> Result<Self, RegistryError> {
        let http_client = Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(http_client))
    }

    pub fn with_client(http_client: Client) -> Self {
        Self {
            http_client,
            token: None,
        }
    }

    /// Authenticate user requests with a personal access token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// `endpoint` with the access token appended, if one is configured
    fn authorized(&self, endpoint: &str) -> Result<String, RegistryError> {
        let Some(token) = &self.token else {
            return Ok(endpoint.to_string());
        };
        let mut url = Url::parse(endpoint).map_err(|source| RegistryError::InvalidUrl {
            url: endpoint.to_string(),
            source,
        })?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url.into())
    }

    pub async fn get_extensions(&self, endpoint: &str) -> Result<Vec<ExtensionReference>, RegistryError> {
        debug!(endpoint = %endpoint, "Searching extensions");
        let response = self.http_client.get(endpoint).send().await?;
        let result: SearchResult = json_response(response).await?;
        Ok(result.extensions)
    }

    pub async fn get_extension(&self, endpoint: &str) -> Result<Extension, RegistryError> {
        let response = self.http_client.get(endpoint).send().await?;
        json_response(response).await
    }

    /// Fetch the README as raw Markdown
    pub async fn get_extension_readme(&self, endpoint: &str) -> Result<String, RegistryError> {
        let response = self.http_client.get(endpoint).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RegistryError::Status { status, body });
        }
        Ok(body)
    }

    pub async fn get_extension_reviews(&self, endpoint: &str) -> Result<ExtensionReviewList, RegistryError> {
        let response = self.http_client.get(endpoint).send().await?;
        json_response(response).await
    }

    /// Post a review to the `postUrl` of a review list.
    ///
    /// A non-JSON acknowledgement is accepted; a JSON body with an `error`
    /// field is not.
    pub async fn post_review(&self, review: &ExtensionReview, endpoint: &str) -> Result<(), RegistryError> {
        let url = self.authorized(endpoint)?;
        let response = self.http_client.post(&url).json(review).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RegistryError::Status { status, body });
        }

        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            check_payload_error(&value)?;
        }
        Ok(())
    }

    /// Ask the registry who owns the current session.
    ///
    /// Unauthorized responses and bodies that are not a user profile both mean
    /// [`UserState::Anonymous`]. A body that is not JSON at all is an error.
    pub async fn get_user(&self, endpoint: &str) -> Result<UserState, RegistryError> {
        let url = self.authorized(endpoint)?;
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(UserState::Anonymous);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(RegistryError::Status { status, body });
        }

        let value: Value = serde_json::from_str(&body)?;
        Ok(UserState::from_json(value))
    }
}
