//! Marketplace data service
//!
//! Built once by the application entry point and handed to every consumer.
//! Holds the registry base URL and turns view-level requests (filters,
//! extension pages) into endpoint URLs for [`ExtensionRegistryApi`].

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use url::Url;

use super::api::ExtensionRegistryApi;
use super::cancel::SupersedingRequests;
use crate::api::{
    Extension, ExtensionCategory, ExtensionReference, ExtensionReview, ExtensionReviewList,
    UserState,
};
use crate::error::RegistryError;
use crate::urls::{create_absolute_url, QueryParam};

/// Search filter of the extension list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionFilter {
    pub full_text: Option<String>,
    pub category: Option<ExtensionCategory>,
    pub offset: Option<u64>,
    pub size: Option<u64>,
}

impl ExtensionFilter {
    /// One query pair per set filter value.
    ///
    /// Unset values, empty strings and zero numbers are left out entirely.
    pub fn to_query(&self) -> Vec<QueryParam> {
        let mut query = Vec::new();
        if let Some(text) = self.full_text.as_deref().filter(|t| !t.is_empty()) {
            query.push(QueryParam::new("fullText", text));
        }
        if let Some(category) = self.category {
            query.push(QueryParam::new("category", category.label()));
        }
        if let Some(offset) = self.offset.filter(|o| *o != 0) {
            query.push(QueryParam::new("offset", offset));
        }
        if let Some(size) = self.size.filter(|s| *s != 0) {
            query.push(QueryParam::new("size", size));
        }
        query
    }
}

/// README location of an extension: its `readmeUrl`, or the conventional file
/// below the extension URL
pub fn readme_url(extension: &Extension) -> String {
    match extension.readme_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => create_absolute_url(&[extension.url.as_str(), "file", "ReadMe.md"], None),
    }
}

/// Review list location of an extension
pub fn reviews_url(extension: &Extension) -> String {
    if extension.reviews_url.is_empty() {
        create_absolute_url(&[extension.url.as_str(), "reviews"], None)
    } else {
        extension.reviews_url.clone()
    }
}

#[derive(Debug, Clone)]
pub struct ExtensionRegistryService {
    server_url: String,
    api: ExtensionRegistryApi,
}

impl ExtensionRegistryService {
    pub fn new(server_url: &str) -> Result<Self, RegistryError> {
        Self::with_api(server_url, ExtensionRegistryApi::new()?)
    }

    pub fn with_api(server_url: &str, api: ExtensionRegistryApi) -> Result<Self, RegistryError> {
        let server_url = server_url.strip_suffix('/').unwrap_or(server_url);
        Url::parse(server_url).map_err(|source| RegistryError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;

        Ok(Self {
            server_url: server_url.to_string(),
            api,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// API URL of an extension, or one of its versions
    pub fn extension_url(&self, reference: &ExtensionReference) -> String {
        create_absolute_url(
            &[
                self.server_url.as_str(),
                "api",
                reference.publisher.as_str(),
                reference.extension.as_str(),
                reference.version.as_deref().unwrap_or(""),
            ],
            None,
        )
    }

    pub async fn get_extensions(
        &self,
        filter: Option<&ExtensionFilter>,
    ) -> Result<Vec<ExtensionReference>, RegistryError> {
        let query = filter.map(ExtensionFilter::to_query).unwrap_or_default();
        let endpoint = create_absolute_url(
            &[self.server_url.as_str(), "api", "-", "search"],
            Some(query.as_slice()),
        );
        self.api.get_extensions(&endpoint).await
    }

    pub async fn get_extension_detail(&self, url: &str) -> Result<Extension, RegistryError> {
        self.api.get_extension(url).await
    }

    pub async fn get_extension_readme(&self, url: &str) -> Result<String, RegistryError> {
        self.api.get_extension_readme(url).await
    }

    pub async fn get_extension_reviews(&self, url: &str) -> Result<ExtensionReviewList, RegistryError> {
        self.api.get_extension_reviews(url).await
    }

    pub async fn post_review(&self, review: &ExtensionReview, url: &str) -> Result<(), RegistryError> {
        info!(url = %url, rating = review.rating.value(), "Posting review");
        self.api.post_review(review, url).await
    }

    pub async fn get_user(&self) -> Result<UserState, RegistryError> {
        let endpoint = create_absolute_url(&[self.server_url.as_str(), "-", "user"], None);
        self.api.get_user(&endpoint).await
    }

    pub fn get_categories(&self) -> &'static [ExtensionCategory] {
        &ExtensionCategory::ALL
    }
}

/// Current contents of an [`ExtensionListing`]
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    pub filter: ExtensionFilter,
    pub extensions: Vec<ExtensionReference>,
}

/// Extension list whose contents always belong to the latest filter.
///
/// Applying a filter rejects any search still running for an earlier one.
#[derive(Debug)]
pub struct ExtensionListing {
    service: Arc<ExtensionRegistryService>,
    requests: SupersedingRequests,
    snapshot: Mutex<Option<ListingSnapshot>>,
}

impl ExtensionListing {
    pub fn new(service: Arc<ExtensionRegistryService>) -> Self {
        Self {
            service,
            requests: SupersedingRequests::new(),
            snapshot: Mutex::new(None),
        }
    }

    pub async fn apply_filter(&self, filter: ExtensionFilter) -> Result<Vec<ExtensionReference>, RegistryError> {
        let ticket = self.requests.begin();
        debug!(generation = ticket.generation(), filter = ?filter, "Applying extension filter");

        let extensions = ticket
            .guard(self.service.get_extensions(Some(&filter)))
            .await?;

        self.requests.commit(&ticket, || {
            let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            *snapshot = Some(ListingSnapshot {
                filter,
                extensions: extensions.clone(),
            });
        })?;

        Ok(extensions)
    }

    pub fn snapshot(&self) -> Option<ListingSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop interest in the running search, e.g. when the view goes away
    pub fn cancel(&self) {
        self.requests.cancel();
    }
}
