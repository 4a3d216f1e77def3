//! Registry client used by the command line tools.
//!
//! Talks to the registry's REST API relative to a single base URL. Each call
//! is exactly one request/response round trip.

use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{parse_payload, Extension};
use crate::error::RegistryError;
use crate::urls::create_absolute_url;

/// Registry used when neither a flag, the environment nor the config file name one
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Handle on a registry base URL
#[derive(Debug, Clone)]
pub struct Registry {
    url: String,
    http_client: Client,
}

impl Registry {
    /// Create a client for `url`, falling back to [`DEFAULT_URL`].
    pub fn new(url: Option<&str>) -> Result<Self, RegistryError> {
        Self::with_client(Client::new(), url)
    }

    /// Create a client reusing an existing HTTP client.
    ///
    /// A trailing slash is stripped so paths can be appended verbatim.
    pub fn with_client(http_client: Client, url: Option<&str>) -> Result<Self, RegistryError> {
        let url = match url.filter(|u| !u.is_empty()) {
            Some(u) => u.strip_suffix('/').unwrap_or(u),
            None => DEFAULT_URL,
        };
        Url::parse(url).map_err(|source| RegistryError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            url: url.to_string(),
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Upload an extension archive.
    ///
    /// The file is streamed as the request body. It is owned by the body, so
    /// a read error aborts the upload and dropping the request closes the file.
    pub async fn publish(&self, file: &Path, pat: Option<&str>) -> Result<Extension, RegistryError> {
        let path = file.display().to_string();
        let io_error = |source| RegistryError::Io {
            path: path.clone(),
            source,
        };
        let file = tokio::fs::File::open(file).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();

        info!(file = %path, size = length, registry = %self.url, "Uploading extension package");

        let stream = ReaderStream::new(file).inspect_err(move |e| {
            warn!(file = %path, error = %e, "Reading package file failed, aborting upload");
        });

        self.upload(Body::wrap_stream(stream), length, pat).await
    }

    /// POST `body` of `length` bytes to the publish endpoint
    pub(crate) async fn upload(
        &self,
        body: Body,
        length: u64,
        pat: Option<&str>,
    ) -> Result<Extension, RegistryError> {
        let mut url = format!("{}/api/-/publish", self.url);
        if let Some(pat) = pat.filter(|p| !p.is_empty()) {
            url = format!("{}?token={}", url, urlencoding::encode(pat));
        }

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;

        json_response(response).await
    }

    /// Fetch the metadata of an extension, or of one of its versions.
    pub async fn get_metadata(
        &self,
        publisher: &str,
        extension: &str,
        version: Option<&str>,
    ) -> Result<Extension, RegistryError> {
        let url = create_absolute_url(
            &[
                self.url.as_str(),
                "api",
                publisher,
                extension,
                version.unwrap_or(""),
            ],
            None,
        );
        debug!(url = %url, "Fetching extension metadata");

        let response = self.http_client.get(&url).send().await?;
        json_response(response).await
    }
}

/// Read the whole body, then check the status and decode it.
pub(crate) async fn json_response<T: DeserializeOwned>(response: Response) -> Result<T, RegistryError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        debug!(status = %status, body = %body, "Registry returned an error status");
        return Err(RegistryError::Status { status, body });
    }

    parse_payload(&body)
}
