//! Remote acquisition: list a folder, then fetch every file in parallel

use futures_util::future::try_join_all;
use metrics::counter;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;

use super::types::{AcquisitionError, Blob, DEFAULT_CONTENT_TYPE};

/// Fetches a folder of DICOM files from a file-listing API and a content host
#[derive(Debug, Clone)]
pub struct RemoteAcquirer {
    client: reqwest::Client,
    api_base: String,
    content_base: String,
}

impl RemoteAcquirer {
    /// Create an acquirer with an untimed HTTP client
    pub fn new(api_base: impl Into<String>, content_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base, content_base)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_base: impl Into<String>,
        content_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            content_base: content_base.into(),
        }
    }

    /// Build an acquirer from configuration, if both bases are set
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        match (&config.api_base, &config.content_base) {
            (Some(api), Some(content)) => Some(Self::new(api.clone(), content.clone())),
            _ => None,
        }
    }

    /// `<api base><percent-encoded relative path>`
    pub fn listing_url(&self, relative_path: &str) -> String {
        format!("{}{}", self.api_base, encode_component(relative_path))
    }

    /// `<content base><relative path>/<name>`
    pub fn content_url(&self, relative_path: &str, file_name: &str) -> String {
        format!("{}{}/{}", self.content_base, relative_path, file_name)
    }

    /// Fetch the list of file names under a relative path
    pub async fn list_files(&self, relative_path: &str) -> Result<Vec<String>, AcquisitionError> {
        let url = self.listing_url(relative_path);
        debug!("Listing remote files: {}", url);

        let response = self.get(&url).await?;
        let names: Vec<String> =
            response
                .json()
                .await
                .map_err(|source| AcquisitionError::InvalidListing {
                    url: url.clone(),
                    source,
                })?;

        info!("Listing {} returned {} files", url, names.len());
        Ok(names)
    }

    /// Fetch one file and wrap it as a blob named after the last URL segment
    pub async fn fetch_blob(&self, url: &str) -> Result<Blob, AcquisitionError> {
        let response = self.get(url).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let data = response
            .bytes()
            .await
            .map_err(|source| AcquisitionError::Body {
                url: url.to_string(),
                source,
            })?;

        counter!("dicomlocal_remote_files_fetched_total").increment(1);
        debug!("Fetched {} ({} bytes, {})", url, data.len(), content_type);

        Ok(Blob::new(last_segment(url), content_type, data))
    }

    /// List a folder and fetch all of its files concurrently
    ///
    /// All-or-nothing: the first failed fetch fails the acquisition and no
    /// blobs are returned.
    pub async fn acquire(&self, relative_path: &str) -> Result<Vec<Blob>, AcquisitionError> {
        let names = self.list_files(relative_path).await?;
        let urls: Vec<String> = names
            .iter()
            .map(|name| self.content_url(relative_path, name))
            .collect();

        let blobs = try_join_all(urls.iter().map(|url| self.fetch_blob(url)))
            .await
            .inspect_err(|e| warn!("Remote acquisition of {:?} failed: {}", relative_path, e))?;

        info!(
            "Acquired {} remote files under {:?}",
            blobs.len(),
            relative_path
        );
        Ok(blobs)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AcquisitionError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| AcquisitionError::Request {
                    url: url.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

/// Percent-encode a value the way a URI component is encoded (spaces as `%20`)
fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
