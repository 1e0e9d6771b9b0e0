//! HTTP client for the artifact catalog.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::catalog::model::{BuildDescriptor, ProjectIndex, VersionIndex};
use crate::core::{Result, UpdateError};

/// Client for the versioned artifact catalog.
///
/// Fetches project-, version-, and build-level metadata and hands out the
/// raw download response for artifact streaming. Metadata responses are
/// cached for the process lifetime, keyed by the exact resolved URL, so a
/// repeated identical query within one run never issues a second request.
///
/// Failures are never retried here; a retry is a user-initiated re-run.
///
/// # Examples
///
/// ```rust,no_run
/// use srvup::catalog::CatalogClient;
///
/// # async fn example() -> srvup::core::Result<()> {
/// let catalog = CatalogClient::new("https://api.example.com/v2/projects/server");
/// let versions = catalog.versions().await?;
/// let builds = catalog.builds(versions.last().unwrap()).await?;
/// # Ok(())
/// # }
/// ```
pub struct CatalogClient {
    /// Base URL of the project, without a trailing slash.
    base: String,
    /// Shared HTTP client with the catalog's default headers.
    client: reqwest::Client,
    /// Response cache keyed by resolved URL, scoped to this process run.
    cache: DashMap<String, Value>,
}

impl CatalogClient {
    /// Create a client for the given project base URL.
    pub fn new(base: impl Into<String>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .expect("default reqwest client configuration is valid");

        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client,
            cache: DashMap::new(),
        }
    }

    /// Build a metadata URL, appending path segments only for the arguments
    /// actually supplied.
    ///
    /// No arguments addresses the project, version-only the version, both
    /// the specific build. Omission broadens the query scope; it never
    /// produces a wildcard token.
    pub fn data_url(&self, version: Option<&str>, build: Option<i64>) -> String {
        let mut url = self.base.clone();
        if let Some(version) = version {
            url.push_str("/versions/");
            url.push_str(version);
            if let Some(build) = build {
                url.push_str("/builds/");
                url.push_str(&build.to_string());
            }
        }
        url
    }

    /// Build the deterministic download URL for a build's artifact.
    pub fn download_url(&self, version: &str, build: i64, name: &str) -> String {
        format!(
            "{}/versions/{version}/builds/{build}/downloads/{name}",
            self.base
        )
    }

    /// Project-level metadata: the known versions, newest last.
    pub async fn project(&self) -> Result<ProjectIndex> {
        self.get(self.data_url(None, None)).await
    }

    /// Shorthand for the project's version list.
    pub async fn versions(&self) -> Result<Vec<String>> {
        Ok(self.project().await?.versions)
    }

    /// Version-level metadata: the builds published for `version`.
    pub async fn version(&self, version: &str) -> Result<VersionIndex> {
        self.get(self.data_url(Some(version), None)).await
    }

    /// Shorthand for a version's build list, newest last.
    pub async fn builds(&self, version: &str) -> Result<Vec<i64>> {
        Ok(self.version(version).await?.builds)
    }

    /// Full descriptor for one `(version, build)` pair.
    pub async fn build(&self, version: &str, build: i64) -> Result<BuildDescriptor> {
        self.get(self.data_url(Some(version), Some(build))).await
    }

    /// Issue a GET for an artifact body, with status checking but no caching.
    ///
    /// Used by the downloader, which streams the response itself.
    pub async fn fetch_artifact(&self, url: &str) -> Result<reqwest::Response> {
        debug!(%url, "requesting artifact");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| UpdateError::Network {
                url: url.to_string(),
                source,
            })?;
        Self::check_status(url, response)
    }

    /// Fetch a metadata URL through the cache and deserialize it.
    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        if let Some(cached) = self.cache.get(&url) {
            trace!(%url, "catalog cache hit");
            return serde_json::from_value(cached.clone()).map_err(|source| {
                UpdateError::InvalidResponse {
                    url: url.clone(),
                    source,
                }
            });
        }

        debug!(%url, "querying catalog");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| UpdateError::Network {
                url: url.clone(),
                source,
            })?;
        let response = Self::check_status(&url, response)?;

        let body: Value = response.json().await.map_err(|source| UpdateError::Network {
            url: url.clone(),
            source,
        })?;

        let parsed = serde_json::from_value(body.clone()).map_err(|source| {
            UpdateError::InvalidResponse {
                url: url.clone(),
                source,
            }
        })?;
        self.cache.insert(url, body);
        Ok(parsed)
    }

    /// Map a non-2xx response to [`UpdateError::HttpStatus`].
    fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(UpdateError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
        })
    }
}
